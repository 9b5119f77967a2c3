use crate::data::{SkillId, StateId};

/// Battle configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BattleConfig {
    /// Number of roster members that fight; the rest sit on the bench.
    pub max_battle_members: usize,
    pub max_tp: i32,
    pub max_gold: i32,
    /// Per-entry cap for item, weapon and armor counts.
    pub max_items: i32,
    /// Added to the escape ratio after every failed escape.
    pub escape_ratio_step: f64,
    pub critical_multiplier: f64,
    /// When set, slip damage (negative HP regeneration) is allowed to kill.
    pub slip_death: bool,
    /// When set, bench members receive full battle experience.
    pub extra_exp: bool,
    /// Battle-start TP is drawn from `0..initial_tp_range`.
    pub initial_tp_range: i32,
    /// TP gained from taking damage equal to the full MHP.
    pub tp_charge_by_damage: f64,
}

impl BattleConfig {
    // ===== compile-time constants =====
    /// State that marks a battler as knocked out.
    pub const DEATH_STATE_ID: StateId = StateId(1);
    pub const ATTACK_SKILL_ID: SkillId = SkillId(1);
    pub const GUARD_SKILL_ID: SkillId = SkillId(2);
    /// Element used by a player character's attack when no weapon is equipped.
    pub const BARE_HANDS_ELEMENT_ID: i32 = 1;
    pub const PARAM_COUNT: usize = 8;
    pub const MAX_BUFF_LEVEL: i32 = 2;
    /// Upper bound on actions a single battler can queue for one turn.
    /// Action-plus rolls past it are dropped with a warning.
    pub const MAX_ACTIONS_PER_TURN: usize = 8;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_BATTLE_MEMBERS: usize = 4;
    pub const DEFAULT_MAX_TP: i32 = 100;
    pub const DEFAULT_MAX_GOLD: i32 = 99_999_999;
    pub const DEFAULT_MAX_ITEMS: i32 = 99;
    pub const DEFAULT_ESCAPE_RATIO_STEP: f64 = 0.1;
    pub const DEFAULT_CRITICAL_MULTIPLIER: f64 = 3.0;
    pub const DEFAULT_INITIAL_TP_RANGE: i32 = 25;
    pub const DEFAULT_TP_CHARGE_BY_DAMAGE: f64 = 50.0;

    pub fn new() -> Self {
        Self {
            max_battle_members: Self::DEFAULT_MAX_BATTLE_MEMBERS,
            max_tp: Self::DEFAULT_MAX_TP,
            max_gold: Self::DEFAULT_MAX_GOLD,
            max_items: Self::DEFAULT_MAX_ITEMS,
            escape_ratio_step: Self::DEFAULT_ESCAPE_RATIO_STEP,
            critical_multiplier: Self::DEFAULT_CRITICAL_MULTIPLIER,
            slip_death: false,
            extra_exp: false,
            initial_tp_range: Self::DEFAULT_INITIAL_TP_RANGE,
            tp_charge_by_damage: Self::DEFAULT_TP_CHARGE_BY_DAMAGE,
        }
    }

    pub fn with_max_battle_members(mut self, max_battle_members: usize) -> Self {
        self.max_battle_members = max_battle_members;
        self
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}
