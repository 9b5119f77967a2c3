//! Skills and items: everything a battler can "use" in an action.

use super::ids::{ItemId, SkillId};

/// Declared target category of a skill or item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Scope {
    #[default]
    None = 0,
    OneEnemy = 1,
    AllEnemies = 2,
    OneRandomEnemy = 3,
    TwoRandomEnemies = 4,
    ThreeRandomEnemies = 5,
    FourRandomEnemies = 6,
    OneAlly = 7,
    AllAllies = 8,
    OneDeadAlly = 9,
    AllDeadAllies = 10,
    User = 11,
}

impl Scope {
    pub fn is_for_opponent(self) -> bool {
        matches!(
            self,
            Self::OneEnemy
                | Self::AllEnemies
                | Self::OneRandomEnemy
                | Self::TwoRandomEnemies
                | Self::ThreeRandomEnemies
                | Self::FourRandomEnemies
        )
    }

    pub fn is_for_friend(self) -> bool {
        matches!(
            self,
            Self::OneAlly | Self::AllAllies | Self::OneDeadAlly | Self::AllDeadAllies | Self::User
        )
    }

    pub fn is_for_dead_friend(self) -> bool {
        matches!(self, Self::OneDeadAlly | Self::AllDeadAllies)
    }

    pub fn is_for_user(self) -> bool {
        self == Self::User
    }

    pub fn is_for_one(self) -> bool {
        matches!(
            self,
            Self::OneEnemy | Self::OneRandomEnemy | Self::OneAlly | Self::OneDeadAlly | Self::User
        )
    }

    pub fn is_for_random(self) -> bool {
        matches!(
            self,
            Self::OneRandomEnemy
                | Self::TwoRandomEnemies
                | Self::ThreeRandomEnemies
                | Self::FourRandomEnemies
        )
    }

    pub fn is_for_all(self) -> bool {
        matches!(self, Self::AllEnemies | Self::AllAllies | Self::AllDeadAllies)
    }

    /// Scopes where the player picks the target.
    pub fn needs_selection(self) -> bool {
        matches!(self, Self::OneEnemy | Self::OneAlly | Self::OneDeadAlly)
    }

    /// Number of random draws for random scopes, 0 otherwise.
    pub fn num_targets(self) -> usize {
        if self.is_for_random() {
            self as usize - 2
        } else {
            0
        }
    }
}

/// When a skill or item may be used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Occasion {
    #[default]
    Always,
    BattleOnly,
    MenuOnly,
    Never,
}

impl Occasion {
    pub fn allows(self, in_battle: bool) -> bool {
        match self {
            Self::Always => true,
            Self::BattleOnly => in_battle,
            Self::MenuOnly => !in_battle,
            Self::Never => false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HitType {
    #[default]
    Certain,
    Physical,
    Magical,
}

/// What the damage formula does to the target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum DamageType {
    #[default]
    None = 0,
    HpDamage = 1,
    MpDamage = 2,
    HpRecover = 3,
    MpRecover = 4,
    HpDrain = 5,
    MpDrain = 6,
}

impl DamageType {
    pub fn is_hp_effect(self) -> bool {
        matches!(self, Self::HpDamage | Self::HpRecover | Self::HpDrain)
    }

    pub fn is_mp_effect(self) -> bool {
        matches!(self, Self::MpDamage | Self::MpRecover | Self::MpDrain)
    }

    pub fn is_damage(self) -> bool {
        matches!(self, Self::HpDamage | Self::MpDamage)
    }

    pub fn is_recover(self) -> bool {
        matches!(self, Self::HpRecover | Self::MpRecover)
    }

    pub fn is_drain(self) -> bool {
        matches!(self, Self::HpDrain | Self::MpDrain)
    }

    /// Sign applied to the formula result: recovery heals.
    pub fn sign(self) -> f64 {
        if self.is_recover() { -1.0 } else { 1.0 }
    }
}

/// Damage block of a skill or item.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Damage {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: DamageType,
    /// Element id; `-1` uses the subject's attack elements.
    pub element_id: i32,
    /// Expression over `a` (subject), `b` (target) and `v` (variables).
    pub formula: String,
    /// Symmetric jitter in percent.
    pub variance: i32,
    pub critical: bool,
}

impl Default for Damage {
    fn default() -> Self {
        Self {
            kind: DamageType::None,
            element_id: 0,
            formula: String::from("0"),
            variance: 20,
            critical: false,
        }
    }
}

impl Damage {
    pub fn new(kind: DamageType, formula: impl Into<String>) -> Self {
        Self {
            kind,
            formula: formula.into(),
            ..Self::default()
        }
    }

    pub fn with_element(mut self, element_id: i32) -> Self {
        self.element_id = element_id;
        self
    }

    pub fn with_variance(mut self, variance: i32) -> Self {
        self.variance = variance;
        self
    }

    pub fn with_critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }
}

/// Effect code. Discriminants follow the data file codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::FromRepr, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum EffectCode {
    /// `value1` = rate of MHP, `value2` = flat amount.
    RecoverHp = 11,
    RecoverMp = 12,
    GainTp = 13,
    /// `data_id` 0 adds the subject's attack states.
    AddState = 21,
    RemoveState = 22,
    /// `data_id` = param, `value1` = turns.
    AddBuff = 31,
    AddDebuff = 32,
    RemoveBuff = 33,
    RemoveDebuff = 34,
    /// `data_id` 0 = escape.
    Special = 41,
    /// Permanent param growth by `value1`.
    Grow = 42,
    LearnSkill = 43,
    CommonEvent = 44,
}

/// Special effect data id for escaping from battle.
pub const SPECIAL_EFFECT_ESCAPE: i32 = 0;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Effect {
    pub code: EffectCode,
    #[cfg_attr(feature = "serde", serde(default))]
    pub data_id: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub value1: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub value2: f64,
}

impl Effect {
    pub const fn new(code: EffectCode, data_id: i32, value1: f64, value2: f64) -> Self {
        Self {
            code,
            data_id,
            value1,
            value2,
        }
    }
}

/// Fields shared by skills and items.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Usage {
    pub scope: Scope,
    pub occasion: Occasion,
    pub speed: i32,
    /// Percent.
    pub success_rate: i32,
    pub repeats: i32,
    pub tp_gain: i32,
    pub hit_type: HitType,
    pub damage: Damage,
    pub effects: Vec<Effect>,
}

impl Default for Usage {
    fn default() -> Self {
        Self {
            scope: Scope::None,
            occasion: Occasion::Always,
            speed: 0,
            success_rate: 100,
            repeats: 1,
            tp_gain: 0,
            hit_type: HitType::Certain,
            damage: Damage::default(),
            effects: Vec::new(),
        }
    }
}

impl Usage {
    pub fn new(scope: Scope, hit_type: HitType) -> Self {
        Self {
            scope,
            hit_type,
            ..Self::default()
        }
    }

    pub fn with_damage(mut self, damage: Damage) -> Self {
        self.damage = damage;
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_repeats(mut self, repeats: i32) -> Self {
        self.repeats = repeats;
        self
    }

    pub fn with_speed(mut self, speed: i32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_success_rate(mut self, success_rate: i32) -> Self {
        self.success_rate = success_rate;
        self
    }

    pub fn with_occasion(mut self, occasion: Occasion) -> Self {
        self.occasion = occasion;
        self
    }

    pub fn with_tp_gain(mut self, tp_gain: i32) -> Self {
        self.tp_gain = tp_gain;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillData {
    pub id: SkillId,
    pub name: String,
    /// Skill type id; 0 means "no type" and is never sealed.
    #[cfg_attr(feature = "serde", serde(default))]
    pub stype_id: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mp_cost: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tp_cost: i32,
    /// Weapon types, either of which enables the skill; `[0, 0]` = no requirement.
    #[cfg_attr(feature = "serde", serde(default))]
    pub required_wtype_ids: [u32; 2],
    #[cfg_attr(feature = "serde", serde(default))]
    pub usage: Usage,
}

impl SkillData {
    pub fn new(id: u32, name: impl Into<String>, usage: Usage) -> Self {
        Self {
            id: SkillId(id),
            name: name.into(),
            stype_id: 0,
            mp_cost: 0,
            tp_cost: 0,
            required_wtype_ids: [0, 0],
            usage,
        }
    }

    pub fn with_costs(mut self, mp_cost: i32, tp_cost: i32) -> Self {
        self.mp_cost = mp_cost;
        self.tp_cost = tp_cost;
        self
    }

    pub fn with_stype(mut self, stype_id: u32) -> Self {
        self.stype_id = stype_id;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemData {
    pub id: ItemId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub itype_id: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub price: i32,
    #[cfg_attr(feature = "serde", serde(default = "consumable_default"))]
    pub consumable: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub usage: Usage,
}

#[cfg(feature = "serde")]
fn consumable_default() -> bool {
    true
}

impl ItemData {
    pub fn new(id: u32, name: impl Into<String>, usage: Usage) -> Self {
        Self {
            id: ItemId(id),
            name: name.into(),
            itype_id: 1,
            price: 0,
            consumable: true,
            usage,
        }
    }
}

/// Reference to a usable definition, as held by an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemRef {
    Skill(SkillId),
    Item(ItemId),
}

/// Resolved view over a skill or item definition.
#[derive(Clone, Copy, Debug)]
pub enum UsableItem<'a> {
    Skill(&'a SkillData),
    Item(&'a ItemData),
}

impl<'a> UsableItem<'a> {
    pub fn usage(&self) -> &'a Usage {
        match self {
            Self::Skill(skill) => &skill.usage,
            Self::Item(item) => &item.usage,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            Self::Skill(skill) => &skill.name,
            Self::Item(item) => &item.name,
        }
    }

    pub fn item_ref(&self) -> ItemRef {
        match self {
            Self::Skill(skill) => ItemRef::Skill(skill.id),
            Self::Item(item) => ItemRef::Item(item.id),
        }
    }

    pub fn is_skill(&self) -> bool {
        matches!(self, Self::Skill(_))
    }

    pub fn is_item(&self) -> bool {
        matches!(self, Self::Item(_))
    }
}
