//! The battler attribute model.
//!
//! One [`Battler`] struct covers player characters and enemies. Stat math,
//! states, buffs and resources are shared; the few variant behaviors
//! (naming, parameter sources, experience, enemy AI) dispatch on
//! [`BattlerKind`].
//!
//! Derived values are never cached. Each query walks the current trait
//! sources, so equipment, state or level changes are visible immediately.
mod actions;
mod actor;
mod enemy;
mod lifecycle;
mod params;
mod resources;
mod states;
mod traits;
mod usability;

use arrayvec::ArrayVec;
use std::collections::BTreeMap;

use crate::action::{Action, ActionResult};
use crate::config::BattleConfig;
use crate::data::{ActorId, DataError, Database, EnemyId, StateId};
use crate::unit::Side;

pub use actor::{ActorProfile, LevelUp};
pub use enemy::{EnemyProfile, PatternContext};
pub use params::{ExParam, Param, SpParam};

const PARAMS: usize = BattleConfig::PARAM_COUNT;

/// Stable battler identity, valid across rebuilds of the battle objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattlerId {
    Actor(ActorId),
    /// Index into the troop's enemy list.
    Enemy(usize),
}

impl BattlerId {
    pub fn side(self) -> Side {
        match self {
            Self::Actor(_) => Side::Party,
            Self::Enemy(_) => Side::Troop,
        }
    }

    pub fn is_actor(self) -> bool {
        matches!(self, Self::Actor(_))
    }

    pub fn is_enemy(self) -> bool {
        matches!(self, Self::Enemy(_))
    }
}

impl core::fmt::Display for BattlerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Actor(id) => write!(f, "actor#{}", id.0),
            Self::Enemy(index) => write!(f, "enemy#{index}"),
        }
    }
}

/// Command-input progress of a battler for the current turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionState {
    #[default]
    Idle,
    Undecided,
    Inputting,
    Waiting,
    Acting,
    Done,
}

/// Variant-specific data.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattlerKind {
    Actor(ActorProfile),
    Enemy(EnemyProfile),
}

/// A combatant.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Battler {
    id: BattlerId,
    pub kind: BattlerKind,
    hp: i32,
    mp: i32,
    tp: i32,
    hidden: bool,
    /// Permanent growth per base param.
    param_plus: [i32; PARAMS],
    /// Sorted by priority descending, then id ascending.
    states: Vec<StateId>,
    state_turns: BTreeMap<StateId, i32>,
    buffs: [i32; PARAMS],
    buff_turns: [i32; PARAMS],
    /// At most `MAX_ACTIONS_PER_TURN` slots; extra action-plus rolls are
    /// dropped when the queue is built.
    actions: ArrayVec<Action, { BattleConfig::MAX_ACTIONS_PER_TURN }>,
    /// Turn-order key from [`Battler::make_speed`]; higher acts first.
    speed: i32,
    result: ActionResult,
    action_state: ActionState,
    last_target_index: i32,
}

impl Battler {
    fn blank(id: BattlerId, kind: BattlerKind) -> Self {
        Self {
            id,
            kind,
            hp: 0,
            mp: 0,
            tp: 0,
            hidden: false,
            param_plus: [0; PARAMS],
            states: Vec::new(),
            state_turns: BTreeMap::new(),
            buffs: [0; PARAMS],
            buff_turns: [0; PARAMS],
            actions: ArrayVec::new(),
            speed: 0,
            result: ActionResult::default(),
            action_state: ActionState::Idle,
            last_target_index: 0,
        }
    }

    /// Builds a player character at its initial level with full HP and MP.
    pub fn new_actor(db: &Database, actor_id: ActorId) -> Result<Self, DataError> {
        let data = db.actors.require(actor_id)?;
        db.classes.require(data.class_id)?;
        let profile = ActorProfile::from_data(db, data);
        let mut battler = Self::blank(BattlerId::Actor(actor_id), BattlerKind::Actor(profile));
        battler.init_equips(db, &data.equips);
        battler.recover_all(db);
        Ok(battler)
    }

    /// Builds the enemy at `index` of a troop.
    pub fn new_enemy(db: &Database, enemy_id: EnemyId, index: usize) -> Result<Self, DataError> {
        db.enemies.require(enemy_id)?;
        let profile = EnemyProfile::new(enemy_id);
        let mut battler = Self::blank(BattlerId::Enemy(index), BattlerKind::Enemy(profile));
        battler.recover_all(db);
        Ok(battler)
    }

    pub fn id(&self) -> BattlerId {
        self.id
    }

    pub fn is_actor(&self) -> bool {
        self.id.is_actor()
    }

    pub fn is_enemy(&self) -> bool {
        self.id.is_enemy()
    }

    pub fn actor_profile(&self) -> Option<&ActorProfile> {
        match &self.kind {
            BattlerKind::Actor(profile) => Some(profile),
            BattlerKind::Enemy(_) => None,
        }
    }

    pub fn actor_profile_mut(&mut self) -> Option<&mut ActorProfile> {
        match &mut self.kind {
            BattlerKind::Actor(profile) => Some(profile),
            BattlerKind::Enemy(_) => None,
        }
    }

    pub fn enemy_profile(&self) -> Option<&EnemyProfile> {
        match &self.kind {
            BattlerKind::Enemy(profile) => Some(profile),
            BattlerKind::Actor(_) => None,
        }
    }

    pub fn enemy_profile_mut(&mut self) -> Option<&mut EnemyProfile> {
        match &mut self.kind {
            BattlerKind::Enemy(profile) => Some(profile),
            BattlerKind::Actor(_) => None,
        }
    }

    /// Display name. Enemies sharing a name get their letter appended.
    pub fn name(&self, db: &Database) -> String {
        match &self.kind {
            BattlerKind::Actor(profile) => profile.name.clone(),
            BattlerKind::Enemy(profile) => {
                let mut name = db
                    .enemy(profile.enemy_id)
                    .map(|enemy| enemy.name.clone())
                    .unwrap_or_default();
                if profile.plural {
                    name.push_str(&profile.letter);
                }
                name
            }
        }
    }

    /// Name without the disambiguation letter.
    pub fn original_name(&self, db: &Database) -> String {
        match &self.kind {
            BattlerKind::Actor(profile) => profile.name.clone(),
            BattlerKind::Enemy(profile) => db
                .enemy(profile.enemy_id)
                .map(|enemy| enemy.name.clone())
                .unwrap_or_default(),
        }
    }

    pub fn level(&self) -> Option<i32> {
        self.actor_profile().map(|profile| profile.level)
    }

    // ===== visibility and liveness =====

    pub fn is_appeared(&self) -> bool {
        !self.hidden
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn hide(&mut self) {
        self.hidden = true;
    }

    pub fn appear(&mut self) {
        self.hidden = false;
    }

    pub fn is_death_state_affected(&self) -> bool {
        self.is_state_affected(BattleConfig::DEATH_STATE_ID)
    }

    pub fn is_alive(&self) -> bool {
        self.is_appeared() && !self.is_death_state_affected()
    }

    pub fn is_dead(&self) -> bool {
        self.is_appeared() && self.is_death_state_affected()
    }

    /// Alive with less than a quarter of max HP.
    pub fn is_dying(&self, db: &Database) -> bool {
        self.is_alive() && f64::from(self.hp) < f64::from(self.mhp(db)) / 4.0
    }

    // ===== action bookkeeping =====

    pub fn result(&self) -> &ActionResult {
        &self.result
    }

    pub fn result_mut(&mut self) -> &mut ActionResult {
        &mut self.result
    }

    pub fn clear_result(&mut self) {
        self.result.clear();
    }

    pub fn action_state(&self) -> ActionState {
        self.action_state
    }

    pub fn set_action_state(&mut self, state: ActionState) {
        self.action_state = state;
    }

    pub fn last_target_index(&self) -> i32 {
        self.last_target_index
    }

    /// Remembers the index of the last battler targeted, `0` when none.
    pub fn set_last_target(&mut self, index: Option<usize>) {
        self.last_target_index = index.and_then(|i| i32::try_from(i).ok()).unwrap_or(0);
    }

    pub fn speed(&self) -> i32 {
        self.speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ACTOR_HERO, ENEMY_SLIME, fixture_db};

    #[test]
    fn new_battlers_start_at_full_resources() {
        let db = fixture_db();
        let hero = Battler::new_actor(&db, ACTOR_HERO).unwrap();
        assert_eq!(hero.hp(), hero.mhp(&db));
        assert_eq!(hero.mp(), hero.mmp(&db));
        assert!(hero.is_alive());

        let slime = Battler::new_enemy(&db, ENEMY_SLIME, 0).unwrap();
        assert_eq!(slime.id(), BattlerId::Enemy(0));
        assert_eq!(slime.name(&db), "Slime");
    }

    #[test]
    fn unknown_ids_are_data_errors() {
        let db = fixture_db();
        assert!(matches!(
            Battler::new_actor(&db, ActorId(99)),
            Err(DataError::NotFound { table: "actor", id: 99 })
        ));
        assert!(Battler::new_enemy(&db, EnemyId(99), 0).is_err());
    }

    #[test]
    fn hidden_battlers_are_neither_alive_nor_dead() {
        let db = fixture_db();
        let mut slime = Battler::new_enemy(&db, ENEMY_SLIME, 0).unwrap();
        slime.hide();
        assert!(!slime.is_alive());
        assert!(!slime.is_dead());
        slime.appear();
        assert!(slime.is_alive());
    }
}
