//! Explicit inputs of a running battle.
//!
//! [`BattleEnv`] bundles the read-only pieces (database, RNG stream) and is
//! cheap to copy. [`BattleContext`] adds the mutable party and troop, the
//! game variables formulas may read, and the optional hooks.

use std::collections::{BTreeMap, BTreeSet};

use crate::battler::{Battler, BattlerId};
use crate::config::BattleConfig;
use crate::data::Database;
use crate::hooks::{BattleHooks, LogEvent};
use crate::rng::BattleRng;
use crate::unit::{Party, Side, Troop, Unit};

/// Read-only environment shared by every battle computation.
#[derive(Clone, Copy)]
pub struct BattleEnv<'a> {
    pub db: &'a Database,
    pub rng: &'a dyn BattleRng,
}

impl<'a> BattleEnv<'a> {
    pub fn new(db: &'a Database, rng: &'a dyn BattleRng) -> Self {
        Self { db, rng }
    }

    pub fn config(&self) -> &'a BattleConfig {
        &self.db.config
    }

    pub fn random(&self) -> f64 {
        self.rng.random()
    }

    pub fn random_int(&self, max: i32) -> i32 {
        self.rng.random_int(max)
    }
}

impl core::fmt::Debug for BattleEnv<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BattleEnv").finish_non_exhaustive()
    }
}

/// Numeric game variables, read by damage formulas as `v[n]`.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameVariables {
    values: BTreeMap<i32, f64>,
}

impl GameVariables {
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    pub fn value(&self, id: i32) -> f64 {
        self.values.get(&id).copied().unwrap_or(0.0)
    }

    pub fn set_value(&mut self, id: i32, value: f64) {
        self.values.insert(id, value);
    }
}

/// Boolean game switches, read by enemy action conditions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameSwitches {
    on: BTreeSet<u32>,
}

impl GameSwitches {
    pub const fn new() -> Self {
        Self { on: BTreeSet::new() }
    }

    pub fn value(&self, id: u32) -> bool {
        self.on.contains(&id)
    }

    pub fn set_value(&mut self, id: u32, value: bool) {
        if value {
            self.on.insert(id);
        } else {
            self.on.remove(&id);
        }
    }
}

static NO_VARIABLES: GameVariables = GameVariables::new();
static NO_SWITCHES: GameSwitches = GameSwitches::new();

/// Everything a battle tick reads and mutates.
pub struct BattleContext<'a> {
    pub env: BattleEnv<'a>,
    pub party: &'a mut Party,
    pub troop: &'a mut Troop,
    pub variables: &'a GameVariables,
    pub switches: &'a GameSwitches,
    pub hooks: BattleHooks<'a>,
    /// Common events queued by actions, in order. Drained by the caller.
    pub reserved_common_events: Vec<u32>,
}

impl<'a> BattleContext<'a> {
    pub fn new(env: BattleEnv<'a>, party: &'a mut Party, troop: &'a mut Troop) -> Self {
        Self {
            env,
            party,
            troop,
            variables: &NO_VARIABLES,
            switches: &NO_SWITCHES,
            hooks: BattleHooks::default(),
            reserved_common_events: Vec::new(),
        }
    }

    pub fn with_variables(mut self, variables: &'a GameVariables) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_switches(mut self, switches: &'a GameSwitches) -> Self {
        self.switches = switches;
        self
    }

    pub fn with_hooks(mut self, hooks: BattleHooks<'a>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_log(mut self, log: &'a mut dyn crate::hooks::BattleLog) -> Self {
        self.hooks.log = Some(log);
        self
    }

    pub fn with_status(mut self, status: &'a mut dyn crate::hooks::StatusRefresh) -> Self {
        self.hooks.status = Some(status);
        self
    }

    pub fn with_system(mut self, system: &'a mut dyn crate::hooks::BattleSystem) -> Self {
        self.hooks.system = Some(system);
        self
    }

    pub fn db(&self) -> &'a Database {
        self.env.db
    }

    pub fn in_battle(&self) -> bool {
        self.party.in_battle()
    }

    pub fn try_battler(&self, id: BattlerId) -> Option<&Battler> {
        match id {
            BattlerId::Actor(actor_id) => self.party.actor(actor_id),
            BattlerId::Enemy(index) => self.troop.enemy(index),
        }
    }

    pub fn try_battler_mut(&mut self, id: BattlerId) -> Option<&mut Battler> {
        match id {
            BattlerId::Actor(actor_id) => self.party.actor_mut(actor_id),
            BattlerId::Enemy(index) => self.troop.enemy_mut(index),
        }
    }

    /// Resolves a battler that must exist.
    ///
    /// # Panics
    ///
    /// When `id` does not resolve. That only happens when the caller keeps a
    /// stale id around, which is an orchestration bug.
    pub fn battler(&self, id: BattlerId) -> &Battler {
        self.try_battler(id)
            .unwrap_or_else(|| panic!("battler {id} is not part of this battle"))
    }

    /// Mutable counterpart of [`BattleContext::battler`].
    ///
    /// # Panics
    ///
    /// When `id` does not resolve.
    pub fn battler_mut(&mut self, id: BattlerId) -> &mut Battler {
        self.try_battler_mut(id)
            .unwrap_or_else(|| panic!("battler {id} is not part of this battle"))
    }

    pub fn unit(&self, side: Side) -> &dyn Unit {
        match side {
            Side::Party => &*self.party,
            Side::Troop => &*self.troop,
        }
    }

    pub fn friends_unit(&self, id: BattlerId) -> &dyn Unit {
        self.unit(id.side())
    }

    pub fn opponents_unit(&self, id: BattlerId) -> &dyn Unit {
        self.unit(id.side().opponent())
    }

    /// Display name of a battler.
    pub fn name_of(&self, id: BattlerId) -> String {
        self.battler(id).name(self.env.db)
    }

    /// Records a narration event, building it only when a log is attached.
    pub fn narrate(&mut self, event: impl FnOnce(&Self) -> LogEvent) {
        if !self.hooks.has_log() {
            return;
        }
        let event = event(self);
        self.hooks.record(event);
    }

    pub fn refresh_status(&mut self) {
        self.hooks.refresh_status();
    }
}

impl core::fmt::Debug for BattleContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BattleContext")
            .field("party", &self.party)
            .field("troop", &self.troop)
            .field("hooks", &self.hooks)
            .field("reserved_common_events", &self.reserved_common_events)
            .finish_non_exhaustive()
    }
}
