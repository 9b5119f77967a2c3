//! States, buffs and the death invariant.
//!
//! `hp == 0` holds exactly when the death state is active. Every resource
//! change goes through [`Battler::refresh`], which re-establishes that.

use tracing::trace;

use super::Battler;
use crate::config::BattleConfig;
use crate::context::BattleEnv;
use crate::data::{AutoRemoval, Database, Restriction, StateData, StateId};

impl Battler {
    // ===== queries =====

    pub fn states(&self) -> &[StateId] {
        &self.states
    }

    pub fn state_data<'d>(&'d self, db: &'d Database) -> impl Iterator<Item = &'d StateData> + 'd {
        self.states.iter().filter_map(move |&id| db.state(id))
    }

    pub fn is_state_affected(&self, state_id: StateId) -> bool {
        self.states.contains(&state_id)
    }

    pub fn state_turns(&self, state_id: StateId) -> Option<i32> {
        self.state_turns.get(&state_id).copied()
    }

    pub fn is_state_expired(&self, state_id: StateId) -> bool {
        self.state_turns(state_id) == Some(0)
    }

    /// Strongest restriction among active states.
    pub fn restriction(&self, db: &Database) -> Restriction {
        self.state_data(db)
            .map(|state| state.restriction)
            .max()
            .unwrap_or_default()
    }

    pub fn is_restricted(&self, db: &Database) -> bool {
        self.is_appeared() && self.restriction(db) > Restriction::None
    }

    pub fn can_move(&self, db: &Database) -> bool {
        self.is_appeared() && self.restriction(db) < Restriction::CannotMove
    }

    pub fn can_input(&self, db: &Database) -> bool {
        self.is_appeared() && !self.is_restricted(db) && !self.is_auto_battle(db)
    }

    pub fn is_confused(&self, db: &Database) -> bool {
        self.is_appeared()
            && matches!(
                self.restriction(db),
                Restriction::AttackEnemy | Restriction::AttackAnyone | Restriction::AttackAlly
            )
    }

    /// 1..=3 while confused, 0 otherwise.
    pub fn confusion_level(&self, db: &Database) -> i32 {
        if self.is_confused(db) {
            self.restriction(db).level()
        } else {
            0
        }
    }

    /// Addable unless dead, undefined, resisted, already removed by the
    /// current action, or blocked by an active restriction.
    pub fn is_state_addable(&self, db: &Database, state_id: StateId) -> bool {
        let Some(state) = db.state(state_id) else {
            return false;
        };
        self.is_alive()
            && !self.is_state_resist(db, state_id)
            && !self.result.is_state_removed(state_id)
            && !(state.remove_by_restriction && self.is_restricted(db))
    }

    // ===== state mutation =====

    pub fn add_state(&mut self, env: &BattleEnv<'_>, state_id: StateId) {
        if !self.is_state_addable(env.db, state_id) {
            return;
        }
        if !self.is_state_affected(state_id) {
            self.add_new_state(env, state_id);
            self.refresh(env);
        }
        self.reset_state_counts(env, state_id);
        self.result.push_added_state(state_id);
        trace!(battler = %self.id, state = state_id.0, "state added");
    }

    fn add_new_state(&mut self, env: &BattleEnv<'_>, state_id: StateId) {
        if state_id == BattleConfig::DEATH_STATE_ID {
            self.die();
        }
        let was_restricted = self.is_restricted(env.db);
        self.states.push(state_id);
        self.sort_states(env.db);
        if !was_restricted && self.is_restricted(env.db) {
            self.on_restrict(env);
        }
    }

    /// Entering a restriction drops queued actions and the states it removes.
    fn on_restrict(&mut self, env: &BattleEnv<'_>) {
        self.clear_actions();
        let removable: Vec<StateId> = self
            .state_data(env.db)
            .filter(|state| state.remove_by_restriction)
            .map(|state| state.id)
            .collect();
        for state_id in removable {
            self.remove_state(env, state_id);
        }
    }

    fn sort_states(&mut self, db: &Database) {
        let priority = |id: StateId| db.state(id).map(|s| s.priority).unwrap_or(0);
        self.states
            .sort_by(|&a, &b| priority(b).cmp(&priority(a)).then(a.cmp(&b)));
    }

    /// Rolls a fresh duration in `min_turns..=max_turns`.
    fn reset_state_counts(&mut self, env: &BattleEnv<'_>, state_id: StateId) {
        let Some(state) = env.db.state(state_id) else {
            return;
        };
        let variance = 1 + (state.max_turns - state.min_turns).max(0);
        let turns = state.min_turns + env.random_int(variance);
        self.state_turns.insert(state_id, turns);
    }

    /// Removes an active state. Removing death revives at 1 HP.
    pub fn remove_state(&mut self, env: &BattleEnv<'_>, state_id: StateId) {
        if !self.is_state_affected(state_id) {
            return;
        }
        if state_id == BattleConfig::DEATH_STATE_ID {
            self.revive();
        }
        self.erase_state(state_id);
        self.refresh(env);
        self.result.push_removed_state(state_id);
        trace!(battler = %self.id, state = state_id.0, "state removed");
    }

    pub(crate) fn erase_state(&mut self, state_id: StateId) {
        self.states.retain(|&id| id != state_id);
        self.state_turns.remove(&state_id);
    }

    pub fn clear_states(&mut self) {
        self.states.clear();
        self.state_turns.clear();
    }

    /// Knock-out: HP to 0, every state and buff cleared.
    pub fn die(&mut self) {
        self.hp = 0;
        self.clear_states();
        self.clear_buffs();
    }

    pub fn revive(&mut self) {
        if self.hp == 0 {
            self.hp = 1;
        }
    }

    /// Re-clamps resources and re-establishes the death invariant.
    pub fn refresh(&mut self, env: &BattleEnv<'_>) {
        let db = env.db;
        let resisted = self.state_resist_set(db);
        self.states.retain(|id| !resisted.contains(&(id.0 as i32)));
        self.state_turns
            .retain(|id, _| !resisted.contains(&(id.0 as i32)));

        self.hp = self.hp.clamp(0, self.mhp(db));
        self.mp = self.mp.clamp(0, self.mmp(db));
        self.tp = self.tp.clamp(0, self.max_tp(db));

        if self.hp == 0 {
            self.add_state(env, BattleConfig::DEATH_STATE_ID);
        } else {
            self.remove_state(env, BattleConfig::DEATH_STATE_ID);
        }
    }

    pub fn update_state_turns(&mut self) {
        for turns in self.state_turns.values_mut() {
            if *turns > 0 {
                *turns -= 1;
            }
        }
    }

    /// Removes expired states whose auto-removal timing is `timing`.
    pub fn remove_states_auto(&mut self, env: &BattleEnv<'_>, timing: AutoRemoval) {
        let expired: Vec<StateId> = self
            .state_data(env.db)
            .filter(|state| state.auto_removal == timing)
            .map(|state| state.id)
            .filter(|&id| self.is_state_expired(id))
            .collect();
        for state_id in expired {
            self.remove_state(env, state_id);
        }
    }

    /// Each damage-removable state rolls `random_int(100) < chance_by_damage`.
    pub fn remove_states_by_damage(&mut self, env: &BattleEnv<'_>) {
        let candidates: Vec<(StateId, i32)> = self
            .state_data(env.db)
            .filter(|state| state.remove_by_damage)
            .map(|state| (state.id, state.chance_by_damage))
            .collect();
        for (state_id, chance) in candidates {
            if env.random_int(100) < chance {
                self.remove_state(env, state_id);
            }
        }
    }

    pub fn remove_battle_states(&mut self, env: &BattleEnv<'_>) {
        let battle_only: Vec<StateId> = self
            .state_data(env.db)
            .filter(|state| state.remove_at_battle_end)
            .map(|state| state.id)
            .collect();
        for state_id in battle_only {
            self.remove_state(env, state_id);
        }
    }

    // ===== buffs =====

    pub fn buff(&self, param_id: usize) -> i32 {
        self.buffs.get(param_id).copied().unwrap_or(0)
    }

    pub fn buff_turns(&self, param_id: usize) -> i32 {
        self.buff_turns.get(param_id).copied().unwrap_or(0)
    }

    pub fn is_buff_affected(&self, param_id: usize) -> bool {
        self.buff(param_id) > 0
    }

    pub fn is_debuff_affected(&self, param_id: usize) -> bool {
        self.buff(param_id) < 0
    }

    pub fn is_buff_or_debuff_affected(&self, param_id: usize) -> bool {
        self.buff(param_id) != 0
    }

    pub fn is_max_buff_affected(&self, param_id: usize) -> bool {
        self.buff(param_id) == BattleConfig::MAX_BUFF_LEVEL
    }

    pub fn is_max_debuff_affected(&self, param_id: usize) -> bool {
        self.buff(param_id) == -BattleConfig::MAX_BUFF_LEVEL
    }

    pub fn is_buff_expired(&self, param_id: usize) -> bool {
        self.buff_turns(param_id) == 0
    }

    /// Raises a param one level for at least `turns` turns.
    pub fn add_buff(&mut self, env: &BattleEnv<'_>, param_id: usize, turns: i32) {
        if !self.is_alive() || param_id >= self.buffs.len() {
            return;
        }
        if !self.is_max_buff_affected(param_id) {
            self.buffs[param_id] += 1;
        }
        if self.is_buff_affected(param_id) {
            self.overwrite_buff_turns(param_id, turns);
        }
        self.result.push_added_buff(param_id);
        self.refresh(env);
    }

    pub fn add_debuff(&mut self, env: &BattleEnv<'_>, param_id: usize, turns: i32) {
        if !self.is_alive() || param_id >= self.buffs.len() {
            return;
        }
        if !self.is_max_debuff_affected(param_id) {
            self.buffs[param_id] -= 1;
        }
        if self.is_debuff_affected(param_id) {
            self.overwrite_buff_turns(param_id, turns);
        }
        self.result.push_added_debuff(param_id);
        self.refresh(env);
    }

    pub fn remove_buff(&mut self, env: &BattleEnv<'_>, param_id: usize) {
        if self.is_alive() && self.is_buff_or_debuff_affected(param_id) {
            self.erase_buff(param_id);
            self.result.push_removed_buff(param_id);
            self.refresh(env);
        }
    }

    /// Never shortens a running buff.
    fn overwrite_buff_turns(&mut self, param_id: usize, turns: i32) {
        if self.buff_turns[param_id] < turns {
            self.buff_turns[param_id] = turns;
        }
    }

    fn erase_buff(&mut self, param_id: usize) {
        self.buffs[param_id] = 0;
        self.buff_turns[param_id] = 0;
    }

    pub fn clear_buffs(&mut self) {
        self.buffs = [0; super::PARAMS];
        self.buff_turns = [0; super::PARAMS];
    }

    pub fn remove_all_buffs(&mut self, env: &BattleEnv<'_>) {
        for param_id in 0..self.buffs.len() {
            self.remove_buff(env, param_id);
        }
    }

    pub fn update_buff_turns(&mut self) {
        for turns in &mut self.buff_turns {
            if *turns > 0 {
                *turns -= 1;
            }
        }
    }

    pub fn remove_buffs_auto(&mut self, env: &BattleEnv<'_>) {
        for param_id in 0..self.buffs.len() {
            if self.is_buff_or_debuff_affected(param_id) && self.is_buff_expired(param_id) {
                self.remove_buff(env, param_id);
            }
        }
    }
}
