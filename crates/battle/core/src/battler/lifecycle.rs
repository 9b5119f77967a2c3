//! Battle, turn and action hooks every battler goes through.
//!
//! The engine calls these in a fixed order: `on_battle_start` once, then per
//! turn `on_all_actions_end` after the battler's own actions and
//! `on_turn_end` for every member, and `on_battle_end` once at the close.

use super::{ActionState, Battler};
use crate::context::BattleEnv;
use crate::data::AutoRemoval;

impl Battler {
    /// Marks the battler undecided and rolls starting TP in
    /// `0..initial_tp_range`, unless TP is preserved between battles. A zero
    /// range still consumes one draw.
    pub fn on_battle_start(&mut self, env: &BattleEnv<'_>) {
        self.set_action_state(ActionState::Undecided);
        if !self.is_preserve_tp(env.db) {
            let tp = env.random_int(env.config().initial_tp_range);
            self.init_tp(env.db, tp);
        }
    }

    /// After the battler's last action of a turn.
    pub fn on_all_actions_end(&mut self, env: &BattleEnv<'_>) {
        self.clear_result();
        self.remove_states_auto(env, AutoRemoval::ActionEnd);
        self.remove_buffs_auto(env);
    }

    /// Regeneration and turn counters. A forced turn does not count down.
    pub fn on_turn_end(&mut self, env: &BattleEnv<'_>, forced: bool) {
        self.clear_result();
        self.regenerate_all(env);
        if !forced {
            self.update_state_turns();
            self.update_buff_turns();
        }
        self.remove_states_auto(env, AutoRemoval::TurnEnd);
    }

    /// Drops battle-only states and every buff, empties the action queue and
    /// brings a hidden battler back.
    pub fn on_battle_end(&mut self, env: &BattleEnv<'_>) {
        self.clear_result();
        self.remove_battle_states(env);
        self.remove_all_buffs(env);
        self.clear_actions();
        if !self.is_preserve_tp(env.db) {
            self.init_tp(env.db, 0);
        }
        self.appear();
        self.set_action_state(ActionState::Idle);
    }

    /// Reaction to HP damage `value`: damage-removable states roll off and
    /// TP charges by `value / mhp`.
    pub fn on_damage(&mut self, env: &BattleEnv<'_>, value: i32) {
        self.remove_states_by_damage(env);
        let mhp = self.mhp(env.db);
        if mhp > 0 {
            self.charge_tp_by_damage(env, f64::from(value) / f64::from(mhp));
        }
    }

    /// Leaves the battle. Outside a battle only the states are cleared.
    pub fn escape(&mut self, in_battle: bool) {
        if in_battle {
            self.hide();
        }
        self.clear_actions();
        self.clear_states();
    }
}
