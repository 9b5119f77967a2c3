//! The per-turn action queue and command-input cursor.
//!
//! The queue is a fixed-capacity `ArrayVec` of
//! [`BattleConfig::MAX_ACTIONS_PER_TURN`] slots. Slot 0 is always the next
//! action to run; the input cursor only exists for actors.

use tracing::warn;

use super::Battler;
use crate::action::Action;
use crate::config::BattleConfig;
use crate::context::BattleEnv;

impl Battler {
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn num_actions(&self) -> usize {
        self.actions.len()
    }

    pub fn action(&self, index: usize) -> Option<&Action> {
        self.actions.get(index)
    }

    pub fn action_mut(&mut self, index: usize) -> Option<&mut Action> {
        self.actions.get_mut(index)
    }

    /// Next action to execute.
    pub fn current_action(&self) -> Option<&Action> {
        self.actions.first()
    }

    pub fn current_action_mut(&mut self) -> Option<&mut Action> {
        self.actions.first_mut()
    }

    pub fn set_action(&mut self, index: usize, action: Action) {
        if let Some(slot) = self.actions.get_mut(index) {
            *slot = action;
        }
    }

    /// Queues an action; returns `false` when the queue is full.
    pub fn push_action(&mut self, action: Action) -> bool {
        self.actions.try_push(action).is_ok()
    }

    pub fn remove_current_action(&mut self) -> Option<Action> {
        if self.actions.is_empty() {
            None
        } else {
            Some(self.actions.remove(0))
        }
    }

    pub fn clear_actions(&mut self) {
        self.actions.clear();
        if let Some(profile) = self.actor_profile_mut() {
            profile.action_input_index = 0;
        }
    }

    /// Replaces the queue with a single forced action.
    pub fn set_forced_action(&mut self, action: Action) {
        self.clear_actions();
        self.push_action(action);
    }

    /// One action plus one per successful "action plus" roll.
    ///
    /// Every action-plus trait consumes one draw, even past the cap. The
    /// result never exceeds [`BattleConfig::MAX_ACTIONS_PER_TURN`]; rolls
    /// beyond it are dropped with a warning.
    pub fn make_action_times(&self, env: &BattleEnv<'_>) -> usize {
        let extra = self
            .action_plus_set(env.db)
            .into_iter()
            .filter(|&chance| env.random() < chance)
            .count();
        let times = 1 + extra;
        if times > BattleConfig::MAX_ACTIONS_PER_TURN {
            warn!(
                battler = %self.id,
                rolled = times,
                cap = BattleConfig::MAX_ACTIONS_PER_TURN,
                "action-plus rolls exceed the per-turn cap"
            );
        }
        times.min(BattleConfig::MAX_ACTIONS_PER_TURN)
    }

    /// Clears the queue and, when able to move, allocates empty action slots.
    pub fn make_actions_base(&mut self, env: &BattleEnv<'_>) {
        self.clear_actions();
        if self.can_move(env.db) {
            let times = self.make_action_times(env);
            for _ in 0..times {
                self.push_action(Action::new(self.id, false));
            }
        }
    }

    /// Turn-order speed: the slowest queued action.
    ///
    /// An empty queue yields `i32::MAX`, so battlers with nothing to do sort
    /// ahead of everyone and leave the turn order immediately.
    pub fn make_speed(&mut self, env: &BattleEnv<'_>) {
        self.speed = self
            .actions
            .iter()
            .map(|action| action.speed(env, self))
            .min()
            .unwrap_or(i32::MAX);
    }

    // ===== command input =====

    pub fn action_input_index(&self) -> usize {
        self.actor_profile()
            .map_or(0, |profile| profile.action_input_index)
    }

    pub fn inputting_action(&self) -> Option<&Action> {
        self.action(self.action_input_index())
    }

    pub fn inputting_action_mut(&mut self) -> Option<&mut Action> {
        let index = self.action_input_index();
        self.action_mut(index)
    }

    /// Moves the cursor to the next slot; `false` at the last one.
    pub fn select_next_command(&mut self) -> bool {
        let last = self.num_actions().saturating_sub(1);
        match self.actor_profile_mut() {
            Some(profile) if profile.action_input_index < last => {
                profile.action_input_index += 1;
                true
            }
            _ => false,
        }
    }

    /// Moves the cursor to the previous slot; `false` at the first one.
    pub fn select_previous_command(&mut self) -> bool {
        match self.actor_profile_mut() {
            Some(profile) if profile.action_input_index > 0 => {
                profile.action_input_index -= 1;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{StateData, StateId, Trait, TraitCode};
    use crate::rng::ScriptedRng;
    use crate::testing::{ACTOR_HERO, fixture_db};

    #[test]
    fn action_plus_rolls_extra_slots() {
        let mut db = fixture_db();
        db.states.upsert(
            StateData::new(40, "Haste")
                .with_trait(Trait::new(TraitCode::ActionPlus, 0, 0.5))
                .with_trait(Trait::new(TraitCode::ActionPlus, 0, 0.5)),
        );
        let rng = ScriptedRng::new([0.0, 0.0, 0.2, 0.9], 0.0);
        let env = BattleEnv::new(&db, &rng);
        let mut hero = Battler::new_actor(&db, ACTOR_HERO).unwrap();
        hero.add_state(&env, StateId(40));
        hero.make_actions_base(&env);
        assert_eq!(hero.num_actions(), 3);
        hero.make_actions_base(&env);
        assert_eq!(hero.num_actions(), 2);
    }

    #[test]
    fn input_cursor_stays_in_range() {
        let db = fixture_db();
        let rng = ScriptedRng::new([], 0.0);
        let env = BattleEnv::new(&db, &rng);
        let mut hero = Battler::new_actor(&db, ACTOR_HERO).unwrap();
        hero.make_actions_base(&env);
        hero.push_action(Action::new(hero.id(), false));

        assert!(!hero.select_previous_command());
        assert!(hero.select_next_command());
        assert!(!hero.select_next_command());
        assert_eq!(hero.action_input_index(), 1);
        hero.clear_actions();
        assert_eq!(hero.action_input_index(), 0);
    }

    #[test]
    fn empty_queue_moves_first() {
        let db = fixture_db();
        let rng = ScriptedRng::new([], 0.0);
        let env = BattleEnv::new(&db, &rng);
        let mut hero = Battler::new_actor(&db, ACTOR_HERO).unwrap();
        hero.make_speed(&env);
        assert_eq!(hero.speed(), i32::MAX);
    }

    #[test]
    fn action_plus_rolls_stop_at_the_queue_capacity() {
        let mut db = fixture_db();
        let mut state = StateData::new(41, "Frenzy");
        for _ in 0..10 {
            state = state.with_trait(Trait::new(TraitCode::ActionPlus, 0, 1.0));
        }
        db.states.upsert(state);
        let rng = ScriptedRng::new([], 0.0);
        let env = BattleEnv::new(&db, &rng);
        let mut hero = Battler::new_actor(&db, ACTOR_HERO).unwrap();
        hero.add_state(&env, StateId(41));
        let before = rng.drawn();

        assert_eq!(hero.make_action_times(&env), BattleConfig::MAX_ACTIONS_PER_TURN);
        assert_eq!(rng.drawn() - before, 10);
        hero.make_actions_base(&env);
        assert_eq!(hero.num_actions(), BattleConfig::MAX_ACTIONS_PER_TURN);
    }
}
