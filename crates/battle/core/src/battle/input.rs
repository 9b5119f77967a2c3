//! Command input and the start of each turn.

use std::cmp::Reverse;

use tracing::debug;

use super::{BattleEngine, BattlePhase};
use crate::action::{Action, make_actions, make_auto_battle_actions};
use crate::battler::{ActionState, BattlerId};
use crate::context::BattleContext;
use crate::hooks::LogEvent;
use crate::unit::Unit;

/// Command input methods for BattleEngine.
impl BattleEngine {
    /// Decides every battler's actions and opens command input. Skipped
    /// straight into the turn when the party is surprised or nobody can take
    /// commands.
    pub(super) fn start_input(&mut self, ctx: &mut BattleContext<'_>) {
        self.phase = BattlePhase::Input;
        for id in ctx.party.member_ids() {
            make_actions(ctx, id);
        }
        for id in ctx.troop.member_ids() {
            make_actions(ctx, id);
        }
        self.clear_actor(ctx);
        if self.surprise || !ctx.party.can_input(ctx.db()) {
            self.start_turn(ctx);
        }
    }

    /// Party member currently receiving commands.
    pub fn actor(&self, ctx: &BattleContext<'_>) -> Option<BattlerId> {
        let index = self.actor_index?;
        ctx.party.members().get(index).map(|b| b.id())
    }

    /// Action slot the current command goes into.
    pub fn inputting_action_mut<'c>(
        &self,
        ctx: &'c mut BattleContext<'_>,
    ) -> Option<&'c mut Action> {
        let id = self.actor(ctx)?;
        ctx.try_battler_mut(id)?.inputting_action_mut()
    }

    fn change_actor(
        &mut self,
        ctx: &mut BattleContext<'_>,
        index: Option<usize>,
        last_state: ActionState,
    ) {
        let last = self.actor(ctx);
        self.actor_index = index;
        let next = self.actor(ctx);
        if let Some(id) = last {
            ctx.battler_mut(id).set_action_state(last_state);
        }
        if let Some(id) = next {
            ctx.battler_mut(id).set_action_state(ActionState::Inputting);
        }
    }

    fn clear_actor(&mut self, ctx: &mut BattleContext<'_>) {
        self.change_actor(ctx, None, ActionState::Waiting);
    }

    fn actor_can_input(&self, ctx: &BattleContext<'_>) -> bool {
        self.actor(ctx)
            .is_some_and(|id| ctx.battler(id).can_input(ctx.db()))
    }

    /// Confirms the current command. Moves to the next slot, then the next
    /// member that can take commands; past the last member the turn starts.
    pub fn select_next_command(&mut self, ctx: &mut BattleContext<'_>) {
        if self.phase != BattlePhase::Input {
            return;
        }
        loop {
            let advanced = self
                .actor(ctx)
                .is_some_and(|id| ctx.battler_mut(id).select_next_command());
            if !advanced {
                let next = self.actor_index.map_or(0, |index| index + 1);
                self.change_actor(ctx, Some(next), ActionState::Waiting);
                if next >= ctx.party.members().len() {
                    self.start_turn(ctx);
                    return;
                }
            }
            if self.actor_can_input(ctx) {
                return;
            }
        }
    }

    /// Steps back one command, possibly into the previous member. Stepping
    /// back from the first member leaves nobody selected.
    pub fn select_previous_command(&mut self, ctx: &mut BattleContext<'_>) {
        if self.phase != BattlePhase::Input {
            return;
        }
        loop {
            let retreated = self
                .actor(ctx)
                .is_some_and(|id| ctx.battler_mut(id).select_previous_command());
            if !retreated {
                match self.actor_index {
                    Some(index) if index > 0 => {
                        self.change_actor(ctx, Some(index - 1), ActionState::Undecided);
                    }
                    _ => {
                        self.change_actor(ctx, None, ActionState::Undecided);
                        return;
                    }
                }
            }
            if self.actor_can_input(ctx) {
                return;
            }
        }
    }

    /// Lets the auto-battle AI decide for every member still holding an
    /// empty command slot, then starts the turn.
    pub fn complete_input_with_auto_battle(&mut self, ctx: &mut BattleContext<'_>) {
        if self.phase != BattlePhase::Input {
            return;
        }
        let db = ctx.db();
        for id in ctx.party.member_ids() {
            let battler = ctx.battler(id);
            let undecided = battler.actions().iter().any(|a| a.item().is_none());
            if undecided && battler.can_input(db) {
                make_auto_battle_actions(ctx, id);
            }
        }
        self.start_turn(ctx);
    }

    /// Opens a turn: counts it and orders every battler by speed.
    pub(super) fn start_turn(&mut self, ctx: &mut BattleContext<'_>) {
        self.phase = BattlePhase::Turn;
        self.clear_actor(ctx);
        ctx.troop.increase_turn();
        self.make_action_orders(ctx);
        let turn = ctx.troop.turn_count();
        debug!(turn, order = ?self.action_battlers, "turn started");
        ctx.narrate(|_| LogEvent::StartTurn { turn });
    }

    /// Party first unless surprised, troop next unless preemptive, then a
    /// stable sort by descending speed.
    fn make_action_orders(&mut self, ctx: &mut BattleContext<'_>) {
        let mut battlers = Vec::new();
        if !self.surprise {
            battlers.extend(ctx.party.member_ids());
        }
        if !self.preemptive {
            battlers.extend(ctx.troop.member_ids());
        }
        let env = ctx.env;
        for &id in &battlers {
            ctx.battler_mut(id).make_speed(&env);
        }
        battlers.sort_by_key(|&id| Reverse(ctx.battler(id).speed()));
        self.action_battlers = battlers.into();
    }
}

#[cfg(test)]
mod tests {
    use crate::battle::{BattleEngine, BattlePhase, Encounter};
    use crate::battler::{ActionState, BattlerId};
    use crate::context::{BattleContext, BattleEnv};
    use crate::data::ActorData;
    use crate::rng::FixedRng;
    use crate::testing::{ACTOR_HERO, TROOP_SLIMES, fixture_db, fixture_party};
    use crate::unit::Troop;

    const HERO: BattlerId = BattlerId::Actor(ACTOR_HERO);

    #[test]
    fn input_walks_members_then_starts_the_turn() {
        let mut db = fixture_db();
        db.actors.upsert(ActorData::new(9, "Squire", 1));
        let rng = FixedRng(0.0);
        let mut party = fixture_party(&db);
        party.add_actor(&db, crate::data::ActorId(9)).unwrap();
        let mut troop = Troop::new();
        let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop);
        let mut engine = BattleEngine::new();
        engine.setup(&mut ctx, TROOP_SLIMES, true, false).unwrap();
        engine.start_battle(&mut ctx, Encounter::Normal);

        engine.update(&mut ctx);
        assert_eq!(engine.phase(), BattlePhase::Input);
        assert_eq!(engine.actor(&ctx), None);

        engine.select_next_command(&mut ctx);
        assert_eq!(engine.actor(&ctx), Some(HERO));
        assert_eq!(ctx.battler(HERO).action_state(), ActionState::Inputting);
        engine.inputting_action_mut(&mut ctx).unwrap().set_attack();

        engine.select_next_command(&mut ctx);
        let squire = BattlerId::Actor(crate::data::ActorId(9));
        assert_eq!(engine.actor(&ctx), Some(squire));
        assert_eq!(ctx.battler(HERO).action_state(), ActionState::Waiting);

        engine.select_previous_command(&mut ctx);
        assert_eq!(engine.actor(&ctx), Some(HERO));
        assert_eq!(ctx.battler(squire).action_state(), ActionState::Undecided);

        engine.select_next_command(&mut ctx);
        engine.select_next_command(&mut ctx);
        assert_eq!(engine.phase(), BattlePhase::Turn);
        assert_eq!(ctx.troop.turn_count(), 1);
    }

    #[test]
    fn surprised_parties_skip_input_and_the_first_turn() {
        let db = fixture_db();
        let rng = FixedRng(0.0);
        let mut party = fixture_party(&db);
        let mut troop = Troop::new();
        let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop);
        let mut engine = BattleEngine::new();
        engine.setup(&mut ctx, TROOP_SLIMES, false, false).unwrap();
        engine.start_battle(&mut ctx, Encounter::Surprise);

        engine.update(&mut ctx);
        assert_eq!(engine.phase(), BattlePhase::Turn);
        let order: Vec<BattlerId> = engine.action_order().collect();
        assert_eq!(order, [BattlerId::Enemy(0), BattlerId::Enemy(1)]);
    }

    #[test]
    fn equal_speeds_keep_concatenation_order() {
        let db = fixture_db();
        let rng = FixedRng(0.0);
        let mut party = fixture_party(&db);
        let mut troop = Troop::new();
        let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop);
        let mut engine = BattleEngine::new();
        engine.setup(&mut ctx, TROOP_SLIMES, false, false).unwrap();
        engine.start_battle(&mut ctx, Encounter::Normal);
        engine.update(&mut ctx);
        engine.complete_input_with_auto_battle(&mut ctx);

        let order: Vec<BattlerId> = engine.action_order().collect();
        let speeds: Vec<i32> = order.iter().map(|&id| ctx.battler(id).speed()).collect();
        assert!(speeds.windows(2).all(|w| w[0] >= w[1]));
        let first_slime = order.iter().position(|&id| id == BattlerId::Enemy(0));
        let second_slime = order.iter().position(|&id| id == BattlerId::Enemy(1));
        // identical slimes roll identical speeds under a fixed rng
        assert!(first_slime < second_slime);
        assert!(ctx.battler(HERO).current_action().is_some_and(|a| a.item().is_some()));
    }
}
