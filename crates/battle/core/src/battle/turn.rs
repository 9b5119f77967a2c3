//! Turn processing: subjects, actions, per-target resolution and turn end.

use tracing::{debug, trace};

use super::{BattleEngine, BattlePhase};
use crate::action::Action;
use crate::battler::BattlerId;
use crate::context::BattleContext;
use crate::data::ItemRef;
use crate::hooks::LogEvent;
use crate::unit::Unit;

/// Turn processing methods for BattleEngine.
impl BattleEngine {
    pub(super) fn update_turn(&mut self, ctx: &mut BattleContext<'_>) {
        if self.subject.is_none() {
            self.subject = self.next_subject(ctx);
        }
        if self.subject.is_some() {
            self.process_turn(ctx);
        } else {
            self.end_turn(ctx);
        }
    }

    /// Pops queued battlers until one is a living battle member.
    fn next_subject(&mut self, ctx: &BattleContext<'_>) -> Option<BattlerId> {
        while let Some(id) = self.action_battlers.pop_front() {
            let Some(battler) = ctx.try_battler(id) else {
                continue;
            };
            let member = match id {
                BattlerId::Actor(actor_id) => ctx.party.is_battle_member(actor_id),
                BattlerId::Enemy(_) => true,
            };
            if member && battler.is_alive() {
                return Some(id);
            }
        }
        None
    }

    /// Runs the subject's next action, or closes its actions for the turn and
    /// moves on to the next subject.
    fn process_turn(&mut self, ctx: &mut BattleContext<'_>) {
        let Some(subject) = self.subject else {
            return;
        };
        if let Some(mut action) = ctx.battler(subject).current_action().cloned() {
            action.prepare(ctx);
            if action.is_valid(ctx) {
                self.start_action(ctx, action);
            } else {
                trace!(battler = %subject, item = ?action.item(), "invalid action skipped");
            }
            ctx.battler_mut(subject).remove_current_action();
        } else {
            let env = ctx.env;
            ctx.battler_mut(subject).on_all_actions_end(&env);
            ctx.refresh_status();
            display_auto_affected_status(ctx, subject);
            display_current_state(ctx, subject);
            display_regeneration(ctx, subject);
            self.subject = self.next_subject(ctx);
        }
    }

    /// Resolves targets once, pays for the action and queues its global
    /// effects; targets are then resolved one per tick.
    fn start_action(&mut self, ctx: &mut BattleContext<'_>, action: Action) {
        let subject = action.subject();
        let targets = action.make_targets(ctx);
        self.phase = BattlePhase::Action;
        use_item(ctx, subject, action.item());
        action.apply_global(ctx);
        ctx.refresh_status();
        debug!(battler = %subject, item = ?action.item(), ?targets, "action started");
        ctx.narrate(|ctx| LogEvent::StartAction {
            subject,
            subject_name: ctx.name_of(subject),
            item_name: action
                .usable(ctx.db())
                .map(|item| item.name().to_owned())
                .unwrap_or_default(),
            targets: targets.clone(),
        });
        self.targets = targets.into();
        self.action = Some(action);
    }

    pub(super) fn update_action(&mut self, ctx: &mut BattleContext<'_>) {
        match self.targets.pop_front() {
            Some(target) => self.invoke_action(ctx, target),
            None => self.end_action(ctx),
        }
    }

    /// One application on `target`: countered, reflected or taken normally.
    fn invoke_action(&mut self, ctx: &mut BattleContext<'_>, target: BattlerId) {
        let Some(action) = self.action.clone() else {
            return;
        };
        let subject = action.subject();
        let db = ctx.db();
        if ctx.env.random() < action.item_cnt(db, ctx.battler(target)) {
            invoke_counter_attack(ctx, subject, target);
        } else if ctx.env.random() < action.item_mrf(db, ctx.battler(target)) {
            invoke_magic_reflection(ctx, &action, target);
        } else {
            invoke_normal_action(ctx, &action, target);
        }
        let index = ctx.friends_unit(target).member_index(target);
        ctx.battler_mut(subject).set_last_target(index);
        ctx.refresh_status();
    }

    fn end_action(&mut self, ctx: &mut BattleContext<'_>) {
        if let Some(subject) = self.subject {
            ctx.narrate(|_| LogEvent::EndAction { subject });
        }
        self.action = None;
        self.phase = BattlePhase::Turn;
    }

    /// Runs the pending forced action out of turn order.
    pub(super) fn process_forced_action(&mut self, ctx: &mut BattleContext<'_>) {
        let Some(id) = self.forced_battler.take() else {
            return;
        };
        self.turn_forced = true;
        self.subject = Some(id);
        if let Some(action) = ctx.battler(id).current_action().cloned() {
            self.start_action(ctx, action);
        }
        ctx.battler_mut(id).remove_current_action();
    }

    /// Turn-end hooks for every battle member of both sides.
    pub(super) fn end_turn(&mut self, ctx: &mut BattleContext<'_>) {
        self.phase = BattlePhase::TurnEnd;
        self.preemptive = false;
        self.surprise = false;
        let env = ctx.env;
        let forced = self.turn_forced;
        let mut members = ctx.party.member_ids();
        members.extend(ctx.troop.member_ids());
        for id in members {
            ctx.battler_mut(id).on_turn_end(&env, forced);
            ctx.refresh_status();
            display_auto_affected_status(ctx, id);
            display_regeneration(ctx, id);
        }
        self.turn_forced = false;
        debug!(turn = ctx.troop.turn_count(), forced, "turn ended");
    }
}

/// Skills cost MP/TP; items leave the party's inventory.
fn use_item(ctx: &mut BattleContext<'_>, subject: BattlerId, item: Option<ItemRef>) {
    let db = ctx.db();
    match item {
        Some(ItemRef::Skill(skill_id)) => {
            if let Some(skill) = db.skill(skill_id) {
                ctx.battler_mut(subject).pay_skill_cost(db, skill);
            }
        }
        Some(ItemRef::Item(item_id)) => {
            if subject.is_actor() {
                ctx.party.consume_item(db, item_id);
            }
        }
        None => {}
    }
}

fn invoke_counter_attack(ctx: &mut BattleContext<'_>, subject: BattlerId, target: BattlerId) {
    let mut counter = Action::new(target, false);
    counter.set_attack();
    counter.apply(ctx, subject);
    ctx.narrate(|ctx| LogEvent::Counter {
        battler: target,
        name: ctx.name_of(target),
    });
    display_action_results(ctx, target, subject);
}

/// The reflector sends the action back at its subject.
fn invoke_magic_reflection(ctx: &mut BattleContext<'_>, action: &Action, target: BattlerId) {
    let subject = action.subject();
    let mut reflected = action.clone();
    reflected.set_reflection_target(Some(target));
    ctx.narrate(|ctx| LogEvent::Reflection {
        battler: target,
        name: ctx.name_of(target),
    });
    reflected.apply(ctx, subject);
    display_action_results(ctx, target, subject);
}

fn invoke_normal_action(ctx: &mut BattleContext<'_>, action: &Action, target: BattlerId) {
    let real_target = apply_substitute(ctx, action, target);
    action.apply(ctx, real_target);
    display_action_results(ctx, action.subject(), real_target);
}

/// A dying target hit by anything but a certain hit is covered by the first
/// substitute-flagged ally that can move.
fn apply_substitute(ctx: &mut BattleContext<'_>, action: &Action, target: BattlerId) -> BattlerId {
    let db = ctx.db();
    if !ctx.battler(target).is_dying(db) || action.is_certain_hit(db) {
        return target;
    }
    match ctx.friends_unit(target).substitute_battler(db) {
        Some(substitute) if substitute != target => {
            ctx.narrate(|ctx| LogEvent::Substitute {
                substitute,
                substitute_name: ctx.name_of(substitute),
                target,
                target_name: ctx.name_of(target),
            });
            substitute
        }
        _ => target,
    }
}

// ===== narration =====

fn display_action_results(ctx: &mut BattleContext<'_>, subject: BattlerId, target: BattlerId) {
    if !ctx.battler(target).result().used {
        return;
    }
    ctx.narrate(|ctx| {
        let battler = ctx.battler(target);
        LogEvent::ActionResult {
            subject,
            target,
            target_name: battler.name(ctx.db()),
            result: battler.result().clone(),
        }
    });
}

fn display_auto_affected_status(ctx: &mut BattleContext<'_>, id: BattlerId) {
    if !ctx.battler(id).result().is_status_affected() {
        return;
    }
    ctx.narrate(|ctx| {
        let battler = ctx.battler(id);
        LogEvent::AutoAffectedStatus {
            battler: id,
            name: battler.name(ctx.db()),
            result: battler.result().clone(),
        }
    });
}

fn display_current_state(ctx: &mut BattleContext<'_>, id: BattlerId) {
    let lines: Vec<String> = ctx
        .battler(id)
        .state_data(ctx.db())
        .map(|state| state.messages.persist.clone())
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return;
    }
    ctx.narrate(|ctx| LogEvent::CurrentState {
        battler: id,
        name: ctx.name_of(id),
        lines,
    });
}

fn display_regeneration(ctx: &mut BattleContext<'_>, id: BattlerId) {
    let result = ctx.battler(id).result();
    if result.hp_damage == 0 && result.mp_damage == 0 && result.tp_damage == 0 {
        return;
    }
    ctx.narrate(|ctx| {
        let battler = ctx.battler(id);
        LogEvent::Regeneration {
            battler: id,
            name: battler.name(ctx.db()),
            result: battler.result().clone(),
        }
    });
}

#[cfg(test)]
mod tests {
    use crate::action::TARGET_LAST;
    use crate::battle::{BattleEngine, BattlePhase, Encounter};
    use crate::battler::BattlerId;
    use crate::context::{BattleContext, BattleEnv};
    use crate::data::{
        Database, EnemyData, ItemRef, StateData, StateId, Trait, TraitCode, TroopData, TroopId,
    };
    use crate::hooks::{LogEvent, RecordingLog};
    use crate::rng::FixedRng;
    use crate::testing::{
        ACTOR_HERO, ITEM_POTION, SKILL_FIRE, STATE_POISON, TROOP_SLIME, fixture_db,
        fixture_party,
    };
    use crate::unit::{Troop, Unit};

    const HERO: BattlerId = BattlerId::Actor(ACTOR_HERO);
    const SLIME: BattlerId = BattlerId::Enemy(0);
    const TROOP_KNIGHT: TroopId = TroopId(20);

    /// Adds a sturdy enemy that survives a few hits and never acts.
    fn knight_db() -> Database {
        let mut db = fixture_db();
        db.enemies.upsert(EnemyData::new(20, "Knight", [500, 0, 10, 10, 10, 10, 1, 5]));
        db.troops.upsert(TroopData::new(TROOP_KNIGHT.0, "Knight", &[20]));
        db.troops.upsert(TroopData::new(21, "Escort", &[1, 20]));
        db
    }

    fn run_until(
        engine: &mut BattleEngine,
        ctx: &mut BattleContext<'_>,
        phase: BattlePhase,
    ) {
        for _ in 0..200 {
            if engine.phase() == phase {
                return;
            }
            engine.update(ctx);
        }
        panic!("never reached {phase}, stuck in {}", engine.phase());
    }

    #[test]
    fn an_attack_resolves_target_by_target() {
        let db = fixture_db();
        let rng = FixedRng(0.0);
        let mut party = fixture_party(&db);
        let mut troop = Troop::new();
        let mut log = RecordingLog::new();
        {
            let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop)
                .with_log(&mut log);
            let mut engine = BattleEngine::new();
            engine.setup(&mut ctx, TROOP_SLIME, false, false).unwrap();
            engine.start_battle(&mut ctx, Encounter::Preemptive);
            run_until(&mut engine, &mut ctx, BattlePhase::Input);
            let action = engine.inputting_action_mut(&mut ctx);
            assert!(action.is_none(), "nobody is selected before the first command");
            engine.select_next_command(&mut ctx);
            let action = engine.inputting_action_mut(&mut ctx).unwrap();
            action.set_attack();
            action.set_target(0);
            engine.select_next_command(&mut ctx);
            assert_eq!(engine.phase(), BattlePhase::Turn);

            engine.update(&mut ctx);
            assert_eq!(engine.phase(), BattlePhase::Action);
            assert_eq!(engine.subject(), Some(HERO));
            engine.update(&mut ctx);
            engine.update(&mut ctx);
            assert_eq!(engine.phase(), BattlePhase::Turn);
            assert!(ctx.battler(SLIME).hp() < ctx.battler(SLIME).mhp(&db));
            assert_eq!(ctx.battler(HERO).last_target_index(), 0);
        }
        let kinds: Vec<&str> = log
            .events
            .iter()
            .filter_map(|event| match event {
                LogEvent::StartTurn { .. } => Some("turn"),
                LogEvent::StartAction { .. } => Some("start"),
                LogEvent::ActionResult { .. } => Some("result"),
                LogEvent::EndAction { .. } => Some("end"),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, ["turn", "start", "result", "end"]);
    }

    #[test]
    fn items_leave_the_inventory_when_used() {
        let db = fixture_db();
        let rng = FixedRng(0.0);
        let mut party = fixture_party(&db);
        let mut troop = Troop::new();
        let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop);
        let mut engine = BattleEngine::new();
        engine.setup(&mut ctx, TROOP_SLIME, false, false).unwrap();
        engine.start_battle(&mut ctx, Encounter::Preemptive);
        run_until(&mut engine, &mut ctx, BattlePhase::Input);
        engine.select_next_command(&mut ctx);
        let action = engine.inputting_action_mut(&mut ctx).unwrap();
        action.set_item(ITEM_POTION);
        action.set_target(0);
        engine.select_next_command(&mut ctx);
        engine.update(&mut ctx);
        assert_eq!(ctx.party.num_items(ITEM_POTION), 2);
    }

    #[test]
    fn forced_actions_jump_the_queue_and_mark_the_turn() {
        let db = knight_db();
        let rng = FixedRng(0.0);
        let mut party = fixture_party(&db);
        let mut troop = Troop::new();
        let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop);
        let mut engine = BattleEngine::new();
        engine.setup(&mut ctx, TROOP_KNIGHT, false, false).unwrap();
        engine.start_battle(&mut ctx, Encounter::Normal);
        run_until(&mut engine, &mut ctx, BattlePhase::Input);
        engine.complete_input_with_auto_battle(&mut ctx);

        engine.force_action(&mut ctx, HERO, SKILL_FIRE, TARGET_LAST);
        assert!(engine.is_action_forced());
        assert!(engine.action_order().all(|id| id != HERO));
        let mp_before = ctx.battler(HERO).mp();

        engine.update(&mut ctx);
        assert!(engine.is_forced_turn());
        assert_eq!(engine.phase(), BattlePhase::Action);
        assert_eq!(
            engine.current_action().and_then(|a| a.item()),
            Some(ItemRef::Skill(SKILL_FIRE))
        );
        assert_eq!(ctx.battler(HERO).mp(), mp_before - 5);

        run_until(&mut engine, &mut ctx, BattlePhase::TurnEnd);
        assert!(!engine.is_forced_turn());
    }

    #[test]
    fn substitutes_cover_dying_allies() {
        let mut db = knight_db();
        db.states.upsert(
            StateData::new(33, "Cover").with_trait(Trait::new(TraitCode::SpecialFlag, 2, 0.0)),
        );
        let rng = FixedRng(0.0);
        let env = BattleEnv::new(&db, &rng);
        let mut party = fixture_party(&db);
        let mut troop = Troop::new();
        let mut log = RecordingLog::new();
        {
            let mut ctx = BattleContext::new(env, &mut party, &mut troop).with_log(&mut log);
            let mut engine = BattleEngine::new();
            engine.setup(&mut ctx, TroopId(21), false, false).unwrap();
            engine.start_battle(&mut ctx, Encounter::Preemptive);
            run_until(&mut engine, &mut ctx, BattlePhase::Input);
            ctx.battler_mut(SLIME).set_hp(&env, 1);
            ctx.battler_mut(BattlerId::Enemy(1)).add_state(&env, StateId(33));
            engine.select_next_command(&mut ctx);
            let action = engine.inputting_action_mut(&mut ctx).unwrap();
            action.set_attack();
            action.set_target(0);
            engine.select_next_command(&mut ctx);
            run_until(&mut engine, &mut ctx, BattlePhase::TurnEnd);
            assert_eq!(ctx.battler(SLIME).hp(), 1);
            assert_eq!(ctx.troop.alive_members().len(), 2);
        }
        assert!(log.events.iter().any(|event| matches!(
            event,
            LogEvent::Substitute {
                substitute: BattlerId::Enemy(1),
                target: BattlerId::Enemy(0),
                ..
            }
        )));
    }

    #[test]
    fn turn_end_ticks_state_durations() {
        let db = knight_db();
        let rng = FixedRng(0.0);
        let env = BattleEnv::new(&db, &rng);
        let mut party = fixture_party(&db);
        let mut troop = Troop::new();
        let mut ctx = BattleContext::new(env, &mut party, &mut troop);
        let mut engine = BattleEngine::new();
        engine.setup(&mut ctx, TROOP_KNIGHT, false, false).unwrap();
        engine.start_battle(&mut ctx, Encounter::Normal);
        ctx.battler_mut(HERO).add_state(&env, STATE_POISON);
        let turns = ctx.battler(HERO).state_turns(STATE_POISON).unwrap();

        run_until(&mut engine, &mut ctx, BattlePhase::Input);
        engine.complete_input_with_auto_battle(&mut ctx);
        run_until(&mut engine, &mut ctx, BattlePhase::TurnEnd);
        assert_eq!(ctx.battler(HERO).state_turns(STATE_POISON), Some(turns - 1));
    }
}
