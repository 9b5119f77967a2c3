mod common;

use battle_core::data::SkillId;
use battle_core::{
    BattleContext, BattleEngine, BattleEnv, BattleOutcome, BattlePhase, BattlerId, Encounter,
    FixedRng, LogEvent, PcgRng, RecordingLog, Unit,
};
use common::{
    HERO, SKILL_SIPHON, TROOP_MIRROR, TROOP_OGRE, TROOP_PORCUPINE, TROOP_WISP, database, party,
    troop,
};

const WISP: BattlerId = BattlerId::Enemy(0);

/// Ticks the engine to completion, letting auto battle pick every command.
fn run_to_end(engine: &mut BattleEngine, ctx: &mut BattleContext<'_>, mut each_tick: impl FnMut(&BattleContext<'_>)) {
    for _ in 0..2_000 {
        if engine.is_input_phase() {
            engine.complete_input_with_auto_battle(ctx);
        } else {
            engine.update(ctx);
        }
        each_tick(ctx);
        if !engine.is_running() {
            return;
        }
    }
    panic!("battle did not finish, stuck in {}", engine.phase());
}

fn assert_hp_matches_death(ctx: &BattleContext<'_>) {
    let battlers = ctx.party.members().into_iter().chain(ctx.troop.members());
    for battler in battlers {
        assert_eq!(
            battler.hp() == 0,
            battler.is_dead(),
            "{} has {} hp, dead = {}",
            battler.id(),
            battler.hp(),
            battler.is_dead()
        );
    }
}

#[test]
fn the_hero_defeats_a_wisp() {
    let db = database();
    let rng = FixedRng(0.0);
    let mut party = party(&db);
    let mut troop = troop();
    let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop);
    let mut engine = BattleEngine::new();
    engine.setup(&mut ctx, TROOP_WISP, true, false).unwrap();
    engine.start_battle(&mut ctx, Encounter::Normal);

    run_to_end(&mut engine, &mut ctx, |_| {});

    assert_eq!(engine.outcome(), Some(BattleOutcome::Victory));
    assert_eq!(engine.phase(), BattlePhase::None);
    let wisp = ctx.battler(WISP);
    assert_eq!(wisp.hp(), 0);
    assert!(wisp.is_dead());
    assert_eq!(engine.rewards().exp, 3);
    assert_eq!(engine.rewards().gold, 2);
    assert_eq!(ctx.party.gold(), 2);
    assert!(ctx.battler(HERO).is_alive());
}

#[test]
fn a_seeded_auto_battle_keeps_hp_and_death_in_step() {
    let db = database();
    let rng = PcgRng::new(7);
    let mut party = party(&db);
    let mut troop = troop();
    let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop);
    let mut engine = BattleEngine::new();
    engine.setup(&mut ctx, TROOP_OGRE, false, false).unwrap();
    engine.start_battle(&mut ctx, Encounter::Rolled);

    run_to_end(&mut engine, &mut ctx, assert_hp_matches_death);

    assert!(engine.outcome().is_some());
    assert!(ctx.troop.turn_count() >= 1);
}

fn seeded_log(seed: u64) -> Vec<LogEvent> {
    let db = database();
    let rng = PcgRng::new(seed);
    let mut party = party(&db);
    let mut troop = troop();
    let mut log = RecordingLog::new();
    {
        let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop)
            .with_log(&mut log);
        let mut engine = BattleEngine::new();
        engine.setup(&mut ctx, TROOP_OGRE, true, false).unwrap();
        engine.start_battle(&mut ctx, Encounter::Rolled);
        run_to_end(&mut engine, &mut ctx, |_| {});
    }
    log.take()
}

#[test]
fn equal_seeds_replay_the_same_battle() {
    let first = seeded_log(42);
    assert!(!first.is_empty());
    assert_eq!(first, seeded_log(42));
}

#[test]
fn each_failed_escape_raises_the_odds() {
    let db = database();
    let rng = FixedRng(0.99);
    let mut party = party(&db);
    let mut troop = troop();
    let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop);
    let mut engine = BattleEngine::new();
    engine.setup(&mut ctx, TROOP_WISP, true, false).unwrap();
    engine.start_battle(&mut ctx, Encounter::Normal);
    assert!((engine.escape_ratio() - 0.5).abs() < 1e-9);

    for attempt in 1..=2 {
        for _ in 0..200 {
            if engine.is_input_phase() {
                break;
            }
            engine.update(&mut ctx);
        }
        assert!(engine.is_input_phase(), "attempt {attempt} never reached input");
        assert!(!engine.process_escape(&mut ctx));
        assert_eq!(engine.phase(), BattlePhase::Turn);
    }

    assert!((engine.escape_ratio() - 0.7).abs() < 1e-9);
    assert!(!engine.is_escaped());
    assert!(engine.outcome().is_none());
}

/// Forces the hero to use `skill` on the first enemy and resolves that one
/// target.
fn resolve_forced_hero_skill(engine: &mut BattleEngine, ctx: &mut BattleContext<'_>, skill: SkillId) {
    engine.force_action(ctx, HERO, skill, 0);
    engine.update(ctx);
    assert_eq!(engine.phase(), BattlePhase::Action);
    assert_eq!(engine.subject(), Some(HERO));
    engine.update(ctx);
}

#[test]
fn a_counter_strikes_the_attacker_instead() {
    let db = database();
    let rng = FixedRng(0.0);
    let mut party = party(&db);
    let mut troop = troop();
    let mut log = RecordingLog::new();
    {
        let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop)
            .with_log(&mut log);
        let mut engine = BattleEngine::new();
        engine.setup(&mut ctx, TROOP_PORCUPINE, false, false).unwrap();
        engine.start_battle(&mut ctx, Encounter::Normal);
        let hero_mhp = ctx.battler(HERO).mhp(&db);
        let porcupine = BattlerId::Enemy(0);

        resolve_forced_hero_skill(&mut engine, &mut ctx, SkillId(1));

        let hero = ctx.battler(HERO);
        assert!(hero.result().hp_damage > 0);
        assert_eq!(hero.hp(), hero_mhp - hero.result().hp_damage);
        let porcupine = ctx.battler(porcupine);
        assert_eq!(porcupine.hp(), porcupine.mhp(&db));
        assert!(!porcupine.result().used);
    }
    let events = log.take();
    assert!(events.iter().any(|event| matches!(event, LogEvent::Counter { .. })));
}

#[test]
fn reflected_drain_hurts_the_caster_and_feeds_the_reflector() {
    let db = database();
    let rng = FixedRng(0.0);
    let mut party = party(&db);
    let mut troop = troop();
    let mut log = RecordingLog::new();
    {
        let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop)
            .with_log(&mut log);
        let mut engine = BattleEngine::new();
        engine.setup(&mut ctx, TROOP_MIRROR, false, false).unwrap();
        engine.start_battle(&mut ctx, Encounter::Normal);
        let mirror = BattlerId::Enemy(0);
        let env = ctx.env;
        ctx.battler_mut(HERO).set_hp(&env, 800);
        ctx.battler_mut(mirror).set_hp(&env, 300);

        resolve_forced_hero_skill(&mut engine, &mut ctx, SkillId(SKILL_SIPHON));

        let hero = ctx.battler(HERO);
        assert_eq!(hero.hp(), 750);
        assert!(hero.result().drain);
        assert_eq!(ctx.battler(mirror).hp(), 350);
    }
    let events = log.take();
    assert!(events.iter().any(|event| matches!(event, LogEvent::Reflection { .. })));
    assert!(!events.iter().any(|event| matches!(event, LogEvent::Counter { .. })));
}
