//! How a battle ends: escape, abort, victory or defeat.

use tracing::{debug, info};

use super::{BattleEngine, BattleOutcome, BattlePhase};
use crate::battler::{BattlerId, LevelUp};
use crate::context::BattleContext;
use crate::data::{Database, DropKind};
use crate::hooks::{BattleCue, BattleMessage, LogEvent};
use crate::unit::Unit;

/// Spoils of a won battle.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rewards {
    pub gold: i32,
    pub exp: i32,
    pub items: Vec<DropKind>,
    /// Actors that levelled up while taking the experience.
    pub level_ups: Vec<(BattlerId, LevelUp)>,
}

fn drop_name(db: &Database, drop: DropKind) -> Option<String> {
    match drop {
        DropKind::None => None,
        DropKind::Item(id) => db.item(id).map(|item| item.name.clone()),
        DropKind::Weapon(id) => db.weapon(id).map(|weapon| weapon.name.clone()),
        DropKind::Armor(id) => db.armor(id).map(|armor| armor.name.clone()),
    }
}

fn announce(ctx: &mut BattleContext<'_>, message: BattleMessage) {
    ctx.narrate(|_| LogEvent::Message(message));
}

/// Battle ending methods for BattleEngine.
impl BattleEngine {
    /// Attempts to run away. Front ends offer this only when
    /// [`BattleEngine::can_escape`] holds.
    ///
    /// A preemptive battle always escapes. A failed attempt raises the odds
    /// for the next one and hands the turn to the enemies.
    pub fn process_escape(&mut self, ctx: &mut BattleContext<'_>) -> bool {
        ctx.hooks.cue(BattleCue::Escape);
        let success = self.preemptive || ctx.env.random() < self.escape_ratio;
        let name = ctx.party.name(ctx.db());
        announce(ctx, BattleMessage::EscapeStart(name));
        if success {
            self.escaped = true;
            self.process_abort(ctx);
        } else {
            announce(ctx, BattleMessage::EscapeFailure);
            self.escape_ratio += ctx.env.config().escape_ratio_step;
            ctx.party.clear_actions();
            self.start_turn(ctx);
        }
        debug!(success, escape_ratio = self.escape_ratio, "escape attempted");
        success
    }

    /// Aborts when the party is gone or an abort was requested.
    pub(super) fn check_abort(&mut self, ctx: &mut BattleContext<'_>) -> bool {
        if matches!(self.phase, BattlePhase::None | BattlePhase::BattleEnd) {
            return false;
        }
        if ctx.party.is_empty() || self.phase == BattlePhase::Aborting {
            ctx.hooks.cue(BattleCue::Escape);
            self.escaped = true;
            self.process_abort(ctx);
            return true;
        }
        false
    }

    fn process_abort(&mut self, ctx: &mut BattleContext<'_>) {
        let env = ctx.env;
        ctx.party.remove_battle_states(&env);
        ctx.hooks.cue(BattleCue::ReplayBgm);
        self.end_battle(ctx, BattleOutcome::Abort);
    }

    pub(super) fn process_victory(&mut self, ctx: &mut BattleContext<'_>) {
        let env = ctx.env;
        ctx.party.remove_battle_states(&env);
        ctx.hooks.cue(BattleCue::VictoryMe);
        ctx.hooks.cue(BattleCue::ReplayBgm);
        self.make_rewards(ctx);
        self.display_victory_message(ctx);
        self.display_rewards(ctx);
        self.gain_rewards(ctx);
        self.end_battle(ctx, BattleOutcome::Victory);
    }

    pub(super) fn process_defeat(&mut self, ctx: &mut BattleContext<'_>) {
        let name = ctx.party.name(ctx.db());
        announce(ctx, BattleMessage::Defeat(name));
        ctx.hooks.cue(BattleCue::DefeatMe);
        if self.can_lose {
            ctx.hooks.cue(BattleCue::ReplayBgm);
        } else {
            ctx.hooks.cue(BattleCue::StopBgm);
        }
        self.end_battle(ctx, BattleOutcome::Defeat);
    }

    fn end_battle(&mut self, ctx: &mut BattleContext<'_>, outcome: BattleOutcome) {
        self.phase = BattlePhase::BattleEnd;
        self.outcome = Some(outcome);
        let escaped = self.escaped;
        if let Some(system) = ctx.hooks.system() {
            match outcome {
                BattleOutcome::Victory => system.on_battle_win(),
                _ if escaped => system.on_battle_escape(),
                _ => {}
            }
        }
        info!(outcome = ?outcome, escaped, turns = ctx.troop.turn_count(), "battle ended");
    }

    /// Final tick of a session. A lost battle that may be lost revives the
    /// fallen with 1 HP.
    pub(super) fn update_battle_end(&mut self, ctx: &mut BattleContext<'_>) {
        let env = ctx.env;
        if !self.escaped && self.can_lose && ctx.party.is_all_dead() {
            ctx.party.revive_battle_members(&env);
        }
        ctx.party.on_battle_end(&env);
        ctx.troop.on_battle_end(&env);
        self.subject = None;
        self.action = None;
        self.targets.clear();
        self.action_battlers.clear();
        self.phase = BattlePhase::None;
    }

    // ===== rewards =====

    fn make_rewards(&mut self, ctx: &BattleContext<'_>) {
        let env = ctx.env;
        let db = env.db;
        self.rewards = Rewards {
            gold: ctx.troop.gold_total(db, ctx.party.has_gold_double(db)),
            exp: ctx.troop.exp_total(db),
            items: ctx
                .troop
                .make_drop_items(&env, ctx.party.has_drop_item_double(db)),
            level_ups: Vec::new(),
        };
    }

    fn display_victory_message(&self, ctx: &mut BattleContext<'_>) {
        let name = ctx.party.name(ctx.db());
        announce(ctx, BattleMessage::Victory(name));
    }

    fn display_rewards(&self, ctx: &mut BattleContext<'_>) {
        if self.rewards.exp > 0 {
            announce(ctx, BattleMessage::ObtainExp(self.rewards.exp));
        }
        if self.rewards.gold > 0 {
            announce(ctx, BattleMessage::ObtainGold(self.rewards.gold));
        }
        let db = ctx.db();
        for &drop in &self.rewards.items {
            if let Some(name) = drop_name(db, drop) {
                announce(ctx, BattleMessage::ObtainItem(name));
            }
        }
    }

    /// Experience goes to the whole roster; bench members receive it only
    /// when the configuration grants it.
    fn gain_rewards(&mut self, ctx: &mut BattleContext<'_>) {
        let env = ctx.env;
        let exp = self.rewards.exp;
        let roster = ctx.party.roster().to_vec();
        for actor_id in roster {
            let battle_member = ctx.party.is_battle_member(actor_id);
            let Some(actor) = ctx.party.actor_mut(actor_id) else {
                continue;
            };
            let Some(level_up) = actor.gain_exp(&env, exp, battle_member) else {
                continue;
            };
            let id = BattlerId::Actor(actor_id);
            let name = ctx.name_of(id);
            announce(
                ctx,
                BattleMessage::LevelUp {
                    name,
                    level: level_up.level,
                },
            );
            for &skill_id in &level_up.new_skills {
                if let Some(skill) = env.db.skill(skill_id) {
                    announce(ctx, BattleMessage::ObtainSkill(skill.name.clone()));
                }
            }
            self.rewards.level_ups.push((id, level_up));
        }
        ctx.party.gain_gold(self.rewards.gold);
        for &drop in &self.rewards.items {
            ctx.party.gain_drop(drop, 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::battle::{BattleEngine, BattleOutcome, BattlePhase, Encounter};
    use crate::battler::BattlerId;
    use crate::context::{BattleContext, BattleEnv};
    use crate::data::{ActorData, ActorId, DropKind};
    use crate::hooks::{BattleCue, BattleMessage, BattleRecord, RecordingLog};
    use crate::rng::FixedRng;
    use crate::testing::{ACTOR_HERO, ITEM_POTION, TROOP_SLIME, fixture_db, fixture_party};
    use crate::unit::{Troop, Unit};

    const HERO: BattlerId = BattlerId::Actor(ACTOR_HERO);

    #[test]
    fn failed_escapes_raise_the_ratio() {
        let db = fixture_db();
        let rng = FixedRng(0.99);
        let mut party = fixture_party(&db);
        let mut troop = Troop::new();
        let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop);
        let mut engine = BattleEngine::new();
        engine.setup(&mut ctx, TROOP_SLIME, true, false).unwrap();
        engine.start_battle(&mut ctx, Encounter::Normal);
        engine.update(&mut ctx);

        let ratio = engine.escape_ratio();
        assert!(!engine.process_escape(&mut ctx));
        assert!((engine.escape_ratio() - (ratio + 0.1)).abs() < 1e-12);
        assert_eq!(engine.phase(), BattlePhase::Turn);
        assert_eq!(ctx.battler(HERO).num_actions(), 0);
    }

    #[test]
    fn preemptive_escapes_always_succeed() {
        let db = fixture_db();
        let rng = FixedRng(0.99);
        let mut party = fixture_party(&db);
        let mut troop = Troop::new();
        let mut record = BattleRecord::default();
        {
            let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop)
                .with_system(&mut record);
            let mut engine = BattleEngine::new();
            engine.setup(&mut ctx, TROOP_SLIME, true, false).unwrap();
            engine.start_battle(&mut ctx, Encounter::Preemptive);
            engine.update(&mut ctx);

            assert!(engine.process_escape(&mut ctx));
            assert_eq!(engine.phase(), BattlePhase::BattleEnd);
            assert_eq!(engine.outcome(), Some(BattleOutcome::Abort));
            engine.update(&mut ctx);
            assert_eq!(engine.phase(), BattlePhase::None);
            assert!(!ctx.in_battle());
        }
        assert_eq!(record.escape_count, 1);
        assert_eq!(record.cues[0], BattleCue::Escape);
    }

    #[test]
    fn aborting_is_observed_on_the_next_tick() {
        let db = fixture_db();
        let rng = FixedRng(0.5);
        let mut party = fixture_party(&db);
        let mut troop = Troop::new();
        let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop);
        let mut engine = BattleEngine::new();
        engine.setup(&mut ctx, TROOP_SLIME, false, false).unwrap();
        engine.start_battle(&mut ctx, Encounter::Normal);
        engine.update(&mut ctx);
        engine.abort();
        assert_eq!(engine.phase(), BattlePhase::Aborting);
        engine.update(&mut ctx);
        assert_eq!(engine.outcome(), Some(BattleOutcome::Abort));
        assert!(engine.is_escaped());
    }

    #[test]
    fn victory_hands_out_rewards() {
        let mut db = fixture_db();
        db.actors.upsert(ActorData::new(9, "Squire", 1));
        // one battle seat: the squire sits on the bench
        db.config.max_battle_members = 1;
        let rng = FixedRng(0.0);
        let mut party = fixture_party(&db);
        party.add_actor(&db, ActorId(9)).unwrap();
        let gold = party.gold();
        let hero_exp = party.actor(ACTOR_HERO).unwrap().exp();
        let mut troop = Troop::new();
        let mut log = RecordingLog::new();
        let mut record = BattleRecord::default();
        {
            let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop)
                .with_log(&mut log)
                .with_system(&mut record);
            let mut engine = BattleEngine::new();
            engine.setup(&mut ctx, TROOP_SLIME, false, false).unwrap();
            engine.start_battle(&mut ctx, Encounter::Normal);
            let env = ctx.env;
            ctx.battler_mut(BattlerId::Enemy(0)).set_hp(&env, 0);

            engine.update(&mut ctx);
            assert_eq!(engine.outcome(), Some(BattleOutcome::Victory));
            assert_eq!(engine.rewards().exp, 10);
            assert_eq!(engine.rewards().gold, 5);
            assert_eq!(engine.rewards().items, [DropKind::Item(ITEM_POTION)]);
            engine.update(&mut ctx);
            assert_eq!(engine.phase(), BattlePhase::None);
        }
        assert_eq!(party.gold(), gold + 5);
        assert_eq!(party.num_items(ITEM_POTION), 4);
        assert_eq!(party.actor(ACTOR_HERO).unwrap().exp(), hero_exp + 10);
        assert!(party.actor(ActorId(9)).unwrap().exp() < hero_exp + 10);
        assert_eq!(record.win_count, 1);
        let messages: Vec<_> = log.messages().cloned().collect();
        assert!(messages.contains(&BattleMessage::Victory("Hero".into())));
        assert!(messages.contains(&BattleMessage::ObtainItem("Potion".into())));
    }

    #[test]
    fn defeat_revives_when_losing_is_allowed() {
        let db = fixture_db();
        let rng = FixedRng(0.5);
        let mut party = fixture_party(&db);
        let mut troop = Troop::new();
        {
            let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop);
            let mut engine = BattleEngine::new();
            engine.setup(&mut ctx, TROOP_SLIME, false, true).unwrap();
            engine.start_battle(&mut ctx, Encounter::Normal);
            let env = ctx.env;
            ctx.battler_mut(HERO).set_hp(&env, 0);
            engine.update(&mut ctx);
            assert_eq!(engine.outcome(), Some(BattleOutcome::Defeat));
            engine.update(&mut ctx);
        }
        assert_eq!(party.actor(ACTOR_HERO).unwrap().hp(), 1);
        assert!(!party.is_all_dead());
    }
}
