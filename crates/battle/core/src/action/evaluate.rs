//! Action selection: auto-battle evaluation, confusion and forced actions.

use tracing::{debug, trace};

use super::Action;
use crate::battler::{ActionState, Battler, BattlerId, PatternContext};
use crate::context::BattleContext;
use crate::data::SkillId;

/// Forced-action target index meaning "the battler's last target".
pub const TARGET_LAST: i32 = -2;
/// Forced-action target index meaning "pick at random".
pub const TARGET_RANDOM: i32 = -1;

impl Action {
    /// Scores the action for the auto-battle AI and, for single-target scopes,
    /// points it at the best candidate. Draws variance rolls per candidate.
    pub fn evaluate(&mut self, ctx: &BattleContext<'_>) -> f64 {
        let db = ctx.db();
        let for_all = self.is_for_all(db);
        let mut value = 0.0;
        for target in self.item_target_candidates(ctx) {
            let target_value = self.evaluate_with_target(ctx, target);
            if for_all {
                value += target_value;
            } else if target_value > value {
                value = target_value;
                if let Some(index) = ctx
                    .unit(target.side())
                    .member_index(target)
                    .and_then(|i| i32::try_from(i).ok())
                {
                    self.target_index = index;
                }
            }
        }
        value *= self.number_of_repeats(db, ctx.battler(self.subject)) as f64;
        if value > 0.0 {
            value += ctx.env.random();
        }
        value
    }

    /// Battlers the evaluation considers, empty for an unusable action.
    pub fn item_target_candidates(&self, ctx: &BattleContext<'_>) -> Vec<BattlerId> {
        if !self.is_valid(ctx) {
            return Vec::new();
        }
        let db = ctx.db();
        if self.is_for_opponent(db) {
            member_ids(&ctx.opponents_unit(self.subject).alive_members())
        } else if self.is_for_user(db) {
            vec![self.subject]
        } else if self.is_for_dead_friend(db) {
            member_ids(&ctx.friends_unit(self.subject).dead_members())
        } else {
            member_ids(&ctx.friends_unit(self.subject).alive_members())
        }
    }

    /// Damage dealt relative to the target's HP, or the share of max HP
    /// restored. Actions without an HP effect score 0.
    pub fn evaluate_with_target(&self, ctx: &BattleContext<'_>, target: BattlerId) -> f64 {
        let db = ctx.db();
        if !self.is_hp_effect(db) {
            return 0.0;
        }
        let subject = ctx.battler(self.subject);
        let victim = ctx.battler(target);
        let value = f64::from(self.make_damage_value(ctx.env, ctx.variables, subject, victim, false));
        if self.is_for_opponent(db) {
            value / f64::from(victim.hp().max(1))
        } else {
            let mhp = f64::from(victim.mhp(db));
            let recovery = (-value).min(mhp - f64::from(victim.hp()));
            if mhp > 0.0 { recovery / mhp } else { 0.0 }
        }
    }
}

fn member_ids(members: &[&Battler]) -> Vec<BattlerId> {
    members.iter().map(|b| b.id()).collect()
}

/// Candidates for one auto-battle slot: attack, then every usable skill.
fn make_action_list(ctx: &BattleContext<'_>, id: BattlerId) -> Vec<Action> {
    let mut attack = Action::new(id, false);
    attack.set_attack();
    let skills = ctx.battler(id).usable_skills(ctx.db(), &*ctx.party);
    core::iter::once(attack)
        .chain(skills.into_iter().map(|skill_id| {
            let mut action = Action::new(id, false);
            action.set_skill(skill_id);
            action
        }))
        .collect()
}

/// Highest strictly positive evaluation, first wins ties.
fn best_auto_action(ctx: &BattleContext<'_>, id: BattlerId) -> Option<Action> {
    let mut best_value = f64::MIN_POSITIVE;
    let mut best = None;
    for mut action in make_action_list(ctx, id) {
        let value = action.evaluate(ctx);
        trace!(battler = %id, item = ?action.item(), value, "auto battle candidate");
        if value > best_value {
            best_value = value;
            best = Some(action);
        }
    }
    best
}

/// Fills every allocated slot with the best-scoring action.
pub fn make_auto_battle_actions(ctx: &mut BattleContext<'_>, id: BattlerId) {
    let slots = ctx.battler(id).num_actions();
    let picks: Vec<Option<Action>> = (0..slots).map(|_| best_auto_action(ctx, id)).collect();
    let battler = ctx.battler_mut(id);
    for (index, pick) in picks.into_iter().enumerate() {
        if let Some(action) = pick {
            battler.set_action(index, action);
        }
    }
    battler.set_action_state(ActionState::Waiting);
}

fn make_confusion_actions(battler: &mut Battler) {
    for index in 0..battler.num_actions() {
        if let Some(action) = battler.action_mut(index) {
            action.set_confusion();
        }
    }
    battler.set_action_state(ActionState::Waiting);
}

/// Decides a battler's actions for the coming turn.
///
/// Player characters get empty slots to fill through command input unless
/// they fight automatically or are confused. Enemies pick from their action
/// patterns.
pub fn make_actions(ctx: &mut BattleContext<'_>, id: BattlerId) {
    let env = ctx.env;
    let db = env.db;
    match id {
        BattlerId::Actor(_) => {
            let battler = ctx.battler_mut(id);
            battler.make_actions_base(&env);
            let state = if battler.num_actions() > 0 {
                ActionState::Undecided
            } else {
                ActionState::Waiting
            };
            battler.set_action_state(state);
            if battler.is_auto_battle(db) {
                make_auto_battle_actions(ctx, id);
            } else if battler.is_confused(db) {
                make_confusion_actions(battler);
            }
        }
        BattlerId::Enemy(index) => {
            let world = PatternContext {
                party: &*ctx.party,
                turn_count: ctx.troop.turn_count(),
                switches: ctx.switches,
            };
            if let Some(enemy) = ctx.troop.enemy_mut(index) {
                enemy.make_enemy_actions(&env, &world);
            }
        }
    }
    debug!(battler = %id, actions = ctx.battler(id).num_actions(), "actions made");
}

/// Replaces a battler's queue with one forced skill use.
///
/// `target_index` is a member index, [`TARGET_RANDOM`] or [`TARGET_LAST`].
pub fn force_action(ctx: &mut BattleContext<'_>, id: BattlerId, skill_id: SkillId, target_index: i32) {
    let mut action = Action::new(id, true);
    action.set_skill(skill_id);
    match target_index {
        TARGET_LAST => action.set_target(ctx.battler(id).last_target_index()),
        TARGET_RANDOM => action.decide_random_target(ctx),
        index => action.set_target(index),
    }
    ctx.battler_mut(id).set_forced_action(action);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BattleEnv;
    use crate::data::{Restriction, StateData, StateId, Trait, TraitCode};
    use crate::rng::FixedRng;
    use crate::testing::{
        ACTOR_HERO, SKILL_FIRE, TROOP_SLIME, TROOP_SLIMES, fixture_db, fixture_party,
        fixture_troop,
    };

    const HERO: BattlerId = BattlerId::Actor(ACTOR_HERO);

    #[test]
    fn single_target_evaluation_prefers_the_weakest_enemy() {
        let db = fixture_db();
        let rng = FixedRng(0.0);
        let mut party = fixture_party(&db);
        let mut troop = fixture_troop(&db, TROOP_SLIMES);
        let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop);
        let env = ctx.env;
        ctx.battler_mut(BattlerId::Enemy(1)).set_hp(&env, 10);

        let mut action = Action::new(HERO, false);
        action.set_attack();
        let value = action.evaluate(&ctx);
        assert!(value > 0.0);
        assert_eq!(action.target_index(), 1);
    }

    #[test]
    fn actions_without_an_item_score_nothing() {
        let db = fixture_db();
        let rng = FixedRng(0.5);
        let mut party = fixture_party(&db);
        let mut troop = fixture_troop(&db, TROOP_SLIME);
        let ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop);
        let mut action = Action::new(HERO, false);
        assert!(action.item_target_candidates(&ctx).is_empty());
        assert_eq!(action.evaluate(&ctx), 0.0);
    }

    #[test]
    fn auto_battle_fills_every_slot() {
        let mut db = fixture_db();
        db.states.upsert(
            StateData::new(42, "Berserk Mind").with_trait(Trait::new(TraitCode::SpecialFlag, 0, 1.0)),
        );
        let rng = FixedRng(0.0);
        let mut party = fixture_party(&db);
        let mut troop = fixture_troop(&db, TROOP_SLIME);
        let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop);
        let env = ctx.env;
        ctx.battler_mut(HERO).add_state(&env, StateId(42));

        make_actions(&mut ctx, HERO);
        let hero = ctx.battler(HERO);
        assert_eq!(hero.action_state(), ActionState::Waiting);
        assert!(hero.num_actions() > 0);
        assert!(hero.actions().iter().all(|action| action.item().is_some()));
    }

    #[test]
    fn confused_characters_only_attack() {
        let mut db = fixture_db();
        db.states
            .upsert(StateData::new(41, "Confused").with_restriction(Restriction::AttackEnemy));
        let rng = FixedRng(0.0);
        let mut party = fixture_party(&db);
        let mut troop = fixture_troop(&db, TROOP_SLIME);
        let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop);
        let env = ctx.env;
        ctx.battler_mut(HERO).add_state(&env, StateId(41));

        make_actions(&mut ctx, HERO);
        let hero = ctx.battler(HERO);
        assert_eq!(hero.action_state(), ActionState::Waiting);
        assert!(hero.actions().iter().all(Action::is_attack));
    }

    #[test]
    fn forced_actions_replace_the_queue() {
        let db = fixture_db();
        let rng = FixedRng(0.0);
        let mut party = fixture_party(&db);
        let mut troop = fixture_troop(&db, TROOP_SLIME);
        let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop);

        make_actions(&mut ctx, HERO);
        force_action(&mut ctx, HERO, SKILL_FIRE, TARGET_RANDOM);
        let hero = ctx.battler(HERO);
        assert_eq!(hero.num_actions(), 1);
        let action = hero.current_action().unwrap();
        assert!(action.is_forcing());
        assert_eq!(action.item(), Some(crate::data::ItemRef::Skill(SKILL_FIRE)));
        assert_eq!(action.target_index(), 0);
    }
}
