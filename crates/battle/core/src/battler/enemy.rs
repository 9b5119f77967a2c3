//! Enemy specifics: naming, rewards and the action pattern AI.

use tracing::trace;

use super::{ActionState, Battler, BattlerKind};
use crate::context::{BattleEnv, GameSwitches};
use crate::data::{ActionCondition, DataError, Database, DropKind, EnemyAction, EnemyId, ItemRef};
use crate::unit::Party;

/// Enemy-only battler state.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnemyProfile {
    pub enemy_id: EnemyId,
    /// Disambiguation suffix such as `" A"`, assigned by the troop.
    pub letter: String,
    /// Set when another living troop member shares the name.
    pub plural: bool,
}

impl EnemyProfile {
    pub fn new(enemy_id: EnemyId) -> Self {
        Self {
            enemy_id,
            letter: String::new(),
            plural: false,
        }
    }
}

/// World state read by action pattern conditions.
#[derive(Clone, Copy, Debug)]
pub struct PatternContext<'a> {
    pub party: &'a Party,
    pub turn_count: i32,
    pub switches: &'a GameSwitches,
}

impl Battler {
    pub fn enemy_id(&self) -> Option<EnemyId> {
        self.enemy_profile().map(|profile| profile.enemy_id)
    }

    pub fn exp_reward(&self, db: &Database) -> i32 {
        self.enemy_id()
            .and_then(|id| db.enemy(id))
            .map_or(0, |enemy| enemy.exp)
    }

    pub fn gold_reward(&self, db: &Database) -> i32 {
        self.enemy_id()
            .and_then(|id| db.enemy(id))
            .map_or(0, |enemy| enemy.gold)
    }

    /// Rolls each drop slot once. With `doubled` every chance is twice as high.
    pub fn make_drop_items(&self, env: &BattleEnv<'_>, doubled: bool) -> Vec<DropKind> {
        let Some(enemy) = self.enemy_id().and_then(|id| env.db.enemy(id)) else {
            return Vec::new();
        };
        let rate = if doubled { 2.0 } else { 1.0 };
        enemy
            .drop_items
            .iter()
            .filter(|drop| drop.kind != DropKind::None)
            .filter(|drop| env.random() * f64::from(drop.denominator) < rate)
            .map(|drop| drop.kind)
            .collect()
    }

    // ===== action patterns =====

    pub fn meets_condition(&self, db: &Database, action: &EnemyAction, world: &PatternContext<'_>) -> bool {
        match action.condition {
            ActionCondition::Always => true,
            ActionCondition::Turn { a, b } => meets_turn_condition(world.turn_count, a, b),
            ActionCondition::Hp { min, max } => {
                let rate = self.hp_rate(db);
                rate >= min && rate <= max
            }
            ActionCondition::Mp { min, max } => {
                let rate = self.mp_rate(db);
                rate >= min && rate <= max
            }
            ActionCondition::State(state_id) => self.is_state_affected(state_id),
            ActionCondition::PartyLevel(level) => world.party.highest_level() >= level,
            ActionCondition::Switch(id) => world.switches.value(id),
        }
    }

    pub fn is_action_valid(&self, db: &Database, action: &EnemyAction, world: &PatternContext<'_>) -> bool {
        self.meets_condition(db, action, world)
            && self.can_use(db, world.party, ItemRef::Skill(action.skill_id))
    }

    /// Allocates action slots and fills each with a rating-weighted pick
    /// among the valid patterns.
    pub fn make_enemy_actions(&mut self, env: &BattleEnv<'_>, world: &PatternContext<'_>) {
        self.make_actions_base(env);
        if self.num_actions() > 0 {
            let valid: Vec<EnemyAction> = self
                .enemy_id()
                .and_then(|id| env.db.enemy(id))
                .map(|enemy| {
                    enemy
                        .actions
                        .iter()
                        .filter(|action| self.is_action_valid(env.db, action, world))
                        .copied()
                        .collect()
                })
                .unwrap_or_default();
            if !valid.is_empty() {
                self.select_all_actions(env, &valid);
            }
        }
        self.set_action_state(ActionState::Waiting);
    }

    fn select_all_actions(&mut self, env: &BattleEnv<'_>, valid: &[EnemyAction]) {
        let rating_max = valid.iter().map(|a| a.rating).max().unwrap_or(0);
        let rating_zero = rating_max - 3;
        let candidates: Vec<&EnemyAction> =
            valid.iter().filter(|a| a.rating > rating_zero).collect();
        for index in 0..self.num_actions() {
            let picked = select_action(env, &candidates, rating_zero);
            if let Some(action) = self.action_mut(index) {
                match picked {
                    Some(pattern) => action.set_skill(pattern.skill_id),
                    None => action.clear(),
                }
            }
            trace!(battler = %self.id, index, skill = ?picked.map(|p| p.skill_id), "enemy action");
        }
    }

    /// Turns into another enemy. The letter is dropped when the name changes.
    pub fn transform(
        &mut self,
        env: &BattleEnv<'_>,
        world: &PatternContext<'_>,
        enemy_id: EnemyId,
    ) -> Result<(), DataError> {
        env.db.enemies.require(enemy_id)?;
        let old_name = self.original_name(env.db);
        if let BattlerKind::Enemy(profile) = &mut self.kind {
            profile.enemy_id = enemy_id;
        }
        if self.original_name(env.db) != old_name {
            if let Some(profile) = self.enemy_profile_mut() {
                profile.letter.clear();
                profile.plural = false;
            }
        }
        self.refresh(env);
        if self.num_actions() > 0 {
            self.make_enemy_actions(env, world);
        }
        Ok(())
    }
}

/// Turn `a + b * k`; with `b == 0`, exactly turn `a`.
fn meets_turn_condition(turn: i32, a: i32, b: i32) -> bool {
    if b == 0 {
        turn == a
    } else {
        turn > 0 && turn >= a && turn % b == a % b
    }
}

fn select_action<'p>(
    env: &BattleEnv<'_>,
    candidates: &[&'p EnemyAction],
    rating_zero: i32,
) -> Option<&'p EnemyAction> {
    let sum: i32 = candidates.iter().map(|a| a.rating - rating_zero).sum();
    if sum <= 0 {
        return None;
    }
    let mut value = env.random_int(sum);
    for &action in candidates {
        value -= action.rating - rating_zero;
        if value < 0 {
            return Some(action);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DropItem, EnemyData, ItemId, SkillId};
    use crate::rng::{FixedRng, ScriptedRng};
    use crate::testing::{ENEMY_SLIME, SKILL_FIRE, fixture_db, fixture_party};

    #[test]
    fn turn_conditions() {
        assert!(meets_turn_condition(3, 3, 0));
        assert!(!meets_turn_condition(4, 3, 0));
        // every 2 turns from turn 1
        assert!(meets_turn_condition(1, 1, 2));
        assert!(!meets_turn_condition(2, 1, 2));
        assert!(meets_turn_condition(5, 1, 2));
        assert!(!meets_turn_condition(0, 0, 2));
    }

    #[test]
    fn low_rated_patterns_are_never_picked() {
        let mut db = fixture_db();
        db.enemies.upsert(
            EnemyData::new(50, "Mage", [80, 50, 10, 10, 10, 10, 10, 10])
                .with_action(EnemyAction::new(1, 9))
                .with_action(EnemyAction::new(SKILL_FIRE.0, 5)),
        );
        let party = fixture_party(&db);
        let switches = GameSwitches::new();
        let world = PatternContext {
            party: &party,
            turn_count: 1,
            switches: &switches,
        };
        let rng = FixedRng(0.99);
        let env = BattleEnv::new(&db, &rng);
        let mut mage = Battler::new_enemy(&db, EnemyId(50), 0).unwrap();

        for _ in 0..10 {
            mage.make_enemy_actions(&env, &world);
            let skill = mage.current_action().and_then(|a| a.item());
            assert_eq!(skill, Some(ItemRef::Skill(SkillId(1))));
        }
        assert_eq!(mage.action_state(), ActionState::Waiting);
    }

    #[test]
    fn weights_split_by_rating_above_zero() {
        let mut db = fixture_db();
        db.enemies.upsert(
            EnemyData::new(51, "Pair", [80, 50, 10, 10, 10, 10, 10, 10])
                .with_action(EnemyAction::new(1, 5))
                .with_action(EnemyAction::new(2, 4)),
        );
        let party = fixture_party(&db);
        let switches = GameSwitches::new();
        let world = PatternContext {
            party: &party,
            turn_count: 1,
            switches: &switches,
        };
        // zero = 2; weights 3 and 2; draws of 0..5
        let rng = ScriptedRng::new([0.0, 0.7], 0.0);
        let env = BattleEnv::new(&db, &rng);
        let mut pair = Battler::new_enemy(&db, EnemyId(51), 0).unwrap();
        pair.make_enemy_actions(&env, &world);
        assert_eq!(pair.current_action().and_then(|a| a.item()), Some(ItemRef::Skill(SkillId(1))));
        pair.make_enemy_actions(&env, &world);
        assert_eq!(pair.current_action().and_then(|a| a.item()), Some(ItemRef::Skill(SkillId(2))));
    }

    #[test]
    fn drops_roll_against_denominator() {
        let mut db = fixture_db();
        db.enemies.upsert(
            EnemyData::new(52, "Rich", [80, 0, 10, 10, 10, 10, 10, 10])
                .with_drop(DropItem::new(DropKind::Item(ItemId(1)), 2)),
        );
        let slime = Battler::new_enemy(&db, EnemyId(52), 0).unwrap();
        let rng = FixedRng(0.6);
        let env = BattleEnv::new(&db, &rng);
        assert!(slime.make_drop_items(&env, false).is_empty());
        assert_eq!(slime.make_drop_items(&env, true), vec![DropKind::Item(ItemId(1))]);
    }

    #[test]
    fn transform_keeps_letter_only_for_same_name() {
        let db = fixture_db();
        let party = fixture_party(&db);
        let switches = GameSwitches::new();
        let world = PatternContext {
            party: &party,
            turn_count: 0,
            switches: &switches,
        };
        let rng = FixedRng(0.0);
        let env = BattleEnv::new(&db, &rng);
        let mut slime = Battler::new_enemy(&db, ENEMY_SLIME, 0).unwrap();
        if let Some(profile) = slime.enemy_profile_mut() {
            profile.letter = String::from(" A");
            profile.plural = true;
        }
        slime.transform(&env, &world, ENEMY_SLIME).unwrap();
        assert_eq!(slime.name(&db), "Slime A");

        slime.transform(&env, &world, crate::testing::ENEMY_BAT).unwrap();
        assert_eq!(slime.name(&db), "Bat");
        assert!(slime.transform(&env, &world, EnemyId(404)).is_err());
    }
}
