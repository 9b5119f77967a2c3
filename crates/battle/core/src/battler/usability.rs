//! Whether a battler may use a skill or item right now.

use super::Battler;
use crate::config::BattleConfig;
use crate::data::{Database, ItemData, ItemRef, SkillData, Usage};
use crate::unit::Party;

impl Battler {
    /// MP cost scaled by the MP cost rate, floored.
    pub fn skill_mp_cost(&self, db: &Database, skill: &SkillData) -> i32 {
        (f64::from(skill.mp_cost) * self.mcr(db)).floor() as i32
    }

    pub fn skill_tp_cost(&self, skill: &SkillData) -> i32 {
        skill.tp_cost
    }

    pub fn can_pay_skill_cost(&self, db: &Database, skill: &SkillData) -> bool {
        self.tp >= self.skill_tp_cost(skill) && self.mp >= self.skill_mp_cost(db, skill)
    }

    /// Deducts costs directly; callers check [`Battler::can_use`] first.
    pub fn pay_skill_cost(&mut self, db: &Database, skill: &SkillData) {
        self.mp -= self.skill_mp_cost(db, skill);
        self.tp -= self.skill_tp_cost(skill);
    }

    /// Weapon requirement of a skill. Enemies carry no weapons and always pass.
    pub fn is_skill_wtype_ok(&self, db: &Database, skill: &SkillData) -> bool {
        if self.is_enemy() {
            return true;
        }
        let [first, second] = skill.required_wtype_ids;
        if first == 0 && second == 0 {
            return true;
        }
        (first > 0 && self.is_wtype_equipped(db, first))
            || (second > 0 && self.is_wtype_equipped(db, second))
    }

    fn meets_usable_item_conditions(&self, db: &Database, usage: &Usage, in_battle: bool) -> bool {
        self.can_move(db) && usage.occasion.allows(in_battle)
    }

    /// Skill gate: able to move, right occasion, weapon, cost and neither the
    /// skill nor its type sealed.
    pub fn meets_skill_conditions(&self, db: &Database, skill: &SkillData, in_battle: bool) -> bool {
        self.meets_usable_item_conditions(db, &skill.usage, in_battle)
            && self.is_skill_wtype_ok(db, skill)
            && self.can_pay_skill_cost(db, skill)
            && !self.is_skill_sealed(db, skill.id)
            && !self.is_skill_type_sealed(db, skill.stype_id)
    }

    pub fn meets_item_conditions(
        &self,
        db: &Database,
        item: &ItemData,
        party: &Party,
    ) -> bool {
        self.meets_usable_item_conditions(db, &item.usage, party.in_battle())
            && party.has_item(item.id)
    }

    /// Full usability check. Unknown ids are never usable.
    pub fn can_use(&self, db: &Database, party: &Party, item: ItemRef) -> bool {
        match item {
            ItemRef::Skill(id) => db
                .skill(id)
                .is_some_and(|skill| self.meets_skill_conditions(db, skill, party.in_battle())),
            ItemRef::Item(id) => db
                .item(id)
                .is_some_and(|data| self.meets_item_conditions(db, data, party)),
        }
    }

    pub fn can_attack(&self, db: &Database, party: &Party) -> bool {
        self.can_use(db, party, ItemRef::Skill(BattleConfig::ATTACK_SKILL_ID))
    }

    pub fn can_guard(&self, db: &Database, party: &Party) -> bool {
        self.can_use(db, party, ItemRef::Skill(BattleConfig::GUARD_SKILL_ID))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BattleEnv;
    use crate::data::{SkillId, Trait, TraitCode};
    use crate::rng::FixedRng;
    use crate::testing::{
        ACTOR_HERO, ENEMY_SLIME, ITEM_POTION, SKILL_FIRE, STATE_SLEEP, fixture_db, fixture_party,
    };

    #[test]
    fn mp_cost_gates_skills() {
        let db = fixture_db();
        let rng = FixedRng(0.0);
        let env = BattleEnv::new(&db, &rng);
        let party = fixture_party(&db);
        let mut hero = Battler::new_actor(&db, ACTOR_HERO).unwrap();
        let fire = db.skill(SKILL_FIRE).unwrap();

        assert!(hero.can_use(&db, &party, ItemRef::Skill(SKILL_FIRE)));
        hero.set_mp(&env, fire.mp_cost - 1);
        assert!(!hero.can_use(&db, &party, ItemRef::Skill(SKILL_FIRE)));
        assert!(hero.can_attack(&db, &party));
    }

    #[test]
    fn sealed_skill_types_block_use() {
        let mut db = fixture_db();
        let class_id = db.actor(ACTOR_HERO).unwrap().class_id;
        let mut class = db.class(class_id).unwrap().clone();
        class.traits.push(Trait::new(TraitCode::SealSkillType, 1, 1.0));
        db.classes.upsert(class);
        let party = fixture_party(&db);
        let hero = Battler::new_actor(&db, ACTOR_HERO).unwrap();
        assert!(!hero.can_use(&db, &party, ItemRef::Skill(SKILL_FIRE)));
        assert!(!hero.can_use(&db, &party, ItemRef::Skill(SkillId(999))));
    }

    #[test]
    fn restricted_battlers_use_nothing() {
        let db = fixture_db();
        let rng = FixedRng(0.0);
        let env = BattleEnv::new(&db, &rng);
        let party = fixture_party(&db);
        let mut slime = Battler::new_enemy(&db, ENEMY_SLIME, 0).unwrap();
        assert!(slime.can_attack(&db, &party));
        slime.add_state(&env, STATE_SLEEP);
        assert!(!slime.can_attack(&db, &party));
    }

    #[test]
    fn items_require_inventory() {
        let db = fixture_db();
        let mut party = fixture_party(&db);
        let hero = Battler::new_actor(&db, ACTOR_HERO).unwrap();
        assert!(hero.can_use(&db, &party, ItemRef::Item(ITEM_POTION)));
        party.lose_item(ITEM_POTION, 99);
        assert!(!hero.can_use(&db, &party, ItemRef::Item(ITEM_POTION)));
    }
}
