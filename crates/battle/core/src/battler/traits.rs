//! Trait aggregation over a battler's current sources.
//!
//! Rates multiply (`traits_pi`), additive params sum (`traits_sum`) and
//! set-like traits collect distinct data ids. Nothing here is cached; every
//! query walks the sources again.

use std::collections::BTreeSet;

use super::{Battler, BattlerKind};
use crate::config::BattleConfig;
use crate::data::{
    CollapseEffect, Database, PartyAbility, SkillId, SpecialFlag, SpecialFlags, StateId, Trait,
    TraitCode,
};

impl Battler {
    /// Trait lists currently affecting this battler: active states first,
    /// then the actor, class and equipment, or the enemy template.
    pub fn trait_objects<'d>(&'d self, db: &'d Database) -> Vec<&'d [Trait]> {
        let mut objects: Vec<&[Trait]> = self
            .states
            .iter()
            .filter_map(|&id| db.state(id))
            .map(|state| state.traits.as_slice())
            .collect();
        match &self.kind {
            BattlerKind::Actor(profile) => {
                if let Some(actor) = db.actor(profile.actor_id) {
                    objects.push(&actor.traits);
                }
                if let Some(class) = db.class(profile.class_id) {
                    objects.push(&class.traits);
                }
                objects.extend(profile.equips.iter().flatten().map(|&item| db.equip_traits(item)));
            }
            BattlerKind::Enemy(profile) => {
                if let Some(enemy) = db.enemy(profile.enemy_id) {
                    objects.push(&enemy.traits);
                }
            }
        }
        objects
    }

    pub fn all_traits<'d>(&'d self, db: &'d Database) -> impl Iterator<Item = &'d Trait> + 'd {
        self.trait_objects(db).into_iter().flatten()
    }

    pub fn traits<'d>(
        &'d self,
        db: &'d Database,
        code: TraitCode,
    ) -> impl Iterator<Item = &'d Trait> + 'd {
        self.all_traits(db).filter(move |t| t.code == code)
    }

    pub fn traits_with_id<'d>(
        &'d self,
        db: &'d Database,
        code: TraitCode,
        data_id: i32,
    ) -> impl Iterator<Item = &'d Trait> + 'd {
        self.traits(db, code).filter(move |t| t.data_id == data_id)
    }

    /// Product of matching trait values, 1 when none match.
    pub fn traits_pi(&self, db: &Database, code: TraitCode, data_id: i32) -> f64 {
        self.traits_with_id(db, code, data_id)
            .map(|t| t.value)
            .product()
    }

    /// Sum of matching trait values, 0 when none match.
    pub fn traits_sum(&self, db: &Database, code: TraitCode, data_id: i32) -> f64 {
        self.traits_with_id(db, code, data_id).map(|t| t.value).sum()
    }

    pub fn traits_sum_all(&self, db: &Database, code: TraitCode) -> f64 {
        self.traits(db, code).map(|t| t.value).sum()
    }

    /// Distinct data ids of matching traits, in ascending order.
    pub fn traits_set(&self, db: &Database, code: TraitCode) -> BTreeSet<i32> {
        self.traits(db, code).map(|t| t.data_id).collect()
    }

    // ===== rates =====

    pub fn element_rate(&self, db: &Database, element_id: i32) -> f64 {
        self.traits_pi(db, TraitCode::ElementRate, element_id)
    }

    pub fn debuff_rate(&self, db: &Database, param_id: usize) -> f64 {
        self.traits_pi(db, TraitCode::DebuffRate, param_id as i32)
    }

    pub fn state_rate(&self, db: &Database, state_id: StateId) -> f64 {
        self.traits_pi(db, TraitCode::StateRate, state_id.0 as i32)
    }

    pub fn state_resist_set(&self, db: &Database) -> BTreeSet<i32> {
        self.traits_set(db, TraitCode::StateResist)
    }

    pub fn is_state_resist(&self, db: &Database, state_id: StateId) -> bool {
        self.traits_with_id(db, TraitCode::StateResist, state_id.0 as i32)
            .next()
            .is_some()
    }

    // ===== attack =====

    /// Elements of a normal attack. Unarmed player characters hit with the
    /// bare-hands element.
    pub fn attack_elements(&self, db: &Database) -> BTreeSet<i32> {
        let mut elements = self.traits_set(db, TraitCode::AttackElement);
        if self.has_no_weapons() {
            elements.insert(BattleConfig::BARE_HANDS_ELEMENT_ID);
        }
        elements
    }

    pub fn attack_states(&self, db: &Database) -> Vec<StateId> {
        self.traits_set(db, TraitCode::AttackState)
            .into_iter()
            .filter_map(|id| u32::try_from(id).ok())
            .map(StateId)
            .collect()
    }

    pub fn attack_states_rate(&self, db: &Database, state_id: StateId) -> f64 {
        self.traits_sum(db, TraitCode::AttackState, state_id.0 as i32)
    }

    pub fn attack_speed(&self, db: &Database) -> f64 {
        self.traits_sum_all(db, TraitCode::AttackSpeed)
    }

    pub fn attack_times_add(&self, db: &Database) -> f64 {
        self.traits_sum_all(db, TraitCode::AttackTimes).max(0.0)
    }

    // ===== skills =====

    pub fn added_skill_types(&self, db: &Database) -> BTreeSet<i32> {
        self.traits_set(db, TraitCode::AddSkillType)
    }

    pub fn is_skill_type_sealed(&self, db: &Database, stype_id: u32) -> bool {
        self.traits_set(db, TraitCode::SealSkillType)
            .contains(&(stype_id as i32))
    }

    pub fn added_skills(&self, db: &Database) -> Vec<SkillId> {
        self.traits_set(db, TraitCode::AddSkill)
            .into_iter()
            .filter_map(|id| u32::try_from(id).ok())
            .map(SkillId)
            .collect()
    }

    pub fn is_skill_sealed(&self, db: &Database, skill_id: SkillId) -> bool {
        self.traits_set(db, TraitCode::SealSkill)
            .contains(&(skill_id.0 as i32))
    }

    // ===== equipment =====

    pub fn is_equip_wtype_ok(&self, db: &Database, wtype_id: u32) -> bool {
        self.traits_set(db, TraitCode::EquipWeaponType)
            .contains(&(wtype_id as i32))
    }

    pub fn is_equip_atype_ok(&self, db: &Database, atype_id: u32) -> bool {
        self.traits_set(db, TraitCode::EquipArmorType)
            .contains(&(atype_id as i32))
    }

    pub fn is_equip_type_locked(&self, db: &Database, etype_id: u32) -> bool {
        self.traits_set(db, TraitCode::LockEquip)
            .contains(&(etype_id as i32))
    }

    pub fn is_equip_type_sealed(&self, db: &Database, etype_id: u32) -> bool {
        self.traits_set(db, TraitCode::SealEquip)
            .contains(&(etype_id as i32))
    }

    pub fn slot_type(&self, db: &Database) -> i32 {
        self.traits_set(db, TraitCode::SlotType)
            .last()
            .copied()
            .unwrap_or(0)
    }

    pub fn is_dual_wield(&self, db: &Database) -> bool {
        self.slot_type(db) == 1
    }

    // ===== other =====

    pub fn action_plus_set(&self, db: &Database) -> Vec<f64> {
        self.traits(db, TraitCode::ActionPlus)
            .map(|t| t.value)
            .collect()
    }

    pub fn special_flags(&self, db: &Database) -> SpecialFlags {
        self.traits(db, TraitCode::SpecialFlag)
            .fold(SpecialFlags::empty(), |flags, t| {
                flags | SpecialFlags::from_data_id(t.data_id)
            })
    }

    pub fn special_flag(&self, db: &Database, flag: SpecialFlag) -> bool {
        self.traits_with_id(db, TraitCode::SpecialFlag, flag as i32)
            .next()
            .is_some()
    }

    pub fn collapse_type(&self, db: &Database) -> CollapseEffect {
        self.traits_set(db, TraitCode::CollapseType)
            .last()
            .and_then(|&id| u8::try_from(id).ok())
            .and_then(CollapseEffect::from_repr)
            .unwrap_or_default()
    }

    pub fn party_ability(&self, db: &Database, ability: PartyAbility) -> bool {
        self.traits_with_id(db, TraitCode::PartyAbility, ability as i32)
            .next()
            .is_some()
    }

    pub fn is_auto_battle(&self, db: &Database) -> bool {
        self.special_flag(db, SpecialFlag::AutoBattle)
    }

    pub fn is_guard(&self, db: &Database) -> bool {
        self.special_flag(db, SpecialFlag::Guard) && self.can_move(db)
    }

    pub fn is_substitute(&self, db: &Database) -> bool {
        self.special_flag(db, SpecialFlag::Substitute) && self.can_move(db)
    }

    pub fn is_preserve_tp(&self, db: &Database) -> bool {
        self.special_flag(db, SpecialFlag::PreserveTp)
    }
}
