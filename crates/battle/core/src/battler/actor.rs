//! Player-character specifics: levels, experience, skills and equipment.

use std::collections::BTreeMap;

use tracing::debug;

use super::Battler;
use crate::context::BattleEnv;
use crate::data::{
    ActorData, ArmorData, ArmorId, ClassId, Database, EquipItem, ItemRef, SkillId, WeaponData,
    WeaponId,
};
use crate::unit::Party;

/// Actor-only battler state.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorProfile {
    pub actor_id: crate::data::ActorId,
    pub name: String,
    pub class_id: ClassId,
    pub level: i32,
    pub max_level: i32,
    /// Accumulated experience per class.
    pub exp: BTreeMap<ClassId, i32>,
    /// Learned skills, ascending.
    pub skills: Vec<SkillId>,
    /// One entry per equipment slot.
    pub equips: Vec<Option<EquipItem>>,
    /// Action slot being filled in during command input.
    pub action_input_index: usize,
}

impl ActorProfile {
    pub fn from_data(db: &Database, data: &ActorData) -> Self {
        let mut profile = Self {
            actor_id: data.id,
            name: data.name.clone(),
            class_id: data.class_id,
            level: data.initial_level,
            max_level: data.max_level,
            exp: BTreeMap::new(),
            skills: Vec::new(),
            equips: Vec::new(),
            action_input_index: 0,
        };
        if let Some(class) = db.class(data.class_id) {
            for learning in &class.learnings {
                if learning.level <= profile.level {
                    profile.learn_skill(learning.skill_id);
                }
            }
            profile
                .exp
                .insert(data.class_id, class.exp_for_level(profile.level));
        }
        profile
    }

    pub fn learn_skill(&mut self, skill_id: SkillId) -> bool {
        match self.skills.binary_search(&skill_id) {
            Ok(_) => false,
            Err(pos) => {
                self.skills.insert(pos, skill_id);
                true
            }
        }
    }

    pub fn forget_skill(&mut self, skill_id: SkillId) {
        self.skills.retain(|&id| id != skill_id);
    }

    pub fn is_learned_skill(&self, skill_id: SkillId) -> bool {
        self.skills.binary_search(&skill_id).is_ok()
    }

    pub fn current_exp(&self) -> i32 {
        self.exp.get(&self.class_id).copied().unwrap_or(0)
    }
}

/// Announced when experience raises an actor's level.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelUp {
    pub level: i32,
    pub new_skills: Vec<SkillId>,
}

impl Battler {
    // ===== experience =====

    pub fn exp(&self) -> i32 {
        self.actor_profile().map_or(0, ActorProfile::current_exp)
    }

    pub fn exp_for_level(&self, db: &Database, level: i32) -> i32 {
        self.actor_profile()
            .and_then(|profile| db.class(profile.class_id))
            .map_or(0, |class| class.exp_for_level(level))
    }

    pub fn current_level_exp(&self, db: &Database) -> i32 {
        self.exp_for_level(db, self.level().unwrap_or(1))
    }

    pub fn next_level_exp(&self, db: &Database) -> i32 {
        self.exp_for_level(db, self.level().unwrap_or(1) + 1)
    }

    pub fn next_required_exp(&self, db: &Database) -> i32 {
        self.next_level_exp(db) - self.exp()
    }

    pub fn is_max_level(&self) -> bool {
        self.actor_profile()
            .is_some_and(|profile| profile.level >= profile.max_level)
    }

    /// Sets total experience, moving the level up or down to match.
    /// Returns the level-up announcement when the level rose.
    pub fn change_exp(&mut self, env: &BattleEnv<'_>, exp: i32) -> Option<LevelUp> {
        let db = env.db;
        let class_id = self.actor_profile()?.class_id;
        let last_level = self.level()?;
        let last_skills = self.skills(db);
        if let Some(profile) = self.actor_profile_mut() {
            profile.exp.insert(class_id, exp.max(0));
        }
        while !self.is_max_level() && self.exp() >= self.next_level_exp(db) {
            self.level_up(db);
        }
        while self.exp() < self.current_level_exp(db) {
            self.level_down();
        }
        self.refresh(env);

        let level = self.level()?;
        (level > last_level).then(|| {
            let new_skills = self
                .skills(db)
                .into_iter()
                .filter(|id| !last_skills.contains(id))
                .collect();
            debug!(battler = %self.id, level, "level up");
            LevelUp { level, new_skills }
        })
    }

    fn level_up(&mut self, db: &Database) {
        let Some(profile) = self.actor_profile_mut() else {
            return;
        };
        profile.level += 1;
        let level = profile.level;
        if let Some(class) = db.class(profile.class_id) {
            for learning in class.learnings.iter().filter(|l| l.level == level) {
                profile.learn_skill(learning.skill_id);
            }
        }
    }

    fn level_down(&mut self) {
        if let Some(profile) = self.actor_profile_mut() {
            profile.level -= 1;
        }
    }

    /// Experience is scaled by EXR. Bench members gain nothing unless
    /// `extra_exp` is configured.
    pub fn final_exp_rate(&self, env: &BattleEnv<'_>, battle_member: bool) -> f64 {
        let bench_rate = if env.config().extra_exp { 1.0 } else { 0.0 };
        self.exr(env.db) * if battle_member { 1.0 } else { bench_rate }
    }

    pub fn gain_exp(
        &mut self,
        env: &BattleEnv<'_>,
        exp: i32,
        battle_member: bool,
    ) -> Option<LevelUp> {
        let gained = crate::formula::round_half_up(
            f64::from(exp) * self.final_exp_rate(env, battle_member),
        ) as i32;
        self.change_exp(env, self.exp() + gained)
    }

    pub fn change_level(&mut self, env: &BattleEnv<'_>, level: i32) -> Option<LevelUp> {
        let max_level = self.actor_profile()?.max_level;
        let level = level.clamp(1, max_level);
        let exp = self.exp_for_level(env.db, level);
        self.change_exp(env, exp)
    }

    // ===== skills =====

    /// Learned skills followed by skills granted through traits.
    pub fn skills(&self, db: &Database) -> Vec<SkillId> {
        let mut skills = self
            .actor_profile()
            .map(|profile| profile.skills.clone())
            .unwrap_or_default();
        for id in self.added_skills(db) {
            if !skills.contains(&id) {
                skills.push(id);
            }
        }
        skills.retain(|&id| db.skill(id).is_some());
        skills
    }

    pub fn has_skill(&self, db: &Database, skill_id: SkillId) -> bool {
        self.skills(db).contains(&skill_id)
    }

    pub fn is_learned_skill(&self, skill_id: SkillId) -> bool {
        self.actor_profile()
            .is_some_and(|profile| profile.is_learned_skill(skill_id))
    }

    pub fn learn_skill(&mut self, skill_id: SkillId) -> bool {
        self.actor_profile_mut()
            .is_some_and(|profile| profile.learn_skill(skill_id))
    }

    pub fn usable_skills(&self, db: &Database, party: &Party) -> Vec<SkillId> {
        self.skills(db)
            .into_iter()
            .filter(|&id| self.can_use(db, party, ItemRef::Skill(id)))
            .collect()
    }

    // ===== equipment =====

    /// Equip type per slot. Dual wielders hold a weapon in the second slot.
    pub fn equip_slots(&self, db: &Database) -> Vec<u32> {
        let mut slots = db.system.equip_slots();
        if slots.len() >= 2 && self.is_dual_wield(db) {
            slots[1] = 1;
        }
        slots
    }

    pub fn equips(&self) -> &[Option<EquipItem>] {
        self.actor_profile().map_or(&[], |profile| profile.equips.as_slice())
    }

    pub fn weapon_ids(&self) -> Vec<WeaponId> {
        self.equips()
            .iter()
            .flatten()
            .filter_map(|item| match item {
                EquipItem::Weapon(id) => Some(*id),
                EquipItem::Armor(_) => None,
            })
            .collect()
    }

    pub fn armor_ids(&self) -> Vec<ArmorId> {
        self.equips()
            .iter()
            .flatten()
            .filter_map(|item| match item {
                EquipItem::Armor(id) => Some(*id),
                EquipItem::Weapon(_) => None,
            })
            .collect()
    }

    pub fn weapons<'d>(&self, db: &'d Database) -> Vec<&'d WeaponData> {
        self.weapon_ids()
            .into_iter()
            .filter_map(|id| db.weapon(id))
            .collect()
    }

    pub fn armors<'d>(&self, db: &'d Database) -> Vec<&'d ArmorData> {
        self.armor_ids()
            .into_iter()
            .filter_map(|id| db.armor(id))
            .collect()
    }

    /// Only actors can be unarmed; enemies have no equipment model.
    pub fn has_no_weapons(&self) -> bool {
        self.is_actor() && self.weapon_ids().is_empty()
    }

    pub fn is_wtype_equipped(&self, db: &Database, wtype_id: u32) -> bool {
        self.weapons(db).iter().any(|w| w.wtype_id == wtype_id)
    }

    pub fn is_equipped(&self, item: EquipItem) -> bool {
        self.equips().contains(&Some(item))
    }

    pub fn can_equip(&self, db: &Database, item: EquipItem) -> bool {
        match item {
            EquipItem::Weapon(id) => db.weapon(id).is_some_and(|w| {
                self.is_equip_wtype_ok(db, w.wtype_id) && !self.is_equip_type_sealed(db, w.etype_id)
            }),
            EquipItem::Armor(id) => db.armor(id).is_some_and(|a| {
                self.is_equip_atype_ok(db, a.atype_id) && !self.is_equip_type_sealed(db, a.etype_id)
            }),
        }
    }

    pub fn is_equip_change_ok(&self, db: &Database, slot: usize) -> bool {
        let Some(&etype) = self.equip_slots(db).get(slot) else {
            return false;
        };
        !self.is_equip_type_locked(db, etype) && !self.is_equip_type_sealed(db, etype)
    }

    /// Fills the slots from raw data ids: weapon-type slots read weapons,
    /// the others armors. Invalid equipment is discarded.
    pub fn init_equips(&mut self, db: &Database, ids: &[u32]) {
        let slots = self.equip_slots(db);
        let equips = slots
            .iter()
            .enumerate()
            .map(|(i, &etype)| match ids.get(i).copied() {
                Some(0) | None => None,
                Some(id) if etype == 1 => Some(EquipItem::Weapon(WeaponId(id))),
                Some(id) => Some(EquipItem::Armor(ArmorId(id))),
            })
            .collect();
        if let Some(profile) = self.actor_profile_mut() {
            profile.equips = equips;
        }
        self.take_unequippable_items(db);
    }

    /// Replaces the item in `slot` and returns the previous one. No checks.
    pub(crate) fn put_equip(&mut self, slot: usize, item: Option<EquipItem>) -> Option<EquipItem> {
        let profile = self.actor_profile_mut()?;
        let cell = profile.equips.get_mut(slot)?;
        core::mem::replace(cell, item)
    }

    /// Equips without touching the inventory; the old item is lost.
    pub fn force_change_equip(&mut self, env: &BattleEnv<'_>, slot: usize, item: Option<EquipItem>) {
        self.put_equip(slot, item);
        self.take_unequippable_items(env.db);
        self.refresh(env);
    }

    /// Unequips everything the actor can no longer wear and returns it.
    /// Repeats until stable, since removing one item can invalidate another.
    pub(crate) fn take_unequippable_items(&mut self, db: &Database) -> Vec<EquipItem> {
        let mut released = Vec::new();
        loop {
            let slots = self.equip_slots(db);
            let invalid: Vec<usize> = self
                .equips()
                .iter()
                .enumerate()
                .filter_map(|(i, item)| {
                    let item = (*item)?;
                    let fits = db.equip_etype(item) == slots.get(i).copied();
                    (!fits || !self.can_equip(db, item)).then_some(i)
                })
                .collect();
            if invalid.is_empty() {
                break;
            }
            for slot in invalid {
                released.extend(self.put_equip(slot, None));
            }
        }
        released
    }

    /// Equipment slot etype check used when the player picks an item.
    pub fn fits_slot(&self, db: &Database, slot: usize, item: EquipItem) -> bool {
        db.equip_etype(item) == self.equip_slots(db).get(slot).copied()
    }
}
