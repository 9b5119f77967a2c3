//! Actions: one use of a skill or item by one battler.
//!
//! An [`Action`] only names its subject and item. Every computation reads
//! the live battlers through a [`BattleContext`](crate::BattleContext):
//!
//! 1. [`Action::make_targets`] resolves the target list once
//! 2. [`Action::apply`] resolves hit, damage and effects against one target
//! 3. [`Action::apply_global`] queues the action's common events
//!
//! The per-target outcome lands in the target's [`ActionResult`].

mod apply;
mod damage;
mod evaluate;
mod result;
mod targeting;

pub use damage::BattlerScope;
pub use evaluate::{TARGET_LAST, TARGET_RANDOM, force_action, make_actions, make_auto_battle_actions};
pub use result::ActionResult;

use crate::battler::{Battler, BattlerId};
use crate::config::BattleConfig;
use crate::context::{BattleContext, BattleEnv};
use crate::data::{
    DamageType, Database, HitType, ItemId, ItemRef, Scope, SkillId, UsableItem, Usage,
};

/// A queued or executing skill/item use.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Action {
    subject: BattlerId,
    /// Forced actions skip usability checks and confusion.
    forcing: bool,
    item: Option<ItemRef>,
    /// Index into the target unit; negative means "pick at random".
    target_index: i32,
    /// Receiver of drained HP/MP while a reflected action is applied.
    reflection_target: Option<BattlerId>,
}

impl Action {
    pub fn new(subject: BattlerId, forcing: bool) -> Self {
        Self {
            subject,
            forcing,
            item: None,
            target_index: -1,
            reflection_target: None,
        }
    }

    pub fn subject(&self) -> BattlerId {
        self.subject
    }

    pub fn is_forcing(&self) -> bool {
        self.forcing
    }

    pub fn item(&self) -> Option<ItemRef> {
        self.item
    }

    pub fn target_index(&self) -> i32 {
        self.target_index
    }

    pub fn reflection_target(&self) -> Option<BattlerId> {
        self.reflection_target
    }

    pub fn clear(&mut self) {
        self.item = None;
        self.target_index = -1;
    }

    pub fn set_skill(&mut self, skill_id: SkillId) {
        self.item = Some(ItemRef::Skill(skill_id));
    }

    pub fn set_item(&mut self, item_id: ItemId) {
        self.item = Some(ItemRef::Item(item_id));
    }

    pub fn set_item_ref(&mut self, item: Option<ItemRef>) {
        self.item = item;
    }

    pub fn set_attack(&mut self) {
        self.set_skill(BattleConfig::ATTACK_SKILL_ID);
    }

    pub fn set_guard(&mut self) {
        self.set_skill(BattleConfig::GUARD_SKILL_ID);
    }

    /// A confused battler can only attack.
    pub fn set_confusion(&mut self) {
        self.set_attack();
    }

    pub fn set_target(&mut self, target_index: i32) {
        self.target_index = target_index;
    }

    pub fn set_reflection_target(&mut self, target: Option<BattlerId>) {
        self.reflection_target = target;
    }

    // ===== item queries =====

    pub fn usable<'d>(&self, db: &'d Database) -> Option<UsableItem<'d>> {
        self.item.and_then(|item| db.usable(item))
    }

    pub fn usage<'d>(&self, db: &'d Database) -> Option<&'d Usage> {
        self.usable(db).map(|item| item.usage())
    }

    pub fn is_skill(&self) -> bool {
        matches!(self.item, Some(ItemRef::Skill(_)))
    }

    pub fn is_item(&self) -> bool {
        matches!(self.item, Some(ItemRef::Item(_)))
    }

    pub fn is_attack(&self) -> bool {
        self.item == Some(ItemRef::Skill(BattleConfig::ATTACK_SKILL_ID))
    }

    pub fn is_guard(&self) -> bool {
        self.item == Some(ItemRef::Skill(BattleConfig::GUARD_SKILL_ID))
    }

    pub fn scope(&self, db: &Database) -> Scope {
        self.usage(db).map_or(Scope::None, |usage| usage.scope)
    }

    pub fn is_for_opponent(&self, db: &Database) -> bool {
        self.scope(db).is_for_opponent()
    }

    pub fn is_for_friend(&self, db: &Database) -> bool {
        self.scope(db).is_for_friend()
    }

    pub fn is_for_dead_friend(&self, db: &Database) -> bool {
        self.scope(db).is_for_dead_friend()
    }

    pub fn is_for_user(&self, db: &Database) -> bool {
        self.scope(db).is_for_user()
    }

    pub fn is_for_one(&self, db: &Database) -> bool {
        self.scope(db).is_for_one()
    }

    pub fn is_for_random(&self, db: &Database) -> bool {
        self.scope(db).is_for_random()
    }

    pub fn is_for_all(&self, db: &Database) -> bool {
        self.scope(db).is_for_all()
    }

    pub fn needs_selection(&self, db: &Database) -> bool {
        self.scope(db).needs_selection()
    }

    pub fn hit_type(&self, db: &Database) -> HitType {
        self.usage(db).map_or(HitType::Certain, |usage| usage.hit_type)
    }

    pub fn is_certain_hit(&self, db: &Database) -> bool {
        self.hit_type(db) == HitType::Certain
    }

    pub fn is_physical(&self, db: &Database) -> bool {
        self.hit_type(db) == HitType::Physical
    }

    pub fn is_magical(&self, db: &Database) -> bool {
        self.hit_type(db) == HitType::Magical
    }

    pub fn damage_type(&self, db: &Database) -> DamageType {
        self.usage(db).map_or(DamageType::None, |usage| usage.damage.kind)
    }

    pub fn is_hp_effect(&self, db: &Database) -> bool {
        self.damage_type(db).is_hp_effect()
    }

    pub fn is_mp_effect(&self, db: &Database) -> bool {
        self.damage_type(db).is_mp_effect()
    }

    pub fn is_drain(&self, db: &Database) -> bool {
        self.damage_type(db).is_drain()
    }

    pub fn is_hp_recover(&self, db: &Database) -> bool {
        self.damage_type(db) == DamageType::HpRecover
    }

    pub fn is_mp_recover(&self, db: &Database) -> bool {
        self.damage_type(db) == DamageType::MpRecover
    }

    // ===== subject-derived values =====

    /// Applications per target: item repeats, plus extra attacks for the
    /// normal attack.
    pub fn number_of_repeats(&self, db: &Database, subject: &Battler) -> usize {
        let mut repeats = self.usage(db).map_or(1, |usage| usage.repeats) as f64;
        if self.is_attack() {
            repeats += subject.attack_times_add(db);
        }
        repeats.floor().max(0.0) as usize
    }

    /// `agi + randomInt(floor(5 + agi / 4))`, plus item speed and attack speed.
    pub fn speed(&self, env: &BattleEnv<'_>, subject: &Battler) -> i32 {
        let db = env.db;
        let agi = subject.agi(db);
        let jitter = env.random_int((5.0 + f64::from(agi) / 4.0).floor() as i32);
        let mut speed = f64::from(agi + jitter);
        if let Some(usage) = self.usage(db) {
            speed += f64::from(usage.speed);
        }
        if self.is_attack() {
            speed += subject.attack_speed(db);
        }
        speed.floor() as i32
    }

    /// Makes a confused subject attack, unless the action is forced.
    pub fn prepare(&mut self, ctx: &BattleContext<'_>) {
        if !self.forcing && ctx.battler(self.subject).is_confused(ctx.db()) {
            self.set_confusion();
        }
    }

    /// Forced actions only need an existing item; others must be usable.
    pub fn is_valid(&self, ctx: &BattleContext<'_>) -> bool {
        let db = ctx.db();
        match self.item {
            None => false,
            Some(item) if self.forcing => db.usable(item).is_some(),
            Some(item) => ctx.battler(self.subject).can_use(db, &*ctx.party, item),
        }
    }

    // ===== hit rolls =====

    pub fn item_hit(&self, db: &Database, subject: &Battler) -> f64 {
        let rate = self.usage(db).map_or(0, |usage| usage.success_rate);
        let base = f64::from(rate) * 0.01;
        if self.is_physical(db) {
            base * subject.hit(db)
        } else {
            base
        }
    }

    pub fn item_eva(&self, db: &Database, target: &Battler) -> f64 {
        match self.hit_type(db) {
            HitType::Physical => target.eva(db),
            HitType::Magical => target.mev(db),
            HitType::Certain => 0.0,
        }
    }

    pub fn item_cri(&self, db: &Database, subject: &Battler, target: &Battler) -> f64 {
        let critical = self.usage(db).is_some_and(|usage| usage.damage.critical);
        if critical {
            subject.cri(db) * (1.0 - target.cev(db))
        } else {
            0.0
        }
    }

    /// Counter chance. Only physical hits on a target able to move can be countered.
    pub fn item_cnt(&self, db: &Database, target: &Battler) -> f64 {
        if self.is_physical(db) && target.can_move(db) {
            target.cnt(db)
        } else {
            0.0
        }
    }

    /// Magic reflection chance.
    pub fn item_mrf(&self, db: &Database, target: &Battler) -> f64 {
        if self.is_magical(db) {
            target.mrf(db)
        } else {
            0.0
        }
    }

    /// `max(1 + (a.luk - b.luk) * 0.001, 0)`
    pub fn luk_effect_rate(&self, db: &Database, subject: &Battler, target: &Battler) -> f64 {
        (1.0 + f64::from(subject.luk(db) - target.luk(db)) * 0.001).max(0.0)
    }
}
