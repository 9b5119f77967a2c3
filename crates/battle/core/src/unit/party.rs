//! The player's party: actor registry, roster order and inventory.

use std::collections::BTreeMap;

use tracing::debug;

use super::{Side, Unit};
use crate::battler::{Battler, BattlerId};
use crate::config::BattleConfig;
use crate::context::BattleEnv;
use crate::data::{
    ActorId, ArmorId, DataError, Database, DropKind, EquipItem, ItemId, PartyAbility, WeaponId,
};

/// Every actor the game knows about, the ordered roster and the shared
/// inventory.
///
/// Battle members are the first `max_battle_members` appeared roster entries
/// while a battle runs; outside a battle [`Unit::members`] is the whole roster.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Party {
    actors: BTreeMap<ActorId, Battler>,
    roster: Vec<ActorId>,
    gold: i32,
    items: BTreeMap<ItemId, i32>,
    weapons: BTreeMap<WeaponId, i32>,
    armors: BTreeMap<ArmorId, i32>,
    in_battle: bool,
    max_battle_members: usize,
    max_gold: i32,
    max_items: i32,
}

impl Party {
    pub fn new(config: &BattleConfig) -> Self {
        Self {
            actors: BTreeMap::new(),
            roster: Vec::new(),
            gold: 0,
            items: BTreeMap::new(),
            weapons: BTreeMap::new(),
            armors: BTreeMap::new(),
            in_battle: false,
            max_battle_members: config.max_battle_members,
            max_gold: config.max_gold,
            max_items: config.max_items,
        }
    }

    /// Party with the starting members listed in the system data.
    pub fn from_system(db: &Database) -> Result<Self, DataError> {
        let mut party = Self::new(&db.config);
        for &actor_id in &db.system.party_members {
            party.add_actor(db, actor_id)?;
        }
        Ok(party)
    }

    // ===== roster =====

    /// Adds an actor to the end of the roster, creating it on first use.
    pub fn add_actor(&mut self, db: &Database, actor_id: ActorId) -> Result<(), DataError> {
        if !self.actors.contains_key(&actor_id) {
            let actor = Battler::new_actor(db, actor_id)?;
            self.actors.insert(actor_id, actor);
        }
        if !self.roster.contains(&actor_id) {
            self.roster.push(actor_id);
            debug!(actor = actor_id.0, size = self.roster.len(), "actor joined the party");
        }
        Ok(())
    }

    /// Leaves the roster; the actor keeps its progress in the registry.
    pub fn remove_actor(&mut self, actor_id: ActorId) {
        self.roster.retain(|&id| id != actor_id);
    }

    pub fn swap_order(&mut self, a: usize, b: usize) {
        if a < self.roster.len() && b < self.roster.len() {
            self.roster.swap(a, b);
        }
    }

    pub fn roster(&self) -> &[ActorId] {
        &self.roster
    }

    pub fn size(&self) -> usize {
        self.roster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    pub fn actor(&self, actor_id: ActorId) -> Option<&Battler> {
        self.actors.get(&actor_id)
    }

    pub fn actor_mut(&mut self, actor_id: ActorId) -> Option<&mut Battler> {
        self.actors.get_mut(&actor_id)
    }

    pub fn all_members(&self) -> Vec<&Battler> {
        self.roster
            .iter()
            .filter_map(|id| self.actors.get(id))
            .collect()
    }

    fn battle_member_ids(&self) -> Vec<ActorId> {
        self.roster
            .iter()
            .copied()
            .filter(|id| self.actors.get(id).is_some_and(Battler::is_appeared))
            .take(self.max_battle_members)
            .collect()
    }

    fn member_actor_ids(&self) -> Vec<ActorId> {
        if self.in_battle {
            self.battle_member_ids()
        } else {
            self.roster.clone()
        }
    }

    pub fn battle_members(&self) -> Vec<&Battler> {
        self.battle_member_ids()
            .iter()
            .filter_map(|id| self.actors.get(id))
            .collect()
    }

    pub fn is_battle_member(&self, actor_id: ActorId) -> bool {
        self.battle_member_ids().contains(&actor_id)
    }

    pub fn in_battle(&self) -> bool {
        self.in_battle
    }

    pub fn highest_level(&self) -> i32 {
        self.members()
            .iter()
            .filter_map(|b| b.level())
            .max()
            .unwrap_or(0)
    }

    /// "Hero" for a lone fighter, "Hero's Party" otherwise, empty without one.
    pub fn name(&self, db: &Database) -> String {
        let members = self.battle_members();
        match members.as_slice() {
            [] => String::new(),
            [leader] => leader.name(db),
            [leader, ..] => format!("{}'s Party", leader.name(db)),
        }
    }

    pub fn can_input(&self, db: &Database) -> bool {
        self.members().iter().any(|b| b.can_input(db))
    }

    // ===== gold and inventory =====

    pub fn gold(&self) -> i32 {
        self.gold
    }

    pub fn gain_gold(&mut self, amount: i32) {
        self.gold = self.gold.saturating_add(amount).clamp(0, self.max_gold);
    }

    pub fn lose_gold(&mut self, amount: i32) {
        self.gain_gold(amount.saturating_neg());
    }

    pub fn num_items(&self, item_id: ItemId) -> i32 {
        self.items.get(&item_id).copied().unwrap_or(0)
    }

    pub fn has_item(&self, item_id: ItemId) -> bool {
        self.num_items(item_id) > 0
    }

    pub fn gain_item(&mut self, item_id: ItemId, amount: i32) {
        adjust_count(&mut self.items, item_id, amount, self.max_items);
    }

    pub fn lose_item(&mut self, item_id: ItemId, amount: i32) {
        self.gain_item(item_id, amount.saturating_neg());
    }

    /// Uses up one of a consumable item.
    pub fn consume_item(&mut self, db: &Database, item_id: ItemId) {
        if db.item(item_id).is_some_and(|item| item.consumable) {
            self.lose_item(item_id, 1);
        }
    }

    pub fn items(&self) -> impl Iterator<Item = (ItemId, i32)> + '_ {
        self.items.iter().map(|(&id, &n)| (id, n))
    }

    pub fn num_equips(&self, item: EquipItem) -> i32 {
        match item {
            EquipItem::Weapon(id) => self.weapons.get(&id).copied().unwrap_or(0),
            EquipItem::Armor(id) => self.armors.get(&id).copied().unwrap_or(0),
        }
    }

    pub fn has_equip(&self, item: EquipItem) -> bool {
        self.num_equips(item) > 0
    }

    pub fn gain_equip(&mut self, item: EquipItem, amount: i32) {
        match item {
            EquipItem::Weapon(id) => adjust_count(&mut self.weapons, id, amount, self.max_items),
            EquipItem::Armor(id) => adjust_count(&mut self.armors, id, amount, self.max_items),
        }
    }

    pub fn lose_equip(&mut self, item: EquipItem, amount: i32) {
        self.gain_equip(item, amount.saturating_neg());
    }

    /// Adds one rolled enemy drop to the inventory.
    pub fn gain_drop(&mut self, drop: DropKind, amount: i32) {
        match drop {
            DropKind::None => {}
            DropKind::Item(id) => self.gain_item(id, amount),
            DropKind::Weapon(id) => self.gain_equip(EquipItem::Weapon(id), amount),
            DropKind::Armor(id) => self.gain_equip(EquipItem::Armor(id), amount),
        }
    }

    // ===== equipment =====

    /// Swaps `item` from the inventory into an actor's slot.
    ///
    /// The replaced item and anything the actor can no longer wear go back
    /// to the inventory. Returns `false` without changes when the item is not
    /// owned, does not fit the slot or the slot is locked.
    pub fn change_equip(
        &mut self,
        env: &BattleEnv<'_>,
        actor_id: ActorId,
        slot: usize,
        item: Option<EquipItem>,
    ) -> bool {
        let db = env.db;
        let Some(actor) = self.actors.get(&actor_id) else {
            return false;
        };
        if !actor.is_equip_change_ok(db, slot) || slot >= actor.equips().len() {
            return false;
        }
        if let Some(item) = item {
            if !self.has_equip(item) || !actor.fits_slot(db, slot, item) {
                return false;
            }
        }
        let Some(actor) = self.actors.get_mut(&actor_id) else {
            return false;
        };
        let old = actor.put_equip(slot, item);
        let released = actor.take_unequippable_items(db);
        actor.refresh(env);

        if let Some(item) = item {
            self.lose_equip(item, 1);
        }
        for returned in old.into_iter().chain(released) {
            self.gain_equip(returned, 1);
        }
        true
    }

    // ===== battle =====

    pub fn party_ability(&self, db: &Database, ability: PartyAbility) -> bool {
        self.battle_members()
            .iter()
            .any(|b| b.party_ability(db, ability))
    }

    pub fn has_gold_double(&self, db: &Database) -> bool {
        self.party_ability(db, PartyAbility::GoldDouble)
    }

    pub fn has_drop_item_double(&self, db: &Database) -> bool {
        self.party_ability(db, PartyAbility::DropItemDouble)
    }

    /// Chance of a preemptive strike against a troop with agility `troop_agi`.
    pub fn rate_preemptive(&self, db: &Database, troop_agi: f64) -> f64 {
        let rate = if self.agility(db) >= troop_agi { 0.05 } else { 0.03 };
        if self.party_ability(db, PartyAbility::RaisePreemptive) {
            rate * 4.0
        } else {
            rate
        }
    }

    /// Chance of being ambushed by a troop with agility `troop_agi`.
    pub fn rate_surprise(&self, db: &Database, troop_agi: f64) -> f64 {
        if self.party_ability(db, PartyAbility::CancelSurprise) {
            return 0.0;
        }
        if self.agility(db) >= troop_agi { 0.03 } else { 0.05 }
    }

    /// Brings knocked-out battle members back at 1 HP.
    pub fn revive_battle_members(&mut self, env: &BattleEnv<'_>) {
        for id in self.battle_member_ids() {
            if let Some(actor) = self.actors.get_mut(&id) {
                if actor.is_dead() {
                    actor.set_hp(env, 1);
                }
            }
        }
    }

    pub fn remove_battle_states(&mut self, env: &BattleEnv<'_>) {
        for member in self.members_mut() {
            member.remove_battle_states(env);
        }
    }
}

fn adjust_count<K: Ord>(counts: &mut BTreeMap<K, i32>, key: K, amount: i32, max: i32) {
    let count = counts.entry(key).or_insert(0);
    *count = count.saturating_add(amount).clamp(0, max);
    counts.retain(|_, n| *n > 0);
}

impl Unit for Party {
    fn side(&self) -> Side {
        Side::Party
    }

    fn members(&self) -> Vec<&Battler> {
        self.member_actor_ids()
            .iter()
            .filter_map(|id| self.actors.get(id))
            .collect()
    }

    fn members_mut(&mut self) -> Vec<&mut Battler> {
        let ids = self.member_actor_ids();
        let mut picked: Vec<(usize, &mut Battler)> = self
            .actors
            .iter_mut()
            .filter_map(|(id, actor)| ids.iter().position(|x| x == id).map(|pos| (pos, actor)))
            .collect();
        picked.sort_by_key(|(pos, _)| *pos);
        picked.into_iter().map(|(_, actor)| actor).collect()
    }

    fn member_index(&self, id: BattlerId) -> Option<usize> {
        let BattlerId::Actor(actor_id) = id else {
            return None;
        };
        self.member_actor_ids().iter().position(|&x| x == actor_id)
    }

    /// An empty roster outside a battle is not a wipe-out.
    fn is_all_dead(&self) -> bool {
        self.alive_members().is_empty() && (self.in_battle || !self.is_empty())
    }

    fn on_battle_start(&mut self, env: &BattleEnv<'_>) {
        for member in self.members_mut() {
            member.on_battle_start(env);
        }
        self.in_battle = true;
    }

    fn on_battle_end(&mut self, env: &BattleEnv<'_>) {
        self.in_battle = false;
        for member in self.members_mut() {
            member.on_battle_end(env);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ActorData, StateData, StateId, Trait, TraitCode};
    use crate::rng::FixedRng;
    use crate::testing::{ACTOR_HERO, ITEM_POTION, WEAPON_SWORD, fixture_db, fixture_party};

    fn add_recruits(db: &mut Database, count: u32) -> Vec<ActorId> {
        (0..count)
            .map(|n| {
                let id = 50 + n;
                db.actors.upsert(ActorData::new(id, "Recruit", 1));
                ActorId(id)
            })
            .collect()
    }

    #[test]
    fn only_the_front_of_the_roster_fights() {
        let mut db = fixture_db();
        let recruits = add_recruits(&mut db, 4);
        let rng = FixedRng(0.0);
        let env = BattleEnv::new(&db, &rng);
        let mut party = fixture_party(&db);
        for &id in &recruits {
            party.add_actor(&db, id).unwrap();
        }
        assert_eq!(party.members().len(), 5);

        party.on_battle_start(&env);
        assert!(party.in_battle());
        assert_eq!(party.members().len(), db.config.max_battle_members);
        assert_eq!(party.member_index(BattlerId::Actor(ACTOR_HERO)), Some(0));
        assert_eq!(party.member_index(BattlerId::Actor(recruits[3])), None);
        assert!(party.actor(recruits[3]).is_some());

        party.on_battle_end(&env);
        assert_eq!(party.members().len(), 5);
    }

    #[test]
    fn members_mut_follows_roster_order() {
        let mut db = fixture_db();
        let recruits = add_recruits(&mut db, 2);
        let mut party = Party::new(&db.config);
        party.add_actor(&db, recruits[1]).unwrap();
        party.add_actor(&db, ACTOR_HERO).unwrap();
        party.add_actor(&db, recruits[0]).unwrap();
        party.swap_order(0, 2);

        let ids: Vec<BattlerId> = party.members_mut().iter().map(|b| b.id()).collect();
        assert_eq!(ids, party.member_ids());
        assert_eq!(ids[0], BattlerId::Actor(recruits[0]));
        assert_eq!(ids[2], BattlerId::Actor(recruits[1]));
    }

    #[test]
    fn inventory_counts_are_clamped() {
        let db = fixture_db();
        let mut party = fixture_party(&db);
        party.gain_item(ITEM_POTION, 500);
        assert_eq!(party.num_items(ITEM_POTION), db.config.max_items);
        party.lose_item(ITEM_POTION, 1000);
        assert!(!party.has_item(ITEM_POTION));
        assert_eq!(party.items().count(), 0);

        party.gain_gold(-5);
        assert_eq!(party.gold(), 0);
        party.gain_gold(i32::MAX);
        assert_eq!(party.gold(), db.config.max_gold);
    }

    #[test]
    fn consumables_are_used_up() {
        let db = fixture_db();
        let mut party = fixture_party(&db);
        let before = party.num_items(ITEM_POTION);
        party.consume_item(&db, ITEM_POTION);
        assert_eq!(party.num_items(ITEM_POTION), before - 1);
    }

    #[test]
    fn changing_equipment_trades_with_the_inventory() {
        let db = fixture_db();
        let rng = FixedRng(0.0);
        let env = BattleEnv::new(&db, &rng);
        let mut party = fixture_party(&db);
        let sword = EquipItem::Weapon(WEAPON_SWORD);

        assert!(!party.change_equip(&env, ACTOR_HERO, 0, Some(sword)));
        assert!(party.change_equip(&env, ACTOR_HERO, 0, None));
        assert_eq!(party.num_equips(sword), 1);
        assert_eq!(party.actor(ACTOR_HERO).unwrap().equips()[0], None);

        assert!(party.change_equip(&env, ACTOR_HERO, 0, Some(sword)));
        assert_eq!(party.num_equips(sword), 0);
        assert_eq!(party.actor(ACTOR_HERO).unwrap().equips()[0], Some(sword));
    }

    #[test]
    fn surprise_can_be_cancelled() {
        let mut db = fixture_db();
        db.states.upsert(StateData::new(32, "Alert").with_trait(Trait::new(
            TraitCode::PartyAbility,
            PartyAbility::CancelSurprise as i32,
            0.0,
        )));
        let rng = FixedRng(0.0);
        let env = BattleEnv::new(&db, &rng);
        let mut party = fixture_party(&db);
        assert_eq!(party.rate_surprise(&db, 0.0), 0.03);
        assert_eq!(party.rate_preemptive(&db, 1000.0), 0.03);
        party.actor_mut(ACTOR_HERO).unwrap().add_state(&env, StateId(32));
        assert_eq!(party.rate_surprise(&db, 0.0), 0.0);
    }

    #[test]
    fn revival_restores_one_hp() {
        let db = fixture_db();
        let rng = FixedRng(0.0);
        let env = BattleEnv::new(&db, &rng);
        let mut party = fixture_party(&db);
        party.actor_mut(ACTOR_HERO).unwrap().set_hp(&env, 0);
        assert!(party.is_all_dead());
        party.revive_battle_members(&env);
        let hero = party.actor(ACTOR_HERO).unwrap();
        assert_eq!(hero.hp(), 1);
        assert!(hero.is_alive());
    }
}
