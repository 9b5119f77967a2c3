//! Static game data.
//!
//! The [`Database`] is built once, validated, and then only read by battle
//! logic. Tables are keyed by 1-based id and iterate in id order.
mod actors;
mod enemies;
mod equipment;
mod ids;
mod states;
mod system;
mod traits;
mod usable;

use std::collections::BTreeMap;

use crate::config::BattleConfig;
use crate::error::{BattleError, ErrorSeverity};

pub use actors::{ActorData, ClassData, Learning};
pub use enemies::{
    ActionCondition, DropItem, DropKind, EnemyAction, EnemyData, TroopData, TroopMember,
};
pub use equipment::{ArmorData, EquipItem, WeaponData};
pub use ids::{ActorId, ArmorId, ClassId, EnemyId, ItemId, SkillId, StateId, TroopId, WeaponId};
pub use states::{AutoRemoval, Restriction, StateData, StateMessages};
pub use system::SystemData;
pub use traits::{CollapseEffect, PartyAbility, SpecialFlag, SpecialFlags, Trait, TraitCode};
pub use usable::{
    Damage, DamageType, Effect, EffectCode, HitType, ItemData, ItemRef, Occasion,
    SPECIAL_EFFECT_ESCAPE, Scope, SkillData, UsableItem, Usage,
};

/// Errors raised while assembling or validating the database.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    /// Two rows share an id.
    #[error("duplicate {table} id {id}")]
    DuplicateId { table: &'static str, id: u32 },

    /// Id 0 is reserved for "nothing".
    #[error("{table} row uses reserved id 0")]
    ReservedId { table: &'static str },

    /// A lookup for a row that does not exist.
    #[error("{table} id {id} not found")]
    NotFound { table: &'static str, id: u32 },

    /// A row references a row of another table that does not exist.
    #[error("{owner} references missing {table} id {id}")]
    DanglingReference {
        owner: String,
        table: &'static str,
        id: u32,
    },
}

impl BattleError for DataError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateId { .. } => "DATA_DUPLICATE_ID",
            Self::ReservedId { .. } => "DATA_RESERVED_ID",
            Self::NotFound { .. } => "DATA_NOT_FOUND",
            Self::DanglingReference { .. } => "DATA_DANGLING_REFERENCE",
        }
    }
}

/// A row of a [`Table`].
pub trait Record {
    type Id: Copy + Ord + Into<u32>;
    const TABLE: &'static str;

    fn id(&self) -> Self::Id;
}

macro_rules! record {
    ($data:ty, $id:ty, $table:literal) => {
        impl Record for $data {
            type Id = $id;
            const TABLE: &'static str = $table;

            fn id(&self) -> Self::Id {
                self.id
            }
        }
    };
}

record!(ActorData, ActorId, "actor");
record!(ClassData, ClassId, "class");
record!(SkillData, SkillId, "skill");
record!(ItemData, ItemId, "item");
record!(WeaponData, WeaponId, "weapon");
record!(ArmorData, ArmorId, "armor");
record!(EnemyData, EnemyId, "enemy");
record!(TroopData, TroopId, "troop");
record!(StateData, StateId, "state");

/// Id-keyed table of one kind of record.
#[derive(Clone, Debug)]
pub struct Table<T: Record> {
    rows: BTreeMap<T::Id, T>,
}

impl<T: Record> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<T: Record> Table<T> {
    pub fn from_rows(rows: impl IntoIterator<Item = T>) -> Result<Self, DataError> {
        let mut table = Self::default();
        for row in rows {
            table.insert(row)?;
        }
        Ok(table)
    }

    pub fn insert(&mut self, row: T) -> Result<(), DataError> {
        let id = row.id();
        let raw: u32 = id.into();
        if raw == 0 {
            return Err(DataError::ReservedId { table: T::TABLE });
        }
        if self.rows.contains_key(&id) {
            return Err(DataError::DuplicateId {
                table: T::TABLE,
                id: raw,
            });
        }
        self.rows.insert(id, row);
        Ok(())
    }

    /// Inserts or replaces a row.
    pub fn upsert(&mut self, row: T) {
        self.rows.insert(row.id(), row);
    }

    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.rows.get(&id)
    }

    pub fn require(&self, id: T::Id) -> Result<&T, DataError> {
        self.get(id).ok_or(DataError::NotFound {
            table: T::TABLE,
            id: id.into(),
        })
    }

    pub fn contains(&self, id: T::Id) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The full static data store plus battle tunables.
#[derive(Clone, Debug, Default)]
pub struct Database {
    pub actors: Table<ActorData>,
    pub classes: Table<ClassData>,
    pub skills: Table<SkillData>,
    pub items: Table<ItemData>,
    pub weapons: Table<WeaponData>,
    pub armors: Table<ArmorData>,
    pub enemies: Table<EnemyData>,
    pub troops: Table<TroopData>,
    pub states: Table<StateData>,
    pub system: SystemData,
    pub config: BattleConfig,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: BattleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn actor(&self, id: ActorId) -> Option<&ActorData> {
        self.actors.get(id)
    }

    pub fn class(&self, id: ClassId) -> Option<&ClassData> {
        self.classes.get(id)
    }

    pub fn skill(&self, id: SkillId) -> Option<&SkillData> {
        self.skills.get(id)
    }

    pub fn item(&self, id: ItemId) -> Option<&ItemData> {
        self.items.get(id)
    }

    pub fn weapon(&self, id: WeaponId) -> Option<&WeaponData> {
        self.weapons.get(id)
    }

    pub fn armor(&self, id: ArmorId) -> Option<&ArmorData> {
        self.armors.get(id)
    }

    pub fn enemy(&self, id: EnemyId) -> Option<&EnemyData> {
        self.enemies.get(id)
    }

    pub fn troop(&self, id: TroopId) -> Option<&TroopData> {
        self.troops.get(id)
    }

    pub fn state(&self, id: StateId) -> Option<&StateData> {
        self.states.get(id)
    }

    /// Resolves a skill or item reference.
    pub fn usable(&self, item: ItemRef) -> Option<UsableItem<'_>> {
        match item {
            ItemRef::Skill(id) => self.skill(id).map(UsableItem::Skill),
            ItemRef::Item(id) => self.item(id).map(UsableItem::Item),
        }
    }

    pub fn equip_traits(&self, item: EquipItem) -> &[Trait] {
        match item {
            EquipItem::Weapon(id) => self.weapon(id).map(|w| w.traits.as_slice()),
            EquipItem::Armor(id) => self.armor(id).map(|a| a.traits.as_slice()),
        }
        .unwrap_or(&[])
    }

    pub fn equip_params(&self, item: EquipItem) -> [i32; 8] {
        match item {
            EquipItem::Weapon(id) => self.weapon(id).map(|w| w.params),
            EquipItem::Armor(id) => self.armor(id).map(|a| a.params),
        }
        .unwrap_or([0; 8])
    }

    pub fn equip_etype(&self, item: EquipItem) -> Option<u32> {
        match item {
            EquipItem::Weapon(id) => self.weapon(id).map(|w| w.etype_id),
            EquipItem::Armor(id) => self.armor(id).map(|a| a.etype_id),
        }
    }

    /// Checks every cross-table reference the battle logic relies on.
    pub fn validate(&self) -> Result<(), DataError> {
        for actor in self.actors.iter() {
            let owner = || actor.id.to_string();
            expect_row(&self.classes, actor.class_id, owner)?;
        }
        for class in self.classes.iter() {
            for learning in &class.learnings {
                expect_row(&self.skills, learning.skill_id, || class.id.to_string())?;
            }
        }
        for enemy in self.enemies.iter() {
            for action in &enemy.actions {
                expect_row(&self.skills, action.skill_id, || enemy.id.to_string())?;
            }
            for drop in &enemy.drop_items {
                let owner = || enemy.id.to_string();
                match drop.kind {
                    DropKind::None => {}
                    DropKind::Item(id) => expect_row(&self.items, id, owner)?,
                    DropKind::Weapon(id) => expect_row(&self.weapons, id, owner)?,
                    DropKind::Armor(id) => expect_row(&self.armors, id, owner)?,
                }
            }
        }
        for troop in self.troops.iter() {
            for member in &troop.members {
                expect_row(&self.enemies, member.enemy_id, || troop.id.to_string())?;
            }
        }
        for actor_id in &self.system.party_members {
            expect_row(&self.actors, *actor_id, || String::from("system"))?;
        }
        expect_row(&self.states, BattleConfig::DEATH_STATE_ID, || {
            String::from("config")
        })?;
        Ok(())
    }
}

fn expect_row<T: Record>(
    table: &Table<T>,
    id: T::Id,
    owner: impl FnOnce() -> String,
) -> Result<(), DataError> {
    if table.contains(id) {
        Ok(())
    } else {
        Err(DataError::DanglingReference {
            owner: owner(),
            table: T::TABLE,
            id: id.into(),
        })
    }
}
