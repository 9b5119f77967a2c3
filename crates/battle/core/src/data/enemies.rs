use super::ids::{ArmorId, EnemyId, ItemId, SkillId, StateId, TroopId, WeaponId};
use super::traits::Trait;

/// What a drop slot yields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DropKind {
    None,
    Item(ItemId),
    Weapon(WeaponId),
    Armor(ArmorId),
}

/// One roll on an enemy's drop table; succeeds with probability `1 / denominator`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DropItem {
    pub kind: DropKind,
    pub denominator: u32,
}

impl DropItem {
    pub const fn new(kind: DropKind, denominator: u32) -> Self {
        Self { kind, denominator }
    }
}

/// Condition gating an enemy action pattern.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionCondition {
    #[default]
    Always,
    /// Turn `a + b * n` for some `n >= 0`; `b == 0` means exactly turn `a`.
    Turn { a: i32, b: i32 },
    /// HP rate within `[min, max]`.
    Hp { min: f64, max: f64 },
    Mp { min: f64, max: f64 },
    State(StateId),
    /// Highest party level at least this value.
    PartyLevel(i32),
    Switch(u32),
}

/// One entry of an enemy's action pattern.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnemyAction {
    pub skill_id: SkillId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub condition: ActionCondition,
    /// 1..=9; only patterns within 3 of the best valid rating are picked.
    #[cfg_attr(feature = "serde", serde(default = "rating_default"))]
    pub rating: i32,
}

#[cfg(feature = "serde")]
fn rating_default() -> i32 {
    5
}

impl EnemyAction {
    pub const fn new(skill_id: u32, rating: i32) -> Self {
        Self {
            skill_id: SkillId(skill_id),
            condition: ActionCondition::Always,
            rating,
        }
    }

    pub const fn when(mut self, condition: ActionCondition) -> Self {
        self.condition = condition;
        self
    }
}

/// Enemy template.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnemyData {
    pub id: EnemyId,
    pub name: String,
    pub params: [i32; 8],
    #[cfg_attr(feature = "serde", serde(default))]
    pub exp: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub gold: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub drop_items: Vec<DropItem>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub actions: Vec<EnemyAction>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub traits: Vec<Trait>,
}

impl EnemyData {
    pub fn new(id: u32, name: impl Into<String>, params: [i32; 8]) -> Self {
        Self {
            id: EnemyId(id),
            name: name.into(),
            params,
            exp: 0,
            gold: 0,
            drop_items: Vec::new(),
            actions: Vec::new(),
            traits: Vec::new(),
        }
    }

    pub fn with_rewards(mut self, exp: i32, gold: i32) -> Self {
        self.exp = exp;
        self.gold = gold;
        self
    }

    pub fn with_drop(mut self, drop: DropItem) -> Self {
        self.drop_items.push(drop);
        self
    }

    pub fn with_action(mut self, action: EnemyAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_trait(mut self, t: Trait) -> Self {
        self.traits.push(t);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TroopMember {
    pub enemy_id: EnemyId,
    /// Hidden members join the fight only when made to appear.
    #[cfg_attr(feature = "serde", serde(default))]
    pub hidden: bool,
}

/// Enemy formation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TroopData {
    pub id: TroopId,
    pub name: String,
    pub members: Vec<TroopMember>,
}

impl TroopData {
    pub fn new(id: u32, name: impl Into<String>, enemy_ids: &[u32]) -> Self {
        Self {
            id: TroopId(id),
            name: name.into(),
            members: enemy_ids
                .iter()
                .map(|&enemy_id| TroopMember {
                    enemy_id: EnemyId(enemy_id),
                    hidden: false,
                })
                .collect(),
        }
    }
}
