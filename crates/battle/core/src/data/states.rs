use super::ids::StateId;
use super::traits::Trait;

/// How much a state limits its bearer's actions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, strum::FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Restriction {
    #[default]
    None = 0,
    /// Confused: attacks an enemy.
    AttackEnemy = 1,
    /// Confused: attacks anyone.
    AttackAnyone = 2,
    /// Confused: attacks an ally.
    AttackAlly = 3,
    CannotMove = 4,
}

impl Restriction {
    pub const fn level(self) -> i32 {
        self as i32
    }
}

/// When a state's turn counter is checked for expiry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum AutoRemoval {
    #[default]
    None = 0,
    ActionEnd = 1,
    TurnEnd = 2,
}

/// Narration lines; the bearer's name is prefixed by the presentation layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StateMessages {
    pub actor: String,
    pub enemy: String,
    pub persist: String,
    pub remove: String,
}

/// Status condition definition.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateData {
    pub id: StateId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub restriction: Restriction,
    #[cfg_attr(feature = "serde", serde(default))]
    pub priority: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub auto_removal: AutoRemoval,
    #[cfg_attr(feature = "serde", serde(default))]
    pub min_turns: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_turns: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub remove_at_battle_end: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub remove_by_restriction: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub remove_by_damage: bool,
    /// Percent chance of removal per damaging hit.
    #[cfg_attr(feature = "serde", serde(default))]
    pub chance_by_damage: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub messages: StateMessages,
    #[cfg_attr(feature = "serde", serde(default))]
    pub traits: Vec<Trait>,
}

impl StateData {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: StateId(id),
            name: name.into(),
            restriction: Restriction::None,
            priority: 50,
            auto_removal: AutoRemoval::None,
            min_turns: 1,
            max_turns: 1,
            remove_at_battle_end: false,
            remove_by_restriction: false,
            remove_by_damage: false,
            chance_by_damage: 100,
            messages: StateMessages::default(),
            traits: Vec::new(),
        }
    }

    pub fn with_restriction(mut self, restriction: Restriction) -> Self {
        self.restriction = restriction;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_auto_removal(mut self, timing: AutoRemoval, min_turns: i32, max_turns: i32) -> Self {
        self.auto_removal = timing;
        self.min_turns = min_turns;
        self.max_turns = max_turns;
        self
    }

    pub fn removed_at_battle_end(mut self) -> Self {
        self.remove_at_battle_end = true;
        self
    }

    pub fn removed_by_restriction(mut self) -> Self {
        self.remove_by_restriction = true;
        self
    }

    pub fn removed_by_damage(mut self, chance: i32) -> Self {
        self.remove_by_damage = true;
        self.chance_by_damage = chance;
        self
    }

    pub fn with_trait(mut self, t: Trait) -> Self {
        self.traits.push(t);
        self
    }
}
