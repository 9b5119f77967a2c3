//! Sides of a battle: the player's [`Party`] and the enemy [`Troop`].
//!
//! Both expose their members through the [`Unit`] trait, which carries the
//! shared membership and targeting queries.

mod party;
mod troop;

pub use party::Party;
pub use troop::Troop;

use crate::battler::{Battler, BattlerId};
use crate::context::BattleEnv;
use crate::data::Database;

/// Which side of the battle a battler fights on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Party,
    Troop,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Self::Party => Self::Troop,
            Self::Troop => Self::Party,
        }
    }
}

/// Membership and targeting queries shared by both sides.
///
/// Member order is stable and defines the indices actions target by.
pub trait Unit {
    fn side(&self) -> Side;

    /// Members that take part in the battle, in index order.
    fn members(&self) -> Vec<&Battler>;

    fn members_mut(&mut self) -> Vec<&mut Battler>;

    fn member_ids(&self) -> Vec<BattlerId> {
        self.members().iter().map(|b| b.id()).collect()
    }

    fn member_index(&self, id: BattlerId) -> Option<usize> {
        self.members().iter().position(|b| b.id() == id)
    }

    fn alive_members(&self) -> Vec<&Battler> {
        self.members().into_iter().filter(|b| b.is_alive()).collect()
    }

    fn dead_members(&self) -> Vec<&Battler> {
        self.members().into_iter().filter(|b| b.is_dead()).collect()
    }

    fn movable_members(&self, db: &Database) -> Vec<&Battler> {
        self.members()
            .into_iter()
            .filter(|b| b.can_move(db))
            .collect()
    }

    fn is_all_dead(&self) -> bool {
        self.alive_members().is_empty()
    }

    /// Average agility of all members, 1 for an empty unit.
    fn agility(&self, db: &Database) -> f64 {
        let members = self.members();
        if members.is_empty() {
            return 1.0;
        }
        let sum: i32 = members.iter().map(|b| b.agi(db)).sum();
        f64::from(sum) / members.len() as f64
    }

    fn tgr_sum(&self, db: &Database) -> f64 {
        self.alive_members().iter().map(|b| b.tgr(db)).sum()
    }

    /// Living member drawn with probability proportional to its target rate.
    fn random_target(&self, env: &BattleEnv<'_>) -> Option<BattlerId> {
        let alive = self.alive_members();
        let mut roll = env.random() * self.tgr_sum(env.db);
        for member in &alive {
            roll -= member.tgr(env.db);
            if roll <= 0.0 {
                return Some(member.id());
            }
        }
        // rounding can leave a sliver above zero
        alive.last().map(|b| b.id())
    }

    fn random_dead_target(&self, env: &BattleEnv<'_>) -> Option<BattlerId> {
        let dead = self.dead_members();
        if dead.is_empty() {
            return None;
        }
        let index = (env.random() * dead.len() as f64).floor() as usize;
        dead.get(index.min(dead.len() - 1)).map(|b| b.id())
    }

    /// The member at `index` when alive, else the first living member.
    fn smooth_target(&self, index: i32) -> Option<BattlerId> {
        let members = self.members();
        let index = usize::try_from(index).unwrap_or(0);
        match members.get(index) {
            Some(member) if member.is_alive() => Some(member.id()),
            _ => self.alive_members().first().map(|b| b.id()),
        }
    }

    /// The member at `index` when dead, else the first dead member.
    fn smooth_dead_target(&self, index: i32) -> Option<BattlerId> {
        let members = self.members();
        let index = usize::try_from(index).unwrap_or(0);
        match members.get(index) {
            Some(member) if member.is_dead() => Some(member.id()),
            _ => self.dead_members().first().map(|b| b.id()),
        }
    }

    /// First member willing and able to cover for a dying ally.
    fn substitute_battler(&self, db: &Database) -> Option<BattlerId> {
        self.members()
            .into_iter()
            .find(|b| b.is_substitute(db))
            .map(|b| b.id())
    }

    fn clear_actions(&mut self) {
        for member in self.members_mut() {
            member.clear_actions();
        }
    }

    fn clear_results(&mut self) {
        for member in self.members_mut() {
            member.clear_result();
        }
    }

    fn on_battle_start(&mut self, env: &BattleEnv<'_>) {
        for member in self.members_mut() {
            member.on_battle_start(env);
        }
    }

    fn on_battle_end(&mut self, env: &BattleEnv<'_>) {
        for member in self.members_mut() {
            member.on_battle_end(env);
        }
    }
}
