//! The enemy side of a battle.

use std::collections::BTreeMap;

use tracing::debug;

use super::{Side, Unit};
use crate::battler::{Battler, PatternContext};
use crate::context::BattleEnv;
use crate::data::{DataError, Database, DropKind, EnemyId, TroopId};

const LETTERS: [&str; 26] = [
    " A", " B", " C", " D", " E", " F", " G", " H", " I", " J", " K", " L", " M", " N", " O",
    " P", " Q", " R", " S", " T", " U", " V", " W", " X", " Y", " Z",
];

/// Enemies of the current battle plus the turn counter.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Troop {
    troop_id: Option<TroopId>,
    enemies: Vec<Battler>,
    turn_count: i32,
    names_count: BTreeMap<String, usize>,
}

impl Troop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.troop_id = None;
        self.enemies.clear();
        self.turn_count = 0;
        self.names_count.clear();
    }

    /// Rebuilds the troop from its formation data.
    pub fn setup(&mut self, db: &Database, troop_id: TroopId) -> Result<(), DataError> {
        self.clear();
        let data = db.troops.require(troop_id)?;
        for (index, member) in data.members.iter().enumerate() {
            let mut enemy = Battler::new_enemy(db, member.enemy_id, index)?;
            if member.hidden {
                enemy.hide();
            }
            self.enemies.push(enemy);
        }
        self.troop_id = Some(troop_id);
        self.make_unique_names(db);
        debug!(troop = troop_id.0, enemies = self.enemies.len(), "troop set up");
        Ok(())
    }

    pub fn troop_id(&self) -> Option<TroopId> {
        self.troop_id
    }

    pub fn enemy(&self, index: usize) -> Option<&Battler> {
        self.enemies.get(index)
    }

    pub fn enemy_mut(&mut self, index: usize) -> Option<&mut Battler> {
        self.enemies.get_mut(index)
    }

    pub fn enemies(&self) -> &[Battler] {
        &self.enemies
    }

    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    pub fn turn_count(&self) -> i32 {
        self.turn_count
    }

    pub fn increase_turn(&mut self) {
        self.turn_count += 1;
    }

    /// Hands a letter to every living enemy that has none yet. Letters are
    /// shown once two or more enemies have shared a name.
    pub fn make_unique_names(&mut self, db: &Database) {
        for enemy in &mut self.enemies {
            if !enemy.is_alive() {
                continue;
            }
            let name = enemy.original_name(db);
            let Some(profile) = enemy.enemy_profile_mut() else {
                continue;
            };
            if !profile.letter.is_empty() {
                continue;
            }
            let count = self.names_count.entry(name).or_insert(0);
            profile.letter = LETTERS[*count % LETTERS.len()].to_owned();
            *count += 1;
        }
        for enemy in &mut self.enemies {
            let name = enemy.original_name(db);
            let shared = self.names_count.get(&name).is_some_and(|&n| n >= 2);
            if let Some(profile) = enemy.enemy_profile_mut() {
                if shared {
                    profile.plural = true;
                }
            }
        }
    }

    /// Distinct names of the living enemies, in formation order.
    pub fn enemy_names(&self, db: &Database) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for enemy in self.enemies.iter().filter(|e| e.is_alive()) {
            let name = enemy.original_name(db);
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Turns the enemy at `index` into another enemy and renames the troop.
    pub fn transform_enemy(
        &mut self,
        env: &BattleEnv<'_>,
        world: &PatternContext<'_>,
        index: usize,
        enemy_id: EnemyId,
    ) -> Result<(), DataError> {
        if let Some(enemy) = self.enemies.get_mut(index) {
            enemy.transform(env, world, enemy_id)?;
            self.make_unique_names(env.db);
        }
        Ok(())
    }

    // ===== rewards =====

    pub fn exp_total(&self, db: &Database) -> i32 {
        self.dead_members().iter().map(|e| e.exp_reward(db)).sum()
    }

    pub fn gold_total(&self, db: &Database, doubled: bool) -> i32 {
        let gold: i32 = self.dead_members().iter().map(|e| e.gold_reward(db)).sum();
        if doubled { gold.saturating_mul(2) } else { gold }
    }

    pub fn make_drop_items(&self, env: &BattleEnv<'_>, doubled: bool) -> Vec<DropKind> {
        self.dead_members()
            .iter()
            .flat_map(|e| e.make_drop_items(env, doubled))
            .collect()
    }
}

impl Unit for Troop {
    fn side(&self) -> Side {
        Side::Troop
    }

    fn members(&self) -> Vec<&Battler> {
        self.enemies.iter().collect()
    }

    fn members_mut(&mut self) -> Vec<&mut Battler> {
        self.enemies.iter_mut().collect()
    }
}
