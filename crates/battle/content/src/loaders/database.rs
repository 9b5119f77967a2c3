//! Whole-database loader.

use std::path::Path;

use battle_core::data::{Record, Table};
use battle_core::{Database, SystemData};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::loaders::classes::ClassLoader;
use crate::loaders::{ConfigLoader, LoadResult, read_ron};

/// Loader for a complete battle database from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── battle.toml      (optional, BattleConfig)
/// ├── system.ron
/// ├── actors.ron
/// ├── classes.ron
/// ├── skills.ron
/// ├── items.ron
/// ├── weapons.ron      (optional)
/// ├── armors.ron       (optional)
/// ├── enemies.ron
/// ├── troops.ron
/// └── states.ron
/// ```
pub struct DatabaseLoader;

impl DatabaseLoader {
    /// Load and validate every table under `dir`.
    pub fn load_dir(dir: &Path) -> LoadResult<Database> {
        let classes = ClassLoader::load(&dir.join("classes.ron"))?;
        let mut db = Database {
            actors: load_table(dir, "actors.ron", true)?,
            classes: into_table(dir, "classes.ron", classes)?,
            skills: load_table(dir, "skills.ron", true)?,
            items: load_table(dir, "items.ron", true)?,
            weapons: load_table(dir, "weapons.ron", false)?,
            armors: load_table(dir, "armors.ron", false)?,
            enemies: load_table(dir, "enemies.ron", true)?,
            troops: load_table(dir, "troops.ron", true)?,
            states: load_table(dir, "states.ron", true)?,
            system: read_ron::<SystemData>(&dir.join("system.ron"))?,
            ..Database::default()
        };

        let config_path = dir.join("battle.toml");
        if config_path.exists() {
            db.config = ConfigLoader::load(&config_path)?;
        }

        db.validate()
            .map_err(|e| anyhow::anyhow!("Invalid database in {}: {}", dir.display(), e))?;
        debug!(
            dir = %dir.display(),
            actors = db.actors.len(),
            skills = db.skills.len(),
            enemies = db.enemies.len(),
            troops = db.troops.len(),
            states = db.states.len(),
            "database loaded"
        );
        Ok(db)
    }
}

/// Reads `Vec<T>` from `dir/file`. Optional tables load empty when the file is absent.
fn load_table<T>(dir: &Path, file: &str, required: bool) -> LoadResult<Table<T>>
where
    T: Record + DeserializeOwned,
{
    let path = dir.join(file);
    if !required && !path.exists() {
        return Ok(Table::default());
    }
    let rows: Vec<T> = read_ron(&path)?;
    into_table(dir, file, rows)
}

fn into_table<T: Record>(dir: &Path, file: &str, rows: Vec<T>) -> LoadResult<Table<T>> {
    Table::from_rows(rows)
        .map_err(|e| anyhow::anyhow!("Invalid rows in {}: {}", dir.join(file).display(), e))
}
