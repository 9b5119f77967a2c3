//! Content factory for loading battle data from a directory.

use std::path::{Path, PathBuf};

use battle_core::{BattleConfig, Database};

use crate::loaders::{ConfigLoader, DatabaseLoader, LoadResult};

/// Content factory that loads all battle content from a data directory.
///
/// See [`DatabaseLoader`] for the expected layout.
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Factory over the sample game shipped with this crate.
    pub fn bundled() -> Self {
        Self::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("data"))
    }

    /// Load the full database, including `battle.toml` when present.
    pub fn load_database(&self) -> LoadResult<Database> {
        DatabaseLoader::load_dir(&self.data_dir)
    }

    /// Load battle tunables from `battle.toml` alone.
    pub fn load_config(&self) -> LoadResult<BattleConfig> {
        ConfigLoader::load(&self.data_dir.join("battle.toml"))
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use battle_core::data::{ActorId, TroopId};

    use super::*;

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
    }

    #[test]
    fn bundled_data_loads_and_validates() {
        let db = ContentFactory::bundled().load_database().unwrap();
        assert!(db.troop(TroopId(1)).is_some());
        assert!(!db.system.party_members.is_empty());
        assert!(db.actor(ActorId(1)).is_some());
        assert!((db.config.escape_ratio_step - 0.1).abs() < f64::EPSILON);
    }

    fn write_minimal(dir: &Path) {
        let files = [
            ("system.ron", "(party_members: [1])"),
            ("actors.ron", "[(id: 1, name: \"Hero\", class_id: 1)]"),
            ("classes.ron", "[(id: 1, name: \"Knight\", params: Flat((500, 50, 20, 20, 10, 10, 10, 10)))]"),
            ("skills.ron", "[(id: 1, name: \"Attack\", usage: (scope: OneEnemy, hit_type: Physical))]"),
            ("items.ron", "[]"),
            ("enemies.ron", "[(id: 1, name: \"Rat\", params: (30, 0, 5, 5, 5, 5, 5, 5), actions: [(skill_id: 1)])]"),
            ("troops.ron", "[(id: 1, name: \"Rat\", members: [(enemy_id: 1)])]"),
            ("states.ron", "[(id: 1, name: \"Knockout\", restriction: CannotMove, priority: 100)]"),
        ];
        for (file, content) in files {
            fs::write(dir.join(file), content).unwrap();
        }
    }

    #[test]
    fn optional_files_may_be_missing() {
        let dir = tempfile::tempdir().unwrap();
        write_minimal(dir.path());

        let factory = ContentFactory::new(dir.path());
        let db = factory.load_database().unwrap();
        assert!(db.weapons.is_empty());
        assert_eq!(db.config, BattleConfig::default());
        assert!(factory.load_config().is_err());
    }

    #[test]
    fn config_overrides_apply() {
        let dir = tempfile::tempdir().unwrap();
        write_minimal(dir.path());
        fs::write(dir.path().join("battle.toml"), "max_battle_members = 2\n").unwrap();

        let db = ContentFactory::new(dir.path()).load_database().unwrap();
        assert_eq!(db.config.max_battle_members, 2);
    }

    #[test]
    fn dangling_references_name_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_minimal(dir.path());
        fs::write(
            dir.path().join("troops.ron"),
            "[(id: 1, name: \"Ghost\", members: [(enemy_id: 9)])]",
        )
        .unwrap();

        let err = ContentFactory::new(dir.path()).load_database().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Invalid database"), "{message}");
        assert!(message.contains("enemy id 9"), "{message}");
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        write_minimal(dir.path());
        fs::write(dir.path().join("states.ron"), "[(id: 1,").unwrap();

        let err = ContentFactory::new(dir.path()).load_database().unwrap_err();
        assert!(err.to_string().contains("states.ron"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_minimal(dir.path());
        fs::write(
            dir.path().join("items.ron"),
            "[(id: 1, name: \"Potion\"), (id: 1, name: \"Ether\")]",
        )
        .unwrap();

        let err = ContentFactory::new(dir.path()).load_database().unwrap_err();
        assert!(err.to_string().contains("duplicate item id 1"));
    }
}
