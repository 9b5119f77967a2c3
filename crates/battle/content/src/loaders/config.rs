//! Battle configuration loader.

use std::path::Path;

use battle_core::BattleConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for battle tunables from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file. Missing keys keep their defaults.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML file containing a [`BattleConfig`]
    pub fn load(path: &Path) -> LoadResult<BattleConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML {}: {}", path.display(), e))
    }

    pub(crate) fn parse(content: &str) -> Result<BattleConfig, toml::de::Error> {
        toml::from_str(content)
    }
}
