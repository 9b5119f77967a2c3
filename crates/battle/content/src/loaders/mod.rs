//! Content loaders for reading battle data from files.

pub mod classes;
pub mod config;
pub mod database;
pub mod factory;

pub use classes::{ClassSpec, ParamCurve};
pub use config::ConfigLoader;
pub use database::DatabaseLoader;
pub use factory::ContentFactory;

use std::path::Path;

use serde::de::DeserializeOwned;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}

/// Reads and parses one RON file.
pub(crate) fn read_ron<T: DeserializeOwned>(path: &Path) -> LoadResult<T> {
    let content = read_file(path)?;
    ron::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse RON {}: {}", path.display(), e))
}
