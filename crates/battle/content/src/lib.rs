//! Data-driven battle content and loaders.
//!
//! The battle core never touches the filesystem. This crate reads RON and
//! TOML files into a [`battle_core::Database`] and a
//! [`battle_core::BattleConfig`]:
//! - actors, classes, skills, items, weapons, armors, enemies, troops and
//!   states (one RON list per table)
//! - system data (starting party, type names)
//! - battle tunables (TOML)
//!
//! Loaded data is validated for dangling cross-table references before it
//! is handed out.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{ClassSpec, ConfigLoader, ContentFactory, DatabaseLoader, ParamCurve};
