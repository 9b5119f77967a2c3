//! Class loader with compact parameter curves.
//!
//! A class stores one parameter row per level. Writing ninety-nine rows by
//! hand is impractical, so the data files describe the curve instead and the
//! rows are expanded at load time.

use std::path::Path;

use battle_core::data::{ClassData, ClassId, Learning, Trait};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_ron};

/// Parameter growth as written in `classes.ron`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamCurve {
    /// Same row at every level.
    Flat([i32; 8]),
    /// `base + growth * (level - 1)`.
    Linear { base: [i32; 8], growth: [i32; 8] },
    /// Explicit rows, index 0 unused.
    Table(Vec<[i32; 8]>),
}

/// One class entry in `classes.ron`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSpec {
    pub id: ClassId,
    pub name: String,
    #[serde(default)]
    pub exp_params: Option<[i32; 4]>,
    pub params: ParamCurve,
    #[serde(default = "max_level_default")]
    pub max_level: i32,
    #[serde(default)]
    pub learnings: Vec<Learning>,
    #[serde(default)]
    pub traits: Vec<Trait>,
}

fn max_level_default() -> i32 {
    99
}

impl ClassSpec {
    /// Expands the curve into per-level rows.
    pub fn into_class(self) -> ClassData {
        let class = ClassData::new(self.id.0, self.name);
        let mut class = match self.params {
            ParamCurve::Flat(row) => class.with_flat_params(row, self.max_level),
            ParamCurve::Linear { base, growth } => {
                class.with_linear_params(base, growth, self.max_level)
            }
            ParamCurve::Table(rows) => ClassData {
                params: rows,
                ..class
            },
        };
        if let Some(exp_params) = self.exp_params {
            class.exp_params = exp_params;
        }
        class.learnings = self.learnings;
        class.traits = self.traits;
        class
    }
}

/// Loader for class definitions from RON files.
pub struct ClassLoader;

impl ClassLoader {
    /// Load `Vec<ClassSpec>` from a RON file and expand every curve.
    pub fn load(path: &Path) -> LoadResult<Vec<ClassData>> {
        let specs: Vec<ClassSpec> = read_ron(path)?;
        Ok(specs.into_iter().map(ClassSpec::into_class).collect())
    }
}
