use super::ids::{ActorId, ClassId, SkillId};
use super::traits::Trait;

/// Player character definition.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorData {
    pub id: ActorId,
    pub name: String,
    pub class_id: ClassId,
    #[cfg_attr(feature = "serde", serde(default = "one"))]
    pub initial_level: i32,
    #[cfg_attr(feature = "serde", serde(default = "max_level_default"))]
    pub max_level: i32,
    /// Raw data id per equipment slot, 0 for an empty slot. Whether an id is a
    /// weapon or an armor depends on the slot's equip type.
    #[cfg_attr(feature = "serde", serde(default))]
    pub equips: Vec<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub traits: Vec<Trait>,
}

#[cfg(feature = "serde")]
fn one() -> i32 {
    1
}

#[cfg(feature = "serde")]
fn max_level_default() -> i32 {
    99
}

impl ActorData {
    pub fn new(id: u32, name: impl Into<String>, class_id: u32) -> Self {
        Self {
            id: ActorId(id),
            name: name.into(),
            class_id: ClassId(class_id),
            initial_level: 1,
            max_level: 99,
            equips: Vec::new(),
            traits: Vec::new(),
        }
    }

    pub fn with_level(mut self, initial_level: i32) -> Self {
        self.initial_level = initial_level;
        self
    }

    pub fn with_equips(mut self, equips: Vec<u32>) -> Self {
        self.equips = equips;
        self
    }

    pub fn with_trait(mut self, t: Trait) -> Self {
        self.traits.push(t);
        self
    }
}

/// Skill learned on reaching a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Learning {
    pub level: i32,
    pub skill_id: SkillId,
}

/// Class definition: param curves, experience curve and learnings.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassData {
    pub id: ClassId,
    pub name: String,
    /// `[basis, extra, acceleration a, acceleration b]`.
    #[cfg_attr(feature = "serde", serde(default = "exp_params_default"))]
    pub exp_params: [i32; 4],
    /// Base params indexed by level; row 0 is unused by the formulas but kept
    /// so `params[level]` reads naturally.
    #[cfg_attr(feature = "serde", serde(default))]
    pub params: Vec<[i32; 8]>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub learnings: Vec<Learning>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub traits: Vec<Trait>,
}

#[cfg(feature = "serde")]
fn exp_params_default() -> [i32; 4] {
    ClassData::DEFAULT_EXP_PARAMS
}

impl ClassData {
    pub const DEFAULT_EXP_PARAMS: [i32; 4] = [30, 20, 30, 30];

    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: ClassId(id),
            name: name.into(),
            exp_params: Self::DEFAULT_EXP_PARAMS,
            params: Vec::new(),
            learnings: Vec::new(),
            traits: Vec::new(),
        }
    }

    /// Same params at every level up to `max_level`.
    pub fn with_flat_params(mut self, params: [i32; 8], max_level: i32) -> Self {
        let rows = usize::try_from(max_level.max(1)).unwrap_or(1) + 1;
        self.params = vec![params; rows];
        self
    }

    /// Linear curve: `base + growth * (level - 1)`.
    pub fn with_linear_params(mut self, base: [i32; 8], growth: [i32; 8], max_level: i32) -> Self {
        self.params = (0..=max_level.max(1))
            .map(|level| {
                let steps = (level - 1).max(0);
                core::array::from_fn(|i| base[i] + growth[i] * steps)
            })
            .collect();
        self
    }

    pub fn with_learning(mut self, level: i32, skill_id: u32) -> Self {
        self.learnings.push(Learning {
            level,
            skill_id: SkillId(skill_id),
        });
        self
    }

    pub fn with_trait(mut self, t: Trait) -> Self {
        self.traits.push(t);
        self
    }

    /// Base value of `param_id` at `level`. Levels past the table read the last row.
    pub fn param_at(&self, param_id: usize, level: i32) -> i32 {
        let Some(last) = self.params.len().checked_sub(1) else {
            return 0;
        };
        let row = usize::try_from(level).unwrap_or(0).min(last);
        self.params[row].get(param_id).copied().unwrap_or(0)
    }

    /// Total experience required to reach `level`.
    pub fn exp_for_level(&self, level: i32) -> i32 {
        let [basis, extra, acc_a, acc_b] = self.exp_params.map(f64::from);
        let lv = f64::from(level);
        let value = basis * (lv - 1.0).powf(0.9 + acc_a / 250.0) * lv * (lv + 1.0)
            / (6.0 + lv.powi(2) / 50.0 / acc_b)
            + (lv - 1.0) * extra;
        crate::formula::round_half_up(value) as i32
    }
}
