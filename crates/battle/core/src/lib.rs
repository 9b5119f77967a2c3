//! Turn-based battle rules shared by every front end.
//!
//! `battle-core` defines the canonical battle semantics: the battler
//! attribute model, action resolution, per-target action results, the
//! party/troop containers and the battle state machine that sequences a
//! fight from the first turn to the final outcome. Presentation, audio and
//! persistence stay outside and are reached only through the hooks in
//! [`hooks`].
//!
//! All mutation of a running battle flows through [`battle::BattleEngine`],
//! which is driven by one [`battle::BattleEngine::update`] call per frame
//! against an explicit [`BattleContext`].
pub mod action;
pub mod battle;
pub mod battler;
pub mod config;
pub mod context;
pub mod data;
pub mod error;
pub mod formula;
pub mod hooks;
pub mod rng;
pub mod unit;

#[cfg(test)]
pub(crate) mod testing;

pub use action::{Action, ActionResult};
pub use battle::{BattleEngine, BattleOutcome, BattlePhase, Encounter, Rewards, SetupError};
pub use battler::{
    ActionState, Battler, BattlerId, BattlerKind, ExParam, LevelUp, Param, PatternContext, SpParam,
};
pub use config::BattleConfig;
pub use context::{BattleContext, BattleEnv, GameSwitches, GameVariables};
pub use data::{
    ActorData, ActorId, ArmorData, ArmorId, ClassData, ClassId, DataError, Database, EnemyData,
    EnemyId, ItemData, ItemId, ItemRef, SkillData, SkillId, StateData, StateId, SystemData,
    TroopData, TroopId, WeaponData, WeaponId,
};
pub use error::{BattleError, ErrorSeverity};
pub use formula::{Formula, FormulaError};
pub use hooks::{
    BattleCue, BattleHooks, BattleLog, BattleMessage, BattleRecord, BattleSystem, LogEvent,
};
pub use hooks::{RecordingLog, StatusRefresh};
pub use rng::{BattleRng, EntropyRng, FixedRng, PcgRng, ScriptedRng};
pub use unit::{Party, Side, Troop, Unit};
