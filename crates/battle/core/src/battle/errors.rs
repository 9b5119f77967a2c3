//! Errors surfaced while preparing a battle.

use super::BattlePhase;
use crate::data::DataError;
use crate::error::{BattleError, ErrorSeverity};

/// Reasons [`BattleEngine::setup`](super::BattleEngine::setup) refuses to start a session.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("cannot set up troop: {0}")]
    Troop(#[from] DataError),

    #[error("a battle is already running (phase {phase})")]
    InProgress { phase: BattlePhase },
}

impl BattleError for SetupError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Troop(_) => ErrorSeverity::Validation,
            Self::InProgress { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Troop(_) => "SETUP_TROOP",
            Self::InProgress { .. } => "SETUP_IN_PROGRESS",
        }
    }
}
