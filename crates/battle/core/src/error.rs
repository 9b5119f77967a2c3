//! Common error infrastructure for battle-core.
//!
//! Domain-specific errors (`DataError`, `FormulaError`, `SetupError`) live
//! next to the code that produces them and implement [`BattleError`] so
//! callers can classify failures uniformly.
//!
//! Only expected, data-driven failures are modelled as errors. Broken
//! orchestration (acting on a battler that no longer exists) panics instead,
//! because it can only come from a bug in the caller.

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Temporary condition; retrying with different input may succeed.
    Recoverable,

    /// Invalid input or data reference, should not be retried unchanged.
    ///
    /// Examples: unknown troop id, duplicate database entry
    Validation,

    /// Unexpected inconsistency that indicates a bug.
    Internal,

    /// Unrecoverable: the battle cannot continue.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all battle-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
/// - Give every variant a stable `error_code` for logs and tests
pub trait BattleError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_covers_fatal() {
        assert!(ErrorSeverity::Fatal.is_internal());
        assert!(ErrorSeverity::Internal.is_internal());
        assert!(!ErrorSeverity::Validation.is_internal());
        assert!(ErrorSeverity::Recoverable.is_recoverable());
        assert_eq!(ErrorSeverity::Validation.as_str(), "validation");
    }
}
