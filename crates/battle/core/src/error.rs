//! Common error infrastructure for battle-core.
//!
//! Caller mistakes (unknown ids, acting out of turn, undoing an empty log)
//! surface as errors. Missing data inside a well-formed request (no spell
//! slots, unknown skill, no reaction available) is not an error: it resolves
//! into an unsuccessful log entry so the outer layer can still persist it.

use crate::state::ParticipantId;

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - can retry with same or alternative action.
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    Validation,

    /// Internal error - unexpected state inconsistency.
    Internal,

    /// Fatal error - battle state corrupted, cannot continue.
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

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Contextual information attached to errors for diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorContext {
    /// Participant that triggered the error (if applicable).
    pub actor: Option<ParticipantId>,

    /// Round in which the error occurred.
    pub round: u32,

    /// Logical clock (number of resolved actions) at the time of error.
    pub clock: u64,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(round: u32, clock: u64) -> Self {
        Self {
            actor: None,
            round,
            clock,
        }
    }

    #[must_use]
    pub const fn with_actor(mut self, actor: ParticipantId) -> Self {
        self.actor = Some(actor);
        self
    }
}

/// Common trait for all battle-core errors.
///
/// - All error enums implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait BattleError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    /// Stable identifier for error categorization and tests.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
