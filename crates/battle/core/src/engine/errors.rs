//! Error types for the battle engine.

use crate::error::{BattleError, ErrorContext, ErrorSeverity};
use crate::state::ParticipantId;

use super::BattleOutcome;

/// Errors raised while scheduling turns.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TurnError {
    #[error("cannot start a battle with an empty roster")]
    EmptyRoster,

    #[error("no active participant left to take a turn")]
    NoActiveParticipants,

    #[error("battle has already started")]
    AlreadyStarted,

    #[error("battle has not started")]
    NotStarted,
}

impl BattleError for TurnError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            TurnError::EmptyRoster | TurnError::AlreadyStarted | TurnError::NotStarted => {
                ErrorSeverity::Validation
            }
            TurnError::NoActiveParticipants => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            TurnError::EmptyRoster => "TURN_EMPTY_ROSTER",
            TurnError::NoActiveParticipants => "TURN_NO_ACTIVE_PARTICIPANTS",
            TurnError::AlreadyStarted => "TURN_ALREADY_STARTED",
            TurnError::NotStarted => "TURN_NOT_STARTED",
        }
    }
}

/// Errors surfaced while executing a request through the battle engine.
///
/// A well-formed request that cannot succeed (no slots, unknown skill) is not
/// an error; it is logged as an unsuccessful entry instead.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("turn scheduling failed: {0}")]
    Turn(#[from] TurnError),

    #[error("unknown participant {participant}")]
    UnknownParticipant {
        participant: ParticipantId,
        context: ErrorContext,
    },

    #[error("participant {actor} cannot act: not active")]
    ActorInactive {
        actor: ParticipantId,
        context: ErrorContext,
    },

    #[error("invalid actor: request actor {actor} does not match current turn actor {current}")]
    NotYourTurn {
        actor: ParticipantId,
        current: ParticipantId,
        context: ErrorContext,
    },

    #[error("battle is over: {outcome}")]
    BattleOver { outcome: BattleOutcome },

    #[error("nothing to undo")]
    NothingToUndo,
}

impl EngineError {
    pub fn unknown_participant(participant: ParticipantId, round: u32, clock: u64) -> Self {
        Self::UnknownParticipant {
            participant,
            context: ErrorContext::new(round, clock).with_actor(participant),
        }
    }

    pub fn actor_inactive(actor: ParticipantId, round: u32, clock: u64) -> Self {
        Self::ActorInactive {
            actor,
            context: ErrorContext::new(round, clock).with_actor(actor),
        }
    }

    pub fn not_your_turn(actor: ParticipantId, current: ParticipantId, round: u32, clock: u64) -> Self {
        Self::NotYourTurn {
            actor,
            current,
            context: ErrorContext::new(round, clock).with_actor(actor),
        }
    }
}

impl BattleError for EngineError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            EngineError::Turn(err) => err.severity(),
            EngineError::UnknownParticipant { .. } => ErrorSeverity::Validation,
            EngineError::ActorInactive { .. } | EngineError::NotYourTurn { .. } => {
                ErrorSeverity::Recoverable
            }
            EngineError::BattleOver { .. } | EngineError::NothingToUndo => {
                ErrorSeverity::Validation
            }
        }
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            EngineError::UnknownParticipant { context, .. }
            | EngineError::ActorInactive { context, .. }
            | EngineError::NotYourTurn { context, .. } => Some(context),
            _ => None,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            EngineError::Turn(err) => err.error_code(),
            EngineError::UnknownParticipant { .. } => "ENGINE_UNKNOWN_PARTICIPANT",
            EngineError::ActorInactive { .. } => "ENGINE_ACTOR_INACTIVE",
            EngineError::NotYourTurn { .. } => "ENGINE_NOT_YOUR_TURN",
            EngineError::BattleOver { .. } => "ENGINE_BATTLE_OVER",
            EngineError::NothingToUndo => "ENGINE_NOTHING_TO_UNDO",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_severity() {
        let err = EngineError::not_your_turn(ParticipantId(2), ParticipantId(1), 1, 4);
        assert_eq!(err.error_code(), "ENGINE_NOT_YOUR_TURN");
        assert!(err.severity().is_recoverable());
        assert_eq!(err.context().and_then(|c| c.actor), Some(ParticipantId(2)));

        let err = EngineError::from(TurnError::EmptyRoster);
        assert_eq!(err.error_code(), "TURN_EMPTY_ROSTER");
        assert_eq!(err.severity(), ErrorSeverity::Validation);
    }
}
