//! Oracle access errors.

use crate::error::{BattleError, ErrorSeverity};

/// Errors that occur when accessing oracle data.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OracleError {
    /// SummonOracle is not available in the environment.
    #[error("SummonOracle not available")]
    SummonsNotAvailable,

    /// No summon template is registered for the tier.
    #[error("no summon template for tier {0}")]
    SummonTierNotFound(u32),
}

impl BattleError for OracleError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            OracleError::SummonsNotAvailable => ErrorSeverity::Recoverable,
            OracleError::SummonTierNotFound(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            OracleError::SummonsNotAvailable => "ORACLE_SUMMONS_NOT_AVAILABLE",
            OracleError::SummonTierNotFound(_) => "ORACLE_SUMMON_TIER_NOT_FOUND",
        }
    }
}
