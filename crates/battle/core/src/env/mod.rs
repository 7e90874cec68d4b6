//! Read-only inputs to the engine.
//!
//! Oracles expose the random source, critical tables and summon templates.
//! The [`BattleEnv`] aggregate bundles them with the [`BattleConfig`] so the
//! resolution code never depends on concrete implementations.
mod critical;
mod error;
mod rng;
mod summons;

pub use critical::{CriticalEffect, CriticalKind, CriticalOracle, CriticalOutcome, CriticalTable};
pub use error::OracleError;
pub use rng::{FixedRng, PcgRng, RngOracle, RollCursor, compute_seed};
pub use summons::{SummonCatalog, SummonOracle};

use crate::config::BattleConfig;

static STANDARD_CRITICALS: std::sync::LazyLock<CriticalTable> =
    std::sync::LazyLock::new(CriticalTable::standard);

/// Aggregates the read-only oracles required by the resolution pipelines.
#[derive(Clone, Copy)]
pub struct BattleEnv<'a> {
    config: &'a BattleConfig,
    rng: &'a dyn RngOracle,
    critical: Option<&'a dyn CriticalOracle>,
    summons: Option<&'a dyn SummonOracle>,
}

impl<'a> BattleEnv<'a> {
    pub fn new(config: &'a BattleConfig, rng: &'a dyn RngOracle) -> Self {
        Self {
            config,
            rng,
            critical: None,
            summons: None,
        }
    }

    pub fn with_critical(mut self, critical: &'a dyn CriticalOracle) -> Self {
        self.critical = Some(critical);
        self
    }

    pub fn with_summons(mut self, summons: &'a dyn SummonOracle) -> Self {
        self.summons = Some(summons);
        self
    }

    pub fn config(&self) -> &'a BattleConfig {
        self.config
    }

    pub fn rng(&self) -> &'a dyn RngOracle {
        self.rng
    }

    /// Returns the configured critical tables, falling back to the standard set.
    pub fn critical(&self) -> &'a dyn CriticalOracle {
        match self.critical {
            Some(critical) => critical,
            None => &*STANDARD_CRITICALS,
        }
    }

    /// Returns the SummonOracle, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::SummonsNotAvailable` if no summon oracle was provided.
    pub fn summons(&self) -> Result<&'a dyn SummonOracle, OracleError> {
        self.summons.ok_or(OracleError::SummonsNotAvailable)
    }

    /// Builds the draw cursor for one action.
    pub fn cursor(&self, nonce: u64, actor: u32) -> RollCursor<'a> {
        RollCursor::new(self.rng, self.config.seed, nonce, actor)
    }
}

impl core::fmt::Debug for BattleEnv<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BattleEnv")
            .field("config", self.config)
            .field("critical", &self.critical.is_some())
            .field("summons", &self.summons.is_some())
            .finish()
    }
}
