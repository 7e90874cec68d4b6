//! Data-driven battle content and loaders.
//!
//! This crate reads RON/TOML data files into `battle-core` types:
//! - Battle configuration (TOML)
//! - Critical-effect tables (RON)
//! - Rosters of participants (RON)
//! - Summon templates per tier (RON)
//! - Scripted request sequences for replays (RON)
//!
//! Content feeds the engine's oracles and the initial roster; it never
//! appears in the action log.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{
    BattleScript, ConfigLoader, ContentFactory, CriticalLoader, RosterLoader, ScriptLoader,
    ScriptStep, SummonLoader,
};
