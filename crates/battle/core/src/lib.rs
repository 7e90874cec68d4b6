//! Deterministic battle resolution for a turn-based tabletop RPG.
//!
//! `battle-core` owns the canonical rules: attack and spell pipelines, the
//! skill trigger engine, effect bookkeeping and turn scheduling. It performs
//! no I/O. Callers hydrate a [`BattleState`], supply dice through each
//! [`ActionRequest`], and persist the updated snapshots and log entries the
//! [`engine::BattleEngine`] hands back.
pub mod combat;
pub mod config;
pub mod dice;
pub mod engine;
pub mod env;
pub mod error;
pub mod formula;
pub mod ledger;
pub mod scene;
pub mod spell;
pub mod state;
pub mod stats;
pub mod triggers;

pub use combat::{AttackRolls, resolve_attack};
pub use config::BattleConfig;
pub use dice::DiceExpr;
pub use engine::{
    ActionRequest, BattleEngine, BattleOutcome, EngineError, ExecutionOutcome, TurnError,
    TurnReport, initiative_order,
};
pub use env::{
    BattleEnv, CriticalEffect, CriticalKind, CriticalOracle, CriticalOutcome, CriticalTable,
    FixedRng, OracleError, PcgRng, RngOracle, SummonCatalog, SummonOracle,
};
pub use error::{BattleError, ErrorContext, ErrorSeverity};
pub use scene::Scene;
pub use spell::{SpellRolls, resolve_spell};
#[cfg(feature = "serde")]
pub use state::compute_log_root;
pub use state::{
    Ability, AbilityScores, ActionDetails, ActionFlags, ActionKind, ActiveEffect, ActiveSkill,
    Attack, BattleAction, BattleState, EffectEntry, EffectKind, HpChange, KnownSpell, LifeStatus,
    Participant, ParticipantId, Side, SkillEffect, SkillTrigger, Spellcasting,
};
pub use stats::{AttackType, BonusStack, DamageCategory};
