//! Critical-effect tables.
//!
//! A natural 20 draws an entry from the success table, a natural 1 from the
//! fail table. Tables are data: the engine ships a default set and content
//! loaders may replace it.

/// Which table an entry belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CriticalOutcome {
    Success,
    Fail,
}

/// Mechanical payload of a critical entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CriticalKind {
    /// Final physical damage is doubled.
    DoubleDamage,
    /// Weapon dice count as rolling their maximum.
    MaxDice,
    /// Adds the average of extra dice to the damage.
    ExtraDamage { dice: String },
    /// Target receives an AC penalty for a number of rounds.
    TargetArmorPenalty { value: i32, duration: u32 },
    /// Attacker hurts itself.
    SelfDamage { amount: u32 },
    /// Attacker receives an AC penalty for a number of rounds.
    SelfArmorPenalty { value: i32, duration: u32 },
    /// Narrative only.
    Nothing,
}

/// One row of a critical table.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CriticalEffect {
    pub id: String,
    pub name: String,
    pub kind: CriticalKind,
    /// The target may not react to an attack carrying this entry.
    #[cfg_attr(feature = "serde", serde(default))]
    pub suppresses_reaction: bool,
}

impl CriticalEffect {
    pub fn new(id: &str, name: &str, kind: CriticalKind) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            suppresses_reaction: false,
        }
    }

    pub fn suppressing_reaction(mut self) -> Self {
        self.suppresses_reaction = true;
        self
    }
}

/// Oracle exposing the critical tables.
pub trait CriticalOracle: Send + Sync {
    fn table(&self, outcome: CriticalOutcome) -> &[CriticalEffect];
}

/// In-memory critical tables.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CriticalTable {
    pub success: Vec<CriticalEffect>,
    pub fail: Vec<CriticalEffect>,
}

impl CriticalTable {
    pub fn new(success: Vec<CriticalEffect>, fail: Vec<CriticalEffect>) -> Self {
        Self { success, fail }
    }

    /// Built-in tables used when no content is loaded.
    pub fn standard() -> Self {
        Self {
            success: vec![
                CriticalEffect::new("double", "Devastating blow", CriticalKind::DoubleDamage),
                CriticalEffect::new("max_dice", "Perfect strike", CriticalKind::MaxDice),
                CriticalEffect::new(
                    "extra",
                    "Deep wound",
                    CriticalKind::ExtraDamage {
                        dice: "1d6".to_string(),
                    },
                ),
                CriticalEffect::new(
                    "armor_crack",
                    "Staggering blow",
                    CriticalKind::TargetArmorPenalty {
                        value: 2,
                        duration: 2,
                    },
                )
                .suppressing_reaction(),
            ],
            fail: vec![
                CriticalEffect::new("fumble", "Fumble", CriticalKind::Nothing),
                CriticalEffect::new(
                    "self_hit",
                    "Self-inflicted wound",
                    CriticalKind::SelfDamage { amount: 2 },
                ),
                CriticalEffect::new(
                    "off_balance",
                    "Off balance",
                    CriticalKind::SelfArmorPenalty {
                        value: 2,
                        duration: 1,
                    },
                ),
            ],
        }
    }
}

impl Default for CriticalTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl CriticalOracle for CriticalTable {
    fn table(&self, outcome: CriticalOutcome) -> &[CriticalEffect] {
        match outcome {
            CriticalOutcome::Success => &self.success,
            CriticalOutcome::Fail => &self.fail,
        }
    }
}
