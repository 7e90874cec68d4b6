//! Summon templates keyed by tier.

use std::collections::BTreeMap;

use crate::state::Participant;

/// Oracle providing participant templates for summon bonus actions.
pub trait SummonOracle: Send + Sync {
    fn template(&self, tier: u32) -> Option<&Participant>;
}

/// In-memory summon catalog.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SummonCatalog {
    tiers: BTreeMap<u32, Participant>,
}

impl SummonCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tier(mut self, tier: u32, template: Participant) -> Self {
        self.tiers.insert(tier, template);
        self
    }

    pub fn insert(&mut self, tier: u32, template: Participant) {
        self.tiers.insert(tier, template);
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

impl SummonOracle for SummonCatalog {
    fn template(&self, tier: u32) -> Option<&Participant> {
        self.tiers.get(&tier)
    }
}
