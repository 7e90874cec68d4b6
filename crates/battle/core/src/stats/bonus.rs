//! Damage and healing contribution stack.
//!
//! Contributions are collected from skills, active effects, artifacts and
//! passives, then applied in a fixed order:
//! base + stat → Σ percent → Σ flat.
//!
//! ```text
//! percent_bonus = floor(base_with_stat × Σpercent / 100)
//! total         = base_with_stat + percent_bonus + Σflat
//! ```

use super::modifiers::{format_flat, format_percent, non_empty, percent_bonus};

/// One labelled bonus.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Contribution {
    /// Stored as integer percentage (25 = +25%).
    Percent { label: String, value: i32 },
    Flat { label: String, value: i32 },
}

impl Contribution {
    pub fn line(&self) -> String {
        match self {
            Contribution::Percent { label, value } => format_percent(label, i64::from(*value)),
            Contribution::Flat { label, value } => format_flat(label, i64::from(*value)),
        }
    }
}

/// Ordered collection of contributions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BonusStack {
    contributions: Vec<Contribution>,
}

/// Result of applying a [`BonusStack`] to a base value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StackTotal {
    pub total_percent: i64,
    pub percent_bonus: i64,
    pub total_flat: i64,
    pub total: i64,
}

impl BonusStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_percent(&mut self, label: impl Into<String>, value: i32) {
        self.contributions.push(Contribution::Percent {
            label: label.into(),
            value,
        });
    }

    pub fn add_flat(&mut self, label: impl Into<String>, value: i32) {
        self.contributions.push(Contribution::Flat {
            label: label.into(),
            value,
        });
    }

    pub fn extend(&mut self, other: BonusStack) {
        self.contributions.extend(other.contributions);
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    pub fn total_percent(&self) -> i64 {
        self.contributions
            .iter()
            .filter_map(|c| match c {
                Contribution::Percent { value, .. } => Some(i64::from(*value)),
                Contribution::Flat { .. } => None,
            })
            .sum()
    }

    pub fn total_flat(&self) -> i64 {
        self.contributions
            .iter()
            .filter_map(|c| match c {
                Contribution::Flat { value, .. } => Some(i64::from(*value)),
                Contribution::Percent { .. } => None,
            })
            .sum()
    }

    /// Applies the stack to a non-negative base.
    pub fn apply(&self, base_with_stat: i64) -> StackTotal {
        let total_percent = self.total_percent();
        let percent_bonus = percent_bonus(base_with_stat, total_percent);
        let total_flat = self.total_flat();
        StackTotal {
            total_percent,
            percent_bonus,
            total_flat,
            total: base_with_stat + percent_bonus + total_flat,
        }
    }

    /// Breakdown lines: percent contributions first, then flat ones, each in
    /// insertion order. Zero contributions produce no line.
    pub fn lines(&self) -> Vec<String> {
        let percents = self
            .contributions
            .iter()
            .filter(|c| matches!(c, Contribution::Percent { .. }));
        let flats = self
            .contributions
            .iter()
            .filter(|c| matches!(c, Contribution::Flat { .. }));
        non_empty(percents.chain(flats).map(Contribution::line))
    }
}
