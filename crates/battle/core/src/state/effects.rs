//! Active effects owned by a participant.

use super::ParticipantId;

/// Classification of an active effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EffectKind {
    Buff,
    Debuff,
    Condition,
}

impl EffectKind {
    /// Debuffs and conditions are removed by cleansing abilities.
    pub fn is_negative(self) -> bool {
        matches!(self, EffectKind::Debuff | EffectKind::Condition)
    }
}

/// When an effect was applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AppliedAt {
    pub round: u32,
    /// Logical battle clock, not wall time.
    pub timestamp: u64,
}

/// One stat delta carried by an active effect.
///
/// `stat` is a free-form tag (`ac_bonus`, `speed`, `morale`, `melee_damage`,
/// ...). Readers match on the tag; unknown tags are carried but ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectEntry {
    pub stat: String,
    pub value: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_percentage: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub damage_type: Option<String>,
}

impl EffectEntry {
    pub fn flat(stat: &str, value: i32) -> Self {
        Self {
            stat: stat.to_string(),
            value,
            is_percentage: false,
            damage_type: None,
        }
    }

    pub fn percent(stat: &str, value: i32) -> Self {
        Self {
            is_percentage: true,
            ..Self::flat(stat, value)
        }
    }
}

/// Per-round damage payload.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DotDamage {
    pub damage_per_round: u32,
    pub damage_type: String,
}

/// A buff, debuff or condition with a remaining duration in owner turns.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveEffect {
    pub id: String,
    pub name: String,
    pub kind: EffectKind,
    pub duration: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub applied_at: AppliedAt,
    #[cfg_attr(feature = "serde", serde(default))]
    pub effects: Vec<EffectEntry>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub dot_damage: Option<DotDamage>,
    /// Participant that applied the effect, when it matters (damage redirection).
    #[cfg_attr(feature = "serde", serde(default))]
    pub source: Option<ParticipantId>,
}

impl ActiveEffect {
    pub fn new(name: &str, kind: EffectKind, duration: u32) -> Self {
        Self {
            id: String::new(),
            name: name.to_string(),
            kind,
            duration,
            applied_at: AppliedAt::default(),
            effects: Vec::new(),
            dot_damage: None,
            source: None,
        }
    }

    pub fn with_entry(mut self, entry: EffectEntry) -> Self {
        self.effects.push(entry);
        self
    }

    pub fn with_dot(mut self, damage_per_round: u32, damage_type: &str) -> Self {
        self.dot_damage = Some(DotDamage {
            damage_per_round,
            damage_type: damage_type.to_string(),
        });
        self
    }

    pub fn with_source(mut self, source: ParticipantId) -> Self {
        self.source = Some(source);
        self
    }

    /// Entries whose tag equals `stat` (case-insensitive).
    pub fn entries<'a>(&'a self, stat: &'a str) -> impl Iterator<Item = &'a EffectEntry> + 'a {
        self.effects
            .iter()
            .filter(move |entry| entry.stat.eq_ignore_ascii_case(stat))
    }
}
