//! Append-only battle log.
//!
//! Every resolved request yields exactly one [`BattleAction`]. Entries are
//! never edited afterwards except for the `cancelled` flag set by undo.

use super::{LifeStatus, Participant, ParticipantId, TurnState};
use crate::env::CriticalEffect;

/// Kind of a logged action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ActionKind {
    Attack,
    SpellCast,
    BonusAction,
    MoraleCheck,
    SkipTurn,
}

/// Outcome of the attack roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HitOutcome {
    CriticalFail,
    Miss,
    Hit,
    CriticalHit,
}

impl HitOutcome {
    pub fn is_hit(self) -> bool {
        matches!(self, HitOutcome::Hit | HitOutcome::CriticalHit)
    }
}

/// Roll record of a weapon attack.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackDetails {
    pub weapon: String,
    pub d20: u32,
    /// Second d20 when the attack was rolled with advantage.
    pub advantage_d20: Option<u32>,
    /// The d20 actually used.
    pub natural: u32,
    pub attack_bonus: i32,
    pub total: i32,
    pub target_ac: i32,
    pub outcome: HitOutcome,
}

/// Per-target gate result of a spell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CheckOutcome {
    Automatic,
    SaveFailed,
    SaveHalved,
    SaveNegated,
    Hit,
    Missed,
}

/// What a spell did to one target.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellTargetOutcome {
    pub target: ParticipantId,
    pub check: CheckOutcome,
    /// Damage dealt or HP healed, after resistance.
    pub amount: u32,
}

/// Roll record of a spell cast.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellDetails {
    pub spell_id: String,
    pub level: u8,
    pub slot_consumed: bool,
    pub targets: Vec<SpellTargetOutcome>,
    /// Follow-up spell cast for free by an upgrade skill.
    pub follow_up: Option<String>,
}

/// A counter-attack made by the target of an attack.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReactionDetails {
    pub actor: ParticipantId,
    pub target: ParticipantId,
    pub weapon: String,
    pub damage: u32,
}

/// Structured detail of a log entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionDetails {
    pub attack: Option<AttackDetails>,
    pub spell: Option<SpellDetails>,
    pub critical: Option<CriticalEffect>,
    pub reaction: Option<ReactionDetails>,
    /// Skill used by a bonus action.
    pub skill: Option<String>,
    /// Ordered damage/heal composition lines.
    pub breakdown: Vec<String>,
    /// Raw d20 of a morale check.
    pub morale_roll: Option<u32>,
}

/// HP delta of one participant touched by an action.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HpChange {
    pub participant: ParticipantId,
    pub hp_before: u32,
    pub hp_after: u32,
    pub temp_before: u32,
    pub temp_after: u32,
    pub status_after: LifeStatus,
}

impl HpChange {
    pub fn between(before: &Participant, after: &Participant) -> Self {
        Self {
            participant: after.id,
            hp_before: before.current_hp,
            hp_after: after.current_hp,
            temp_before: before.temp_hp,
            temp_after: after.temp_hp,
            status_after: after.status,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.hp_before == self.hp_after && self.temp_before == self.temp_after
    }

    /// Signed HP change (negative for damage).
    pub fn delta(&self) -> i64 {
        i64::from(self.hp_after) - i64::from(self.hp_before)
    }
}

/// Roster and turn state captured before an action, restored by undo.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateBefore {
    pub roster: Vec<Participant>,
    pub turn: TurnState,
}

/// One log record.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleAction {
    pub round: u32,
    /// Ordinal of the entry within the battle log.
    pub index: u32,
    pub actor: ParticipantId,
    pub targets: Vec<ParticipantId>,
    pub kind: ActionKind,
    pub details: ActionDetails,
    /// Short result text (`"hit"`, `"no spell slots"`, ...).
    pub result: String,
    pub success: bool,
    pub hp_changes: Vec<HpChange>,
    /// Player-facing narration lines.
    pub narration: Vec<String>,
    pub cancelled: bool,
    pub state_before: StateBefore,
}

impl BattleAction {
    pub fn new(kind: ActionKind, actor: ParticipantId, state_before: StateBefore) -> Self {
        Self {
            round: state_before.turn.round,
            index: 0,
            actor,
            targets: Vec::new(),
            kind,
            details: ActionDetails::default(),
            result: String::new(),
            success: true,
            hp_changes: Vec::new(),
            narration: Vec::new(),
            cancelled: false,
            state_before,
        }
    }

    /// Marks the entry unsuccessful with a reason.
    pub fn failed(mut self, reason: &str) -> Self {
        self.success = false;
        self.result = reason.to_string();
        self
    }

    pub fn hp_change(&self, id: ParticipantId) -> Option<&HpChange> {
        self.hp_changes.iter().find(|change| change.participant == id)
    }
}

/// SHA-256 over the bincode encoding of each entry, in log order.
///
/// Two replays that produced the same log produce the same root. Entries that
/// fail to encode are skipped.
#[cfg(feature = "serde")]
pub fn compute_log_root(entries: &[BattleAction]) -> [u8; 32] {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    for entry in entries {
        if let Ok(bytes) = bincode::serialize(entry) {
            hasher.update(&bytes);
        }
    }
    hasher.finalize().into()
}
