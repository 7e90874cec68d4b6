//! Authoritative battle state.
//!
//! This module owns the roster, turn bookkeeping and the action log. Callers
//! clone or query this state but mutate it exclusively through the engine.
mod effects;
mod gear;
mod log;
mod participant;
mod skills;
mod spells;
mod turn;

use core::fmt;

pub use effects::{ActiveEffect, AppliedAt, DotDamage, EffectEntry, EffectKind};
pub use gear::{ArtifactModifier, Attack, PassiveAbility, Resistances};
#[cfg(feature = "serde")]
pub use log::compute_log_root;
pub use log::{
    ActionDetails, ActionKind, AttackDetails, BattleAction, CheckOutcome, HitOutcome, HpChange,
    ReactionDetails, SpellDetails, SpellTargetOutcome, StateBefore,
};
pub use participant::{
    Ability, AbilityScores, ActionFlags, Identity, LifeStatus, Participant, Side, SourceKind,
};
pub use skills::{
    ActiveSkill, Comparison, EffectTarget, EffectValue, Hook, SkillEffect, SkillEffectKind,
    SkillTrigger, TriggerModifiers, TriggerTarget, ValueType,
};
pub use spells::{KnownSpell, SaveEffect, SlotPool, SpellCheck, SpellEffect, SpellTargeting, Spellcasting};
pub use turn::TurnState;

/// Battle-scoped participant identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ParticipantId(pub u32);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Canonical snapshot of one battle.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleState {
    /// Participants in initiative order once the battle has started.
    pub roster: Vec<Participant>,

    pub turn: TurnState,

    #[cfg_attr(feature = "serde", serde(default))]
    pub log: Vec<BattleAction>,

    /// Logical clock: number of resolved actions. Used as the RNG nonce and
    /// as the `applied_at` timestamp of new effects.
    #[cfg_attr(feature = "serde", serde(default))]
    pub clock: u64,

    /// Next id handed to a summon. Monotonic, never reused.
    #[cfg_attr(feature = "serde", serde(default))]
    next_id: u32,
}

impl BattleState {
    pub fn new(roster: Vec<Participant>) -> Self {
        let next_id = roster.iter().map(|p| p.id.0 + 1).max().unwrap_or(0);
        Self {
            roster,
            turn: TurnState::new(),
            log: Vec::new(),
            clock: 0,
            next_id,
        }
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.roster.iter().find(|p| p.id == id)
    }

    pub fn participant_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.roster.iter_mut().find(|p| p.id == id)
    }

    /// Participant whose turn it is.
    pub fn current(&self) -> Option<&Participant> {
        self.roster.get(self.turn.index)
    }

    /// Allocates an id not used by any roster or pending participant.
    pub fn allocate_id(&mut self) -> ParticipantId {
        let id = self.next_id();
        self.next_id = id + 1;
        ParticipantId(id)
    }

    /// Id the next summon would receive, without reserving it.
    pub fn next_id(&self) -> u32 {
        self.roster
            .iter()
            .chain(self.turn.pending.iter())
            .map(|p| p.id.0 + 1)
            .max()
            .unwrap_or(0)
            .max(self.next_id)
    }

    /// Queues summoned participants for the next round and reserves their ids.
    pub fn queue_summons(&mut self, summons: Vec<Participant>) {
        for summon in summons {
            self.next_id = self.next_id.max(summon.id.0 + 1);
            self.turn.pending.push(summon);
        }
    }

    /// Snapshot used as the undo point of the next log entry.
    pub fn snapshot(&self) -> StateBefore {
        StateBefore {
            roster: self.roster.clone(),
            turn: self.turn.clone(),
        }
    }

    /// Replaces roster entries with updated snapshots, matched by id.
    pub fn commit(&mut self, updated: &[Participant]) {
        for participant in updated {
            if let Some(slot) = self.participant_mut(participant.id) {
                *slot = participant.clone();
            }
        }
    }
}
