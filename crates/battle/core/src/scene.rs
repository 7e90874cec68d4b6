//! Working copy used while one request is being resolved.
//!
//! Resolution never mutates the caller's roster. A [`Scene`] clones it, the
//! pipelines mutate the clones, and [`Scene::into_parts`] hands back only the
//! participants that were touched together with the narration.

use std::collections::BTreeSet;

use crate::config::BattleConfig;
use crate::env::{BattleEnv, RollCursor};
use crate::ledger;
use crate::state::{ActiveEffect, Participant, ParticipantId};

/// Mutable resolution context for one request.
pub struct Scene<'a> {
    roster: Vec<Participant>,
    touched: BTreeSet<ParticipantId>,
    narration: Vec<String>,
    summons: Vec<Participant>,
    env: BattleEnv<'a>,
    cursor: RollCursor<'a>,
    round: u32,
    clock: u64,
    next_id: u32,
}

/// What a finished scene hands back to the engine.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneOutput {
    /// Touched participants, in roster order.
    pub updated: Vec<Participant>,
    pub narration: Vec<String>,
    /// Participants summoned during resolution; they join next round.
    pub summons: Vec<Participant>,
}

/// Scene contents saved by [`Scene::checkpoint`].
pub struct Checkpoint {
    roster: Vec<Participant>,
    touched: BTreeSet<ParticipantId>,
    narration: usize,
    summons: usize,
    next_id: u32,
}

impl<'a> Scene<'a> {
    pub fn new(
        roster: &[Participant],
        env: BattleEnv<'a>,
        round: u32,
        clock: u64,
        actor: ParticipantId,
        next_id: u32,
    ) -> Self {
        Self {
            roster: roster.to_vec(),
            touched: BTreeSet::new(),
            narration: Vec::new(),
            summons: Vec::new(),
            env,
            cursor: env.cursor(clock, actor.0),
            round,
            clock,
            next_id,
        }
    }

    // ===== read access =====

    pub fn env(&self) -> BattleEnv<'a> {
        self.env
    }

    pub fn config(&self) -> &'a BattleConfig {
        self.env.config()
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn roster(&self) -> &[Participant] {
        &self.roster
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.roster.iter().find(|p| p.id == id)
    }

    pub fn name_of(&self, id: ParticipantId) -> String {
        self.get(id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn is_active(&self, id: ParticipantId) -> bool {
        self.get(id).is_some_and(Participant::is_active)
    }

    // ===== write access =====

    /// Mutable access; marks the participant as touched.
    pub fn get_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        let participant = self.roster.iter_mut().find(|p| p.id == id)?;
        self.touched.insert(id);
        Some(participant)
    }

    /// Marks a participant as touched without changing it.
    pub fn touch(&mut self, id: ParticipantId) {
        if self.get(id).is_some() {
            self.touched.insert(id);
        }
    }

    pub fn say(&mut self, line: impl Into<String>) {
        let line = line.into();
        if !line.is_empty() {
            self.narration.push(line);
        }
    }

    pub fn cursor(&mut self) -> &mut RollCursor<'a> {
        &mut self.cursor
    }

    /// Adds an effect through the ledger, stamped with this scene's round and clock.
    pub fn add_effect(&mut self, id: ParticipantId, effect: ActiveEffect) -> bool {
        let round = self.round;
        let clock = self.clock;
        match self.get_mut(id) {
            Some(participant) => {
                ledger::add_active_effect(participant, effect, round, clock);
                true
            }
            None => false,
        }
    }

    /// Queues a summoned participant and returns its new id.
    pub fn summon(&mut self, mut participant: Participant) -> ParticipantId {
        let id = ParticipantId(self.next_id);
        self.next_id += 1;
        participant.id = id;
        self.summons.push(participant);
        id
    }

    /// Saves the roster, narration and summons. Draws already taken from the
    /// cursor are not part of a checkpoint.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            roster: self.roster.clone(),
            touched: self.touched.clone(),
            narration: self.narration.len(),
            summons: self.summons.len(),
            next_id: self.next_id,
        }
    }

    /// Discards every change made since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.roster = checkpoint.roster;
        self.touched = checkpoint.touched;
        self.narration.truncate(checkpoint.narration);
        self.summons.truncate(checkpoint.summons);
        self.next_id = checkpoint.next_id;
    }

    pub fn into_parts(self) -> SceneOutput {
        let touched = self.touched;
        SceneOutput {
            updated: self
                .roster
                .into_iter()
                .filter(|p| touched.contains(&p.id))
                .collect(),
            narration: self.narration,
            summons: self.summons,
        }
    }
}
