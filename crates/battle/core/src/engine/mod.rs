//! Turn scheduling and action execution.
//!
//! The [`BattleEngine`] is the authoritative reducer for [`BattleState`].
//! Every request resolves against a [`Scene`] working copy of the roster; the
//! engine then commits the touched participants, appends exactly one log
//! entry and advances the logical clock. Scheduling lives in [`turns`].

mod errors;
mod morale;
mod turns;

pub use errors::{EngineError, TurnError};
pub use morale::{MoraleResult, SHAKEN, morale_check};
pub use turns::{TurnReport, initiative_order};

use tracing::{debug, info};

use crate::combat::{AttackRolls, resolve_attack};
use crate::env::BattleEnv;
use crate::scene::Scene;
use crate::spell::{self, SpellRolls, resolve_spell};
use crate::state::{
    ActionFlags, ActionKind, BattleAction, BattleState, HpChange, Participant, ParticipantId, Side,
};
use crate::triggers::use_bonus_action;

/// Who is still standing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleOutcome {
    Ongoing,
    AlliesWin,
    EnemiesWin,
}

impl BattleOutcome {
    /// Outcome implied by the active participants of `roster`.
    pub fn of(roster: &[Participant]) -> Self {
        let standing = |side: Side| roster.iter().any(|p| p.side() == side && p.is_active());
        match (standing(Side::Ally), standing(Side::Enemy)) {
            (true, true) => BattleOutcome::Ongoing,
            (true, false) => BattleOutcome::AlliesWin,
            (false, _) => BattleOutcome::EnemiesWin,
        }
    }

    pub fn is_over(self) -> bool {
        !matches!(self, BattleOutcome::Ongoing)
    }
}

/// One request from the current actor, carrying the caller's rolls.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ActionRequest {
    Attack {
        actor: ParticipantId,
        targets: Vec<ParticipantId>,
        #[cfg_attr(feature = "serde", serde(default))]
        weapon: usize,
        #[cfg_attr(feature = "serde", serde(default))]
        rolls: AttackRolls,
    },
    CastSpell {
        actor: ParticipantId,
        spell_id: String,
        #[cfg_attr(feature = "serde", serde(default))]
        targets: Vec<ParticipantId>,
        #[cfg_attr(feature = "serde", serde(default))]
        rolls: SpellRolls,
    },
    BonusAction {
        actor: ParticipantId,
        skill_id: String,
        #[cfg_attr(feature = "serde", serde(default))]
        targets: Vec<ParticipantId>,
    },
    MoraleCheck {
        actor: ParticipantId,
        d20: u32,
    },
    SkipTurn {
        actor: ParticipantId,
    },
}

impl ActionRequest {
    pub fn actor(&self) -> ParticipantId {
        match self {
            ActionRequest::Attack { actor, .. }
            | ActionRequest::CastSpell { actor, .. }
            | ActionRequest::BonusAction { actor, .. }
            | ActionRequest::MoraleCheck { actor, .. }
            | ActionRequest::SkipTurn { actor } => *actor,
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            ActionRequest::Attack { .. } => ActionKind::Attack,
            ActionRequest::CastSpell { .. } => ActionKind::SpellCast,
            ActionRequest::BonusAction { .. } => ActionKind::BonusAction,
            ActionRequest::MoraleCheck { .. } => ActionKind::MoraleCheck,
            ActionRequest::SkipTurn { .. } => ActionKind::SkipTurn,
        }
    }
}

/// Complete outcome of one executed request.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionOutcome {
    /// The log entry appended for the request.
    pub entry: BattleAction,

    /// Snapshots of every participant the request touched, after resolution.
    pub updated: Vec<Participant>,

    /// Participants summoned by the request; they join next round.
    pub summons: Vec<Participant>,

    pub outcome: BattleOutcome,

    /// Set when the request ended the turn (skip turn).
    pub next_turn: Option<TurnReport>,
}

/// Battle engine that resolves requests against a [`BattleState`].
pub struct BattleEngine<'a> {
    state: &'a mut BattleState,
}

impl<'a> BattleEngine<'a> {
    pub fn new(state: &'a mut BattleState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &BattleState {
        self.state
    }

    pub fn outcome(&self) -> BattleOutcome {
        BattleOutcome::of(&self.state.roster)
    }

    /// Resolves one request from the current actor.
    ///
    /// Validates that the battle is running and that `request.actor()` holds
    /// the turn. Everything past that point is logged, including requests
    /// that fail for missing data.
    pub fn execute(
        &mut self,
        env: BattleEnv<'_>,
        request: &ActionRequest,
    ) -> Result<ExecutionOutcome, EngineError> {
        let actor = request.actor();
        self.validate_actor(actor)?;

        let state_before = self.state.snapshot();
        let round = self.state.turn.round;
        let clock = self.state.clock;
        let mut scene = Scene::new(&self.state.roster, env, round, clock, actor, self.state.next_id());
        let mut entry = BattleAction::new(request.kind(), actor, state_before);

        match request {
            ActionRequest::Attack {
                targets,
                weapon,
                rolls,
                ..
            } => {
                if action_used(&scene, actor) {
                    entry = entry.failed("action already used");
                } else {
                    let resolution = resolve_attack(&mut scene, actor, targets, *weapon, rolls);
                    if resolution.success {
                        spend_action(&mut scene, actor);
                    }
                    entry.targets = resolution.targets;
                    entry.details = resolution.details;
                    entry.result = resolution.result;
                    entry.success = resolution.success;
                }
            }
            ActionRequest::CastSpell {
                spell_id,
                targets,
                rolls,
                ..
            } => {
                let extra = action_used(&scene, actor);
                if extra && !scene.get(actor).is_some_and(spell::has_extra_cast) {
                    entry = entry.failed("action already used");
                } else {
                    let resolution = resolve_spell(&mut scene, actor, spell_id, targets, rolls);
                    if resolution.success {
                        if extra {
                            if let Some(caster) = scene.get_mut(actor) {
                                spell::consume_extra_cast(caster);
                            }
                        } else {
                            spend_action(&mut scene, actor);
                        }
                    }
                    entry.targets = resolution.targets;
                    entry.details = resolution.details;
                    entry.result = resolution.result;
                    entry.success = resolution.success;
                }
            }
            ActionRequest::BonusAction {
                skill_id, targets, ..
            } => {
                let outcome = use_bonus_action(&mut scene, actor, skill_id, targets);
                entry.targets = targets.clone();
                entry.details.skill = Some(skill_id.clone());
                entry.result = outcome.result;
                entry.success = outcome.success;
            }
            ActionRequest::MoraleCheck { d20, .. } => {
                match morale_check(&mut scene, actor, *d20) {
                    Some(result) => {
                        entry.details.morale_roll = Some(*d20);
                        entry.details.breakdown.push(result.line);
                        entry.result = if result.passed { "passed" } else { "shaken" }.to_string();
                    }
                    None => entry = entry.failed("unknown participant"),
                }
            }
            ActionRequest::SkipTurn { .. } => {
                let name = scene.name_of(actor);
                scene.say(format!("{name} skips the turn"));
                entry.result = "skipped".to_string();
            }
        }

        let output = scene.into_parts();
        entry.hp_changes = output
            .updated
            .iter()
            .filter_map(|after| {
                let before = self.state.participant(after.id)?;
                let change = HpChange::between(before, after);
                (!change.is_noop()).then_some(change)
            })
            .collect();
        entry.narration = output.narration;
        entry.index = self.state.log.len() as u32;

        self.state.commit(&output.updated);
        self.state.queue_summons(output.summons.clone());
        self.state.log.push(entry.clone());
        self.state.clock += 1;

        debug!(
            actor = %actor,
            kind = %entry.kind,
            result = %entry.result,
            success = entry.success,
            "action resolved"
        );

        let outcome = self.outcome();
        if outcome.is_over() {
            info!(%outcome, round, "battle over");
        }

        let next_turn = if matches!(request, ActionRequest::SkipTurn { .. }) && !outcome.is_over() {
            Some(self.end_turn(env)?)
        } else {
            None
        };

        Ok(ExecutionOutcome {
            entry,
            updated: output.updated,
            summons: output.summons,
            outcome,
            next_turn,
        })
    }

    /// Cancels the newest non-cancelled log entry and restores the roster and
    /// turn state it captured.
    pub fn undo_last(&mut self) -> Result<&BattleAction, EngineError> {
        let index = self
            .state
            .log
            .iter()
            .rposition(|entry| !entry.cancelled)
            .ok_or(EngineError::NothingToUndo)?;
        let entry = &mut self.state.log[index];
        entry.cancelled = true;
        let restored = entry.state_before.clone();
        self.state.roster = restored.roster;
        self.state.turn = restored.turn;
        info!(index, round = self.state.turn.round, "action undone");
        Ok(&self.state.log[index])
    }

    fn validate_actor(&self, actor: ParticipantId) -> Result<(), EngineError> {
        let round = self.state.turn.round;
        let clock = self.state.clock;
        if !self.state.turn.started {
            return Err(TurnError::NotStarted.into());
        }
        let outcome = self.outcome();
        if outcome.is_over() {
            return Err(EngineError::BattleOver { outcome });
        }
        let participant = self
            .state
            .participant(actor)
            .ok_or_else(|| EngineError::unknown_participant(actor, round, clock))?;
        let current = self
            .state
            .current()
            .map(|p| p.id)
            .ok_or(TurnError::NoActiveParticipants)?;
        if current != actor {
            return Err(EngineError::not_your_turn(actor, current, round, clock));
        }
        if !participant.is_active() {
            return Err(EngineError::actor_inactive(actor, round, clock));
        }
        Ok(())
    }
}

fn action_used(scene: &Scene<'_>, actor: ParticipantId) -> bool {
    scene
        .get(actor)
        .is_some_and(|p| p.flags.contains(ActionFlags::ACTION_USED))
}

fn spend_action(scene: &mut Scene<'_>, actor: ParticipantId) {
    if let Some(participant) = scene.get_mut(actor) {
        participant.flags.insert(ActionFlags::ACTION_USED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BattleConfig;
    use crate::env::FixedRng;
    use crate::state::{
        AbilityScores, ActiveEffect, Attack, EffectEntry, EffectKind, KnownSpell, LifeStatus,
        SpellEffect, SpellTargeting, Spellcasting,
    };
    use crate::stats::AttackType;

    fn duel() -> BattleState {
        BattleState::new(vec![
            Participant::new(ParticipantId(1), "Hero", Side::Ally)
                .with_hp(20)
                .with_initiative(15, 15)
                .with_abilities(AbilityScores::new(14, 10, 10, 10, 10, 10))
                .with_level(1, 2)
                .with_attack(Attack::new("Sword", AttackType::Melee, "1d8").with_bonus(1)),
            Participant::new(ParticipantId(2), "Goblin", Side::Enemy)
                .with_hp(20)
                .with_initiative(5, 5)
                .with_armor_class(15)
                .with_attack(Attack::new("Club", AttackType::Melee, "1d4")),
        ])
    }

    fn swing(actor: u32, target: u32, d20: u32) -> ActionRequest {
        ActionRequest::Attack {
            actor: ParticipantId(actor),
            targets: vec![ParticipantId(target)],
            weapon: 0,
            rolls: AttackRolls {
                d20,
                damage: vec![5],
                ..AttackRolls::default()
            },
        }
    }

    #[test]
    fn execute_requires_a_started_battle() {
        let config = BattleConfig::default();
        let rng = FixedRng(0);
        let env = BattleEnv::new(&config, &rng);
        let mut state = duel();
        let mut engine = BattleEngine::new(&mut state);
        assert_eq!(
            engine.execute(env, &swing(1, 2, 15)),
            Err(EngineError::Turn(TurnError::NotStarted))
        );
    }

    #[test]
    fn attack_logs_one_entry_and_spends_the_action() {
        let config = BattleConfig::default();
        let rng = FixedRng(0);
        let env = BattleEnv::new(&config, &rng);
        let mut state = duel();
        let mut engine = BattleEngine::new(&mut state);
        engine.start(env).unwrap();

        let outcome = engine.execute(env, &swing(1, 2, 15)).unwrap();
        assert_eq!(outcome.entry.index, 0);
        assert_eq!(outcome.entry.result, "hit");
        let change = outcome.entry.hp_change(ParticipantId(2)).unwrap();
        assert_eq!((change.hp_before, change.hp_after), (20, 13));
        assert_eq!(engine.state().clock, 1);

        let again = engine.execute(env, &swing(1, 2, 15)).unwrap();
        assert!(!again.entry.success);
        assert_eq!(again.entry.result, "action already used");
        assert!(again.entry.hp_changes.is_empty());
        assert_eq!(engine.state().log.len(), 2);
    }

    #[test]
    fn out_of_turn_is_rejected() {
        let config = BattleConfig::default();
        let rng = FixedRng(0);
        let env = BattleEnv::new(&config, &rng);
        let mut state = duel();
        let mut engine = BattleEngine::new(&mut state);
        engine.start(env).unwrap();
        let err = engine.execute(env, &swing(2, 1, 15)).unwrap_err();
        assert!(matches!(err, EngineError::NotYourTurn { current: ParticipantId(1), .. }));
        let err = engine.execute(env, &swing(9, 1, 15)).unwrap_err();
        assert!(matches!(err, EngineError::UnknownParticipant { .. }));
    }

    #[test]
    fn extra_cast_allows_a_second_spell() {
        let config = BattleConfig::default();
        let rng = FixedRng(0);
        let env = BattleEnv::new(&config, &rng);
        let mut book = Spellcasting::default();
        book.known.push(KnownSpell::new(
            "spark",
            "Spark",
            0,
            SpellTargeting::Single,
            SpellEffect::Damage {
                dice: "1d4".to_string(),
                damage_type: "fire".to_string(),
            },
        ));
        let mut state = duel();
        state.roster[0] = state.roster[0].clone().with_spellcasting(book);
        state.roster[0].effects.push(
            ActiveEffect::new("Quickened", EffectKind::Buff, 2).with_entry(EffectEntry::flat("extra_cast", 1)),
        );
        let mut engine = BattleEngine::new(&mut state);
        engine.start(env).unwrap();

        let cast = ActionRequest::CastSpell {
            actor: ParticipantId(1),
            spell_id: "spark".to_string(),
            targets: vec![ParticipantId(2)],
            rolls: SpellRolls {
                amount: vec![2],
                ..SpellRolls::default()
            },
        };
        assert!(engine.execute(env, &cast).unwrap().entry.success);
        assert!(engine.execute(env, &cast).unwrap().entry.success);
        let third = engine.execute(env, &cast).unwrap();
        assert_eq!(third.entry.result, "action already used");
    }

    #[test]
    fn undo_restores_state_before() {
        let config = BattleConfig::default();
        let rng = FixedRng(0);
        let env = BattleEnv::new(&config, &rng);
        let mut state = duel();
        let mut engine = BattleEngine::new(&mut state);
        engine.start(env).unwrap();
        engine.execute(env, &swing(1, 2, 15)).unwrap();

        let undone = engine.undo_last().unwrap();
        assert!(undone.cancelled);
        assert_eq!(engine.state().participant(ParticipantId(2)).map(|p| p.current_hp), Some(20));
        assert!(
            !engine
                .state()
                .participant(ParticipantId(1))
                .unwrap()
                .flags
                .contains(ActionFlags::ACTION_USED)
        );
        assert_eq!(engine.undo_last().unwrap_err(), EngineError::NothingToUndo);
    }

    #[test]
    fn outcome_follows_active_participants() {
        let mut roster = duel().roster;
        assert_eq!(BattleOutcome::of(&roster), BattleOutcome::Ongoing);
        roster[1].current_hp = 0;
        roster[1].status = LifeStatus::Dead;
        assert_eq!(BattleOutcome::of(&roster), BattleOutcome::AlliesWin);
    }
}
