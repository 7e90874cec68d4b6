//! Initiative order, start-of-turn bookkeeping and turn advancement.

use core::cmp::Ordering;

use tracing::{debug, info};

use super::{BattleEngine, EngineError, TurnError};
use crate::config::BattleConfig;
use crate::env::BattleEnv;
use crate::ledger;
use crate::scene::{Scene, SceneOutput};
use crate::state::{Ability, ActionFlags, LifeStatus, Participant, ParticipantId};
use crate::stats::effective_initiative;
use crate::triggers;

/// What happened while handing the turn to the next participant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TurnReport {
    pub round: u32,
    /// Participant now holding the turn.
    pub actor: Option<ParticipantId>,
    /// A new round started (pending summons joined, roster re-sorted).
    pub new_round: bool,
    /// The same participant acts again.
    pub extra_turn: bool,
    /// DOT ticks, expirations and start-of-turn trigger narration.
    pub narration: Vec<String>,
}

/// Sorts `roster` into initiative order.
///
/// Participants of the pinned race are set to the pinned initiative first.
/// Order: effective initiative desc, base initiative desc, dexterity desc,
/// id asc.
pub fn initiative_order(roster: &mut [Participant], config: &BattleConfig) {
    for participant in roster.iter_mut() {
        if config.is_pinned_race(&participant.race) {
            participant.initiative = config.pinned_initiative;
        }
    }
    roster.sort_by(compare_initiative);
}

fn compare_initiative(a: &Participant, b: &Participant) -> Ordering {
    effective_initiative(b)
        .cmp(&effective_initiative(a))
        .then_with(|| b.base_initiative.cmp(&a.base_initiative))
        .then_with(|| {
            b.abilities
                .score(Ability::Dex)
                .cmp(&a.abilities.score(Ability::Dex))
        })
        .then_with(|| a.id.cmp(&b.id))
}

impl BattleEngine<'_> {
    /// Fires `onBattleStart` hooks, sorts the roster and opens round 1.
    pub fn start(&mut self, env: BattleEnv<'_>) -> Result<TurnReport, EngineError> {
        if self.state.turn.started {
            return Err(TurnError::AlreadyStarted.into());
        }
        if self.state.roster.is_empty() {
            return Err(TurnError::EmptyRoster.into());
        }

        let mut report = TurnReport {
            round: 1,
            new_round: true,
            ..TurnReport::default()
        };
        let mut scene = Scene::new(
            &self.state.roster,
            env,
            1,
            self.state.clock,
            ParticipantId::default(),
            self.state.next_id(),
        );
        let owners: Vec<ParticipantId> = self
            .state
            .roster
            .iter()
            .filter(|p| p.is_active())
            .map(|p| p.id)
            .collect();
        for owner in owners {
            triggers::on_battle_start(&mut scene, owner);
        }
        self.absorb(scene.into_parts(), &mut report);

        initiative_order(&mut self.state.roster, env.config());
        self.state.turn.round = 1;
        self.state.turn.index = 0;
        self.state.turn.started = true;
        self.state.turn.ticked.clear();
        info!(
            participants = self.state.roster.len(),
            first = ?self.state.current().map(|p| p.id),
            "battle started"
        );

        if self.state.current().is_some_and(Participant::is_active) {
            self.begin_turn(env, &mut report);
        }
        if !self.current_can_act() && !self.outcome().is_over() {
            self.advance(env, &mut report)?;
        }
        Ok(report)
    }

    /// Ends the current turn.
    ///
    /// A pending extra turn replays the same participant. Otherwise the turn
    /// passes to the next active participant, opening a new round on wrap.
    pub fn end_turn(&mut self, env: BattleEnv<'_>) -> Result<TurnReport, EngineError> {
        if !self.state.turn.started {
            return Err(TurnError::NotStarted.into());
        }
        let outcome = self.outcome();
        if outcome.is_over() {
            return Err(EngineError::BattleOver { outcome });
        }

        let mut report = TurnReport {
            round: self.state.turn.round,
            ..TurnReport::default()
        };
        let index = self.state.turn.index;
        let extra = self.state.roster.get_mut(index).is_some_and(|p| {
            let extra = p.is_active() && p.flags.contains(ActionFlags::EXTRA_TURN);
            p.flags.remove(ActionFlags::EXTRA_TURN);
            extra
        });
        if extra {
            report.extra_turn = true;
            self.begin_turn(env, &mut report);
            if self.current_can_act() || self.outcome().is_over() {
                return Ok(report);
            }
        }

        self.advance(env, &mut report)?;
        Ok(report)
    }

    fn current_can_act(&self) -> bool {
        self.state.current().is_some_and(Participant::is_active)
    }

    /// Moves to the next participant that is still active after its
    /// start-of-turn bookkeeping.
    fn advance(&mut self, env: BattleEnv<'_>, report: &mut TurnReport) -> Result<(), EngineError> {
        let limit = 2 * (self.state.roster.len() + self.state.turn.pending.len()) + 2;
        for _ in 0..limit {
            self.state.turn.index += 1;
            if self.state.turn.index >= self.state.roster.len() {
                self.open_round(env, report);
            }
            if !self.current_can_act() {
                continue;
            }
            self.begin_turn(env, report);
            if self.current_can_act() || self.outcome().is_over() {
                return Ok(());
            }
        }
        Err(TurnError::NoActiveParticipants.into())
    }

    /// Start-of-round: merge pending summons, then re-sort.
    fn open_round(&mut self, env: BattleEnv<'_>, report: &mut TurnReport) {
        let turn = &mut self.state.turn;
        turn.round += 1;
        turn.index = 0;
        turn.ticked.clear();
        let joined = turn.pending.len();
        self.state.roster.append(&mut turn.pending);
        initiative_order(&mut self.state.roster, env.config());

        report.round = self.state.turn.round;
        report.new_round = true;
        info!(round = self.state.turn.round, joined, "round started");
    }

    /// DOT ticks, duration decay and status update, then start-of-turn
    /// triggers, then the action economy reset.
    ///
    /// Ticking and triggers run once per participant per round; an extra turn
    /// only resets the action economy.
    fn begin_turn(&mut self, env: BattleEnv<'_>, report: &mut TurnReport) {
        let Some(actor) = self.state.current().map(|p| p.id) else {
            return;
        };
        report.round = self.state.turn.round;
        report.actor = Some(actor);

        let first = !self.state.turn.has_ticked(actor);
        let mut scene = Scene::new(
            &self.state.roster,
            env,
            self.state.turn.round,
            self.state.clock,
            actor,
            self.state.next_id(),
        );

        if first {
            let lines = scene.get_mut(actor).map(tick).unwrap_or_default();
            for line in lines {
                scene.say(line);
            }
            if scene.is_active(actor) {
                triggers::start_of_turn(&mut scene, actor);
            }
        }
        if let Some(participant) = scene.get_mut(actor) {
            let granted = participant.flags & ActionFlags::EXTRA_TURN;
            participant.reset_turn_flags();
            participant.flags |= granted;
        }

        self.absorb(scene.into_parts(), report);
        if first {
            self.state.turn.ticked.push(actor);
        }
        debug!(participant = %actor, round = report.round, first, "turn started");
    }

    fn absorb(&mut self, output: SceneOutput, report: &mut TurnReport) {
        self.state.commit(&output.updated);
        self.state.queue_summons(output.summons);
        report.narration.extend(output.narration);
    }
}

/// Applies DOT and decays durations of the participant starting its turn.
fn tick(participant: &mut Participant) -> Vec<String> {
    let mut lines = ledger::apply_dot_effects(participant);
    let name = participant.name.clone();
    for expired in ledger::decrease_effect_durations(participant) {
        lines.push(format!("{expired} wears off {name}"));
    }
    if participant.current_hp == 0 && participant.is_active() {
        participant.status = LifeStatus::Unconscious;
        lines.push(format!("{name} is {}", participant.status));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::FixedRng;
    use crate::state::{AbilityScores, ActiveEffect, BattleState, DotDamage, EffectKind, Side};

    fn unit(id: u32, side: Side, initiative: i32, base: i32, dex: i32) -> Participant {
        Participant::new(ParticipantId(id), &format!("u{id}"), side)
            .with_hp(10)
            .with_initiative(initiative, base)
            .with_abilities(AbilityScores::new(10, dex, 10, 10, 10, 10))
    }

    #[test]
    fn initiative_tie_breaks() {
        let config = BattleConfig::default();
        let mut roster = vec![
            unit(1, Side::Ally, 10, 10, 12),
            unit(2, Side::Ally, 10, 9, 14),
            unit(3, Side::Enemy, 12, 0, 10),
        ];
        initiative_order(&mut roster, &config);
        let order: Vec<u32> = roster.iter().map(|p| p.id.0).collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn pinned_race_goes_first() {
        let config = BattleConfig::default();
        let mut roster = vec![
            unit(1, Side::Ally, 20, 20, 18),
            unit(2, Side::Enemy, 1, 1, 8).with_race("fey"),
        ];
        initiative_order(&mut roster, &config);
        assert_eq!(roster[0].id, ParticipantId(2));
        assert_eq!(roster[0].initiative, BattleConfig::DEFAULT_PINNED_INITIATIVE);
    }

    #[test]
    fn turns_wrap_into_new_round_and_skip_the_fallen() {
        let config = BattleConfig::default();
        let rng = FixedRng(0);
        let env = BattleEnv::new(&config, &rng);
        let mut fallen = unit(3, Side::Enemy, 8, 8, 10).with_current_hp(0);
        fallen.status = LifeStatus::Unconscious;
        let mut state = BattleState::new(vec![
            unit(1, Side::Ally, 15, 15, 10),
            unit(2, Side::Enemy, 10, 10, 10),
            fallen,
        ]);
        let mut engine = BattleEngine::new(&mut state);
        let report = engine.start(env).unwrap();
        assert_eq!((report.round, report.actor), (1, Some(ParticipantId(1))));

        let report = engine.end_turn(env).unwrap();
        assert_eq!(report.actor, Some(ParticipantId(2)));
        let report = engine.end_turn(env).unwrap();
        assert!(report.new_round);
        assert_eq!((report.round, report.actor), (2, Some(ParticipantId(1))));
    }

    #[test]
    fn dot_ticks_once_per_round_and_effects_expire() {
        let config = BattleConfig::default();
        let rng = FixedRng(0);
        let env = BattleEnv::new(&config, &rng);
        let mut burning = ActiveEffect::new("Burning", EffectKind::Debuff, 2);
        burning.dot_damage = Some(DotDamage {
            damage_per_round: 3,
            damage_type: "fire".to_string(),
        });
        let mut state = BattleState::new(vec![
            unit(1, Side::Ally, 15, 15, 10).with_effect(burning),
            unit(2, Side::Enemy, 10, 10, 10),
        ]);
        let mut engine = BattleEngine::new(&mut state);
        engine.start(env).unwrap();
        let hero = engine.state().participant(ParticipantId(1)).unwrap();
        assert_eq!((hero.current_hp, hero.effects[0].duration), (7, 1));

        engine.end_turn(env).unwrap();
        let report = engine.end_turn(env).unwrap();
        let hero = engine.state().participant(ParticipantId(1)).unwrap();
        assert_eq!(hero.current_hp, 4);
        assert!(hero.effects.is_empty());
        assert!(report.narration.iter().any(|line| line == "Burning wears off u1"));
    }

    #[test]
    fn extra_turn_replays_without_ticking() {
        let config = BattleConfig::default();
        let rng = FixedRng(0);
        let env = BattleEnv::new(&config, &rng);
        let mut burning = ActiveEffect::new("Burning", EffectKind::Debuff, 3);
        burning.dot_damage = Some(DotDamage {
            damage_per_round: 2,
            damage_type: "fire".to_string(),
        });
        let mut state = BattleState::new(vec![
            unit(1, Side::Ally, 15, 15, 10).with_effect(burning),
            unit(2, Side::Enemy, 10, 10, 10),
        ]);
        let mut engine = BattleEngine::new(&mut state);
        engine.start(env).unwrap();
        engine.state.roster[0].flags.insert(ActionFlags::ACTION_USED | ActionFlags::EXTRA_TURN);

        let report = engine.end_turn(env).unwrap();
        assert!(report.extra_turn);
        assert_eq!(report.actor, Some(ParticipantId(1)));
        let hero = &engine.state().roster[0];
        assert_eq!(hero.current_hp, 8);
        assert!(hero.flags.is_empty());
    }

    #[test]
    fn start_twice_is_rejected() {
        let config = BattleConfig::default();
        let rng = FixedRng(0);
        let env = BattleEnv::new(&config, &rng);
        let mut state = BattleState::new(Vec::new());
        let mut engine = BattleEngine::new(&mut state);
        assert_eq!(engine.start(env), Err(EngineError::Turn(TurnError::EmptyRoster)));

        let mut state = BattleState::new(vec![unit(1, Side::Ally, 1, 1, 10), unit(2, Side::Enemy, 1, 1, 10)]);
        let mut engine = BattleEngine::new(&mut state);
        engine.start(env).unwrap();
        assert_eq!(engine.start(env), Err(EngineError::Turn(TurnError::AlreadyStarted)));
    }
}
