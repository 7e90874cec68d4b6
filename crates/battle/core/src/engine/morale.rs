//! Morale checks.

use tracing::debug;

use crate::scene::Scene;
use crate::state::{ActiveEffect, EffectEntry, EffectKind, ParticipantId};
use crate::stats::effective_morale;

pub const SHAKEN: &str = "Shaken";

/// Result of one morale check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoraleResult {
    pub passed: bool,
    pub total: i32,
    pub dc: i32,
    pub line: String,
}

/// `d20 + effective morale >= dc` passes. A failure lowers morale by one and
/// shakes the participant until its next turn.
pub fn morale_check(scene: &mut Scene<'_>, actor: ParticipantId, d20: u32) -> Option<MoraleResult> {
    let dc = scene.config().morale_dc;
    let participant = scene.get(actor)?;
    let morale = effective_morale(participant);
    let total = d20 as i32 + morale;
    let passed = total >= dc;
    let name = participant.name.clone();
    let line = format!("Morale roll: {d20} + {morale} = {total} vs DC {dc}");
    debug!(participant = %actor, d20, total, dc, passed, "morale check");

    if passed {
        scene.say(format!("{name} holds firm"));
    } else {
        if let Some(participant) = scene.get_mut(actor) {
            let lowered = i32::from(participant.morale) - 1;
            participant.set_morale(lowered);
        }
        let shaken = ActiveEffect::new(SHAKEN, EffectKind::Condition, 1)
            .with_entry(EffectEntry::flat("attack_bonus", -1));
        scene.add_effect(actor, shaken);
        scene.say(format!("{name} is shaken"));
    }
    Some(MoraleResult {
        passed,
        total,
        dc,
        line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BattleConfig;
    use crate::env::{BattleEnv, FixedRng};
    use crate::state::{Participant, Side};

    fn check(morale: i32, d20: u32) -> (Option<MoraleResult>, Participant) {
        let config = BattleConfig::default();
        let rng = FixedRng(0);
        let env = BattleEnv::new(&config, &rng);
        let roster = vec![Participant::new(ParticipantId(1), "Squire", Side::Ally).with_morale(morale)];
        let mut scene = Scene::new(&roster, env, 1, 0, ParticipantId(1), 2);
        let result = morale_check(&mut scene, ParticipantId(1), d20);
        let after = scene
            .into_parts()
            .updated
            .pop()
            .unwrap_or_else(|| roster[0].clone());
        (result, after)
    }

    #[test]
    fn pass_leaves_participant_untouched() {
        let (result, after) = check(1, 9);
        let result = result.unwrap();
        assert!(result.passed);
        assert_eq!(result.line, "Morale roll: 9 + 1 = 10 vs DC 10");
        assert_eq!(after.morale, 1);
        assert!(after.effects.is_empty());
    }

    #[test]
    fn failure_lowers_morale_and_shakes() {
        let (result, after) = check(-3, 5);
        assert!(!result.unwrap().passed);
        assert_eq!(after.morale, BattleConfig::MORALE_MIN);
        assert!(after.has_effect(SHAKEN));

        let (_, after) = check(2, 1);
        assert_eq!(after.morale, 1);
    }
}
