//! Scripted battle loader.
//!
//! A script is the ordered list of requests a table played, with the dice it
//! rolled. Replaying it through the engine reproduces the action log.

use std::path::Path;

use battle_core::ActionRequest;
use serde::Deserialize;

use crate::loaders::{LoadResult, read_file};

/// One step of a replay.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    /// Execute a request from the current actor.
    Act(ActionRequest),
    /// Hand the turn to the next participant.
    EndTurn,
    /// Cancel the newest non-cancelled log entry.
    Undo,
}

/// Ordered steps of a scripted battle.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct BattleScript {
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

/// Loader for scripted battles from RON files.
pub struct ScriptLoader;

impl ScriptLoader {
    /// Load a [`BattleScript`] from a RON file.
    ///
    /// ```ron
    /// (
    ///     steps: [
    ///         act(attack(actor: 1, targets: [2], rolls: (d20: 15, damage: [5]))),
    ///         end_turn,
    ///         act(skip_turn(actor: 2)),
    ///     ],
    /// )
    /// ```
    pub fn load(path: &Path) -> LoadResult<BattleScript> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to load script {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<BattleScript> {
        ron::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse script RON: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::ParticipantId;

    #[test]
    fn parses_every_step_kind() {
        let script = ScriptLoader::parse(
            r#"(
                steps: [
                    act(attack(actor: 1, targets: [2], rolls: (d20: 15, damage: [5]))),
                    act(cast_spell(actor: 1, spell_id: "bolt", targets: [2], rolls: (amount: [6], checks: {2: 11}))),
                    act(bonus_action(actor: 1, skill_id: "war_cry")),
                    act(morale_check(actor: 1, d20: 12)),
                    end_turn,
                    undo,
                    act(skip_turn(actor: 2)),
                ],
            )"#,
        )
        .unwrap();
        assert_eq!(script.steps.len(), 7);
        match &script.steps[1] {
            ScriptStep::Act(ActionRequest::CastSpell { rolls, .. }) => {
                assert_eq!(rolls.check(ParticipantId(2)), 11);
                assert_eq!(rolls.check(ParticipantId(3)), 0);
            }
            other => panic!("unexpected step {other:?}"),
        }
        assert_eq!(script.steps[4], ScriptStep::EndTurn);
        assert_eq!(
            script.steps[6],
            ScriptStep::Act(ActionRequest::SkipTurn {
                actor: ParticipantId(2)
            })
        );
    }
}
