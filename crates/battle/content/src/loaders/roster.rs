//! Roster loader.

use std::collections::HashSet;
use std::path::Path;

use battle_core::{BattleState, Participant};

use crate::loaders::{LoadResult, read_file};

/// Loader for participant rosters from RON files.
pub struct RosterLoader;

impl RosterLoader {
    /// Load a roster from a RON file.
    ///
    /// RON format: `Vec<Participant>`
    ///
    /// ```ron
    /// [
    ///     (id: 1, name: "Hero", side: ally, max_hp: 20, current_hp: 20, armor_class: 15),
    ///     (id: 2, name: "Goblin", side: enemy, max_hp: 7, current_hp: 7, armor_class: 13),
    /// ]
    /// ```
    pub fn load(path: &Path) -> LoadResult<Vec<Participant>> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to load roster {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<Vec<Participant>> {
        let roster: Vec<Participant> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse roster RON: {}", e))?;
        validate(&roster)?;
        Ok(roster)
    }

    /// Loads a roster into a fresh, unstarted battle.
    pub fn load_state(path: &Path) -> LoadResult<BattleState> {
        Self::load(path).map(BattleState::new)
    }
}

fn validate(roster: &[Participant]) -> LoadResult<()> {
    let mut ids = HashSet::new();
    for participant in roster {
        if !ids.insert(participant.id) {
            anyhow::bail!("duplicate participant id {}", participant.id);
        }
        if participant.max_hp == 0 {
            anyhow::bail!("participant '{}' has no max HP", participant.name);
        }
        if participant.current_hp > participant.max_hp {
            anyhow::bail!(
                "participant '{}' has {} HP above its maximum of {}",
                participant.name,
                participant.current_hp,
                participant.max_hp
            );
        }
    }
    Ok(())
}
