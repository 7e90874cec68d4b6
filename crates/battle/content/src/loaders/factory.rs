//! Content factory for loading a battle from a data directory.

use std::path::{Path, PathBuf};

use battle_core::{BattleConfig, BattleState, CriticalTable, SummonCatalog};

use crate::loaders::{
    BattleScript, ConfigLoader, CriticalLoader, LoadResult, RosterLoader, ScriptLoader, SummonLoader,
};

/// Content factory that loads all battle content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml      (optional, defaults otherwise)
/// ├── criticals.ron    (optional, built-in tables otherwise)
/// ├── summons.ron      (optional, no summons otherwise)
/// ├── roster.ron
/// └── script.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load battle configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<BattleConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(BattleConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load critical tables from `criticals.ron`.
    pub fn load_criticals(&self) -> LoadResult<CriticalTable> {
        let path = self.data_dir.join("criticals.ron");
        if !path.exists() {
            return Ok(CriticalTable::standard());
        }
        CriticalLoader::load(&path)
    }

    /// Load summon templates from `summons.ron`.
    pub fn load_summons(&self) -> LoadResult<SummonCatalog> {
        let path = self.data_dir.join("summons.ron");
        if !path.exists() {
            return Ok(SummonCatalog::new());
        }
        SummonLoader::load(&path)
    }

    /// Load the roster from `roster.ron` into an unstarted battle.
    pub fn load_state(&self) -> LoadResult<BattleState> {
        RosterLoader::load_state(&self.data_dir.join("roster.ron"))
    }

    /// Load the replay script from `script.ron`.
    pub fn load_script(&self) -> LoadResult<BattleScript> {
        ScriptLoader::load(&self.data_dir.join("script.ron"))
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
    }

    #[test]
    fn optional_files_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let factory = ContentFactory::new(dir.path());
        assert_eq!(factory.load_config().unwrap(), BattleConfig::default());
        assert_eq!(factory.load_criticals().unwrap(), CriticalTable::standard());
        assert!(factory.load_summons().unwrap().is_empty());
        assert!(factory.load_state().is_err());
    }

    #[test]
    fn loads_a_full_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), "seed = 99\nmorale_dc = 12\n").unwrap();
        fs::write(
            dir.path().join("roster.ron"),
            r#"[
                (id: 1, name: "Hero", side: ally, max_hp: 20, current_hp: 20, armor_class: 15),
                (id: 2, name: "Goblin", side: enemy, max_hp: 7, current_hp: 7, armor_class: 13),
            ]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("script.ron"),
            "(steps: [act(skip_turn(actor: 1)), end_turn])",
        )
        .unwrap();

        let factory = ContentFactory::new(dir.path());
        let config = factory.load_config().unwrap();
        assert_eq!((config.seed, config.morale_dc), (99, 12));
        let state = factory.load_state().unwrap();
        assert_eq!(state.roster.len(), 2);
        assert!(!state.turn.started);
        assert_eq!(factory.load_script().unwrap().steps.len(), 2);
    }
}
