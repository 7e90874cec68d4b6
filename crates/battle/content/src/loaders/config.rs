//! Battle configuration loader.

use std::path::Path;

use battle_core::BattleConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for battle configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a [`BattleConfig`] from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> LoadResult<BattleConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<BattleConfig> {
        let config: BattleConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = ConfigLoader::parse("seed = 7\nadvantage_races = [\"elf\", \"halfling\"]\n").unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.advantage_races.len(), 2);
        assert_eq!(config.counter_bonus_percent, BattleConfig::DEFAULT_COUNTER_BONUS_PERCENT);
        assert_eq!(config.pinned_initiative, 999);
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(ConfigLoader::parse("seed = \"seven\"").is_err());
    }
}
