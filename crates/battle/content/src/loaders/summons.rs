//! Summon template loader.

use std::collections::BTreeMap;
use std::path::Path;

use battle_core::{Participant, SummonCatalog};

use crate::loaders::{LoadResult, read_file};

/// Loader for summon templates from RON files.
pub struct SummonLoader;

impl SummonLoader {
    /// Load a [`SummonCatalog`] from a RON file.
    ///
    /// RON format: `BTreeMap<u32, Participant>` keyed by tier. Template ids
    /// are placeholders; summoned units receive fresh ids in battle.
    pub fn load(path: &Path) -> LoadResult<SummonCatalog> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to load summons {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<SummonCatalog> {
        let tiers: BTreeMap<u32, Participant> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse summon RON: {}", e))?;
        let mut catalog = SummonCatalog::new();
        for (tier, template) in tiers {
            if template.max_hp == 0 {
                anyhow::bail!("summon tier {} ('{}') has no max HP", tier, template.name);
            }
            catalog.insert(tier, template);
        }
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::SummonOracle;

    #[test]
    fn parses_tiers() {
        let catalog = SummonLoader::parse(
            r#"{
                1: (id: 0, name: "Wolf", side: ally, max_hp: 11, current_hp: 11, armor_class: 13),
                2: (id: 0, name: "Bear", side: ally, max_hp: 34, current_hp: 34, armor_class: 11),
            }"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.template(2).map(|t| t.name.as_str()), Some("Bear"));
        assert!(catalog.template(3).is_none());
    }
}
