//! Critical-effect table loader.

use std::collections::HashSet;
use std::path::Path;

use battle_core::CriticalTable;

use crate::loaders::{LoadResult, read_file};

/// Loader for critical-effect tables from RON files.
pub struct CriticalLoader;

impl CriticalLoader {
    /// Load a [`CriticalTable`] from a RON file.
    ///
    /// RON format:
    /// ```ron
    /// (
    ///     success: [(id: "double", name: "Devastating blow", kind: DoubleDamage)],
    ///     fail: [(id: "self_hit", name: "Self-inflicted wound", kind: SelfDamage(amount: 2))],
    /// )
    /// ```
    pub fn load(path: &Path) -> LoadResult<CriticalTable> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to load critical table {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<CriticalTable> {
        let table: CriticalTable = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse critical table RON: {}", e))?;

        let mut seen = HashSet::new();
        for entry in table.success.iter().chain(table.fail.iter()) {
            if !seen.insert(entry.id.as_str()) {
                anyhow::bail!("duplicate critical entry id '{}'", entry.id);
            }
        }
        if table.success.is_empty() || table.fail.is_empty() {
            tracing::warn!(
                success = table.success.len(),
                fail = table.fail.len(),
                "critical table has an empty side; natural 1s or 20s will draw nothing"
            );
        }
        Ok(table)
    }
}
