//! The diff engine: which catalog entries are not yet installed.

use std::collections::HashSet;

use crate::catalog::CatalogEntry;
use crate::contract::InstalledEmojiSet;

/// Returns the catalog entries whose slug is not already installed,
/// preserving catalog order.
///
/// Matching is case-sensitive exact string comparison. Duplicate slugs
/// across the standard/guest/flag sets are de-duplicated by first-seen
/// order, so each name is uploaded at most once per run.
pub fn compute_missing(
    catalog: &[CatalogEntry],
    installed: &InstalledEmojiSet,
) -> Vec<CatalogEntry> {
    let mut seen: HashSet<&str> = HashSet::new();
    catalog
        .iter()
        .filter(|entry| !installed.contains(&entry.slug) && seen.insert(entry.slug.as_str()))
        .cloned()
        .collect()
}
