//! Denylist of (owner, repository, tag) triples known to be unharvestable.

use crate::model::ExclusionEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Immutable set of excluded triples, injected through configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ExclusionEntry>", into = "Vec<ExclusionEntry>")]
pub struct ExclusionFilter {
    entries: HashSet<ExclusionEntry>,
}

impl ExclusionFilter {
    pub fn new(entries: impl IntoIterator<Item = ExclusionEntry>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn empty() -> Self {
        Self::new([])
    }

    /// Case-sensitive exact match on all three fields.
    pub fn is_excluded(&self, owner: &str, repository: &str, tag: &str) -> bool {
        self.entries
            .contains(&ExclusionEntry::new(owner, repository, tag))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ExclusionFilter {
    /// Releases known to be broken upstream.
    ///
    /// Entries are raw tag names, so each release is listed both with and
    /// without the `v` prefix.
    fn default() -> Self {
        let broken = [
            // directory structure is a mess
            ("BrineProp", "0.1.9"),
            // self reference (and an invalid one)
            ("ModelicaDEVS", "1.0"),
            // missing package.mo
            ("NCLib", "0.82"),
        ];

        Self::new(broken.into_iter().flat_map(|(repository, version)| {
            [
                ExclusionEntry::new("modelica-3rdparty", repository, version),
                ExclusionEntry::new("modelica-3rdparty", repository, format!("v{}", version)),
            ]
        }))
    }
}

impl From<Vec<ExclusionEntry>> for ExclusionFilter {
    fn from(entries: Vec<ExclusionEntry>) -> Self {
        Self::new(entries)
    }
}

impl From<ExclusionFilter> for Vec<ExclusionEntry> {
    fn from(filter: ExclusionFilter) -> Self {
        filter.entries.into_iter().collect()
    }
}
