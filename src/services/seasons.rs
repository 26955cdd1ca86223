//! Season reconciliation for series requests.
//!
//! The series backend replaces the whole season list on every update, so the
//! override produced here always carries every source season, never a delta.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{Episode, SeasonCounts, SeasonDescriptor, SeasonEntry};

/// Builds the monitored-season override: every source season is kept, in
/// order, with `monitored` set to its membership in `selected`. Seasons
/// missing from `source` are never synthesized.
#[must_use]
pub fn reconcile(source: &[SeasonEntry], selected: &BTreeSet<i32>) -> Vec<SeasonEntry> {
    source
        .iter()
        .map(|season| SeasonEntry {
            monitored: selected.contains(&season.season_number),
            ..season.clone()
        })
        .collect()
}

/// Joins the source seasons with their file counts for display. Seasons
/// without counts show as 0/0.
#[must_use]
pub fn describe(
    source: &[SeasonEntry],
    counts: &BTreeMap<i32, SeasonCounts>,
) -> Vec<SeasonDescriptor> {
    source
        .iter()
        .map(|season| {
            let c = counts
                .get(&season.season_number)
                .copied()
                .unwrap_or_default();
            SeasonDescriptor {
                number: season.season_number,
                total: c.total,
                have: c.have,
            }
        })
        .collect()
}

/// Per-season totals and files-present counts from an episode list.
#[must_use]
pub fn counts_from_episodes(episodes: &[Episode]) -> BTreeMap<i32, SeasonCounts> {
    let mut counts: BTreeMap<i32, SeasonCounts> = BTreeMap::new();
    for episode in episodes {
        let entry = counts.entry(episode.season_number).or_default();
        entry.total += 1;
        if episode.has_file {
            entry.have += 1;
        }
    }
    counts
}

/// Season numbers in `requested` that `source` does not know about.
#[must_use]
pub fn unknown_seasons(source: &[SeasonEntry], requested: &BTreeSet<i32>) -> Vec<i32> {
    let known: BTreeSet<i32> = source.iter().map(|s| s.season_number).collect();
    requested.difference(&known).copied().collect()
}
