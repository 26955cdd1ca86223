//! Select-menu options built from core data.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::constants::limits::{MAX_SELECT_OPTIONS, OPTION_DESCRIPTION_CHARS, OPTION_LABEL_CHARS};
use crate::domain::{ExternalIds, MediaKind, QualityTier, SeasonDescriptor};
use crate::services::releases::ReleaseOption;
use crate::services::resolver::ResolvedCandidate;

use super::truncate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    pub description: Option<String>,
    pub default: bool,
}

impl SelectOption {
    fn new(label: &str, value: String) -> Self {
        Self {
            label: truncate(label, OPTION_LABEL_CHARS),
            value,
            description: None,
            default: false,
        }
    }

    fn describe(mut self, description: &str) -> Self {
        if !description.is_empty() {
            self.description = Some(truncate(description, OPTION_DESCRIPTION_CHARS));
        }
        self
    }
}

/// Encodes catalog ids as `tvdb:<id>|tmdb:<id>`, with 0 for a missing id.
#[must_use]
pub fn encode_ids(ids: &ExternalIds) -> String {
    format!(
        "tvdb:{}|tmdb:{}",
        ids.tvdb_id.unwrap_or(0),
        ids.tmdb_id.unwrap_or(0)
    )
}

/// Inverse of [`encode_ids`]. Unknown parts are ignored and zero ids
/// become `None`.
#[must_use]
pub fn decode_ids(value: &str) -> ExternalIds {
    let mut ids = ExternalIds::default();
    for part in value.split('|') {
        let Some((key, raw)) = part.split_once(':') else {
            continue;
        };
        let id = raw.trim().parse::<i32>().ok().filter(|id| *id > 0);
        match key.trim() {
            "tvdb" => ids.tvdb_id = id,
            "tmdb" => ids.tmdb_id = id,
            _ => {}
        }
    }
    ids
}

/// Options for a result list; held candidates get a ✅ prefix and say where
/// they already are. Candidates without usable ids are skipped.
#[must_use]
pub fn candidate_options(kind: MediaKind, candidates: &[ResolvedCandidate]) -> Vec<SelectOption> {
    candidates
        .iter()
        .filter(|c| c.candidate.ids.is_addressable(kind))
        .take(MAX_SELECT_OPTIONS)
        .map(|resolved| {
            let title = resolved.candidate.display_title();
            let value = encode_ids(&resolved.candidate.ids);
            if resolved.already_held {
                SelectOption::new(&format!("✅ {title}"), value)
                    .describe(&format!("Already in {}/Plex", kind.backend_name()))
            } else {
                SelectOption::new(&title, value)
                    .describe(resolved.candidate.overview.as_deref().unwrap_or_default())
            }
        })
        .collect()
}

#[must_use]
pub fn tier_options(tiers: &[QualityTier], selected: Option<i32>) -> Vec<SelectOption> {
    tiers
        .iter()
        .take(MAX_SELECT_OPTIONS)
        .map(|tier| SelectOption {
            default: selected == Some(tier.id),
            ..SelectOption::new(&tier.name, tier.id.to_string())
        })
        .collect()
}

/// `Season N  ✅  (have/total eps)`, one per source season.
#[must_use]
pub fn season_label(season: &SeasonDescriptor) -> String {
    format!(
        "Season {}  {}  ({}/{} eps)",
        season.number,
        season.status().symbol(),
        season.have,
        season.total
    )
}

#[must_use]
pub fn season_options(seasons: &[SeasonDescriptor], selected: &BTreeSet<i32>) -> Vec<SelectOption> {
    seasons
        .iter()
        .take(MAX_SELECT_OPTIONS)
        .map(|season| SelectOption {
            default: selected.contains(&season.number),
            ..SelectOption::new(&season_label(season), season.number.to_string())
        })
        .collect()
}

/// `S1, S3` or `(none)`.
#[must_use]
pub fn seasons_summary(selected: &BTreeSet<i32>) -> String {
    if selected.is_empty() {
        return "(none)".to_string();
    }
    selected
        .iter()
        .map(|n| format!("S{n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Release pick list; the value carries `guid|indexerId`.
#[must_use]
pub fn release_options(releases: &[ReleaseOption]) -> Vec<SelectOption> {
    releases
        .iter()
        .filter(|r| !r.guid.is_empty())
        .take(MAX_SELECT_OPTIONS)
        .map(|r| SelectOption::new(&r.label, format!("{}|{}", r.guid, r.indexer_id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Candidate;

    fn resolved(title: &str, ids: ExternalIds, held: bool) -> ResolvedCandidate {
        ResolvedCandidate {
            candidate: Candidate {
                title: title.to_string(),
                year: Some(2008),
                ids,
                overview: Some("x".repeat(200)),
            },
            already_held: held,
        }
    }

    #[test]
    fn test_ids_encoding() {
        let ids = ExternalIds::series(Some(81189), None);
        let value = encode_ids(&ids);
        assert_eq!(value, "tvdb:81189|tmdb:0");
        assert_eq!(decode_ids(&value), ids);
        assert_eq!(decode_ids("garbage"), ExternalIds::default());
    }

    #[test]
    fn test_candidate_options() {
        let options = candidate_options(
            MediaKind::Series,
            &[
                resolved("Breaking Bad", ExternalIds::series(Some(81189), None), true),
                resolved("No Ids", ExternalIds::default(), false),
                resolved("Other", ExternalIds::series(None, Some(5)), false),
            ],
        );
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].label, "✅ Breaking Bad (2008)");
        assert_eq!(options[0].description.as_deref(), Some("Already in Sonarr/Plex"));
        assert_eq!(options[1].description.as_ref().map(|d| d.chars().count()), Some(90));
    }

    #[test]
    fn test_candidate_options_cap() {
        let many: Vec<_> = (1..=40)
            .map(|i| resolved("Movie", ExternalIds::movie(i), false))
            .collect();
        assert_eq!(candidate_options(MediaKind::Movie, &many).len(), 25);
    }

    #[test]
    fn test_season_options() {
        let seasons = [
            SeasonDescriptor { number: 1, total: 10, have: 3 },
            SeasonDescriptor { number: 2, total: 10, have: 10 },
            SeasonDescriptor { number: 3, total: 0, have: 0 },
        ];
        let options = season_options(&seasons, &BTreeSet::from([2]));
        assert_eq!(options[0].label, "Season 1  ➖  (3/10 eps)");
        assert_eq!(options[1].label, "Season 2  ✅  (10/10 eps)");
        assert_eq!(options[2].label, "Season 3  ○  (0/0 eps)");
        assert!(options[1].default);
        assert!(!options[0].default);
    }

    #[test]
    fn test_release_options_skip_empty_guid() {
        let releases = vec![
            ReleaseOption {
                label: "HDTV-720p • Idx • 1.0 GB".to_string(),
                guid: "abc".to_string(),
                indexer_id: 2,
            },
            ReleaseOption {
                label: "empty".to_string(),
                guid: String::new(),
                indexer_id: 3,
            },
        ];
        let options = release_options(&releases);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].value, "abc|2");
    }

    #[test]
    fn test_seasons_summary() {
        assert_eq!(seasons_summary(&BTreeSet::new()), "(none)");
        assert_eq!(seasons_summary(&BTreeSet::from([3, 1])), "S1, S3");
    }
}
