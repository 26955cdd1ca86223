//! Post-submission check that cached releases match the chosen quality.
//!
//! When nothing matches, the user gets a manual pick list or, if the cache is
//! empty, a fresh backend search is triggered instead.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::constants::limits::MAX_SELECT_OPTIONS;
use crate::domain::{Episode, ItemId, MediaKind, Release};
use crate::error::{RequestError, RequestResult};
use crate::services::backends::Backends;

/// What a release check and a later grab are addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseTarget {
    pub kind: MediaKind,
    pub item_id: ItemId,
}

impl ReleaseTarget {
    #[must_use]
    pub const fn movie(item_id: ItemId) -> Self {
        Self {
            kind: MediaKind::Movie,
            item_id,
        }
    }

    #[must_use]
    pub const fn series(item_id: ItemId) -> Self {
        Self {
            kind: MediaKind::Series,
            item_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOption {
    pub label: String,
    pub guid: String,
    pub indexer_id: i32,
}

impl ReleaseOption {
    #[must_use]
    pub fn from_release(release: &Release) -> Self {
        Self {
            label: release_label(release),
            guid: release.guid.clone(),
            indexer_id: release.indexer_id,
        }
    }
}

/// `quality • indexer • 1.5 GB`; the size part is empty when unknown.
#[must_use]
pub fn release_label(release: &Release) -> String {
    let size = if release.size > 0 {
        #[allow(clippy::cast_precision_loss)]
        let gb = release.size as f64 / 1_000_000_000.0;
        format!("{gb:.1} GB")
    } else {
        String::new()
    };
    let quality = if release.quality.is_empty() { "?" } else { &release.quality };
    let indexer = if release.indexer.is_empty() { "?" } else { &release.indexer };
    format!("{quality} • {indexer} • {size}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePicker {
    pub target: ReleaseTarget,
    pub expected_quality: String,
    pub options: Vec<ReleaseOption>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseCheck {
    /// At least one cached release has the expected quality.
    Satisfied,
    /// Series only: no aired, monitored episode is missing a file.
    NothingToValidate,
    /// Cache was empty; a fresh search was started.
    SearchTriggered,
    /// Cache was empty and the search could not be started.
    SearchUnavailable,
    PickerOffered(ReleasePicker),
}

impl ReleaseCheck {
    /// Chat-facing summary of the check.
    #[must_use]
    pub fn user_message(&self, kind: MediaKind, expected_quality: &str) -> String {
        match self {
            Self::Satisfied => match kind {
                MediaKind::Movie => "✅ Added and releases match your profile.".to_string(),
                MediaKind::Series => "✅ Series added and releases match your profile.".to_string(),
            },
            Self::NothingToValidate => {
                "✅ Series added. (No missing aired episodes to validate releases.)".to_string()
            }
            Self::SearchTriggered => format!(
                "ℹ️ No cached releases matched **{expected_quality}**. Triggered a fresh {} search; try again in a moment.",
                kind.backend_name()
            ),
            Self::SearchUnavailable => format!(
                "ℹ️ No cached releases matched **{expected_quality}** and search could not be triggered."
            ),
            Self::PickerOffered(_) => format!(
                "⚠️ No **{expected_quality}** releases found right now. Pick an available release to grab:"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabOutcome {
    Grabbed,
    /// The grab failed but a fresh search was started.
    SearchTriggered,
    Failed,
}

impl GrabOutcome {
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Grabbed => "✅ Grabbed the selected release.",
            Self::SearchTriggered => {
                "⚠️ Couldn't grab from cache (maybe expired). Triggered a fresh search, try again shortly."
            }
            Self::Failed => {
                "❌ Couldn't grab and couldn't trigger a search. Please try again later."
            }
        }
    }
}

/// The most recently aired, monitored episode without a file.
///
/// Ties on air date go to the highest season, then the highest episode.
#[must_use]
pub fn pick_representative_episode(episodes: &[Episode], now: DateTime<Utc>) -> Option<&Episode> {
    episodes
        .iter()
        .filter(|ep| ep.monitored && !ep.has_file)
        .filter_map(|ep| ep.air_date_utc.filter(|aired| *aired <= now).map(|aired| (aired, ep)))
        .max_by_key(|(aired, ep)| (*aired, ep.season_number, ep.episode_number))
        .map(|(_, ep)| ep)
}

#[derive(Debug, Clone)]
pub struct ReleaseFallbackResolver {
    backends: Backends,
}

impl ReleaseFallbackResolver {
    #[must_use]
    pub const fn new(backends: Backends) -> Self {
        Self { backends }
    }

    /// Checks the release cache for `target` against `expected_quality`.
    ///
    /// # Errors
    ///
    /// Only [`RequestError::NotConfigured`] for a series target without a
    /// series backend; every backend failure is folded into the outcome.
    pub async fn ensure_quality_or_offer_picker(
        &self,
        target: ReleaseTarget,
        expected_quality: &str,
    ) -> RequestResult<ReleaseCheck> {
        let releases = match target.kind {
            MediaKind::Movie => self
                .backends
                .movies
                .cached_releases(target.item_id)
                .await
                .unwrap_or_else(|e| {
                    warn!(item_id = %target.item_id, error = %e, "Failed to fetch cached releases");
                    Vec::new()
                }),
            MediaKind::Series => {
                let series = self.backends.series()?;
                let episodes = series.episodes(target.item_id).await.unwrap_or_else(|e| {
                    warn!(item_id = %target.item_id, error = %e, "Failed to fetch episodes");
                    Vec::new()
                });
                let Some(episode) = pick_representative_episode(&episodes, Utc::now()) else {
                    debug!(item_id = %target.item_id, "No missing aired episode to validate");
                    return Ok(ReleaseCheck::NothingToValidate);
                };
                series
                    .cached_releases_for_episode(episode.id)
                    .await
                    .unwrap_or_else(|e| {
                        warn!(episode_id = episode.id, error = %e, "Failed to fetch cached releases");
                        Vec::new()
                    })
            }
        };

        if releases.iter().any(|r| r.matches_quality(expected_quality)) {
            return Ok(ReleaseCheck::Satisfied);
        }

        if releases.is_empty() {
            return Ok(match self.trigger_search(target).await {
                Ok(()) => {
                    info!(kind = %target.kind, item_id = %target.item_id, "No cached releases, triggered search");
                    ReleaseCheck::SearchTriggered
                }
                Err(e) => {
                    warn!(kind = %target.kind, item_id = %target.item_id, error = %e, "Search trigger failed");
                    ReleaseCheck::SearchUnavailable
                }
            });
        }

        let options: Vec<ReleaseOption> = releases
            .iter()
            .take(MAX_SELECT_OPTIONS)
            .filter(|r| !r.guid.is_empty())
            .map(ReleaseOption::from_release)
            .collect();
        info!(
            kind = %target.kind,
            item_id = %target.item_id,
            cached = releases.len(),
            offered = options.len(),
            "No release matches the chosen quality"
        );

        Ok(ReleaseCheck::PickerOffered(ReleasePicker {
            target,
            expected_quality: expected_quality.to_string(),
            options,
        }))
    }

    /// Grabs a picked release, falling back to a fresh search on failure.
    pub async fn grab(&self, target: ReleaseTarget, option: &ReleaseOption) -> GrabOutcome {
        if option.guid.is_empty() {
            return GrabOutcome::Failed;
        }

        let grabbed = match target.kind {
            MediaKind::Movie => {
                self.backends
                    .movies
                    .grab(&option.guid, option.indexer_id)
                    .await
            }
            MediaKind::Series => match self.backends.series() {
                Ok(series) => series.grab(&option.guid, option.indexer_id).await,
                Err(e) => Err(anyhow::anyhow!(e)),
            },
        };

        match grabbed {
            Ok(()) => {
                info!(guid = %option.guid, indexer_id = option.indexer_id, "Grabbed release");
                GrabOutcome::Grabbed
            }
            Err(e) => {
                warn!(guid = %option.guid, error = %e, "Grab failed, triggering search");
                match self.trigger_search(target).await {
                    Ok(()) => GrabOutcome::SearchTriggered,
                    Err(e) => {
                        warn!(error = %e, "Search trigger after failed grab also failed");
                        GrabOutcome::Failed
                    }
                }
            }
        }
    }

    async fn trigger_search(&self, target: ReleaseTarget) -> RequestResult<()> {
        match target.kind {
            MediaKind::Movie => self
                .backends
                .movies
                .trigger_search(target.item_id)
                .await
                .map_err(RequestError::movies),
            MediaKind::Series => self
                .backends
                .series()?
                .trigger_search(target.item_id)
                .await
                .map_err(RequestError::series),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn episode(id: i32, season: i32, number: i32, aired: Option<DateTime<Utc>>) -> Episode {
        Episode {
            id,
            season_number: season,
            episode_number: number,
            monitored: true,
            has_file: false,
            air_date_utc: aired,
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 20, 0, 0).unwrap()
    }

    #[test]
    fn test_pick_latest_aired_missing_episode() {
        let now = day(20);
        let mut held = episode(1, 2, 5, Some(day(10)));
        held.has_file = true;
        let mut unmonitored = episode(2, 2, 4, Some(day(9)));
        unmonitored.monitored = false;
        let episodes = vec![
            held,
            unmonitored,
            episode(3, 1, 8, Some(day(3))),
            episode(4, 2, 3, Some(day(8))),
            episode(5, 2, 6, Some(day(25))),
            episode(6, 2, 7, None),
        ];

        assert_eq!(pick_representative_episode(&episodes, now).map(|e| e.id), Some(4));
    }

    #[test]
    fn test_pick_breaks_ties_by_season_then_episode() {
        let episodes = vec![
            episode(1, 1, 9, Some(day(5))),
            episode(2, 2, 1, Some(day(5))),
            episode(3, 2, 2, Some(day(5))),
        ];
        assert_eq!(pick_representative_episode(&episodes, day(6)).map(|e| e.id), Some(3));
    }

    #[test]
    fn test_pick_none_when_nothing_missing() {
        assert!(pick_representative_episode(&[], day(1)).is_none());
        let future = vec![episode(1, 1, 1, Some(day(10)))];
        assert!(pick_representative_episode(&future, day(1)).is_none());
    }

    #[test]
    fn test_release_label() {
        let release = Release {
            guid: "g".to_string(),
            indexer_id: 1,
            indexer: "Nyaa".to_string(),
            quality: "WEBDL-1080p".to_string(),
            size: 1_500_000_000,
        };
        assert_eq!(release_label(&release), "WEBDL-1080p • Nyaa • 1.5 GB");

        let no_size = Release { size: 0, ..release };
        assert_eq!(release_label(&no_size), "WEBDL-1080p • Nyaa • ");
    }

    #[test]
    fn test_check_messages() {
        assert_eq!(
            ReleaseCheck::SearchTriggered.user_message(MediaKind::Movie, "HD-1080p"),
            "ℹ️ No cached releases matched **HD-1080p**. Triggered a fresh Radarr search; try again in a moment."
        );
        assert!(
            ReleaseCheck::SearchUnavailable
                .user_message(MediaKind::Series, "HD")
                .contains("could not be triggered")
        );
    }
}
