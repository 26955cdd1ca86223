//! Current status of a tracked item, combined from the collection service,
//! its download queue and the transfer client.

use tracing::{debug, warn};

use crate::constants::tracking::SERIES_DONE_PERCENT;
use crate::domain::{first_poster, ItemId, MediaKind, QueueEntry};
use crate::error::{RequestError, RequestResult};
use crate::services::backends::Backends;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    Downloaded,
    Downloading,
    Queued,
    Waiting,
    Complete,
    NotFound,
}

impl TrackState {
    #[must_use]
    pub const fn label(&self, kind: MediaKind) -> &'static str {
        match (self, kind) {
            (Self::Downloaded, _) => "✅ Downloaded",
            (Self::Downloading, _) => "⬇️ Downloading",
            (Self::Queued, _) => "🕘 Queued / Waiting for a matching release",
            (Self::Waiting, _) => "🕘 Waiting / Idle",
            (Self::Complete, _) => "✅ Complete",
            (Self::NotFound, MediaKind::Movie) => "⚠️ Movie not found in Radarr.",
            (Self::NotFound, MediaKind::Series) => "⚠️ Series not found in Sonarr.",
        }
    }
}

/// One rendering-independent snapshot of an item's progress.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub kind: MediaKind,
    pub item_id: ItemId,
    pub title: String,
    pub poster: Option<String>,
    pub state: TrackState,
    /// Percent complete in `0..=100`, when known.
    pub percent: Option<f64>,
    pub eta: Option<String>,
    /// Series only: episodes with files and total episodes.
    pub episodes: Option<(u32, u32)>,
    /// Live transfer client line, when the queue entry maps to a transfer.
    pub transfer: Option<String>,
    /// Whether tracking can stop.
    pub done: bool,
}

impl StatusReport {
    fn not_found(kind: MediaKind, item_id: ItemId) -> Self {
        Self {
            kind,
            item_id,
            title: match kind {
                MediaKind::Movie => "Movie".to_string(),
                MediaKind::Series => "Series".to_string(),
            },
            poster: None,
            state: TrackState::NotFound,
            percent: None,
            eta: None,
            episodes: None,
            transfer: None,
            done: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusProbe {
    backends: Backends,
}

impl StatusProbe {
    #[must_use]
    pub const fn new(backends: Backends) -> Self {
        Self { backends }
    }

    /// # Errors
    ///
    /// Fails only if the item itself cannot be loaded; queue and transfer
    /// failures just leave those parts of the report empty.
    pub async fn probe(&self, kind: MediaKind, item_id: ItemId) -> RequestResult<StatusReport> {
        match kind {
            MediaKind::Movie => self.movie_status(item_id).await,
            MediaKind::Series => self.series_status(item_id).await,
        }
    }

    /// # Errors
    ///
    /// [`RequestError::Backend`] if the movie cannot be loaded.
    pub async fn movie_status(&self, item_id: ItemId) -> RequestResult<StatusReport> {
        let Some(movie) = self
            .backends
            .movies
            .get_by_id(item_id)
            .await
            .map_err(RequestError::movies)?
        else {
            return Ok(StatusReport::not_found(MediaKind::Movie, item_id));
        };

        let title = match movie.year {
            Some(year) if year > 0 => format!("{} ({year})", movie.title),
            _ => movie.title.clone(),
        };
        let mut report = StatusReport {
            kind: MediaKind::Movie,
            item_id,
            title,
            poster: first_poster(&movie.images),
            state: TrackState::Queued,
            percent: None,
            eta: None,
            episodes: None,
            transfer: None,
            done: false,
        };

        if movie.has_file() {
            report.state = TrackState::Downloaded;
            report.percent = Some(100.0);
            report.done = true;
            return Ok(report);
        }

        let queue = self.backends.movies.queue().await.unwrap_or_else(|e| {
            warn!(item_id = %item_id, error = %e, "Failed to read Radarr queue");
            Vec::new()
        });
        if let Some(entry) = queue.iter().find(|entry| entry.belongs_to(item_id)) {
            report.state = TrackState::Downloading;
            report.percent = entry.percent();
            report.eta = entry.time_left.clone().filter(|eta| !eta.is_empty());
            report.transfer = self.transfer_line(std::slice::from_ref(entry)).await;
        }
        Ok(report)
    }

    /// # Errors
    ///
    /// - [`RequestError::NotConfigured`] without a series backend
    /// - [`RequestError::Backend`] if the series cannot be loaded
    pub async fn series_status(&self, item_id: ItemId) -> RequestResult<StatusReport> {
        let series = self.backends.series()?;
        let Some(item) = series
            .get_by_id(item_id)
            .await
            .map_err(RequestError::series)?
        else {
            return Ok(StatusReport::not_found(MediaKind::Series, item_id));
        };

        let stats = item.statistics.clone().unwrap_or_default();
        let percent = stats.percent();
        let done = percent >= SERIES_DONE_PERCENT;

        let queue = series.queue().await.unwrap_or_else(|e| {
            warn!(item_id = %item_id, error = %e, "Failed to read Sonarr queue");
            Vec::new()
        });
        let active: Vec<QueueEntry> = queue
            .into_iter()
            .filter(|entry| entry.belongs_to(item_id))
            .collect();

        let state = if done {
            TrackState::Complete
        } else if active.is_empty() {
            TrackState::Waiting
        } else {
            TrackState::Downloading
        };
        let transfer = if active.is_empty() {
            None
        } else {
            self.transfer_line(&active).await
        };

        Ok(StatusReport {
            kind: MediaKind::Series,
            item_id,
            title: item.title.clone(),
            poster: first_poster(&item.images),
            state,
            percent: Some(percent),
            eta: None,
            episodes: Some((stats.episode_file_count, stats.total_episode_count)),
            transfer,
            done,
        })
    }

    /// Live line from the transfer client for the first entry it knows.
    async fn transfer_line(&self, entries: &[QueueEntry]) -> Option<String> {
        let transfer = self.backends.transfer.as_ref()?;
        for entry in entries {
            let Some(handle) = entry.download_id.as_deref().filter(|h| !h.is_empty()) else {
                continue;
            };
            match transfer.status_by_handle(handle).await {
                Ok(Some(status)) => return Some(status.summary()),
                Ok(None) => debug!(handle, "Transfer not known to the client"),
                Err(e) => debug!(handle, error = %e, "Transfer status lookup failed"),
            }
        }
        None
    }

    /// Finds the collection item for the top lookup hit of `query`.
    ///
    /// # Errors
    ///
    /// - [`RequestError::NotFound`] when the lookup returns nothing
    /// - [`RequestError::Backend`] when the lookup fails
    pub async fn locate(&self, kind: MediaKind, query: &str) -> RequestResult<Option<ItemId>> {
        match kind {
            MediaKind::Movie => {
                let movies = &self.backends.movies;
                let hits = movies.lookup(query).await.map_err(RequestError::movies)?;
                let top = hits
                    .first()
                    .ok_or_else(|| RequestError::not_found("No movies found."))?;
                let Some(tmdb) = top.ids.tmdb_id.filter(|id| *id > 0) else {
                    return Ok(None);
                };
                Ok(movies
                    .get_by_external_id(tmdb)
                    .await
                    .map_err(RequestError::movies)?
                    .map(|movie| movie.id))
            }
            MediaKind::Series => {
                let series = self.backends.series()?;
                let hits = series.lookup(query).await.map_err(RequestError::series)?;
                let top = hits
                    .first()
                    .ok_or_else(|| RequestError::not_found("No series found."))?;
                Ok(series
                    .get_by_external_ids(&top.ids)
                    .await
                    .map_err(RequestError::series)?
                    .and_then(|item| item.id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_labels() {
        assert_eq!(
            TrackState::Queued.label(MediaKind::Movie),
            "🕘 Queued / Waiting for a matching release"
        );
        assert_eq!(
            TrackState::NotFound.label(MediaKind::Series),
            "⚠️ Series not found in Sonarr."
        );
    }

    #[test]
    fn test_not_found_report_is_done() {
        let report = StatusReport::not_found(MediaKind::Movie, ItemId::new(3));
        assert!(report.done);
        assert_eq!(report.state, TrackState::NotFound);
        assert!(report.percent.is_none());
    }
}
