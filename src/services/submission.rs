//! Turns a confirmed selection into one add or update call.

use tracing::{error, info, warn};

use crate::domain::{ItemId, MediaKind};
use crate::error::{RequestError, RequestResult};
use crate::services::backends::{Backends, MovieAddRequest, SeriesAddRequest};
use crate::services::session::SelectionSession;

/// Fixed per-backend add parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionSettings {
    pub movie_root_folder: String,
    pub movie_monitor: bool,
    pub series_root_folder: String,
    pub series_monitor: bool,
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self {
            movie_root_folder: "/movies".to_string(),
            movie_monitor: true,
            series_root_folder: "/tv".to_string(),
            series_monitor: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub kind: MediaKind,
    pub item_id: ItemId,
    pub title: String,
    /// Name of the chosen quality tier, used by the release check.
    pub quality_label: String,
    /// False when an existing series was updated in place.
    pub created: bool,
    /// Seasons whose search trigger failed after an update.
    pub failed_season_searches: Vec<i32>,
}

#[derive(Debug, Clone)]
pub struct SubmissionCoordinator {
    backends: Backends,
    settings: SubmissionSettings,
}

impl SubmissionCoordinator {
    #[must_use]
    pub const fn new(backends: Backends, settings: SubmissionSettings) -> Self {
        Self { backends, settings }
    }

    /// Submits a confirmed session. Consumes it, so it cannot be sent twice.
    ///
    /// # Errors
    ///
    /// Any failure of the add or update call is returned as-is; nothing is
    /// retried and no tracking should be started for it.
    pub async fn submit(&self, session: SelectionSession) -> RequestResult<SubmissionResult> {
        let Some(tier) = session.selected_tier().cloned() else {
            return Err(RequestError::validation(
                "Please choose a quality profile first.",
            ));
        };

        let result = match session.kind {
            MediaKind::Movie => self.submit_movie(&session, tier.id, &tier.name).await,
            MediaKind::Series => match session.existing_item {
                Some(id) => self.update_series(&session, id, tier.id, &tier.name).await,
                None => self.add_series(&session, tier.id, &tier.name).await,
            },
        };

        match &result {
            Ok(done) => info!(
                kind = %done.kind,
                item_id = %done.item_id,
                title = %done.title,
                quality = %done.quality_label,
                created = done.created,
                "Submitted request"
            ),
            Err(e) => error!(
                kind = %session.kind,
                title = %session.candidate.title,
                error = %e,
                "Request submission failed"
            ),
        }
        result
    }

    async fn submit_movie(
        &self,
        session: &SelectionSession,
        tier_id: i32,
        tier_name: &str,
    ) -> RequestResult<SubmissionResult> {
        let tmdb_id = session
            .candidate
            .ids
            .tmdb_id
            .filter(|id| *id > 0)
            .ok_or_else(|| RequestError::validation("This movie has no TMDB id."))?;

        let request = MovieAddRequest {
            tmdb_id,
            quality_profile_id: tier_id,
            root_folder: self.settings.movie_root_folder.clone(),
            monitored: self.settings.movie_monitor,
        };
        let item = self
            .backends
            .movies
            .add(&request)
            .await
            .map_err(RequestError::movies)?;

        Ok(SubmissionResult {
            kind: MediaKind::Movie,
            item_id: item.id,
            title: title_or(&item.title, &session.candidate.title),
            quality_label: tier_name.to_string(),
            created: true,
            failed_season_searches: Vec::new(),
        })
    }

    async fn update_series(
        &self,
        session: &SelectionSession,
        id: ItemId,
        tier_id: i32,
        tier_name: &str,
    ) -> RequestResult<SubmissionResult> {
        let series = self.backends.series()?;
        let mut item = series
            .get_by_id(id)
            .await
            .map_err(RequestError::series)?
            .ok_or_else(|| RequestError::not_found("Could not load existing series."))?;

        item.quality_profile_id = Some(tier_id);
        item.seasons = session.season_override();
        let updated = series.update(&item).await.map_err(RequestError::series)?;

        let mut failed = Vec::new();
        for &season in &session.seasons {
            if let Err(e) = series.trigger_season_search(id, season).await {
                warn!(series_id = %id, season, error = %e, "Season search trigger failed");
                failed.push(season);
            }
        }

        Ok(SubmissionResult {
            kind: MediaKind::Series,
            item_id: updated.id.unwrap_or(id),
            title: title_or(&updated.title, &session.candidate.title),
            quality_label: tier_name.to_string(),
            created: false,
            failed_season_searches: failed,
        })
    }

    async fn add_series(
        &self,
        session: &SelectionSession,
        tier_id: i32,
        tier_name: &str,
    ) -> RequestResult<SubmissionResult> {
        let series = self.backends.series()?;
        let request = SeriesAddRequest {
            ids: session.candidate.ids.clone(),
            quality_profile_id: tier_id,
            root_folder: self.settings.series_root_folder.clone(),
            monitored: self.settings.series_monitor,
            seasons: session.season_override(),
        };
        let item = series.add(&request).await.map_err(RequestError::series)?;
        let item_id = item.id.ok_or_else(|| RequestError::Backend {
            service: "Sonarr".to_string(),
            message: "added series has no id".to_string(),
        })?;

        Ok(SubmissionResult {
            kind: MediaKind::Series,
            item_id,
            title: title_or(&item.title, &session.candidate.title),
            quality_label: tier_name.to_string(),
            created: true,
            failed_season_searches: Vec::new(),
        })
    }
}

fn title_or(primary: &str, fallback: &str) -> String {
    if primary.is_empty() {
        fallback.to_string()
    } else {
        primary.to_string()
    }
}
