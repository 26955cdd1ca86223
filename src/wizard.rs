//! The request wizard: search, pick, configure, confirm, then track.
//!
//! One [`RequestWizard`] serves every user. Per-request state lives in the
//! [`SessionStore`] and is addressed by [`SessionId`], so any transport can
//! drive the flow one interaction at a time.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::constants::limits::DEFAULT_EXISTENCE_CHECKS;
use crate::domain::{Candidate, ItemId, MediaKind};
use crate::error::{RequestError, RequestResult};
use crate::render::options::{seasons_summary, tier_options};
use crate::render::{Action, Message, SelectOption, StatusSink, season_options};
use crate::services::{
    Backends, CatalogResolver, GrabOutcome, ReleaseCheck, ReleaseFallbackResolver, ReleaseOption,
    ReleaseTarget, ResolvedCandidate, SelectionSession, SessionId, SessionStore, StatusProbe,
    SubmissionCoordinator, SubmissionResult, SubmissionSettings, Tracker, TrackingHandle,
    TrackingSettings,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardSettings {
    pub existence_check_limit: usize,
    pub session_timeout: Duration,
    pub submission: SubmissionSettings,
    pub tracking: TrackingSettings,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            existence_check_limit: DEFAULT_EXISTENCE_CHECKS,
            session_timeout: Duration::from_secs(180),
            submission: SubmissionSettings::default(),
            tracking: TrackingSettings::default(),
        }
    }
}

impl From<&Config> for WizardSettings {
    fn from(config: &Config) -> Self {
        Self {
            existence_check_limit: config.wizard.existence_check_limit,
            session_timeout: config.wizard.session_timeout(),
            submission: SubmissionSettings {
                movie_root_folder: config.movies.root_folder.clone(),
                movie_monitor: config.movies.monitor,
                series_root_folder: config.series.root_folder.clone(),
                series_monitor: config.series.monitor,
            },
            tracking: TrackingSettings::from(&config.tracking),
        }
    }
}

/// What the transport shows after a candidate was picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardStep {
    pub session: SessionId,
    pub prompt: String,
    pub tiers: Vec<SelectOption>,
    /// Empty for movies.
    pub seasons: Vec<SelectOption>,
}

/// Everything that happened after a successful confirm.
#[derive(Debug)]
pub struct WizardOutcome {
    pub submission: SubmissionResult,
    /// `None` when the tracking message could not be sent.
    pub tracking: Option<TrackingHandle>,
    pub release_check: ReleaseCheck,
}

pub struct RequestWizard {
    backends: Backends,
    resolver: CatalogResolver,
    sessions: SessionStore,
    submission: SubmissionCoordinator,
    releases: ReleaseFallbackResolver,
    probe: StatusProbe,
    tracker: Tracker,
    sink: Arc<dyn StatusSink>,
}

impl std::fmt::Debug for RequestWizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestWizard")
            .field("backends", &self.backends)
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

impl RequestWizard {
    #[must_use]
    pub fn new(backends: Backends, sink: Arc<dyn StatusSink>, settings: WizardSettings) -> Self {
        let probe = StatusProbe::new(backends.clone());
        Self {
            resolver: CatalogResolver::new(backends.clone(), settings.existence_check_limit),
            sessions: SessionStore::new(settings.session_timeout),
            submission: SubmissionCoordinator::new(backends.clone(), settings.submission),
            releases: ReleaseFallbackResolver::new(backends.clone()),
            tracker: Tracker::new(probe.clone(), Arc::clone(&sink), settings.tracking),
            probe,
            backends,
            sink,
        }
    }

    #[must_use]
    pub const fn probe(&self) -> &StatusProbe {
        &self.probe
    }

    #[must_use]
    pub const fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// # Errors
    ///
    /// See [`CatalogResolver::search`].
    pub async fn search(
        &self,
        query: &str,
        kind: MediaKind,
    ) -> RequestResult<Vec<ResolvedCandidate>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RequestError::validation("Please enter a title to search."));
        }
        self.resolver.search(query, kind).await
    }

    /// Opens a selection session for `candidate`.
    ///
    /// # Errors
    ///
    /// - [`RequestError::Validation`] if the movie is already in the collection
    ///   or the candidate has no usable ids
    /// - [`RequestError::Backend`] if the tiers or series metadata cannot be loaded
    pub async fn begin(&self, kind: MediaKind, candidate: Candidate) -> RequestResult<WizardStep> {
        if !candidate.ids.is_addressable(kind) {
            return Err(RequestError::validation(
                "That result has no catalog id and cannot be requested.",
            ));
        }

        let session = match kind {
            MediaKind::Movie => self.begin_movie(candidate).await?,
            MediaKind::Series => self.begin_series(candidate).await?,
        };
        if session.tiers.is_empty() {
            return Err(RequestError::validation(format!(
                "No quality profiles are configured in {}.",
                kind.backend_name()
            )));
        }

        let tiers = tier_options(&session.tiers, None);
        let seasons = season_options(&session.season_descriptors(), &session.seasons);
        let prompt = match kind {
            MediaKind::Movie => "Pick a quality profile:",
            MediaKind::Series => "Pick a quality profile and the seasons you want:",
        };
        let id = self.sessions.create(session).await;

        Ok(WizardStep {
            session: id,
            prompt: prompt.to_string(),
            tiers,
            seasons,
        })
    }

    async fn begin_movie(&self, candidate: Candidate) -> RequestResult<SelectionSession> {
        let movies = &self.backends.movies;
        if let Some(tmdb) = candidate.ids.tmdb_id {
            let existing = movies
                .get_by_external_id(tmdb)
                .await
                .map_err(RequestError::movies)?;
            if existing.is_some() {
                return Err(RequestError::validation(
                    "ℹ️ That movie is already in Radarr.",
                ));
            }
        }
        let tiers = movies.quality_tiers().await.map_err(RequestError::movies)?;
        Ok(SelectionSession::new(MediaKind::Movie, candidate, tiers))
    }

    async fn begin_series(&self, candidate: Candidate) -> RequestResult<SelectionSession> {
        let series = self.backends.series()?;
        let tiers = series.quality_tiers().await.map_err(RequestError::series)?;
        let lookup = series
            .lookup_by_ids(&candidate.ids)
            .await
            .map_err(RequestError::series)?;
        let existing = series
            .get_by_external_ids(&candidate.ids)
            .await
            .map_err(RequestError::series)?;

        let existing_id = existing.as_ref().and_then(|item| item.id);
        let counts = match existing_id {
            Some(id) => series.season_file_counts(id).await.unwrap_or_else(|e| {
                warn!(series_id = %id, error = %e, "Failed to load season file counts");
                Default::default()
            }),
            None => Default::default(),
        };
        let source = existing
            .map(|item| item.seasons)
            .or_else(|| lookup.map(|item| item.seasons))
            .unwrap_or_default();

        Ok(SelectionSession::new(MediaKind::Series, candidate, tiers)
            .with_seasons(source, counts)
            .with_existing_item(existing_id))
    }

    /// # Errors
    ///
    /// [`RequestError::SessionExpired`] or [`RequestError::Validation`].
    pub async fn select_quality(&self, session: SessionId, tier_id: i32) -> RequestResult<String> {
        let tier = self.sessions.set_quality_tier(session, tier_id).await?;
        let current = self.sessions.get(session).await?;
        Ok(match current.kind {
            MediaKind::Movie => format!("Quality set to **{}**.", tier.name),
            MediaKind::Series => format!(
                "Quality set to **{}**. Now select seasons and hit **Add/Update**.",
                tier.name
            ),
        })
    }

    /// # Errors
    ///
    /// [`RequestError::SessionExpired`] or [`RequestError::Validation`].
    pub async fn select_seasons(
        &self,
        session: SessionId,
        seasons: BTreeSet<i32>,
    ) -> RequestResult<String> {
        let summary = seasons_summary(&seasons);
        self.sessions.set_seasons(session, seasons).await?;
        Ok(format!("Selected seasons: {summary}"))
    }

    /// Snapshot of a live session.
    ///
    /// # Errors
    ///
    /// [`RequestError::SessionExpired`].
    pub async fn session(&self, session: SessionId) -> RequestResult<SelectionSession> {
        self.sessions.get(session).await
    }

    pub async fn cancel(&self, session: SessionId) -> bool {
        self.sessions.discard(session).await
    }

    /// Submits the session, starts tracking and checks cached releases.
    ///
    /// # Errors
    ///
    /// - [`RequestError::Validation`] when no tier is set (the session stays live)
    /// - [`RequestError::SessionExpired`] for an unknown or consumed session
    /// - any submission failure; the session is gone and nothing is tracked
    pub async fn confirm(&self, session: SessionId) -> RequestResult<WizardOutcome> {
        let selection = self.sessions.confirm(session).await?;
        let kind = selection.kind;

        let submission = match self.submission.submit(selection).await {
            Ok(submission) => submission,
            Err(e) => {
                metrics::counter!("requests_failed_total", "kind" => kind.as_str()).increment(1);
                return Err(e);
            }
        };
        metrics::counter!("requests_submitted_total", "kind" => kind.as_str()).increment(1);

        let tracking = self.start_tracking(&submission).await;

        let target = ReleaseTarget {
            kind,
            item_id: submission.item_id,
        };
        let release_check = self
            .releases
            .ensure_quality_or_offer_picker(target, &submission.quality_label)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Release check failed");
                ReleaseCheck::NothingToValidate
            });
        self.notify(Message::text(
            release_check.user_message(kind, &submission.quality_label),
        ))
        .await;

        Ok(WizardOutcome {
            submission,
            tracking,
            release_check,
        })
    }

    async fn start_tracking(&self, submission: &SubmissionResult) -> Option<TrackingHandle> {
        let text = match (submission.kind, submission.created) {
            (MediaKind::Movie, _) => "🎬 Request added. Tracking started:",
            (MediaKind::Series, true) => {
                "✅ Series added with selected seasons monitored. Tracking started:"
            }
            (MediaKind::Series, false) => {
                "✅ Series updated with selected seasons and profile. Tracking started:"
            }
        };
        let message = Message::text(text).with_actions(&[Action::RefreshNow, Action::StopTracking]);
        match self.sink.send(message).await {
            Ok(handle) => Some(
                self.tracker
                    .start(submission.kind, submission.item_id, handle),
            ),
            Err(e) => {
                warn!(item_id = %submission.item_id, error = %e, "Could not send tracking message");
                None
            }
        }
    }

    /// Grabs a release picked from a [`ReleaseCheck::PickerOffered`] list.
    pub async fn grab(&self, target: ReleaseTarget, option: &ReleaseOption) -> GrabOutcome {
        let outcome = self.releases.grab(target, option).await;
        info!(kind = %target.kind, item_id = %target.item_id, outcome = ?outcome, "Release pick handled");
        self.notify(Message::text(outcome.user_message())).await;
        outcome
    }

    /// Tracks an item that is already in its collection.
    ///
    /// # Errors
    ///
    /// [`RequestError::Render`] when the tracking message cannot be sent.
    pub async fn track(&self, kind: MediaKind, item_id: ItemId) -> RequestResult<TrackingHandle> {
        let handle = self
            .sink
            .send(
                Message::text("Tracking started:")
                    .with_actions(&[Action::RefreshNow, Action::StopTracking]),
            )
            .await?;
        Ok(self.tracker.start(kind, item_id, handle))
    }

    async fn notify(&self, message: Message) {
        if let Err(e) = self.sink.send(message).await {
            warn!(error = %e, "Could not send message");
        }
    }
}
