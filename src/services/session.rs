//! In-memory selection sessions, one per active wizard.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    Candidate, ItemId, MediaKind, QualityTier, SeasonCounts, SeasonDescriptor, SeasonEntry,
};
use crate::error::{RequestError, RequestResult};
use crate::services::seasons;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything chosen so far for one candidate.
///
/// Plain data: the render layer reads it to build prompts but never owns it.
#[derive(Debug, Clone)]
pub struct SelectionSession {
    pub kind: MediaKind,
    pub candidate: Candidate,
    /// Tiers offered to the user; a chosen tier must be one of them.
    pub tiers: Vec<QualityTier>,
    pub quality_tier: Option<i32>,
    pub seasons: BTreeSet<i32>,
    pub season_source: Vec<SeasonEntry>,
    pub season_counts: BTreeMap<i32, SeasonCounts>,
    pub existing_item: Option<ItemId>,
    created_at: Instant,
}

impl SelectionSession {
    #[must_use]
    pub fn new(kind: MediaKind, candidate: Candidate, tiers: Vec<QualityTier>) -> Self {
        Self {
            kind,
            candidate,
            tiers,
            quality_tier: None,
            seasons: BTreeSet::new(),
            season_source: Vec::new(),
            season_counts: BTreeMap::new(),
            existing_item: None,
            created_at: Instant::now(),
        }
    }

    #[must_use]
    pub fn with_seasons(
        mut self,
        source: Vec<SeasonEntry>,
        counts: BTreeMap<i32, SeasonCounts>,
    ) -> Self {
        self.season_source = source;
        self.season_counts = counts;
        self
    }

    #[must_use]
    pub const fn with_existing_item(mut self, id: Option<ItemId>) -> Self {
        self.existing_item = id;
        self
    }

    /// The chosen tier, if any.
    #[must_use]
    pub fn selected_tier(&self) -> Option<&QualityTier> {
        let id = self.quality_tier?;
        self.tiers.iter().find(|tier| tier.id == id)
    }

    #[must_use]
    pub fn season_descriptors(&self) -> Vec<SeasonDescriptor> {
        seasons::describe(&self.season_source, &self.season_counts)
    }

    /// The full monitored-season override for the current selection.
    #[must_use]
    pub fn season_override(&self) -> Vec<SeasonEntry> {
        seasons::reconcile(&self.season_source, &self.seasons)
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() >= ttl
    }
}

/// Live sessions keyed by id. A session leaves the store when confirmed,
/// discarded, or older than the configured timeout.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, SelectionSession>>,
    ttl: Duration,
}

impl SessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn create(&self, session: SelectionSession) -> SessionId {
        let id = SessionId::new();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !s.is_expired(self.ttl));
        debug!(session = %id, kind = %session.kind, title = %session.candidate.title, "Created selection session");
        sessions.insert(id, session);
        id
    }

    /// Snapshot of a live session.
    ///
    /// # Errors
    ///
    /// [`RequestError::SessionExpired`] if the session is unknown, consumed or timed out.
    pub async fn get(&self, id: SessionId) -> RequestResult<SelectionSession> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .filter(|s| !s.is_expired(self.ttl))
            .cloned()
            .ok_or(RequestError::SessionExpired)
    }

    /// Sets the quality tier; last write wins.
    ///
    /// # Errors
    ///
    /// - [`RequestError::SessionExpired`] for an unknown session
    /// - [`RequestError::Validation`] if the tier was never offered
    pub async fn set_quality_tier(&self, id: SessionId, tier_id: i32) -> RequestResult<QualityTier> {
        self.update(id, |session| {
            let tier = session
                .tiers
                .iter()
                .find(|tier| tier.id == tier_id)
                .cloned()
                .ok_or_else(|| RequestError::validation("Unknown quality profile."))?;
            session.quality_tier = Some(tier_id);
            Ok(tier)
        })
        .await
    }

    /// Replaces the season selection; last write wins.
    ///
    /// # Errors
    ///
    /// - [`RequestError::SessionExpired`] for an unknown session
    /// - [`RequestError::Validation`] if a season is not in the source metadata
    pub async fn set_seasons(&self, id: SessionId, selected: BTreeSet<i32>) -> RequestResult<()> {
        self.update(id, |session| {
            let unknown = seasons::unknown_seasons(&session.season_source, &selected);
            if !unknown.is_empty() {
                let list = unknown
                    .iter()
                    .map(|n| format!("S{n}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(RequestError::validation(format!("Unknown seasons: {list}")));
            }
            session.seasons = selected;
            Ok(())
        })
        .await
    }

    /// Takes the session out of the store for submission.
    ///
    /// A session without a quality tier stays live so the user can fix it.
    ///
    /// # Errors
    ///
    /// - [`RequestError::SessionExpired`] for an unknown or already confirmed session
    /// - [`RequestError::Validation`] when no quality tier has been chosen
    pub async fn confirm(&self, id: SessionId) -> RequestResult<SelectionSession> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(&id) {
            None => return Err(RequestError::SessionExpired),
            Some(session) if session.is_expired(self.ttl) => {
                sessions.remove(&id);
                return Err(RequestError::SessionExpired);
            }
            Some(session) if session.quality_tier.is_none() => {
                return Err(RequestError::validation(
                    "Please choose a quality profile first.",
                ));
            }
            Some(_) => {}
        }
        sessions.remove(&id).ok_or(RequestError::SessionExpired)
    }

    pub async fn discard(&self, id: SessionId) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(self.ttl));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    async fn update<T>(
        &self,
        id: SessionId,
        apply: impl FnOnce(&mut SelectionSession) -> RequestResult<T>,
    ) -> RequestResult<T> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .filter(|s| !s.is_expired(self.ttl))
            .ok_or(RequestError::SessionExpired)?;
        apply(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExternalIds;

    fn tiers() -> Vec<QualityTier> {
        vec![
            QualityTier { id: 4, name: "HD-1080p".to_string() },
            QualityTier { id: 5, name: "Ultra-HD".to_string() },
        ]
    }

    fn series_session() -> SelectionSession {
        let candidate = Candidate {
            title: "Show".to_string(),
            year: Some(2020),
            ids: ExternalIds::series(Some(10), None),
            overview: None,
        };
        SelectionSession::new(MediaKind::Series, candidate, tiers()).with_seasons(
            vec![SeasonEntry::new(1, false), SeasonEntry::new(2, false)],
            BTreeMap::new(),
        )
    }

    #[tokio::test]
    async fn test_confirm_requires_quality_tier() {
        let store = SessionStore::new(Duration::from_secs(180));
        let id = store.create(series_session()).await;
        store.set_seasons(id, BTreeSet::from([1, 2])).await.unwrap();

        let err = store.confirm(id).await.unwrap_err();
        assert!(matches!(err, RequestError::Validation(_)));
        assert_eq!(err.user_message(), "Please choose a quality profile first.");
        // still live after the validation failure
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_confirm_consumes_session() {
        let store = SessionStore::new(Duration::from_secs(180));
        let id = store.create(series_session()).await;
        store.set_quality_tier(id, 4).await.unwrap();

        let session = store.confirm(id).await.unwrap();
        assert_eq!(session.selected_tier().map(|t| t.name.as_str()), Some("HD-1080p"));
        assert!(matches!(
            store.confirm(id).await,
            Err(RequestError::SessionExpired)
        ));
    }

    #[tokio::test]
    async fn test_setters_are_last_write_wins() {
        let store = SessionStore::new(Duration::from_secs(180));
        let id = store.create(series_session()).await;

        store.set_seasons(id, BTreeSet::from([1])).await.unwrap();
        store.set_quality_tier(id, 5).await.unwrap();
        store.set_seasons(id, BTreeSet::from([2])).await.unwrap();
        store.set_quality_tier(id, 4).await.unwrap();

        let session = store.get(id).await.unwrap();
        assert_eq!(session.quality_tier, Some(4));
        assert_eq!(session.seasons, BTreeSet::from([2]));
    }

    #[tokio::test]
    async fn test_rejects_unknown_seasons_and_tiers() {
        let store = SessionStore::new(Duration::from_secs(180));
        let id = store.create(series_session()).await;

        let err = store.set_seasons(id, BTreeSet::from([1, 9])).await.unwrap_err();
        assert_eq!(err.user_message(), "Unknown seasons: S9");
        assert!(store.get(id).await.unwrap().seasons.is_empty());

        assert!(matches!(
            store.set_quality_tier(id, 99).await,
            Err(RequestError::Validation(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sessions_expire() {
        let store = SessionStore::new(Duration::from_secs(180));
        let id = store.create(series_session()).await;
        store.set_quality_tier(id, 4).await.unwrap();

        tokio::time::advance(Duration::from_secs(181)).await;

        assert!(matches!(store.get(id).await, Err(RequestError::SessionExpired)));
        assert!(matches!(store.confirm(id).await, Err(RequestError::SessionExpired)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_season_override_uses_selection() {
        let mut session = series_session();
        session.seasons = BTreeSet::from([2]);
        let out = session.season_override();
        assert!(!out[0].monitored);
        assert!(out[1].monitored);
    }
}
