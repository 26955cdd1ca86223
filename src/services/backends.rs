//! Collaborator interfaces consumed by the core services.
//!
//! The concrete HTTP clients in [`crate::clients`] implement these traits; the
//! tests substitute in-memory fakes. Every call is fallible and never retried
//! here.

use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{
    Candidate, Episode, ExternalIds, ItemId, MediaKind, MovieItem, QualityTier, QueueEntry,
    Release, SeasonCounts, SeasonEntry, SeriesItem, TransferStatus,
};
use crate::error::{RequestError, RequestResult};

/// Parameters of a movie add call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieAddRequest {
    pub tmdb_id: i32,
    pub quality_profile_id: i32,
    pub root_folder: String,
    pub monitored: bool,
}

/// Parameters of a series add call. `seasons` is the complete season list
/// with the monitored flags already reconciled.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesAddRequest {
    pub ids: ExternalIds,
    pub quality_profile_id: i32,
    pub root_folder: String,
    pub monitored: bool,
    pub seasons: Vec<SeasonEntry>,
}

#[async_trait::async_trait]
pub trait MovieBackend: Send + Sync {
    /// Catalog search, in backend relevance order.
    async fn lookup(&self, term: &str) -> Result<Vec<Candidate>>;

    async fn quality_tiers(&self) -> Result<Vec<QualityTier>>;

    async fn add(&self, request: &MovieAddRequest) -> Result<MovieItem>;

    async fn get_by_id(&self, id: ItemId) -> Result<Option<MovieItem>>;

    async fn get_by_external_id(&self, tmdb_id: i32) -> Result<Option<MovieItem>>;

    async fn queue(&self) -> Result<Vec<QueueEntry>>;

    async fn cached_releases(&self, id: ItemId) -> Result<Vec<Release>>;

    async fn grab(&self, guid: &str, indexer_id: i32) -> Result<()>;

    async fn trigger_search(&self, id: ItemId) -> Result<()>;
}

#[async_trait::async_trait]
pub trait SeriesBackend: Send + Sync {
    async fn lookup(&self, term: &str) -> Result<Vec<Candidate>>;

    /// Full lookup record (including its season list) for a known series.
    async fn lookup_by_ids(&self, ids: &ExternalIds) -> Result<Option<SeriesItem>>;

    async fn quality_tiers(&self) -> Result<Vec<QualityTier>>;

    async fn add(&self, request: &SeriesAddRequest) -> Result<SeriesItem>;

    /// Replaces the whole series resource.
    async fn update(&self, item: &SeriesItem) -> Result<SeriesItem>;

    async fn get_by_id(&self, id: ItemId) -> Result<Option<SeriesItem>>;

    async fn get_by_external_ids(&self, ids: &ExternalIds) -> Result<Option<SeriesItem>>;

    async fn queue(&self) -> Result<Vec<QueueEntry>>;

    async fn episodes(&self, id: ItemId) -> Result<Vec<Episode>>;

    async fn season_file_counts(&self, id: ItemId) -> Result<BTreeMap<i32, SeasonCounts>>;

    async fn cached_releases_for_episode(&self, episode_id: i32) -> Result<Vec<Release>>;

    async fn grab(&self, guid: &str, indexer_id: i32) -> Result<()>;

    async fn trigger_search(&self, id: ItemId) -> Result<()>;

    async fn trigger_season_search(&self, id: ItemId, season_number: i32) -> Result<()>;
}

#[async_trait::async_trait]
pub trait MediaLibrary: Send + Sync {
    /// Whether the playback server already has the candidate, matched by
    /// external id or by title and year.
    async fn exists(&self, kind: MediaKind, candidate: &Candidate) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait TransferBackend: Send + Sync {
    async fn status_by_handle(&self, handle: &str) -> Result<Option<TransferStatus>>;
}

/// The set of collaborators handed to every core service.
#[derive(Clone)]
pub struct Backends {
    pub movies: Arc<dyn MovieBackend>,

    pub series: Option<Arc<dyn SeriesBackend>>,

    pub library: Option<Arc<dyn MediaLibrary>>,

    pub transfer: Option<Arc<dyn TransferBackend>>,
}

impl Backends {
    #[must_use]
    pub fn new(movies: Arc<dyn MovieBackend>) -> Self {
        Self {
            movies,
            series: None,
            library: None,
            transfer: None,
        }
    }

    #[must_use]
    pub fn with_series(mut self, series: Arc<dyn SeriesBackend>) -> Self {
        self.series = Some(series);
        self
    }

    #[must_use]
    pub fn with_library(mut self, library: Arc<dyn MediaLibrary>) -> Self {
        self.library = Some(library);
        self
    }

    #[must_use]
    pub fn with_transfer(mut self, transfer: Arc<dyn TransferBackend>) -> Self {
        self.transfer = Some(transfer);
        self
    }

    pub fn series(&self) -> RequestResult<&Arc<dyn SeriesBackend>> {
        self.series
            .as_ref()
            .ok_or(RequestError::NotConfigured("Sonarr"))
    }
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backends")
            .field("series", &self.series.is_some())
            .field("library", &self.library.is_some())
            .field("transfer", &self.transfer.is_some())
            .finish_non_exhaustive()
    }
}
