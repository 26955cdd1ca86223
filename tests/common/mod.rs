#![allow(dead_code)]

use anyhow::{Result, bail};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

use slavarr::domain::{
    Candidate, Episode, ExternalIds, ItemId, MediaKind, MovieItem, QualityTier, QueueEntry,
    Release, SeasonCounts, SeasonEntry, SeriesItem, SeriesStatistics, TransferStatus,
};
use slavarr::error::{RequestError, RequestResult};
use slavarr::render::{Message, MessageHandle, StatusSink};
use slavarr::services::{
    Backends, MediaLibrary, MovieAddRequest, MovieBackend, SeriesAddRequest, SeriesBackend,
    TransferBackend,
};

pub fn tiers() -> Vec<QualityTier> {
    vec![
        QualityTier {
            id: 1,
            name: "Any".to_string(),
        },
        QualityTier {
            id: 4,
            name: "HD-1080p".to_string(),
        },
    ]
}

pub fn movie_candidate(title: &str, year: i32, tmdb_id: i32) -> Candidate {
    Candidate {
        title: title.to_string(),
        year: Some(year),
        ids: ExternalIds::movie(tmdb_id),
        overview: Some(format!("{title} overview")),
    }
}

pub fn series_candidate(title: &str, tvdb_id: i32, tmdb_id: i32) -> Candidate {
    Candidate {
        title: title.to_string(),
        year: Some(2019),
        ids: ExternalIds::series(Some(tvdb_id), Some(tmdb_id)),
        overview: None,
    }
}

pub fn series_item(id: Option<i32>, title: &str, seasons: Vec<SeasonEntry>) -> SeriesItem {
    SeriesItem {
        id: id.map(ItemId::new),
        title: title.to_string(),
        year: Some(2019),
        tvdb_id: None,
        tmdb_id: None,
        quality_profile_id: Some(1),
        seasons,
        statistics: None,
        images: Vec::new(),
        extra: serde_json::Map::new(),
    }
}

pub fn release(guid: &str, quality: &str) -> Release {
    Release {
        guid: guid.to_string(),
        indexer_id: 2,
        indexer: "Indexer".to_string(),
        quality: quality.to_string(),
        size: 1_500_000_000,
    }
}

#[derive(Default)]
pub struct FakeMovies {
    pub results: Vec<Candidate>,
    pub tiers: Vec<QualityTier>,
    /// Movies the collection already holds, keyed by TMDB id.
    pub held: Mutex<BTreeMap<i32, MovieItem>>,
    pub items: Mutex<BTreeMap<ItemId, MovieItem>>,
    pub queue: Mutex<Vec<QueueEntry>>,
    pub releases: Mutex<Vec<Release>>,
    pub adds: Mutex<Vec<MovieAddRequest>>,
    pub grabs: Mutex<Vec<String>>,
    pub searches: Mutex<Vec<ItemId>>,
    pub get_calls: AtomicU32,
    pub fail_grab: AtomicBool,
    pub fail_search: AtomicBool,
    pub fail_add: AtomicBool,
    next_id: AtomicI32,
}

impl FakeMovies {
    pub fn with_results(results: Vec<Candidate>) -> Self {
        Self {
            results,
            tiers: tiers(),
            next_id: AtomicI32::new(100),
            ..Self::default()
        }
    }

    pub fn hold(&self, tmdb_id: i32, id: i32) {
        let item = MovieItem {
            id: ItemId::new(id),
            title: "Held".to_string(),
            year: None,
            movie_file: None,
            images: Vec::new(),
        };
        self.items.lock().unwrap().insert(item.id, item.clone());
        self.held.lock().unwrap().insert(tmdb_id, item);
    }

    /// Marks the movie as downloaded.
    pub fn finish(&self, id: ItemId) {
        if let Some(item) = self.items.lock().unwrap().get_mut(&id) {
            item.movie_file = Some(serde_json::json!({ "id": 1 }));
        }
    }
}

#[async_trait::async_trait]
impl MovieBackend for FakeMovies {
    async fn lookup(&self, _term: &str) -> Result<Vec<Candidate>> {
        Ok(self.results.clone())
    }

    async fn quality_tiers(&self) -> Result<Vec<QualityTier>> {
        Ok(self.tiers.clone())
    }

    async fn add(&self, request: &MovieAddRequest) -> Result<MovieItem> {
        if self.fail_add.load(Ordering::SeqCst) {
            bail!("add rejected");
        }
        self.adds.lock().unwrap().push(request.clone());
        let id = ItemId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let title = self
            .results
            .iter()
            .find(|c| c.ids.tmdb_id == Some(request.tmdb_id))
            .map(|c| c.title.clone())
            .unwrap_or_default();
        let item = MovieItem {
            id,
            title,
            year: Some(2010),
            movie_file: None,
            images: Vec::new(),
        };
        self.items.lock().unwrap().insert(id, item.clone());
        self.held.lock().unwrap().insert(request.tmdb_id, item.clone());
        Ok(item)
    }

    async fn get_by_id(&self, id: ItemId) -> Result<Option<MovieItem>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.items.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_external_id(&self, tmdb_id: i32) -> Result<Option<MovieItem>> {
        Ok(self.held.lock().unwrap().get(&tmdb_id).cloned())
    }

    async fn queue(&self) -> Result<Vec<QueueEntry>> {
        Ok(self.queue.lock().unwrap().clone())
    }

    async fn cached_releases(&self, _id: ItemId) -> Result<Vec<Release>> {
        Ok(self.releases.lock().unwrap().clone())
    }

    async fn grab(&self, guid: &str, _indexer_id: i32) -> Result<()> {
        if self.fail_grab.load(Ordering::SeqCst) {
            bail!("release expired");
        }
        self.grabs.lock().unwrap().push(guid.to_string());
        Ok(())
    }

    async fn trigger_search(&self, id: ItemId) -> Result<()> {
        if self.fail_search.load(Ordering::SeqCst) {
            bail!("command rejected");
        }
        self.searches.lock().unwrap().push(id);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeSeries {
    pub results: Vec<Candidate>,
    pub tiers: Vec<QualityTier>,
    pub lookup_record: Option<SeriesItem>,
    pub existing: Mutex<Option<SeriesItem>>,
    pub counts: BTreeMap<i32, SeasonCounts>,
    pub episodes: Vec<Episode>,
    pub releases: Mutex<Vec<Release>>,
    pub adds: Mutex<Vec<SeriesAddRequest>>,
    pub updates: Mutex<Vec<SeriesItem>>,
    pub season_searches: Mutex<Vec<i32>>,
    pub searches: Mutex<Vec<ItemId>>,
    pub failing_season: Option<i32>,
}

impl FakeSeries {
    pub fn with_results(results: Vec<Candidate>) -> Self {
        Self {
            results,
            tiers: tiers(),
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
impl SeriesBackend for FakeSeries {
    async fn lookup(&self, _term: &str) -> Result<Vec<Candidate>> {
        Ok(self.results.clone())
    }

    async fn lookup_by_ids(&self, _ids: &ExternalIds) -> Result<Option<SeriesItem>> {
        Ok(self.lookup_record.clone())
    }

    async fn quality_tiers(&self) -> Result<Vec<QualityTier>> {
        Ok(self.tiers.clone())
    }

    async fn add(&self, request: &SeriesAddRequest) -> Result<SeriesItem> {
        self.adds.lock().unwrap().push(request.clone());
        let mut item = series_item(Some(55), "Added Show", request.seasons.clone());
        item.quality_profile_id = Some(request.quality_profile_id);
        *self.existing.lock().unwrap() = Some(item.clone());
        Ok(item)
    }

    async fn update(&self, item: &SeriesItem) -> Result<SeriesItem> {
        self.updates.lock().unwrap().push(item.clone());
        *self.existing.lock().unwrap() = Some(item.clone());
        Ok(item.clone())
    }

    async fn get_by_id(&self, id: ItemId) -> Result<Option<SeriesItem>> {
        Ok(self
            .existing
            .lock()
            .unwrap()
            .clone()
            .filter(|item| item.id == Some(id)))
    }

    async fn get_by_external_ids(&self, _ids: &ExternalIds) -> Result<Option<SeriesItem>> {
        Ok(self.existing.lock().unwrap().clone())
    }

    async fn queue(&self) -> Result<Vec<QueueEntry>> {
        Ok(Vec::new())
    }

    async fn episodes(&self, _id: ItemId) -> Result<Vec<Episode>> {
        Ok(self.episodes.clone())
    }

    async fn season_file_counts(&self, _id: ItemId) -> Result<BTreeMap<i32, SeasonCounts>> {
        Ok(self.counts.clone())
    }

    async fn cached_releases_for_episode(&self, _episode_id: i32) -> Result<Vec<Release>> {
        Ok(self.releases.lock().unwrap().clone())
    }

    async fn grab(&self, _guid: &str, _indexer_id: i32) -> Result<()> {
        Ok(())
    }

    async fn trigger_search(&self, id: ItemId) -> Result<()> {
        self.searches.lock().unwrap().push(id);
        Ok(())
    }

    async fn trigger_season_search(&self, _id: ItemId, season_number: i32) -> Result<()> {
        if self.failing_season == Some(season_number) {
            bail!("season search for S{season_number} rejected");
        }
        self.season_searches.lock().unwrap().push(season_number);
        Ok(())
    }
}

/// Playback library that knows a fixed set of titles.
#[derive(Default)]
pub struct FakeLibrary {
    pub titles: HashSet<String>,
}

#[async_trait::async_trait]
impl MediaLibrary for FakeLibrary {
    async fn exists(&self, _kind: MediaKind, candidate: &Candidate) -> Result<bool> {
        Ok(self.titles.contains(&candidate.title))
    }
}

pub struct FakeTransfer {
    pub status: TransferStatus,
}

#[async_trait::async_trait]
impl TransferBackend for FakeTransfer {
    async fn status_by_handle(&self, handle: &str) -> Result<Option<TransferStatus>> {
        Ok((handle == "HASH").then_some(self.status))
    }
}

/// Sink that records everything and can be told to reject edits.
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<Message>>,
    pub edits: Mutex<Vec<(MessageHandle, Message)>>,
    pub fail_edits: AtomicBool,
    pub fail_sends: AtomicBool,
}

impl RecordingSink {
    pub fn edits_for(&self, handle: &MessageHandle) -> Vec<Message> {
        self.edits
            .lock()
            .unwrap()
            .iter()
            .filter(|(h, _)| h == handle)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|m| m.content.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl StatusSink for RecordingSink {
    async fn send(&self, message: Message) -> RequestResult<MessageHandle> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(RequestError::Render("channel gone".to_string()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(message);
        Ok(MessageHandle(format!("msg-{}", sent.len())))
    }

    async fn edit(&self, handle: &MessageHandle, message: Message) -> RequestResult<()> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(RequestError::Render("message deleted".to_string()));
        }
        self.edits.lock().unwrap().push((handle.clone(), message));
        Ok(())
    }
}

pub fn movie_backends(movies: &Arc<FakeMovies>) -> Backends {
    Backends::new(Arc::clone(movies) as Arc<dyn MovieBackend>)
}

pub fn series_backends(movies: &Arc<FakeMovies>, series: &Arc<FakeSeries>) -> Backends {
    movie_backends(movies).with_series(Arc::clone(series) as Arc<dyn SeriesBackend>)
}

pub fn statistics(have: u32, total: u32) -> SeriesStatistics {
    SeriesStatistics {
        episode_file_count: have,
        total_episode_count: total,
        percent_of_episodes: None,
        extra: serde_json::Map::new(),
    }
}
