//! Domain types shared by the request wizard and its collaborators.
//!
//! Everything here is plain data. Backends produce these values, the core
//! services transform them, and the render layer turns them into messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an item inside a collection service (a movie or a series
/// entry the backend already tracks).
///
/// This newtype keeps collection ids apart from catalog ids such as TMDB ids.
///
/// # Examples
///
/// ```rust
/// use slavarr::domain::ItemId;
///
/// let id = ItemId::new(42);
/// assert_eq!(id.value(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ItemId(i32);

impl ItemId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for ItemId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl Serialize for ItemId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = i32::deserialize(deserializer)?;
        Ok(Self::new(id))
    }
}

/// Which collection service a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
        }
    }

    /// Name of the collection service, as shown to users.
    #[must_use]
    pub const fn backend_name(&self) -> &'static str {
        match self {
            Self::Movie => "Radarr",
            Self::Series => "Sonarr",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single catalog identifier. Used as the key of the "already held" sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExternalKey {
    Tmdb(i32),
    Tvdb(i32),
}

/// External catalog identifiers of a candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalIds {
    #[serde(default)]
    pub tmdb_id: Option<i32>,

    #[serde(default)]
    pub imdb_id: Option<String>,

    #[serde(default)]
    pub tvdb_id: Option<i32>,
}

impl ExternalIds {
    #[must_use]
    pub fn movie(tmdb_id: i32) -> Self {
        Self {
            tmdb_id: Some(tmdb_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn series(tvdb_id: Option<i32>, tmdb_id: Option<i32>) -> Self {
        Self {
            tmdb_id,
            tvdb_id,
            imdb_id: None,
        }
    }

    /// Keys used for de-duplication. Movies are keyed by TMDB id only;
    /// series by TVDB and TMDB. Zero ids are treated as absent.
    #[must_use]
    pub fn keys(&self, kind: MediaKind) -> Vec<ExternalKey> {
        let tmdb = self.tmdb_id.filter(|id| *id > 0).map(ExternalKey::Tmdb);
        match kind {
            MediaKind::Movie => tmdb.into_iter().collect(),
            MediaKind::Series => self
                .tvdb_id
                .filter(|id| *id > 0)
                .map(ExternalKey::Tvdb)
                .into_iter()
                .chain(tmdb)
                .collect(),
        }
    }

    /// Whether the candidate can be requested at all.
    #[must_use]
    pub fn is_addressable(&self, kind: MediaKind) -> bool {
        !self.keys(kind).is_empty()
    }
}

/// A search result that could be added to a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    pub year: Option<i32>,
    pub ids: ExternalIds,
    pub overview: Option<String>,
}

impl Candidate {
    /// "Title (Year)" or just the title when the year is unknown.
    #[must_use]
    pub fn display_title(&self) -> String {
        match self.year {
            Some(year) if year > 0 => format!("{} ({year})", self.title),
            _ => self.title.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityTier {
    pub id: i32,
    pub name: String,
}

/// Per-season file counts from the collection service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonCounts {
    pub total: u32,
    pub have: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SeasonStatus {
    Complete,
    Partial,
    None,
}

impl SeasonStatus {
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Complete => "✅",
            Self::Partial => "➖",
            Self::None => "○",
        }
    }
}

/// A season as presented to the user while picking seasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeasonDescriptor {
    pub number: i32,
    pub total: u32,
    pub have: u32,
}

impl SeasonDescriptor {
    #[must_use]
    pub const fn status(&self) -> SeasonStatus {
        if self.total > 0 && self.have >= self.total {
            SeasonStatus::Complete
        } else if self.have > 0 {
            SeasonStatus::Partial
        } else {
            SeasonStatus::None
        }
    }
}

/// A season entry exactly as the series backend stores it.
///
/// Unknown fields are kept in `extra` so that an entry read from the backend
/// can be written back without losing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonEntry {
    pub season_number: i32,

    #[serde(default)]
    pub monitored: bool,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SeasonEntry {
    #[must_use]
    pub fn new(season_number: i32, monitored: bool) -> Self {
        Self {
            season_number,
            monitored,
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default)]
    pub cover_type: String,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub remote_url: Option<String>,
}

/// First poster URL, preferring the remote URL over the local one.
#[must_use]
pub fn first_poster(images: &[Image]) -> Option<String> {
    images
        .iter()
        .find(|image| image.cover_type == "poster")
        .and_then(|image| image.remote_url.clone().or_else(|| image.url.clone()))
}

/// A movie already present in the movies backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieItem {
    pub id: ItemId,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub year: Option<i32>,

    #[serde(default)]
    pub movie_file: Option<serde_json::Value>,

    #[serde(default)]
    pub images: Vec<Image>,
}

impl MovieItem {
    #[must_use]
    pub fn has_file(&self) -> bool {
        self.movie_file
            .as_ref()
            .is_some_and(|file| !file.is_null())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStatistics {
    #[serde(default)]
    pub episode_file_count: u32,

    #[serde(default)]
    pub total_episode_count: u32,

    #[serde(default)]
    pub percent_of_episodes: Option<f64>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SeriesStatistics {
    /// Percent of monitored episodes with files; falls back to have/total.
    #[must_use]
    pub fn percent(&self) -> f64 {
        match self.percent_of_episodes {
            Some(pct) if pct > 0.0 => pct,
            _ if self.total_episode_count > 0 => {
                100.0 * f64::from(self.episode_file_count) / f64::from(self.total_episode_count)
            }
            _ => 0.0,
        }
    }
}

/// A series in the series backend (or a lookup result shaped like one).
///
/// The backend's update call replaces the whole resource, so every field not
/// modelled here is retained in `extra` and serialized back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvdb_id: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_profile_id: Option<i32>,

    #[serde(default)]
    pub seasons: Vec<SeasonEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<SeriesStatistics>,

    #[serde(default)]
    pub images: Vec<Image>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// An entry of a collection service's download queue.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    #[serde(default, alias = "movieId", alias = "seriesId")]
    pub item_id: Option<ItemId>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub size: f64,

    #[serde(default, rename = "sizeleft")]
    pub size_left: f64,

    #[serde(default, rename = "timeleft")]
    pub time_left: Option<String>,

    #[serde(default)]
    pub download_id: Option<String>,

    #[serde(default)]
    pub protocol: Option<String>,
}

impl QueueEntry {
    /// Completion percentage derived from size and remaining size.
    #[must_use]
    pub fn percent(&self) -> Option<f64> {
        if self.size > 0.0 {
            Some(100.0 * (1.0 - self.size_left / self.size))
        } else {
            None
        }
    }

    #[must_use]
    pub fn belongs_to(&self, id: ItemId) -> bool {
        self.item_id == Some(id)
    }
}

/// Transfer client state, numbered the way the RPC reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Stopped,
    CheckWait,
    Check,
    Download,
    Seed,
    Isolated,
    Stalled,
    Unknown,
}

impl From<i64> for TransferState {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::Stopped,
            1 => Self::CheckWait,
            2 => Self::Check,
            3 => Self::Download,
            4 => Self::Seed,
            5 => Self::Isolated,
            6 => Self::Stalled,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Stopped => "stopped",
            Self::CheckWait => "check_wait",
            Self::Check => "check",
            Self::Download => "download",
            Self::Seed => "seed",
            Self::Isolated => "isolated",
            Self::Stalled => "stalled",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Live progress of one transfer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferStatus {
    pub state: TransferState,
    /// Fraction in `0.0..=1.0`.
    pub percent_done: f64,
    /// Bytes per second.
    pub rate_download: i64,
    /// Seconds, negative when unknown.
    pub eta: i64,
}

impl TransferStatus {
    /// One-line summary, e.g. `download • 42.0% • 1024 B/s • eta 60`.
    #[must_use]
    pub fn summary(&self) -> String {
        let eta = if self.eta >= 0 {
            self.eta.to_string()
        } else {
            "?".to_string()
        };
        format!(
            "{} • {:.1}% • {} B/s • eta {eta}",
            self.state,
            self.percent_done * 100.0,
            self.rate_download
        )
    }
}

/// A downloadable release cached by a collection service's indexers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub guid: String,
    pub indexer_id: i32,
    pub indexer: String,
    pub quality: String,
    pub size: u64,
}

impl Release {
    #[must_use]
    pub fn matches_quality(&self, label: &str) -> bool {
        self.quality.to_lowercase() == label.to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: i32,

    #[serde(default)]
    pub season_number: i32,

    #[serde(default)]
    pub episode_number: i32,

    #[serde(default = "default_true")]
    pub monitored: bool,

    #[serde(default)]
    pub has_file: bool,

    #[serde(default)]
    pub air_date_utc: Option<DateTime<Utc>>,
}

const fn default_true() -> bool {
    true
}
