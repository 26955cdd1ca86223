use anyhow::{Context, Result};
use reqwest::Client;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::{ArrApi, RawLookup};
use crate::constants::limits::MAX_LOOKUP_RESULTS;
use crate::domain::{
    Candidate, Episode, ExternalIds, ItemId, QualityTier, QueueEntry, Release, SeasonCounts,
    SeriesItem,
};
use crate::services::backends::{SeriesAddRequest, SeriesBackend};
use crate::services::seasons::counts_from_episodes;

/// Series backend client (Sonarr v3 API).
#[derive(Debug, Clone)]
pub struct SonarrClient {
    api: ArrApi,
}

impl SonarrClient {
    #[must_use]
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            api: ArrApi::new(client, base_url, api_key),
        }
    }

    pub async fn is_available(&self) -> bool {
        self.api
            .get::<serde_json::Value>("system/status", &[])
            .await
            .is_ok()
    }

    async fn find_series(&self, key: &str, id: i32) -> Result<Option<SeriesItem>> {
        let items: Vec<SeriesItem> = self.api.get("series", &[(key, id.to_string())]).await?;
        Ok(items.into_iter().next())
    }
}

/// Lookup term for an exact id search; TVDB is preferred.
fn lookup_term(ids: &ExternalIds) -> Option<String> {
    match (ids.tvdb_id.filter(|id| *id > 0), ids.tmdb_id.filter(|id| *id > 0)) {
        (Some(tvdb), _) => Some(format!("tvdb:{tvdb}")),
        (None, Some(tmdb)) => Some(format!("tmdb:{tmdb}")),
        (None, None) => None,
    }
}

/// Body of an add call: the lookup record with our choices layered on top.
fn add_body(mut series: SeriesItem, request: &SeriesAddRequest) -> SeriesItem {
    series.id = None;
    series.quality_profile_id = Some(request.quality_profile_id);
    series.seasons.clone_from(&request.seasons);
    series.statistics = None;

    let extra = &mut series.extra;
    extra.insert(
        "rootFolderPath".to_string(),
        serde_json::Value::String(request.root_folder.clone()),
    );
    extra.insert(
        "monitored".to_string(),
        serde_json::Value::Bool(request.monitored),
    );
    extra.insert(
        "addOptions".to_string(),
        serde_json::json!({ "searchForMissingEpisodes": true }),
    );
    extra
        .entry("languageProfileId")
        .or_insert_with(|| serde_json::json!(1));
    extra
        .entry("seriesType")
        .or_insert_with(|| serde_json::json!("standard"));
    series
}

#[async_trait::async_trait]
impl SeriesBackend for SonarrClient {
    async fn lookup(&self, term: &str) -> Result<Vec<Candidate>> {
        let items: Vec<RawLookup> = self
            .api
            .get("series/lookup", &[("term", term.to_string())])
            .await
            .context("Sonarr lookup failed")?;
        debug!(count = items.len(), term, "Sonarr lookup");
        Ok(items
            .into_iter()
            .take(MAX_LOOKUP_RESULTS)
            .map(Candidate::from)
            .collect())
    }

    async fn lookup_by_ids(&self, ids: &ExternalIds) -> Result<Option<SeriesItem>> {
        let Some(term) = lookup_term(ids) else {
            return Ok(None);
        };
        let items: Vec<SeriesItem> = self.api.get("series/lookup", &[("term", term)]).await?;
        Ok(items.into_iter().next())
    }

    async fn quality_tiers(&self) -> Result<Vec<QualityTier>> {
        self.api
            .quality_tiers()
            .await
            .context("Failed to list Sonarr quality profiles")
    }

    async fn add(&self, request: &SeriesAddRequest) -> Result<SeriesItem> {
        let series = self
            .lookup_by_ids(&request.ids)
            .await?
            .context("Series not found during add")?;
        let body = add_body(series, request);
        let item: SeriesItem = self
            .api
            .post("series", &body)
            .await
            .context("Failed to add series")?;
        info!(title = %item.title, "Added series to Sonarr");
        Ok(item)
    }

    async fn update(&self, item: &SeriesItem) -> Result<SeriesItem> {
        self.api
            .put("series", item)
            .await
            .context("Failed to update series")
    }

    async fn get_by_id(&self, id: ItemId) -> Result<Option<SeriesItem>> {
        self.api.get_optional(&format!("series/{id}")).await
    }

    async fn get_by_external_ids(&self, ids: &ExternalIds) -> Result<Option<SeriesItem>> {
        if let Some(tvdb) = ids.tvdb_id.filter(|id| *id > 0) {
            if let Some(series) = self.find_series("tvdbId", tvdb).await? {
                return Ok(Some(series));
            }
        }
        if let Some(tmdb) = ids.tmdb_id.filter(|id| *id > 0) {
            return self.find_series("tmdbId", tmdb).await;
        }
        Ok(None)
    }

    async fn queue(&self) -> Result<Vec<QueueEntry>> {
        self.api.get_records("queue").await
    }

    async fn episodes(&self, id: ItemId) -> Result<Vec<Episode>> {
        self.api.get("episode", &[("seriesId", id.to_string())]).await
    }

    async fn season_file_counts(&self, id: ItemId) -> Result<BTreeMap<i32, SeasonCounts>> {
        let episodes = self.episodes(id).await?;
        Ok(counts_from_episodes(&episodes))
    }

    async fn cached_releases_for_episode(&self, episode_id: i32) -> Result<Vec<Release>> {
        self.api
            .releases(&[("episodeId", episode_id.to_string())])
            .await
    }

    async fn grab(&self, guid: &str, indexer_id: i32) -> Result<()> {
        self.api.grab(guid, indexer_id).await
    }

    async fn trigger_search(&self, id: ItemId) -> Result<()> {
        self.api
            .command(&serde_json::json!({ "name": "SeriesSearch", "seriesId": id }))
            .await
    }

    async fn trigger_season_search(&self, id: ItemId, season_number: i32) -> Result<()> {
        self.api
            .command(&serde_json::json!({
                "name": "SeasonSearch",
                "seriesId": id,
                "seasonNumber": season_number
            }))
            .await
    }
}
