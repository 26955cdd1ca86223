use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use super::{ArrApi, RawLookup};
use crate::constants::limits::MAX_LOOKUP_RESULTS;
use crate::domain::{Candidate, ItemId, MovieItem, QualityTier, QueueEntry, Release};
use crate::services::backends::{MovieAddRequest, MovieBackend};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddOptions {
    search_for_movie: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddMovieBody<'a> {
    tmdb_id: i32,
    quality_profile_id: i32,
    root_folder_path: &'a str,
    monitored: bool,
    add_options: AddOptions,
}

/// Movies backend client (Radarr v3 API).
#[derive(Debug, Clone)]
pub struct RadarrClient {
    api: ArrApi,
}

impl RadarrClient {
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
}

#[async_trait::async_trait]
impl MovieBackend for RadarrClient {
    async fn lookup(&self, term: &str) -> Result<Vec<Candidate>> {
        let items: Vec<RawLookup> = self
            .api
            .get("movie/lookup", &[("term", term.to_string())])
            .await
            .context("Radarr lookup failed")?;
        debug!(count = items.len(), term, "Radarr lookup");
        Ok(items
            .into_iter()
            .take(MAX_LOOKUP_RESULTS)
            .map(Candidate::from)
            .collect())
    }

    async fn quality_tiers(&self) -> Result<Vec<QualityTier>> {
        self.api
            .quality_tiers()
            .await
            .context("Failed to list Radarr quality profiles")
    }

    async fn add(&self, request: &MovieAddRequest) -> Result<MovieItem> {
        let body = AddMovieBody {
            tmdb_id: request.tmdb_id,
            quality_profile_id: request.quality_profile_id,
            root_folder_path: &request.root_folder,
            monitored: request.monitored,
            add_options: AddOptions {
                search_for_movie: true,
            },
        };
        let item: MovieItem = self
            .api
            .post("movie", &body)
            .await
            .context("Failed to add movie")?;
        info!(tmdb_id = request.tmdb_id, id = %item.id, "Added movie to Radarr");
        Ok(item)
    }

    async fn get_by_id(&self, id: ItemId) -> Result<Option<MovieItem>> {
        self.api.get_optional(&format!("movie/{id}")).await
    }

    async fn get_by_external_id(&self, tmdb_id: i32) -> Result<Option<MovieItem>> {
        let items: Vec<MovieItem> = self
            .api
            .get("movie", &[("tmdbId", tmdb_id.to_string())])
            .await?;
        Ok(items.into_iter().next())
    }

    async fn queue(&self) -> Result<Vec<QueueEntry>> {
        self.api.get_records("queue").await
    }

    async fn cached_releases(&self, id: ItemId) -> Result<Vec<Release>> {
        self.api.releases(&[("movieId", id.to_string())]).await
    }

    async fn grab(&self, guid: &str, indexer_id: i32) -> Result<()> {
        self.api.grab(guid, indexer_id).await
    }

    async fn trigger_search(&self, id: ItemId) -> Result<()> {
        self.api
            .command(&serde_json::json!({ "name": "MoviesSearch", "movieIds": [id] }))
            .await
    }
}
