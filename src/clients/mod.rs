pub mod plex;
pub mod radarr;
pub mod sonarr;
pub mod transmission;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::domain::{Candidate, ExternalIds, QualityTier, Release};

/// Builds the HTTP client shared by all backend clients.
pub fn build_http_client(timeout_seconds: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent("Slavarr/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .context("Failed to build shared HTTP client")
}

/// Thin request helper for the v3 API shared by Radarr and Sonarr.
#[derive(Debug, Clone)]
pub struct ArrApi {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ArrApi {
    #[must_use]
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/api/v3/{path}", self.base_url))
            .with_context(|| format!("Invalid backend URL: {}", self.base_url))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("X-Api-Key", &self.api_key)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = self.authorized(builder).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("status={status}, body={body}")
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.url(path, query)?;
        debug!(url = %url, "GET");
        let response = self.send(self.client.get(url)).await?;
        Ok(response.json().await?)
    }

    /// GET that maps a 404 to `None`.
    pub async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = self.url(path, &[])?;
        debug!(url = %url, "GET");
        let response = self.authorized(self.client.get(url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("status={status}, body={body}");
        }
        Ok(Some(response.json().await?))
    }

    pub async fn post<B: serde::Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path, &[])?;
        debug!(url = %url, "POST");
        let response = self.send(self.client.post(url).json(body)).await?;
        Ok(response.json().await?)
    }

    /// POST whose response body is irrelevant.
    pub async fn post_ack<B: serde::Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.url(path, &[])?;
        debug!(url = %url, "POST");
        self.send(self.client.post(url).json(body)).await?;
        Ok(())
    }

    pub async fn put<B: serde::Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path, &[])?;
        debug!(url = %url, "PUT");
        let response = self.send(self.client.put(url).json(body)).await?;
        Ok(response.json().await?)
    }

    /// Queue endpoints answer either `{records: [..]}` or a bare list.
    pub async fn get_records<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let value: serde_json::Value = self.get(path, &[]).await?;
        let records = match value {
            serde_json::Value::Object(mut map) => map
                .remove("records")
                .unwrap_or(serde_json::Value::Array(Vec::new())),
            other => other,
        };
        Ok(serde_json::from_value(records)?)
    }

    pub async fn quality_tiers(&self) -> Result<Vec<QualityTier>> {
        self.get("qualityprofile", &[]).await
    }

    pub async fn releases(&self, query: &[(&str, String)]) -> Result<Vec<Release>> {
        let raw: serde_json::Value = self.get("release", query).await?;
        let releases: Vec<RawRelease> = match raw {
            serde_json::Value::Array(_) => serde_json::from_value(raw)?,
            _ => Vec::new(),
        };
        Ok(releases.into_iter().map(Release::from).collect())
    }

    pub async fn grab(&self, guid: &str, indexer_id: i32) -> Result<()> {
        let payload = serde_json::json!({ "guid": guid, "indexerId": indexer_id });
        self.post_ack("release", &payload).await
    }

    pub async fn command(&self, payload: &serde_json::Value) -> Result<()> {
        self.post_ack("command", payload).await
    }
}

/// Lookup record shape common to movie and series search.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawLookup {
    #[serde(default)]
    title: String,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    tmdb_id: Option<i32>,
    #[serde(default)]
    imdb_id: Option<String>,
    #[serde(default)]
    tvdb_id: Option<i32>,
    #[serde(default)]
    overview: Option<String>,
}

impl From<RawLookup> for Candidate {
    fn from(raw: RawLookup) -> Self {
        Self {
            title: raw.title,
            year: raw.year.filter(|y| *y > 0),
            ids: ExternalIds {
                tmdb_id: raw.tmdb_id,
                imdb_id: raw.imdb_id,
                tvdb_id: raw.tvdb_id,
            },
            overview: raw.overview,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawQualityName {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawQuality {
    #[serde(default)]
    quality: RawQualityName,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawRelease {
    #[serde(default)]
    guid: String,
    #[serde(default)]
    indexer_id: i32,
    #[serde(default)]
    indexer: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    quality: RawQuality,
}

impl From<RawRelease> for Release {
    fn from(raw: RawRelease) -> Self {
        Self {
            guid: raw.guid,
            indexer_id: raw.indexer_id,
            indexer: raw.indexer,
            quality: raw.quality.quality.name,
            size: raw.size,
        }
    }
}
