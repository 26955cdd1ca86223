use anyhow::{Context, Result, bail};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{TransferState, TransferStatus};
use crate::services::backends::TransferBackend;

const SESSION_HEADER: &str = "X-Transmission-Session-Id";

#[derive(Debug, Clone)]
pub struct TransmissionConfig {
    pub url: String,

    pub username: Option<String>,

    pub password: Option<String>,
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9091/transmission/rpc".to_string(),
            username: None,
            password: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TorrentInfo {
    #[serde(default)]
    pub id: i64,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub status: i64,

    #[serde(default)]
    pub percent_done: f64,

    #[serde(default)]
    pub rate_download: i64,

    #[serde(default = "unknown_eta")]
    pub eta: i64,
}

const fn unknown_eta() -> i64 {
    -1
}

impl From<TorrentInfo> for TransferStatus {
    fn from(info: TorrentInfo) -> Self {
        Self {
            state: TransferState::from(info.status),
            percent_done: info.percent_done,
            rate_download: info.rate_download,
            eta: info.eta,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TorrentGetArguments {
    #[serde(default)]
    torrents: Vec<TorrentInfo>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: String,

    #[serde(default)]
    arguments: TorrentGetArguments,
}

/// Transfer backend client (Transmission RPC).
///
/// The RPC answers 409 with a fresh session id until the caller echoes it;
/// the id is cached and the request retried once.
#[derive(Debug)]
pub struct TransmissionClient {
    client: Client,
    config: TransmissionConfig,
    session_id: RwLock<Option<String>>,
}

impl TransmissionClient {
    #[must_use]
    pub fn new(client: Client, config: TransmissionConfig) -> Self {
        Self {
            client,
            config,
            session_id: RwLock::new(None),
        }
    }

    async fn post_rpc(&self, body: &serde_json::Value) -> Result<reqwest::Response> {
        let mut request = self.client.post(&self.config.url).json(body);
        if let Some(user) = &self.config.username {
            request = request.basic_auth(user, self.config.password.as_deref());
        }
        if let Some(sid) = self.session_id.read().await.as_deref() {
            request = request.header(SESSION_HEADER, sid);
        }
        request
            .send()
            .await
            .context("Failed to connect to Transmission")
    }

    async fn rpc(&self, method: &str, arguments: serde_json::Value) -> Result<RpcResponse> {
        let body = serde_json::json!({ "method": method, "arguments": arguments });

        let mut response = self.post_rpc(&body).await?;
        if response.status() == StatusCode::CONFLICT {
            let sid = response
                .headers()
                .get(SESSION_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            debug!(reason = "session_id_refresh", "Retrying Transmission RPC");
            *self.session_id.write().await = sid;
            response = self.post_rpc(&body).await?;
        }

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("Transmission RPC failed: status={status}, body={text}");
        }

        let parsed: RpcResponse = response.json().await?;
        if parsed.result != "success" && !parsed.result.is_empty() {
            bail!("Transmission RPC returned: {}", parsed.result);
        }
        Ok(parsed)
    }

    pub async fn get_by_hash(&self, info_hash: &str) -> Result<Option<TorrentInfo>> {
        let response = self
            .rpc(
                "torrent-get",
                serde_json::json!({
                    "ids": [info_hash],
                    "fields": ["id", "name", "status", "percentDone", "rateDownload", "eta"],
                }),
            )
            .await?;
        Ok(response.arguments.torrents.into_iter().next())
    }

    pub async fn is_available(&self) -> bool {
        self.rpc("session-get", serde_json::json!({})).await.is_ok()
    }
}

#[async_trait::async_trait]
impl TransferBackend for TransmissionClient {
    async fn status_by_handle(&self, handle: &str) -> Result<Option<TransferStatus>> {
        Ok(self.get_by_hash(handle).await?.map(TransferStatus::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_torrent_info_conversion() {
        let info: TorrentInfo = serde_json::from_value(serde_json::json!({
            "id": 1, "name": "x", "status": 4, "percentDone": 1.0, "rateDownload": 0
        }))
        .unwrap();
        let status = TransferStatus::from(info);
        assert_eq!(status.state, TransferState::Seed);
        assert_eq!(status.eta, -1);
        assert_eq!(status.summary(), "seed • 100.0% • 0 B/s • eta ?");
    }

    #[test]
    fn test_rpc_response_parsing() {
        let parsed: RpcResponse = serde_json::from_value(serde_json::json!({
            "result": "success",
            "arguments": { "torrents": [{ "id": 2, "status": 3, "percentDone": 0.5, "rateDownload": 1024, "eta": 60 }] }
        }))
        .unwrap();
        assert_eq!(parsed.arguments.torrents.len(), 1);
        assert_eq!(parsed.arguments.torrents[0].rate_download, 1024);
    }

    #[test]
    fn test_default_config() {
        let config = TransmissionConfig::default();
        assert_eq!(config.url, "http://localhost:9091/transmission/rpc");
        assert!(config.username.is_none());
    }
}
