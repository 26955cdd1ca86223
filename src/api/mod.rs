//! Inbound HTTP surface: the Radarr/Sonarr webhook receiver, a health probe
//! and the Prometheus scrape endpoint.

mod observability;
mod webhook;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;

pub use webhook::WebhookAck;

pub struct AppState {
    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub const fn new(prometheus_handle: Option<PrometheusHandle>) -> Self {
        Self { prometheus_handle }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(webhook::receive))
        .route("/healthz", get(webhook::healthz))
        .route("/metrics", get(observability::get_metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

/// Serves the router on `server.port` until Ctrl-C.
pub async fn serve(config: &Config, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Webhook receiver listening on http://{addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down webhook receiver");
        })
        .await?;
    Ok(())
}
