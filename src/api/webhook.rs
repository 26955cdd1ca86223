use axum::{Json, body::Bytes, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub event: String,
}

/// `eventType`, else `event`, else `unknown`.
pub fn event_type(payload: &Value) -> String {
    ["eventType", "event"]
        .iter()
        .find_map(|key| {
            payload
                .get(key)
                .and_then(Value::as_str)
                .filter(|event| !event.is_empty())
        })
        .unwrap_or("unknown")
        .to_string()
}

pub async fn healthz() -> Json<Value> {
    Json(serde_json::json!({ "ok": true }))
}

/// Accepts any JSON payload from Radarr or Sonarr and logs its event type.
pub async fn receive(body: Bytes) -> impl IntoResponse {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Rejected webhook with invalid JSON");
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "invalid JSON body" })),
            )
                .into_response();
        }
    };

    let event = event_type(&payload);
    info!(event = %event, "Received webhook event");
    Json(WebhookAck {
        received: true,
        event,
    })
    .into_response()
}
