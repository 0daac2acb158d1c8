use std::time::Duration;

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::AppState;
use crate::models::PingMethod;

/// A probe answers within this bound or the target counts as offline.
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub url: String,
    #[serde(default)]
    pub method: Option<PingMethod>,
}

/// Reachability check for a service card. A down service is a routine
/// condition, so every failure mode collapses to "offline" rather than
/// an error response.
pub async fn check_status(
    State(state): State<AppState>,
    Json(req): Json<StatusRequest>,
) -> Json<Value> {
    let status = probe(&state.http, &req.url, req.method.unwrap_or(PingMethod::Head)).await;
    Json(json!({ "status": status }))
}

pub(crate) async fn probe(client: &reqwest::Client, url: &str, method: PingMethod) -> &'static str {
    let request = match method {
        PingMethod::Head => client.head(url),
        PingMethod::Get => client.get(url),
    };
    match request.timeout(PROBE_TIMEOUT).send().await {
        Ok(resp) if resp.status().is_success() || resp.status().is_redirection() => "online",
        Ok(_) => "offline",
        Err(_) => "offline",
    }
}
