use std::net::SocketAddr;

use axum::{Json, extract::ConnectInfo, http::HeaderMap};
use serde_json::{Value, json};

/// Caller IP, used by the frontend to decide whether `local`-flagged
/// services should be shown. Honors x-forwarded-for when running behind
/// a proxy.
pub async fn get_ip(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Json<Value> {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| addr.ip().to_string());
    Json(json!({ "ip": ip }))
}
