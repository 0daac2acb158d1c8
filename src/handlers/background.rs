use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::AppState;
use crate::asset_store::{AssetKind, sanitize_filename};
use crate::handlers::files::{asset_error, read_file_field};

type ErrorResponse = (StatusCode, Json<Value>);

/// Multipart upload of a new background (field `background`). The file
/// becomes the active background and joins the history.
pub async fn upload_background(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ErrorResponse> {
    let (name, bytes) = read_file_field(multipart, "background").await?;
    let filename = state
        .assets
        .upload(AssetKind::Backgrounds, &name, &bytes)
        .map_err(asset_error)?;
    Ok(Json(json!({
        "success": true,
        "filename": filename,
        "config": state.config.load(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    pub url: String,
}

/// Download a background from a URL instead of uploading one. The
/// filename comes from the URL path; URLs without one get a timestamped
/// name so nothing in the history is anonymous.
pub async fn upload_background_url(
    State(state): State<AppState>,
    Json(req): Json<UrlRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let url: reqwest::Url = req
        .url
        .parse()
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, "invalid URL"))?;

    let response = state.http.get(url.clone()).send().await.map_err(|e| {
        tracing::warn!("background download failed: {e}");
        error_response(StatusCode::BAD_GATEWAY, "failed to download image from URL")
    })?;
    if !response.status().is_success() {
        return Err(error_response(
            StatusCode::BAD_GATEWAY,
            "failed to download image from URL",
        ));
    }
    let bytes = response.bytes().await.map_err(|e| {
        tracing::warn!("background download failed: {e}");
        error_response(StatusCode::BAD_GATEWAY, "failed to download image from URL")
    })?;

    let filename = filename_from_url(&url);
    let filename = state
        .assets
        .upload(AssetKind::Backgrounds, &filename, &bytes)
        .map_err(asset_error)?;
    Ok(Json(json!({
        "success": true,
        "filename": filename,
        "config": state.config.load(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct FilenameRequest {
    pub filename: String,
}

/// Select an already-uploaded background as active.
pub async fn set_active_background(
    State(state): State<AppState>,
    Json(req): Json<FilenameRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let config = state
        .assets
        .set_active_background(&req.filename)
        .map_err(asset_error)?;
    Ok(Json(json!({ "success": true, "config": config })))
}

/// Remove a background from disk and from the history; the active
/// selection falls back to the first remaining entry.
pub async fn delete_background(
    State(state): State<AppState>,
    Json(req): Json<FilenameRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    state
        .assets
        .delete(AssetKind::Backgrounds, &req.filename)
        .map_err(asset_error)?;
    Ok(Json(json!({ "success": true, "config": state.config.load() })))
}

fn filename_from_url(url: &reqwest::Url) -> String {
    let last_segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");
    match sanitize_filename(last_segment) {
        Some(name) => name,
        None => {
            let ext = last_segment.rsplit_once('.').map(|(_, e)| e).unwrap_or("jpg");
            format!("{}.{ext}", chrono::Utc::now().timestamp_millis())
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> ErrorResponse {
    (status, Json(json!({ "success": false, "error": message })))
}
