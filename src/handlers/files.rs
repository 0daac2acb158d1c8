use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::AppState;
use crate::asset_store::{AssetError, AssetKind};

type ErrorResponse = (StatusCode, Json<Value>);

pub async fn list_files(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let kind = parse_kind(&kind)?;
    let files = state.assets.list(kind).map_err(asset_error)?;
    Ok(Json(json!({ "success": true, "files": files })))
}

pub async fn upload_file(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ErrorResponse> {
    let kind = parse_kind(&kind)?;
    let (name, bytes) = read_file_field(multipart, "file").await?;
    let filename = state.assets.upload(kind, &name, &bytes).map_err(asset_error)?;

    let mut body = json!({ "success": true, "filename": filename });
    if kind == AssetKind::Backgrounds {
        // background uploads also moved the active/history bookkeeping
        body["config"] = serde_json::to_value(state.config.load()).unwrap_or(Value::Null);
    }
    Ok(Json(body))
}

pub async fn delete_file(
    State(state): State<AppState>,
    Path((kind, filename)): Path<(String, String)>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let kind = parse_kind(&kind)?;
    state.assets.delete(kind, &filename).map_err(asset_error)?;
    Ok(Json(json!({ "success": true, "message": "File deleted" })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    pub new_name: String,
}

pub async fn rename_file(
    State(state): State<AppState>,
    Path((kind, filename)): Path<(String, String)>,
    Json(req): Json<RenameRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let kind = parse_kind(&kind)?;
    let new_name = state
        .assets
        .rename(kind, &filename, &req.new_name)
        .map_err(asset_error)?;
    Ok(Json(json!({ "success": true, "message": "File renamed", "newName": new_name })))
}

pub(crate) fn parse_kind(kind: &str) -> Result<AssetKind, ErrorResponse> {
    AssetKind::parse(kind).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": format!("unknown file type: {kind}") })),
        )
    })
}

/// Pull the named file field out of a multipart body.
pub(crate) async fn read_file_field(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<(String, Vec<u8>), ErrorResponse> {
    while let Some(field) = multipart.next_field().await.map_err(|e| bad_request(&e.to_string()))? {
        if field.name() != Some(field_name) {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| bad_request(&e.to_string()))?;
        return Ok((name, bytes.to_vec()));
    }
    Err(bad_request(&format!("missing '{field_name}' field")))
}

fn bad_request(message: &str) -> ErrorResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": message })),
    )
}

pub(crate) fn asset_error(e: AssetError) -> ErrorResponse {
    let status = match e {
        AssetError::InvalidName => StatusCode::BAD_REQUEST,
        AssetError::NotFound => StatusCode::NOT_FOUND,
        AssetError::Io(_) | AssetError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "success": false, "error": e.to_string() })))
}
