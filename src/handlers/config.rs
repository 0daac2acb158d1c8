use std::collections::HashSet;

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::{Value, json};

use crate::AppState;
use crate::asset_store::AssetKind;
use crate::config_store::ConfigError;
use crate::models::{DashboardConfig, IconRef};

pub async fn get_config(State(state): State<AppState>) -> Json<DashboardConfig> {
    let doc = state.config.load();
    warn_dangling_icons(&state, &doc);
    Json(doc)
}

/// The body is parsed as YAML, which also covers the settings UI posting
/// JSON (YAML is a superset).
pub async fn save_config(
    State(state): State<AppState>,
    body: String,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let raw: serde_yaml::Value = serde_yaml::from_str(&body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": format!("invalid YAML: {e}") })),
        )
    })?;
    match state.config.save(&raw) {
        Ok(doc) => Ok(Json(json!({ "success": true, "config": doc }))),
        Err(ConfigError::Validation(e)) => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "errors": e.errors })),
        )),
        Err(e) => {
            tracing::error!("config save failed: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "failed to write config" })),
            ))
        }
    }
}

/// Raw file text for the YAML editor on the settings page.
pub async fn get_raw_config(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let text = state.config.raw().map_err(|e| {
        tracing::error!("could not read config file: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "could not load config file".to_string(),
        )
    })?;
    Ok(([(header::CONTENT_TYPE, "text/yaml")], text))
}

/// A service icon can point at an uploaded file that has since been
/// deleted or renamed. The dashboard renders anyway; we only log it.
fn warn_dangling_icons(state: &AppState, doc: &DashboardConfig) {
    let uploaded: HashSet<String> = state
        .assets
        .list(AssetKind::Icons)
        .unwrap_or_default()
        .into_iter()
        .collect();
    let all_services = doc
        .groups
        .iter()
        .flat_map(|g| g.services.iter())
        .chain(doc.services.iter().flatten());
    for svc in all_services {
        if let IconRef::Uploaded(file) = svc.icon_ref() {
            if !uploaded.contains(&file) {
                tracing::warn!(
                    service = %svc.name,
                    icon = %file,
                    "service icon references a file missing from the icons directory"
                );
            }
        }
    }
}
