pub mod asset_store;
pub mod config_store;
pub mod handlers;
pub mod models;
pub mod validator;

use std::sync::Arc;

use asset_store::AssetStore;
use config_store::ConfigStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConfigStore>,
    pub assets: Arc<AssetStore>,
    pub http: reqwest::Client,
}
