use axum::{Router, routing::get, routing::post};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use homeport::AppState;
use homeport::asset_store::AssetStore;
use homeport::config_store::ConfigStore;
use homeport::handlers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("homeport=debug,tower_http=debug")
        }))
        .init();

    let config_path =
        std::env::var("HOMEPORT_CONFIG").unwrap_or_else(|_| "config/services.yml".to_string());
    let assets_root =
        PathBuf::from(std::env::var("HOMEPORT_ASSETS").unwrap_or_else(|_| "public".to_string()));
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let config = Arc::new(ConfigStore::new(&config_path));
    let assets = Arc::new(AssetStore::new(&assets_root, config.clone()));
    tracing::info!(
        "config at {config_path}, assets under {}",
        assets_root.display()
    );

    let http = reqwest::Client::builder()
        .user_agent(concat!("homeport/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let state = AppState {
        config,
        assets,
        http,
    };

    let app = Router::new()
        // Dashboard document
        .route(
            "/api/config",
            get(handlers::config::get_config).post(handlers::config::save_config),
        )
        .route("/api/config/raw", get(handlers::config::get_raw_config))
        // Asset files (icons, backgrounds)
        .route(
            "/api/files/{kind}",
            get(handlers::files::list_files).post(handlers::files::upload_file),
        )
        .route(
            "/api/files/{kind}/{filename}",
            axum::routing::put(handlers::files::rename_file)
                .delete(handlers::files::delete_file),
        )
        // Background selection and history
        .route(
            "/api/background",
            post(handlers::background::upload_background)
                .put(handlers::background::set_active_background)
                .delete(handlers::background::delete_background),
        )
        .route(
            "/api/background/url",
            post(handlers::background::upload_background_url),
        )
        // External probes
        .route("/api/status", post(handlers::status::check_status))
        .route("/api/weather", get(handlers::weather::get_weather))
        // Caller IP (gates `local`-flagged services)
        .route("/api/ip", get(handlers::ip::get_ip))
        // Health
        .route("/healthz", get(handlers::health::healthz))
        // Serve uploaded images directly
        .nest_service("/icons", ServeDir::new(assets_root.join("icons")))
        .nest_service("/backgrounds", ServeDir::new(assets_root.join("backgrounds")))
        .layer(axum::extract::DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("homeport listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
