mod config;
mod error;
mod handlers;
mod models;
mod services;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use error::AppError;
use models::MasterFile;
use services::{FileMasterStore, JpxFetcher, MasterStore, TseMasterService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tse_master: TseMasterService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 TSE Master Backend Starting...");

    // Load configuration
    let config = Config::from_env();
    let addr = config.server_addr();

    if config.admin_api_key.is_none() {
        tracing::warn!("⚠️ ADMIN_API_KEY is not set; admin endpoints will answer 503");
    }

    // Initialize services
    let fetcher = JpxFetcher::new(&config).context("failed to create JPX fetcher")?;
    tracing::info!("📡 JPX source: {}", fetcher.url());
    let store = FileMasterStore::new(config.tse_master_path.clone());
    let current = load_master(&store).await?;

    let tse_master = TseMasterService::new(
        Arc::new(fetcher),
        Arc::new(store),
        current,
        config.tse_min_stock_count,
    );

    let state = AppState {
        config: Arc::new(config),
        tse_master,
    };

    let app = router(state);

    tracing::info!("🚀 TSE Master Backend starting on http://{}", addr);
    tracing::info!("🔐 Admin endpoints available at http://{}/api/admin/tse-stocks", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// Read the master once at startup; it stays fixed until the next restart
async fn load_master(store: &FileMasterStore) -> anyhow::Result<MasterFile> {
    match store.load().await {
        Ok(master) => {
            tracing::info!(
                "📦 Loaded TSE master: {} stocks generated {}",
                master.stocks.len(),
                master.metadata.generated_date.map(|d| d.to_string()).unwrap_or_default()
            );
            Ok(master)
        }
        Err(AppError::NotFound(msg)) => {
            tracing::warn!("⚠️ {}; starting with an empty master", msg);
            Ok(MasterFile::empty())
        }
        Err(e) => Err(anyhow::Error::new(e).context(format!("failed to load {}", store.path().display()))),
    }
}

pub fn router(state: AppState) -> Router {
    let origins: Vec<axum::http::HeaderValue> = state
        .config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Stock lookup routes
        .route("/api/stocks/search", get(handlers::search_stocks))
        .route("/api/stocks/:symbol", get(handlers::get_stock))

        // Admin TSE master routes
        .route("/api/admin/tse-stocks/status", get(handlers::get_status))
        .route("/api/admin/tse-stocks/preview", post(handlers::preview))
        .route("/api/admin/tse-stocks/update", post(handlers::update))

        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST, axum::http::Method::OPTIONS])
                .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::AUTHORIZATION]),
        )
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
