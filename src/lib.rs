use crate::model::{MockDatabase, ModelManager, Tables};
use crate::utils::signal::shutdown_signal;
use crate::{error::AppResult, web::AppState};
use axum::Router;
use tokio::net::TcpListener;

pub mod config;
pub use config::{Config, ConfigError, ConfigResult};

pub mod auth;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod progress;
pub mod store;
pub mod utils;
pub mod web;

static APPLICATION_NAME: &str = "lernboard";

/// Opens the configured data file (or an empty in-memory database) and
/// builds the API router on top of it.
pub async fn build_server() -> AppResult<(AppState, Router)> {
    let use_local = cfg!(debug_assertions);
    let config = config::Config::get_or_init(use_local).await;

    let db = match config.app().data_file() {
        Some(path) => {
            tracing::debug!("loading mock database from {}", path.display());
            MockDatabase::open(path).await?
        }
        None => MockDatabase::in_memory(Tables::default()),
    };

    Ok(build_router(db, config))
}

pub async fn build_server_with_db(db: MockDatabase) -> AppResult<(AppState, Router)> {
    let config = config::Config::get_or_init(true).await;
    Ok(build_router(db, config))
}

fn build_router(db: MockDatabase, config: &'static Config) -> (AppState, Router) {
    let mm = ModelManager::new(db);
    let state = AppState::new(mm);
    let app = web::routes::build_app(state.clone(), config);
    (state, app)
}

#[tracing::instrument]
pub async fn setup_workers() -> AppResult<()> {
    let (_, app) = build_server().await?;
    let config = Config::get_or_init(false).await;
    let listener = TcpListener::bind(config.host().bindto()).await?;

    tracing::info!("axum is starting at: {}", config.host().bindto());
    let axum_handle = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal());

    axum_handle.await?;
    Ok(())
}

pub fn setup_trace() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

    // load .env file for RUST_LOG etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .with(ErrorLayer::default())
        .init();

    tracing::debug!("tracing initialized.");
}

#[tracing::instrument]
pub async fn run() -> AppResult<()> {
    setup_trace();
    setup_workers().await?;
    Ok(())
}
