use crate::config::{Config, ConfigError};
use crate::store::Store;
use crate::store::postgres::PgStore;
use crate::{api, db};
use axum::ServiceExt;
use axum::extract::Request;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::layer::Layer;
use tower_http::normalize_path::NormalizePathLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Everything a request handler needs: configuration and access to the data store.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(config: Config, store: impl Store + 'static) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
        }
    }
}

#[derive(Debug, Error)]
#[error(transparent)]
pub enum InitError {
    Config(#[from] ConfigError),
    EnvVar(#[from] std::env::VarError),
    FailedConnection(#[from] diesel::r2d2::PoolError),
    #[error("Could not run database migrations. Details: {0}")]
    Migration(Box<dyn std::error::Error + Send + Sync>),
}

pub fn enable_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug,tower_http=debug,axum=trace", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Loads configuration, connects to the database and brings its schema up to date.
pub fn initialize() -> Result<AppState, InitError> {
    let config = Config::load()?;
    let pool = db::create_pool(&db::create_url()?)?;
    {
        let mut conn = pool.get()?;
        let applied = db::run_migrations(&mut conn).map_err(InitError::Migration)?;
        if !applied.is_empty() {
            info!("Applied {} database migration(s): {}", applied.len(), applied.join(", "));
        }
    }
    Ok(AppState::new(config, PgStore::new(pool)))
}

pub async fn run(state: AppState) -> std::io::Result<()> {
    let address = format!("0.0.0.0:{}", state.config.port);
    let app = NormalizePathLayer::trim_trailing_slash().layer(api::routes(state));

    let listener = TcpListener::bind(address).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::SignalKind;
        match tokio::signal::unix::signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Stopping server...");
}
