use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PoolError, PooledConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use std::env::VarError;

pub type ConnectionPool = Pool<ConnectionManager<PgConnection>>;
pub type PooledPgConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// Runs embedded migrations on the database and returns the versions that were applied.
pub fn run_migrations(conn: &mut PgConnection) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
    conn.run_pending_migrations(MIGRATIONS)
        .map(|versions| versions.iter().map(ToString::to_string).collect())
}

/// Returns a url for the database using `POSTGRES_USER`, `POSTGRES_PASSWORD`, and `POSTGRES_DB` environment variables.
/// `POSTGRES_HOST` defaults to localhost. Variables may also be supplied by a `.env` file.
pub fn create_url() -> Result<String, VarError> {
    if let Err(err) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {err}");
    }

    let user = std::env::var("POSTGRES_USER")?;
    let password = std::env::var("POSTGRES_PASSWORD")?;
    let database = std::env::var("POSTGRES_DB")?;
    let hostname = std::env::var("POSTGRES_HOST").unwrap_or_else(|_| String::from("localhost"));

    Ok(format!("postgres://{user}:{password}@{hostname}/{database}"))
}

/// Builds a connection pool sized to the number of runtime worker threads.
pub fn create_pool(database_url: &str) -> Result<ConnectionPool, PoolError> {
    let num_threads = tokio::runtime::Handle::try_current()
        .map(|handle| handle.metrics().num_workers())
        .unwrap_or(1);
    let manager = ConnectionManager::new(database_url);
    Pool::builder()
        .max_size(num_threads as u32)
        .max_lifetime(None)
        .idle_timeout(None)
        .test_on_check_out(true)
        .build(manager)
}

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();
