use sqlx::migrate::MigrateError;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

pub mod memory;
pub mod queries;
pub mod store;

pub use memory::InMemoryJobStore;
pub use queries::PgJobStore;
pub use store::{JobStore, StoreError};

/// Connections the API server keeps open at most.
pub const SERVER_MAX_CONNECTIONS: u32 = 20;

/// Open the job database pool.
///
/// Workers size the pool to their consumer count; the server uses
/// [`SERVER_MAX_CONNECTIONS`].
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .connect(database_url)
        .await
}

/// Apply pending migrations from `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
