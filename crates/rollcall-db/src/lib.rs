//! # Rollcall DB
//!
//! Database pool, migrations, and transaction helpers for the Rollcall API.
//!
//! - [`init_db_pool`]: builds the PostgreSQL pool from [`DatabaseConfig`]
//! - [`run_migrations`]: applies the embedded `migrations/` directory
//! - [`transaction`]: [`with_transaction`], the only way multi-row writes
//!   reach the database
//!
//! # Example
//!
//! ```ignore
//! use rollcall_db::{DatabaseConfig, init_db_pool, with_transaction};
//!
//! let pool = init_db_pool(&DatabaseConfig::from_env()).await?;
//! let count: i64 = with_transaction(&pool, |conn| {
//!     Box::pin(async move {
//!         let count = sqlx::query_scalar("SELECT COUNT(*) FROM users")
//!             .fetch_one(&mut *conn)
//!             .await?;
//!         Ok(count)
//!     })
//! })
//! .await?;
//! ```

pub mod transaction;

use std::env;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub use sqlx::PgPool;
pub use transaction::{
    TransactionPolicy, TxFuture, is_retryable, unique_violation, with_transaction,
    with_transaction_policy,
};

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl DatabaseConfig {
    /// Reads `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS` and `RUN_MIGRATIONS`.
    ///
    /// # Panics
    ///
    /// Panics if `DATABASE_URL` is not set.
    pub fn from_env() -> Self {
        Self {
            url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            run_migrations: env::var("RUN_MIGRATIONS")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),
        }
    }
}

/// Initializes a PostgreSQL connection pool.
///
/// The returned pool is cheaply cloneable and should be stored in the
/// application state.
pub async fn init_db_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
