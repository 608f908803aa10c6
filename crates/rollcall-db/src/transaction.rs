//! Transaction boundary for multi-row writes.
//!
//! [`with_transaction`] opens a `REPEATABLE READ` transaction, runs the
//! operation on its connection and commits on success. Any error rolls the
//! transaction back. The whole attempt is bounded by
//! [`TransactionPolicy::timeout`], and serialization failures or deadlocks
//! are retried up to [`TransactionPolicy::max_attempts`] times.
//!
//! The operation is a `Fn` so it can be replayed on retry; move owned inputs
//! into the closure and clone them inside it.

use std::env;
use std::future::Future;
use std::pin::Pin;
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, anyhow};
use metrics::counter;
use sqlx::{PgConnection, PgPool};
use tracing::warn;

use rollcall_core::AppError;

pub type TxFuture<'c, T> = Pin<Box<dyn Future<Output = Result<T, AppError>> + Send + 'c>>;

const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

static POLICY: OnceLock<TransactionPolicy> = OnceLock::new();

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
}

impl Default for TransactionPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(10_000),
            max_attempts: 3,
        }
    }
}

impl TransactionPolicy {
    /// Reads `DB_TRANSACTION_TIMEOUT_MS` and `DB_TRANSACTION_MAX_ATTEMPTS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            timeout: env::var("DB_TRANSACTION_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            max_attempts: env::var("DB_TRANSACTION_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &u32| *n > 0)
                .unwrap_or(defaults.max_attempts),
        }
    }

    /// Process-wide policy, read from the environment once.
    pub fn global() -> &'static Self {
        POLICY.get_or_init(Self::from_env)
    }
}

/// True for errors caused by a concurrent writer (serialization failure or
/// deadlock). These are safe to replay.
pub fn is_retryable(err: &AppError) -> bool {
    match err.as_sqlx() {
        Some(sqlx::Error::Database(db_err)) => matches!(
            db_err.code().as_deref(),
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)
        ),
        _ => false,
    }
}

/// Returns the constraint name when `err` is a unique violation.
pub fn unique_violation(err: &AppError) -> Option<&str> {
    match err.as_sqlx() {
        Some(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Some(db_err.constraint().unwrap_or_default())
        }
        _ => None,
    }
}

pub async fn with_transaction<T, F>(db: &PgPool, op: F) -> Result<T, AppError>
where
    T: Send,
    F: for<'c> Fn(&'c mut PgConnection) -> TxFuture<'c, T> + Send + Sync,
{
    with_transaction_policy(db, TransactionPolicy::global(), op).await
}

pub async fn with_transaction_policy<T, F>(
    db: &PgPool,
    policy: &TransactionPolicy,
    op: F,
) -> Result<T, AppError>
where
    T: Send,
    F: for<'c> Fn(&'c mut PgConnection) -> TxFuture<'c, T> + Send + Sync,
{
    let mut attempt = 1;

    loop {
        let result = match tokio::time::timeout(policy.timeout, run_once(db, &op)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::database(anyhow!(
                "Transaction timed out after {} ms",
                policy.timeout.as_millis()
            ))),
        };

        match result {
            Err(err) if attempt < policy.max_attempts && is_retryable(&err) => {
                warn!(attempt, error = %err.error, "Retrying transaction after write conflict");
                counter!("db_transaction_retries_total").increment(1);
                attempt += 1;
            }
            other => return other,
        }
    }
}

async fn run_once<T, F>(db: &PgPool, op: &F) -> Result<T, AppError>
where
    F: for<'c> Fn(&'c mut PgConnection) -> TxFuture<'c, T>,
{
    let mut tx = db
        .begin()
        .await
        .context("Failed to begin transaction")
        .map_err(AppError::database)?;

    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
        .execute(&mut *tx)
        .await?;

    match op(&mut *tx).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Failed to roll back transaction");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_core::ErrorKind;

    #[test]
    fn test_default_policy() {
        let policy = TransactionPolicy::default();
        assert_eq!(policy.timeout, Duration::from_secs(10));
        assert_eq!(policy.max_attempts, 3);
    }

    #[test]
    fn test_non_database_errors_are_not_retryable() {
        assert!(!is_retryable(&AppError::conflict(anyhow!("taken"))));
        assert!(!is_retryable(&AppError::from(sqlx::Error::RowNotFound)));
        assert!(unique_violation(&AppError::from(sqlx::Error::PoolTimedOut)).is_none());
    }

    async fn principal_count(pool: &PgPool, email: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM principals WHERE email = $1")
            .bind(email)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_commits_on_success(pool: PgPool) {
        let email = "commit@example.com".to_string();

        with_transaction(&pool, move |conn| {
            let email = email.clone();
            Box::pin(async move {
                sqlx::query("INSERT INTO principals (email, password) VALUES ($1, 'x')")
                    .bind(email)
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        })
        .await
        .unwrap();

        assert_eq!(principal_count(&pool, "commit@example.com").await, 1);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_rolls_back_on_error(pool: PgPool) {
        let result: Result<(), AppError> = with_transaction(&pool, |conn| {
            Box::pin(async move {
                sqlx::query("INSERT INTO principals (email, password) VALUES ($1, 'x')")
                    .bind("rollback@example.com")
                    .execute(&mut *conn)
                    .await?;
                Err(AppError::validation(anyhow!("abort")))
            })
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(principal_count(&pool, "rollback@example.com").await, 0);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_times_out(pool: PgPool) {
        let policy = TransactionPolicy {
            timeout: Duration::from_millis(100),
            max_attempts: 1,
        };

        let result: Result<(), AppError> = with_transaction_policy(&pool, &policy, |conn| {
            Box::pin(async move {
                sqlx::query("INSERT INTO principals (email, password) VALUES ($1, 'x')")
                    .bind("slow@example.com")
                    .execute(&mut *conn)
                    .await?;
                sqlx::query("SELECT pg_sleep(2)").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Persistence);
        assert_eq!(principal_count(&pool, "slow@example.com").await, 0);
    }
}
