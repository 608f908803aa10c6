//! Principal account seeding.
//!
//! Principal emails are stored lowercase, so `Admin@School.com` and
//! `admin@school.com` name the same account.

use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use rollcall_config::SeedConfig;
use rollcall_core::{AppError, hash_password};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Created(Uuid),
    AlreadyExists,
}

/// Ensures the configured principal exists. Running it again is a no-op.
#[instrument(skip(db, config), fields(email = %config.principal_email))]
pub async fn seed_principal(db: &PgPool, config: &SeedConfig) -> Result<SeedOutcome, AppError> {
    let email = config.principal_email.trim().to_lowercase();
    let password_hash = hash_password(&config.principal_password)?;

    let created: Option<Uuid> = sqlx::query_scalar(
        r#"
        INSERT INTO principals (email, password)
        VALUES ($1, $2)
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(&email)
    .bind(&password_hash)
    .fetch_optional(db)
    .await?;

    match created {
        Some(id) => {
            info!(principal_id = %id, "Principal account created");
            Ok(SeedOutcome::Created(id))
        }
        None => {
            info!("Principal account already exists");
            Ok(SeedOutcome::AlreadyExists)
        }
    }
}

/// Creates a principal, failing if the email is taken.
#[instrument(skip(db, password))]
pub async fn create_principal(db: &PgPool, email: &str, password: &str) -> Result<Uuid, AppError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::validation(anyhow!("A valid email is required")));
    }
    if password.len() < 4 {
        return Err(AppError::validation(anyhow!(
            "Password must be at least 4 characters"
        )));
    }

    let password_hash = hash_password(password)?;

    sqlx::query_scalar("INSERT INTO principals (email, password) VALUES ($1, $2) RETURNING id")
        .bind(&email)
        .bind(&password_hash)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::conflict(anyhow!("Principal with email {} already exists", email));
            }
            AppError::from(e)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_core::{ErrorKind, verify_password};

    fn config(email: &str) -> SeedConfig {
        SeedConfig {
            principal_email: email.to_string(),
            principal_password: "Admin".to_string(),
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_seed_principal_is_idempotent(pool: PgPool) {
        let first = seed_principal(&pool, &config("Principal@Classroom.com"))
            .await
            .unwrap();
        let second = seed_principal(&pool, &config("principal@classroom.com"))
            .await
            .unwrap();

        assert!(matches!(first, SeedOutcome::Created(_)));
        assert_eq!(second, SeedOutcome::AlreadyExists);

        let (email, hash): (String, String) =
            sqlx::query_as("SELECT email, password FROM principals")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(email, "principal@classroom.com");
        assert!(verify_password("Admin", &hash).unwrap());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_create_principal_rejects_duplicate(pool: PgPool) {
        create_principal(&pool, "head@school.com", "secret")
            .await
            .unwrap();

        let err = create_principal(&pool, "HEAD@school.com", "secret")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_create_principal_validates_input(pool: PgPool) {
        let err = create_principal(&pool, "not-an-email", "secret")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = create_principal(&pool, "ok@school.com", "abc")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
