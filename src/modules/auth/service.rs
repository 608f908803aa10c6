//! Credential checks for the two identity classes.
//!
//! Unknown emails, wrong passwords, and deactivated users all fail with the
//! same 403 message, and unknown emails still pay for one bcrypt verify.

use anyhow::anyhow;
use axum::http::StatusCode;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use rollcall_auth::{Role, create_access_token};
use rollcall_config::JwtConfig;
use rollcall_core::password::verify_against_dummy;
use rollcall_core::{AppError, verify_password};

use crate::metrics::track_login;
use crate::modules::auth::model::{LoginRequest, LoginResponse};
use crate::modules::users::model::UserCredentials;

fn auth_failed() -> AppError {
    AppError::unauthorized(anyhow!("Auth failed, email or password is wrong"))
        .with_status(StatusCode::FORBIDDEN)
}

#[derive(sqlx::FromRow)]
struct PrincipalCredentials {
    id: Uuid,
    email: String,
    password: String,
}

pub struct AuthService;

impl AuthService {
    #[instrument(skip(db, dto, jwt_config), fields(email = %dto.email))]
    pub async fn login_user(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let email = dto.email.trim().to_lowercase();

        let user = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, name, email, password, role, active FROM users WHERE email = $1",
        )
        .bind(&email)
        .fetch_optional(db)
        .await?;

        let Some(user) = user else {
            verify_against_dummy(&dto.password);
            track_login("user", false);
            return Err(auth_failed());
        };

        if !verify_password(&dto.password, &user.password)? || !user.active {
            warn!(user_id = %user.id, active = user.active, "User login rejected");
            track_login("user", false);
            return Err(auth_failed());
        }

        let role = Role::from(user.role);
        let jwt_token = create_access_token(user.id, &user.email, role, jwt_config)?;

        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(user.id)
            .execute(db)
            .await?;

        track_login("user", true);
        info!(user_id = %user.id, %role, "User logged in");

        Ok(LoginResponse {
            message: "Login successful".to_string(),
            jwt_token,
            email: user.email,
            name: Some(user.name),
            role,
        })
    }

    #[instrument(skip(db, dto, jwt_config), fields(email = %dto.email))]
    pub async fn login_principal(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let email = dto.email.trim().to_lowercase();

        let principal = sqlx::query_as::<_, PrincipalCredentials>(
            "SELECT id, email, password FROM principals WHERE email = $1",
        )
        .bind(&email)
        .fetch_optional(db)
        .await?;

        let Some(principal) = principal else {
            verify_against_dummy(&dto.password);
            track_login("principal", false);
            return Err(auth_failed());
        };

        if !verify_password(&dto.password, &principal.password)? {
            track_login("principal", false);
            return Err(auth_failed());
        }

        let jwt_token =
            create_access_token(principal.id, &principal.email, Role::Principal, jwt_config)?;

        track_login("principal", true);
        info!(principal_id = %principal.id, "Principal logged in");

        Ok(LoginResponse {
            message: "Login successful".to_string(),
            jwt_token,
            email: principal.email,
            name: None,
            role: Role::Principal,
        })
    }
}
