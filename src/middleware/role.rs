//! Role-gating middleware for `axum::middleware::from_fn_with_state`.

use anyhow::anyhow;
use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use rollcall_auth::{Role, is_authorized};
use rollcall_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Verifies the caller's token and checks its role against `allowed_roles`.
///
/// Missing or invalid tokens yield 401, a disallowed role 403.
pub async fn require_roles(
    state: &AppState,
    req: Request,
    next: Next,
    allowed_roles: &[Role],
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let auth_user = AuthUser::from_request_parts(&mut parts, state).await?;

    if !is_authorized(auth_user.role(), allowed_roles) {
        tracing::debug!(role = %auth_user.role(), ?allowed_roles, "Role not permitted");
        return Err(AppError::forbidden(anyhow!("Insufficient permissions")));
    }

    parts.extensions.insert(auth_user);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Principal-only routes.
pub async fn require_principal(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_roles(&state, req, next, &[Role::Principal])
        .await
        .unwrap_or_else(IntoResponse::into_response)
}

/// Routes for Teacher or Student tokens.
pub async fn require_user(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_roles(&state, req, next, &[Role::Teacher, Role::Student])
        .await
        .unwrap_or_else(IntoResponse::into_response)
}
