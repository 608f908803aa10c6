//! Application error taxonomy.
//!
//! Every fallible operation in the API returns [`AppError`], which pairs an
//! [`ErrorKind`] with the HTTP status sent to the client and the underlying
//! [`anyhow::Error`]. Kinds map to default statuses; call sites that need a
//! different status for the same kind use [`AppError::with_status`].
//!
//! # Response Body
//!
//! ```json
//! { "message": "Classroom not found" }
//! ```
//!
//! When detailed errors are enabled (non-production environments), a `detail`
//! field carries the full error chain. Persistence and internal errors never
//! leak driver messages through `message`.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::ValidationErrors;

static EXPOSE_ERROR_DETAILS: AtomicBool = AtomicBool::new(false);

/// Enables or disables the `detail` field on error responses.
pub fn set_expose_error_details(enabled: bool) {
    EXPOSE_ERROR_DETAILS.store(enabled, Ordering::Relaxed);
}

pub fn expose_error_details() -> bool {
    EXPOSE_ERROR_DETAILS.load(Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or missing input.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// The request would violate an invariant.
    Conflict,
    /// Bad credentials or token.
    Authentication,
    /// Valid token, wrong role.
    Authorization,
    /// Transaction abort, timeout, or connection failure.
    Persistence,
    Internal,
}

impl ErrorKind {
    pub fn default_status(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::Persistence | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_server_side(self) -> bool {
        matches!(self, ErrorKind::Persistence | ErrorKind::Internal)
    }
}

/// Body returned for every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub kind: ErrorKind,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(kind: ErrorKind, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status: kind.default_status(),
            kind,
            error: err.into(),
        }
    }

    /// Overrides the HTTP status while keeping the error kind.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn validation<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::Validation, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::validation(err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::NotFound, err)
    }

    pub fn conflict<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::Conflict, err)
    }

    pub fn unauthorized<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::Authentication, err)
    }

    pub fn forbidden<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::Authorization, err)
    }

    pub fn database<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::Persistence, err)
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::Internal, err)
    }

    /// Message shown to the client.
    ///
    /// Server-side kinds expose only the outermost context attached by the
    /// service layer (e.g. "Failed to assign teacher"), never the driver text.
    pub fn public_message(&self) -> String {
        if !self.kind.is_server_side() {
            return self.error.to_string();
        }

        if self.error.chain().count() > 1 {
            self.error.to_string()
        } else {
            "Internal server error".to_string()
        }
    }

    /// Returns the underlying database error, if any.
    pub fn as_sqlx(&self) -> Option<&sqlx::Error> {
        self.error.downcast_ref::<sqlx::Error>()
    }
}

pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect();
    messages.sort();
    messages.join(", ")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.kind.is_server_side() {
            tracing::error!(kind = ?self.kind, error = %format!("{:#}", self.error), "Request failed");
        }

        let body = ErrorResponse {
            message: self.public_message(),
            detail: expose_error_details().then(|| format!("{:#}", self.error)),
        };

        (self.status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        let error: Error = err.into();

        if let Some(validation) = error.downcast_ref::<ValidationErrors>() {
            let message = format_validation_errors(validation);
            return AppError::validation(anyhow::anyhow!(message));
        }

        if error.downcast_ref::<sqlx::Error>().is_some() {
            return AppError::database(error);
        }

        AppError::internal(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, anyhow};
    use validator::Validate;

    #[derive(Validate)]
    struct Named {
        #[validate(length(min = 1, message = "name is required"))]
        name: String,
    }

    #[test]
    fn test_default_statuses() {
        assert_eq!(
            AppError::validation(anyhow!("x")).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::not_found(anyhow!("x")).status, StatusCode::NOT_FOUND);
        assert_eq!(AppError::conflict(anyhow!("x")).status, StatusCode::CONFLICT);
        assert_eq!(
            AppError::unauthorized(anyhow!("x")).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::forbidden(anyhow!("x")).status, StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::database(anyhow!("x")).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_with_status_keeps_kind() {
        let err = AppError::conflict(anyhow!("No teacher assigned to this classroom"))
            .with_status(StatusCode::BAD_REQUEST);

        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_sqlx_error_is_persistence() {
        let err = AppError::from(sqlx::Error::RowNotFound);

        assert_eq!(err.kind, ErrorKind::Persistence);
        assert!(err.as_sqlx().is_some());
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_validation_errors_are_validation_kind() {
        let errors = Named {
            name: String::new(),
        }
        .validate()
        .unwrap_err();

        let err = AppError::from(errors);

        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "name is required");
    }

    #[test]
    fn test_public_message_uses_outer_context() {
        let source: Result<(), sqlx::Error> = Err(sqlx::Error::PoolTimedOut);
        let err = source
            .context("Failed to assign teacher")
            .map_err(AppError::database)
            .unwrap_err();

        assert_eq!(err.public_message(), "Failed to assign teacher");
        assert!(err.as_sqlx().is_some());
    }

    #[test]
    fn test_client_errors_expose_their_message() {
        let err = AppError::not_found(anyhow!("Classroom not found"));
        assert_eq!(err.public_message(), "Classroom not found");
    }

    #[test]
    fn test_unknown_errors_are_internal() {
        let err = AppError::from(std::io::Error::other("disk on fire"));
        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(err.public_message(), "Internal server error");
    }
}
