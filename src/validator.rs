use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use rollcall_core::AppError;
use rollcall_core::errors::format_validation_errors;

/// JSON body extractor that runs `validator` rules after deserializing.
///
/// Every failure, whether malformed JSON or a rule violation, is a 400
/// validation error naming the offending field.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    let error_msg = rejection.body_text();

    if let Some(field) = extract_between(&error_msg, "missing field `", "`") {
        return AppError::validation(anyhow!("{} is required", field));
    }

    if let Some(variant) = extract_between(&error_msg, "unknown variant `", "`") {
        return AppError::validation(anyhow!("{} is not an accepted value", variant));
    }

    if error_msg.contains("invalid type") || error_msg.contains("invalid length") {
        return AppError::validation(anyhow!("Invalid field type in request"));
    }

    if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
        return AppError::validation(anyhow!(
            "Missing 'Content-Type: application/json' header"
        ));
    }

    AppError::validation(anyhow!("Invalid request body"))
}

fn extract_between<'a>(text: &'a str, start: &str, end: &str) -> Option<&'a str> {
    text.split(start).nth(1)?.split(end).next()
}

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;

        value
            .validate()
            .map_err(|errors| AppError::validation(anyhow!(format_validation_errors(&errors))))?;

        Ok(ValidatedJson(value))
    }
}
