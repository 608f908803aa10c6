use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use rollcall_core::AppError;
use rollcall_core::errors::ErrorResponse;

use crate::modules::timetables::model::{Timetable, TimetableRequest, TimetablesResponse};
use crate::modules::timetables::service::TimetableService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/timetable/create-timetable",
    request_body = TimetableRequest,
    responses(
        (status = 201, description = "Timetable saved successfully", body = TimetablesResponse),
        (status = 400, description = "Duplicate days or malformed periods", body = ErrorResponse),
        (status = 404, description = "Classroom not found", body = ErrorResponse)
    ),
    tag = "Timetables"
)]
#[instrument(skip(state))]
pub async fn create_timetable(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<TimetableRequest>,
) -> Result<(StatusCode, Json<TimetablesResponse>), AppError> {
    let timetables = TimetableService::replace_timetable(&state.db, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(TimetablesResponse {
            message: "Timetable saved successfully".to_string(),
            timetables,
        }),
    ))
}

#[utoipa::path(
    patch,
    path = "/timetable/update-timetable",
    request_body = TimetableRequest,
    responses(
        (status = 200, description = "Timetable updated successfully", body = TimetablesResponse),
        (status = 400, description = "Duplicate days or malformed periods", body = ErrorResponse),
        (status = 404, description = "Classroom not found", body = ErrorResponse)
    ),
    tag = "Timetables"
)]
#[instrument(skip(state))]
pub async fn update_timetable(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<TimetableRequest>,
) -> Result<Json<TimetablesResponse>, AppError> {
    let timetables = TimetableService::patch_timetable(&state.db, dto).await?;

    Ok(Json(TimetablesResponse {
        message: "Timetable updated successfully".to_string(),
        timetables,
    }))
}

#[utoipa::path(
    get,
    path = "/timetable/get-timetable/{classroom_id}",
    params(
        ("classroom_id" = Uuid, Path, description = "Classroom ID")
    ),
    responses(
        (status = 200, description = "Timetables of the classroom", body = Vec<Timetable>),
        (status = 404, description = "Classroom not found", body = ErrorResponse)
    ),
    tag = "Timetables"
)]
#[instrument(skip(state))]
pub async fn get_timetable(
    State(state): State<AppState>,
    Path(classroom_id): Path<Uuid>,
) -> Result<Json<Vec<Timetable>>, AppError> {
    let timetables = TimetableService::get_timetable(&state.db, classroom_id).await?;
    Ok(Json(timetables))
}
