use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use rollcall_core::AppError;
use rollcall_core::errors::ErrorResponse;

use crate::modules::auth::model::MessageResponse;
use crate::modules::classrooms::model::{
    AssignTeacherDto, ClassroomDetail, ClassroomResponse, CreateClassroomDto, RemoveTeacherDto,
    UpdateStudentsDto,
};
use crate::modules::classrooms::service::ClassroomService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/classroom/create-classroom",
    request_body = CreateClassroomDto,
    responses(
        (status = 201, description = "Classroom created successfully", body = ClassroomResponse),
        (status = 400, description = "Invalid input, or teacher already assigned", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - requires Principal", body = ErrorResponse),
        (status = 404, description = "Teacher not found", body = ErrorResponse)
    ),
    tag = "Classrooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_classroom(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateClassroomDto>,
) -> Result<(StatusCode, Json<ClassroomResponse>), AppError> {
    let classroom = ClassroomService::create_classroom(&state.db, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ClassroomResponse {
            message: "Classroom created successfully".to_string(),
            classroom,
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/classroom/delete-classroom/{id}",
    params(
        ("id" = Uuid, Path, description = "Classroom ID")
    ),
    responses(
        (status = 200, description = "Classroom deleted successfully", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - requires Principal", body = ErrorResponse),
        (status = 404, description = "Classroom not found", body = ErrorResponse)
    ),
    tag = "Classrooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_classroom(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    ClassroomService::delete_classroom(&state.db, id).await?;

    Ok(Json(MessageResponse::new("Classroom deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/classroom/assign-teacher",
    request_body = AssignTeacherDto,
    responses(
        (status = 200, description = "Teacher assigned to classroom successfully", body = ClassroomResponse),
        (status = 400, description = "Not a teacher, or teacher already assigned elsewhere", body = ErrorResponse),
        (status = 404, description = "Classroom or teacher not found", body = ErrorResponse)
    ),
    tag = "Classrooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn assign_teacher(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<AssignTeacherDto>,
) -> Result<Json<ClassroomResponse>, AppError> {
    let classroom =
        ClassroomService::assign_teacher(&state.db, dto.classroom_id, dto.teacher_id).await?;

    Ok(Json(ClassroomResponse {
        message: "Teacher assigned to classroom successfully".to_string(),
        classroom,
    }))
}

#[utoipa::path(
    patch,
    path = "/classroom/remove-teacher",
    request_body = RemoveTeacherDto,
    responses(
        (status = 200, description = "Teacher removed from classroom successfully", body = ClassroomResponse),
        (status = 400, description = "No teacher assigned to this classroom", body = ErrorResponse),
        (status = 404, description = "Classroom not found", body = ErrorResponse)
    ),
    tag = "Classrooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn remove_teacher(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RemoveTeacherDto>,
) -> Result<Json<ClassroomResponse>, AppError> {
    let classroom = ClassroomService::remove_teacher(&state.db, dto.classroom_id).await?;

    Ok(Json(ClassroomResponse {
        message: "Teacher removed from classroom successfully".to_string(),
        classroom,
    }))
}

#[utoipa::path(
    put,
    path = "/classroom/update-students-inclassroom",
    request_body = UpdateStudentsDto,
    responses(
        (status = 200, description = "Classroom students updated successfully", body = ClassroomResponse),
        (status = 400, description = "One or more students are invalid or not students", body = ErrorResponse),
        (status = 404, description = "Classroom not found", body = ErrorResponse)
    ),
    tag = "Classrooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_students(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<UpdateStudentsDto>,
) -> Result<Json<ClassroomResponse>, AppError> {
    let classroom =
        ClassroomService::replace_students(&state.db, dto.classroom_id, dto.new_students).await?;

    Ok(Json(ClassroomResponse {
        message: "Classroom students updated successfully".to_string(),
        classroom,
    }))
}

#[utoipa::path(
    get,
    path = "/classroom/get-classrooms",
    responses(
        (status = 200, description = "All classrooms with members and timetables", body = Vec<ClassroomDetail>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Classrooms"
)]
#[instrument(skip(state))]
pub async fn get_classrooms(
    State(state): State<AppState>,
) -> Result<Json<Vec<ClassroomDetail>>, AppError> {
    let classrooms = ClassroomService::list_classrooms(&state.db).await?;
    Ok(Json(classrooms))
}
