use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use rollcall_core::AppError;
use rollcall_core::errors::ErrorResponse;

use crate::middleware::auth::AuthUser;
use crate::modules::auth::model::MessageResponse;
use crate::modules::users::model::{
    CreateUserDto, CreateUserResponse, UpdateUserDto, UpdateUserResponse, UserWithClassroom,
};
use crate::modules::users::service::{UserListing, UserService};
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/user/create-user",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created", body = CreateUserResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "User already exists", body = ErrorResponse)
    ),
    tag = "Users"
)]
#[instrument(skip(state, dto), fields(email = %dto.email))]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateUserDto>,
) -> Result<(StatusCode, Json<CreateUserResponse>), AppError> {
    let new_user = UserService::create_user(&state.db, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            message: "creating user successful".to_string(),
            new_user,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/user/update-user/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User updated successfully", body = UpdateUserResponse),
        (status = 400, description = "No data provided to update", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email in use, or role change of an assigned user", body = ErrorResponse)
    ),
    tag = "Users"
)]
#[instrument(skip(state, dto))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateUserDto>,
) -> Result<Json<UpdateUserResponse>, AppError> {
    let updated_user = UserService::update_user(&state.db, id, dto).await?;

    Ok(Json(UpdateUserResponse {
        message: "User updated successfully".to_string(),
        updated_user,
    }))
}

#[utoipa::path(
    delete,
    path = "/user/delete-user/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted successfully", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - requires Principal", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    UserService::delete_user(&state.db, id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/user/get-students",
    responses((status = 200, description = "All students", body = Vec<UserWithClassroom>)),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_students(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserWithClassroom>>, AppError> {
    Ok(Json(UserService::list_users(&state.db, UserListing::Students).await?))
}

#[utoipa::path(
    get,
    path = "/user/get-teachers",
    responses((status = 200, description = "All teachers", body = Vec<UserWithClassroom>)),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_teachers(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserWithClassroom>>, AppError> {
    Ok(Json(UserService::list_users(&state.db, UserListing::Teachers).await?))
}

#[utoipa::path(
    get,
    path = "/user/available-students",
    responses((status = 200, description = "Students in no classroom", body = Vec<UserWithClassroom>)),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_available_students(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserWithClassroom>>, AppError> {
    Ok(Json(
        UserService::list_users(&state.db, UserListing::AvailableStudents).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/user/available-teachers",
    responses((status = 200, description = "Teachers leading no classroom", body = Vec<UserWithClassroom>)),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_available_teachers(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserWithClassroom>>, AppError> {
    Ok(Json(
        UserService::list_users(&state.db, UserListing::AvailableTeachers).await?,
    ))
}

/// Profile of the calling teacher or student.
#[utoipa::path(
    get,
    path = "/user/profile",
    responses(
        (status = 200, description = "User profile", body = UserWithClassroom),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Principal tokens have no user profile", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn get_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<UserWithClassroom>, AppError> {
    let profile = UserService::get_profile(&state.db, auth_user.id()).await?;
    Ok(Json(profile))
}
