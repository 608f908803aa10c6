use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use crate::state::AppState;

use super::controller::{
    assign_teacher, create_classroom, delete_classroom, get_classrooms, remove_teacher,
    update_students,
};

/// Routes that mutate rosters; the caller layers Principal-only auth on top.
pub fn init_classrooms_router() -> Router<AppState> {
    Router::new()
        .route("/create-classroom", post(create_classroom))
        .route("/delete-classroom/{id}", delete(delete_classroom))
        .route("/assign-teacher", post(assign_teacher))
        .route("/remove-teacher", patch(remove_teacher))
        .route("/update-students-inclassroom", put(update_students))
}

pub fn init_public_classrooms_router() -> Router<AppState> {
    Router::new().route("/get-classrooms", get(get_classrooms))
}
