use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

use super::controller::{
    create_user, delete_user, get_available_students, get_available_teachers, get_profile,
    get_students, get_teachers, update_user,
};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/create-user", post(create_user))
        .route("/update-user/{id}", put(update_user))
        .route("/get-students", get(get_students))
        .route("/get-teachers", get(get_teachers))
        .route("/available-students", get(get_available_students))
        .route("/available-teachers", get(get_available_teachers))
}

/// Principal-only user administration.
pub fn init_users_admin_router() -> Router<AppState> {
    Router::new().route("/delete-user/{id}", delete(delete_user))
}

/// Routes for a signed-in teacher or student.
pub fn init_users_self_router() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile))
}
