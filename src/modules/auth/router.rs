use axum::{Router, routing::post};

use crate::state::AppState;

use super::controller::{principal_login, user_login};

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/user-login", post(user_login))
        .route("/principal-login", post(principal_login))
}
