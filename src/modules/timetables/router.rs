use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{create_timetable, get_timetable, update_timetable};

pub fn init_timetables_router() -> Router<AppState> {
    Router::new()
        .route("/create-timetable", post(create_timetable))
        .route("/update-timetable", patch(update_timetable))
        .route("/get-timetable/{classroom_id}", get(get_timetable))
}
