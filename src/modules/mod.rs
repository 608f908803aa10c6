//! Feature modules. Each has `controller`, `model`, `router`, and `service`.

pub mod auth;
pub mod classrooms;
pub mod timetables;
pub mod users;
