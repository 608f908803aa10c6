pub mod controller;
pub mod model;
pub mod router;
pub mod service;

pub use model::*;
pub use router::{init_users_admin_router, init_users_router, init_users_self_router};
