pub mod controller;
pub mod model;
pub(crate) mod roster;
pub mod router;
pub mod service;

pub use model::*;
pub use router::{init_classrooms_router, init_public_classrooms_router};
