//! Authentication extractor and role-gating middleware.
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. [`auth::AuthUser`] verifies the token and exposes its claims
//! 3. [`role::require_principal`] / [`role::require_user`] reject tokens
//!    whose role is not allowed on the route
//!
//! ```ignore
//! let protected = init_classrooms_router()
//!     .route_layer(middleware::from_fn_with_state(state.clone(), require_principal));
//! ```

pub mod auth;
pub mod role;
