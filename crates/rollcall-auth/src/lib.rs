//! # Rollcall Auth
//!
//! Authentication types and JWT utilities for the Rollcall API.
//!
//! - [`claims`]: The [`Claims`] carried by every session token
//! - [`role`]: The [`Role`] enum and the pure [`is_authorized`] check
//! - [`jwt`]: Token creation and verification
//!
//! # Example
//!
//! ```ignore
//! use rollcall_auth::{Role, create_access_token, is_authorized, verify_token};
//! use rollcall_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, "teacher@example.com", Role::Teacher, &config)?;
//!
//! let claims = verify_token(&token, &config)?;
//! assert!(is_authorized(claims.role, &[Role::Teacher, Role::Student]));
//! ```

pub mod claims;
pub mod jwt;
pub mod role;

pub use claims::Claims;
pub use jwt::{create_access_token, verify_token};
pub use role::{Role, is_authorized};
