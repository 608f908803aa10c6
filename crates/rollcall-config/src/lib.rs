//! # Rollcall Config
//!
//! Configuration types for the Rollcall API, loaded from environment
//! variables with development-friendly defaults:
//!
//! - [`jwt`]: Token signing secret and lifetime
//! - [`cors`]: Allowed origins
//! - [`server`]: Bind address, port, and runtime environment
//! - [`seed`]: The principal account created at startup
//!
//! # Example
//!
//! ```ignore
//! use rollcall_config::{JwtConfig, ServerConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let server_config = ServerConfig::from_env();
//! ```

pub mod cors;
pub mod jwt;
pub mod seed;
pub mod server;

pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use seed::SeedConfig;
pub use server::{Environment, ServerConfig};
