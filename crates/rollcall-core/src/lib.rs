//! # Rollcall Core
//!
//! Core types, errors, and utilities for the Rollcall API.
//!
//! - [`errors`]: Application error taxonomy with HTTP response conversion
//! - [`password`]: Password hashing and verification
//! - [`schedule`]: Weekday and time-of-day value types shared by classrooms and timetables
//!
//! # Example
//!
//! ```ignore
//! use rollcall_core::errors::AppError;
//! use rollcall_core::password::{hash_password, verify_password};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Classroom not found"));
//! let hash = hash_password("secure_password")?;
//! ```

pub mod errors;
pub mod password;
pub mod schedule;

pub use errors::{AppError, ErrorKind};
pub use password::{hash_password, verify_password};
pub use schedule::{Weekday, is_valid_time_of_day};
