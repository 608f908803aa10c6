//! Password hashing and verification using bcrypt.
//!
//! bcrypt salts every hash and compares in constant time, so the same
//! password hashes differently on each call.

use std::sync::OnceLock;

use anyhow::anyhow;
use bcrypt::{DEFAULT_COST, hash, verify};

use crate::errors::AppError;

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::internal(anyhow!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::internal(anyhow!("Failed to verify password: {}", e)))
}

/// Runs a verification against a fixed hash so that lookups for unknown
/// accounts cost the same as a wrong password.
pub fn verify_against_dummy(password: &str) {
    let dummy = DUMMY_HASH.get_or_init(|| {
        hash("rollcall-dummy-password", DEFAULT_COST).unwrap_or_default()
    });

    if !dummy.is_empty() {
        let _ = verify(password, dummy);
    }
}
