//! Account seeding.

mod principal;

pub use principal::{SeedOutcome, create_principal, seed_principal};
