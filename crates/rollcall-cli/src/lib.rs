//! # Rollcall CLI
//!
//! Principal account provisioning for Rollcall.
//!
//! The same seeding routine runs at API startup and from the `rollcall-cli`
//! binary.
//!
//! ```ignore
//! use rollcall_cli::seeder::seed_principal;
//! use rollcall_config::SeedConfig;
//!
//! seed_principal(&pool, &SeedConfig::from_env()).await?;
//! ```

pub mod seeder;
