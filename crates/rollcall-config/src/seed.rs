use std::env;

/// Credentials of the principal account seeded at startup.
#[derive(Clone, Debug)]
pub struct SeedConfig {
    pub principal_email: String,
    pub principal_password: String,
}

impl SeedConfig {
    pub fn from_env() -> Self {
        Self {
            principal_email: env::var("PRINCIPAL_EMAIL")
                .unwrap_or_else(|_| "principal@classroom.com".to_string())
                .to_lowercase(),
            principal_password: env::var("PRINCIPAL_PASSWORD")
                .unwrap_or_else(|_| "Admin".to_string()),
        }
    }
}
