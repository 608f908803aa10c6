//! Session token creation and verification.
//!
//! Tokens are HS256-signed and expire after [`JwtConfig::token_expiry`]
//! seconds. Verification failures of any kind (bad signature, expired,
//! malformed) surface as the same 401 error.

use anyhow::{Context, anyhow};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use rollcall_config::JwtConfig;
use rollcall_core::AppError;

use crate::claims::Claims;
use crate::role::Role;

pub fn create_access_token(
    id: Uuid,
    email: &str,
    role: Role,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.token_expiry.max(0) as usize;

    let claims = Claims {
        id,
        email: email.to_string(),
        role,
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .context("Failed to create token")
    .map_err(AppError::internal)
}

pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized(anyhow!("Invalid or expired token")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::Algorithm;
    use rollcall_core::ErrorKind;

    fn get_test_jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            token_expiry: 3600,
        }
    }

    #[test]
    fn test_create_and_verify_token() {
        let config = get_test_jwt_config();
        let id = Uuid::new_v4();

        let token = create_access_token(id, "student@example.com", Role::Student, &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();

        assert_eq!(claims.id, id);
        assert_eq!(claims.email, "student@example.com");
        assert_eq!(claims.role, Role::Student);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_token_is_hs256() {
        let config = get_test_jwt_config();
        let token =
            create_access_token(Uuid::new_v4(), "p@example.com", Role::Principal, &config).unwrap();

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
    }

    #[test]
    fn test_verify_token_invalid() {
        let config = get_test_jwt_config();
        let err = verify_token("invalid-token", &config).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
        assert_eq!(err.public_message(), "Invalid or expired token");
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let config = get_test_jwt_config();
        let token =
            create_access_token(Uuid::new_v4(), "t@example.com", Role::Teacher, &config).unwrap();

        let wrong_config = JwtConfig {
            secret: "different-secret-key-at-least-32-characters".to_string(),
            token_expiry: 3600,
        };

        assert!(verify_token(&token, &wrong_config).is_err());
    }

    #[test]
    fn test_verify_token_expired() {
        let config = get_test_jwt_config();
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            id: Uuid::new_v4(),
            email: "old@example.com".to_string(),
            role: Role::Teacher,
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert!(verify_token(&token, &config).is_err());
    }
}
