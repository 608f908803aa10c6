#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use rollcall::router::init_router;
use rollcall::state::AppState;
use rollcall_auth::{Role, create_access_token};
use rollcall_config::{CorsConfig, JwtConfig};
use rollcall_core::hash_password;

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub password: String,
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret".to_string(),
        token_expiry: 3600,
    }
}

pub fn setup_test_app(pool: PgPool) -> axum::Router {
    let state = AppState {
        db: pool,
        jwt_config: test_jwt_config(),
        cors_config: CorsConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
    };
    init_router(state)
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

/// Inserts a user directly; `role` is `Teacher` or `Student`.
pub async fn create_test_user(pool: &PgPool, name: &str, role: &str) -> TestUser {
    let email = generate_unique_email();
    let password = "testpass123".to_string();
    let hashed = hash_password(&password).unwrap();

    let id: Uuid = sqlx::query_scalar(
        r#"INSERT INTO users (name, email, password, role)
           VALUES ($1, $2, $3, $4::user_role)
           RETURNING id"#,
    )
    .bind(name)
    .bind(&email)
    .bind(&hashed)
    .bind(role)
    .fetch_one(pool)
    .await
    .unwrap();

    TestUser {
        id,
        email,
        password,
    }
}

pub async fn create_test_principal(pool: &PgPool) -> TestUser {
    let email = generate_unique_email();
    let password = "principalpass".to_string();
    let hashed = hash_password(&password).unwrap();

    let id: Uuid =
        sqlx::query_scalar("INSERT INTO principals (email, password) VALUES ($1, $2) RETURNING id")
            .bind(&email)
            .bind(&hashed)
            .fetch_one(pool)
            .await
            .unwrap();

    TestUser {
        id,
        email,
        password,
    }
}

pub fn token_for(id: Uuid, email: &str, role: Role) -> String {
    create_access_token(id, email, role, &test_jwt_config()).unwrap()
}

pub fn principal_token() -> String {
    token_for(Uuid::new_v4(), "principal@test.com", Role::Principal)
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn read_json(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Sends one request and returns the status with the parsed body.
pub async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, read_json(response).await)
}

/// The classroom id stored on a user row.
pub async fn classroom_of(pool: &PgPool, user_id: Uuid) -> Option<Uuid> {
    sqlx::query_scalar("SELECT classroom_id FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn roster_of(pool: &PgPool, classroom_id: Uuid) -> Vec<Uuid> {
    sqlx::query_scalar(
        "SELECT student_id FROM classroom_students WHERE classroom_id = $1 ORDER BY position",
    )
    .bind(classroom_id)
    .fetch_all(pool)
    .await
    .unwrap()
}

pub fn id_of(value: &Value) -> Uuid {
    value.as_str().unwrap().parse().unwrap()
}
