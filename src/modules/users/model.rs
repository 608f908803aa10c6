//! User records, listings, and request DTOs.
//!
//! A user is either a Teacher or a Student. `classroom_id` is a derived
//! back-reference maintained by the classroom roster engine; nothing in this
//! module writes it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use rollcall_auth::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role")]
pub enum UserRole {
    Teacher,
    Student,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Teacher => f.write_str("Teacher"),
            UserRole::Student => f.write_str("Student"),
        }
    }
}

impl From<UserRole> for Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Teacher => Role::Teacher,
            UserRole::Student => Role::Student,
        }
    }
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub classroom_id: Option<Uuid>,
    pub active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Columns needed to authenticate a user.
#[derive(FromRow, Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub active: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct ClassroomSummary {
    pub id: Uuid,
    pub name: String,
}

/// A user joined with the classroom it belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserWithClassroom {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub classroom: Option<ClassroomSummary>,
    pub created_at: DateTime<Utc>,
}

#[derive(FromRow)]
pub(crate) struct UserWithClassroomRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub classroom_id: Option<Uuid>,
    pub classroom_name: Option<String>,
}

impl From<UserWithClassroomRow> for UserWithClassroom {
    fn from(row: UserWithClassroomRow) -> Self {
        let classroom = match (row.classroom_id, row.classroom_name) {
            (Some(id), Some(name)) => Some(ClassroomSummary { id, name }),
            _ => None,
        };

        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role,
            active: row.active,
            last_login: row.last_login,
            classroom,
            created_at: row.created_at,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(length(min = 3, max = 100, message = "Name must be between 3 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 4, max = 100, message = "Password must be between 4 and 100 characters"))]
    pub password: String,
    pub role: UserRole,
}

/// Partial update; absent fields are left unchanged.
#[derive(Deserialize, Debug, Clone, Default, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(length(min = 3, max = 100, message = "Name must be between 3 and 100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 4, max = 100, message = "Password must be between 4 and 100 characters"))]
    pub password: Option<String>,
    pub role: Option<UserRole>,
    pub active: Option<bool>,
}

impl UpdateUserDto {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.role.is_none()
            && self.active.is_none()
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResponse {
    pub message: String,
    pub new_user: User,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserResponse {
    pub message: String,
    pub updated_user: User,
}
