use anyhow::{Context, anyhow};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

use rollcall_core::{AppError, hash_password};
use rollcall_db::{unique_violation, with_transaction};

use crate::metrics::track_user_created;
use crate::modules::classrooms::roster;
use crate::modules::users::model::{
    CreateUserDto, UpdateUserDto, User, UserWithClassroom, UserWithClassroomRow,
};

const USER_COLUMNS: &str =
    "id, name, email, role, classroom_id, active, last_login, created_at, updated_at";

const USER_WITH_CLASSROOM_SELECT: &str = r#"
    SELECT u.id, u.name, u.email, u.role, u.active, u.last_login, u.created_at,
           c.id AS classroom_id, c.name AS classroom_name
    FROM users u
    LEFT JOIN classrooms c ON c.id = u.classroom_id
"#;

/// Which slice of users a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserListing {
    Students,
    Teachers,
    AvailableStudents,
    AvailableTeachers,
}

impl UserListing {
    fn filter(self) -> &'static str {
        match self {
            UserListing::Students => "WHERE u.role = 'Student'",
            UserListing::Teachers => "WHERE u.role = 'Teacher'",
            UserListing::AvailableStudents => {
                r#"WHERE u.role = 'Student'
                   AND NOT EXISTS (SELECT 1 FROM classroom_students cs WHERE cs.student_id = u.id)"#
            }
            UserListing::AvailableTeachers => {
                r#"WHERE u.role = 'Teacher'
                   AND NOT EXISTS (SELECT 1 FROM classrooms c2 WHERE c2.teacher_id = u.id)"#
            }
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn email_conflict(err: AppError) -> AppError {
    if unique_violation(&err).is_some() {
        return AppError::conflict(anyhow!("Email is already in use"));
    }
    err
}

pub struct UserService;

impl UserService {
    #[instrument(skip(db, dto), fields(email = %dto.email, role = %dto.role))]
    pub async fn create_user(db: &PgPool, dto: CreateUserDto) -> Result<User, AppError> {
        let email = normalize_email(&dto.email);

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(&email)
            .fetch_one(db)
            .await?;
        if exists {
            return Err(AppError::conflict(anyhow!("User already exists, you can login")));
        }

        let password_hash = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users (name, email, password, role)
               VALUES ($1, $2, $3, $4)
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(dto.name.trim())
        .bind(&email)
        .bind(&password_hash)
        .bind(dto.role)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::conflict(anyhow!("User already exists, you can login"));
            }
            AppError::from(e)
        })?;

        track_user_created(&user.role.to_string());
        info!(user_id = %user.id, "User created");

        Ok(user)
    }

    #[instrument(skip(db, dto), fields(%user_id))]
    pub async fn update_user(
        db: &PgPool,
        user_id: Uuid,
        dto: UpdateUserDto,
    ) -> Result<User, AppError> {
        if dto.is_empty() {
            return Err(AppError::validation(anyhow!("No data provided to update")));
        }

        let UpdateUserDto {
            name,
            email,
            password,
            role,
            active,
        } = dto;
        let dto = UpdateUserDto {
            name: name.map(|n| n.trim().to_string()),
            email: email.as_deref().map(normalize_email),
            password: password.as_deref().map(hash_password).transpose()?,
            role,
            active,
        };

        let user: User = with_transaction(db, move |conn| {
            let dto = dto.clone();
            Box::pin(async move { Self::update_user_tx(conn, user_id, dto).await })
        })
        .await?;

        info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    /// `dto.password` already holds the new hash.
    async fn update_user_tx(
        conn: &mut PgConnection,
        user_id: Uuid,
        dto: UpdateUserDto,
    ) -> Result<User, AppError> {
        let member = roster::lock_member(conn, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;

        if let Some(role) = dto.role
            && role != member.role
            && member.classroom_id.is_some()
        {
            return Err(AppError::conflict(anyhow!(
                "Cannot change the role of a user assigned to a classroom"
            )));
        }

        sqlx::query_as::<_, User>(&format!(
            r#"UPDATE users SET
                   name = COALESCE($2, name),
                   email = COALESCE($3, email),
                   password = COALESCE($4, password),
                   role = COALESCE($5, role),
                   active = COALESCE($6, active),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(user_id)
        .bind(dto.name)
        .bind(dto.email)
        .bind(dto.password)
        .bind(dto.role)
        .bind(dto.active)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| email_conflict(AppError::from(e)))
    }

    /// Deletes a user after detaching it from its classroom.
    #[instrument(skip(db))]
    pub async fn delete_user(db: &PgPool, user_id: Uuid) -> Result<(), AppError> {
        with_transaction(db, move |conn| {
            Box::pin(async move {
                let member = roster::lock_member_with_classroom(conn, user_id)
                    .await?
                    .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;

                roster::detach_member(conn, &member).await?;

                sqlx::query("DELETE FROM users WHERE id = $1")
                    .bind(user_id)
                    .execute(&mut *conn)
                    .await
                    .context("Failed to delete user")
                    .map_err(AppError::database)?;

                Ok(())
            })
        })
        .await?;

        info!(%user_id, "User deleted");
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn list_users(
        db: &PgPool,
        listing: UserListing,
    ) -> Result<Vec<UserWithClassroom>, AppError> {
        let rows = sqlx::query_as::<_, UserWithClassroomRow>(&format!(
            "{USER_WITH_CLASSROOM_SELECT} {} ORDER BY u.name, u.id",
            listing.filter()
        ))
        .fetch_all(db)
        .await?;

        Ok(rows.into_iter().map(UserWithClassroom::from).collect())
    }

    #[instrument(skip(db))]
    pub async fn get_profile(db: &PgPool, user_id: Uuid) -> Result<UserWithClassroom, AppError> {
        let row = sqlx::query_as::<_, UserWithClassroomRow>(&format!(
            "{USER_WITH_CLASSROOM_SELECT} WHERE u.id = $1"
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;

        Ok(row.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::users::model::UserRole;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn test_listing_filters_by_role() {
        assert!(UserListing::Students.filter().contains("'Student'"));
        assert!(UserListing::AvailableTeachers.filter().contains("teacher_id"));
        assert!(UserListing::AvailableStudents.filter().contains("classroom_students"));
    }

    #[test]
    fn test_non_database_errors_pass_through_email_conflict() {
        let err = email_conflict(AppError::not_found(anyhow!("User not found")));
        assert_eq!(err.kind, rollcall_core::ErrorKind::NotFound);
    }

    #[test]
    fn test_role_display_matches_enum_label() {
        assert_eq!(UserRole::Student.to_string(), "Student");
    }
}
