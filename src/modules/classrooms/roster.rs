//! Roster consistency engine.
//!
//! Classroom membership lives in `classrooms.teacher_id` and
//! `classroom_students`; `users.classroom_id` mirrors it. Every write to any
//! of those three goes through this module, always on a connection owned by
//! [`rollcall_db::with_transaction`], so both sides change together or not
//! at all.
//!
//! Locking order is classroom row first, then user rows in id order.

use std::collections::HashSet;

use anyhow::anyhow;
use axum::http::StatusCode;
use sqlx::PgConnection;
use uuid::Uuid;

use rollcall_core::AppError;
use rollcall_db::unique_violation;

use crate::modules::classrooms::model::ClassroomRow;
use crate::modules::users::model::UserRole;

pub(crate) const TEACHER_UNIQUE_INDEX: &str = "classrooms_teacher_id_key";
pub(crate) const STUDENT_UNIQUE_INDEX: &str = "classroom_students_student_id_key";

/// The membership-relevant columns of a locked user row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct Member {
    pub id: Uuid,
    pub role: UserRole,
    pub classroom_id: Option<Uuid>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct RosterDiff {
    pub additions: Vec<Uuid>,
    pub removals: Vec<Uuid>,
}

/// Removes repeated ids, keeping the first occurrence.
pub(crate) fn dedup_preserving_order(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

pub(crate) fn diff_roster(current: &[Uuid], next: &[Uuid]) -> RosterDiff {
    let current_set: HashSet<&Uuid> = current.iter().collect();
    let next_set: HashSet<&Uuid> = next.iter().collect();

    RosterDiff {
        additions: next
            .iter()
            .filter(|id| !current_set.contains(id))
            .copied()
            .collect(),
        removals: current
            .iter()
            .filter(|id| !next_set.contains(id))
            .copied()
            .collect(),
    }
}

/// A membership conflict: 400 like the rest of the roster errors.
pub(crate) fn roster_conflict(message: &'static str) -> AppError {
    AppError::conflict(anyhow!(message)).with_status(StatusCode::BAD_REQUEST)
}

/// Maps unique-index violations raised by membership writes to conflicts.
pub(crate) fn map_membership_violation(err: AppError) -> AppError {
    match unique_violation(&err) {
        Some(TEACHER_UNIQUE_INDEX) => {
            roster_conflict("Teacher is already assigned to another classroom")
        }
        Some(STUDENT_UNIQUE_INDEX) => roster_conflict("Student is already assigned to a classroom"),
        _ => err,
    }
}

pub(crate) async fn lock_classroom(
    conn: &mut PgConnection,
    classroom_id: Uuid,
) -> Result<ClassroomRow, AppError> {
    sqlx::query_as::<_, ClassroomRow>(
        r#"SELECT id, name, schedule, teacher_id, timetable_ids, created_at, updated_at
           FROM classrooms
           WHERE id = $1
           FOR UPDATE"#,
    )
    .bind(classroom_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow!("Classroom not found")))
}

pub(crate) async fn lock_member(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Option<Member>, AppError> {
    let member = sqlx::query_as::<_, Member>(
        "SELECT id, role, classroom_id FROM users WHERE id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(member)
}

/// Locks a user together with the classroom it belongs to, classroom first.
///
/// The classroom is read without a lock to find out which row to lock; if
/// another transaction moves the user in between, the user lock fails with a
/// serialization error and the transaction is retried.
pub(crate) async fn lock_member_with_classroom(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Option<Member>, AppError> {
    let classroom_id: Option<Option<Uuid>> =
        sqlx::query_scalar("SELECT classroom_id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;

    let Some(classroom_id) = classroom_id else {
        return Ok(None);
    };

    if let Some(classroom_id) = classroom_id {
        sqlx::query("SELECT id FROM classrooms WHERE id = $1 FOR UPDATE")
            .bind(classroom_id)
            .execute(&mut *conn)
            .await?;
    }

    lock_member(conn, user_id).await
}

/// Locks the given ids that belong to existing students, returning them in
/// input order. Unknown ids and non-students are left out.
pub(crate) async fn lock_students(
    conn: &mut PgConnection,
    ids: &[Uuid],
) -> Result<Vec<Uuid>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let found: Vec<Uuid> = sqlx::query_scalar(
        r#"SELECT id FROM users
           WHERE id = ANY($1) AND role = 'Student'
           ORDER BY id
           FOR UPDATE"#,
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;

    let found: HashSet<Uuid> = found.into_iter().collect();
    Ok(ids.iter().copied().filter(|id| found.contains(id)).collect())
}

pub(crate) async fn roster_student_ids(
    conn: &mut PgConnection,
    classroom_id: Uuid,
) -> Result<Vec<Uuid>, AppError> {
    let ids = sqlx::query_scalar(
        "SELECT student_id FROM classroom_students WHERE classroom_id = $1 ORDER BY position",
    )
    .bind(classroom_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(ids)
}

/// Pulls students out of any roster other than `classroom_id`.
pub(crate) async fn detach_from_other_rosters(
    conn: &mut PgConnection,
    classroom_id: Uuid,
    student_ids: &[Uuid],
) -> Result<(), AppError> {
    if student_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        "DELETE FROM classroom_students WHERE student_id = ANY($1) AND classroom_id <> $2",
    )
    .bind(student_ids)
    .bind(classroom_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Rewrites the roster rows of `classroom_id` to exactly `student_ids`, in
/// order.
pub(crate) async fn write_roster(
    conn: &mut PgConnection,
    classroom_id: Uuid,
    student_ids: &[Uuid],
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM classroom_students WHERE classroom_id = $1")
        .bind(classroom_id)
        .execute(&mut *conn)
        .await?;

    if student_ids.is_empty() {
        return Ok(());
    }

    let positions: Vec<i32> = (0..student_ids.len() as i32).collect();

    sqlx::query(
        r#"INSERT INTO classroom_students (classroom_id, student_id, position)
           SELECT $1, student_id, position
           FROM UNNEST($2::uuid[], $3::int4[]) AS t(student_id, position)"#,
    )
    .bind(classroom_id)
    .bind(student_ids)
    .bind(&positions)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_membership_violation(AppError::from(e)))?;

    Ok(())
}

pub(crate) async fn set_back_refs(
    conn: &mut PgConnection,
    classroom_id: Uuid,
    user_ids: &[Uuid],
) -> Result<(), AppError> {
    if user_ids.is_empty() {
        return Ok(());
    }

    sqlx::query("UPDATE users SET classroom_id = $1, updated_at = NOW() WHERE id = ANY($2)")
        .bind(classroom_id)
        .bind(user_ids)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Clears the back-reference of users that still point at `classroom_id`.
pub(crate) async fn clear_back_refs(
    conn: &mut PgConnection,
    classroom_id: Uuid,
    user_ids: &[Uuid],
) -> Result<(), AppError> {
    if user_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"UPDATE users SET classroom_id = NULL, updated_at = NOW()
           WHERE id = ANY($1) AND classroom_id = $2"#,
    )
    .bind(user_ids)
    .bind(classroom_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn set_teacher(
    conn: &mut PgConnection,
    classroom_id: Uuid,
    teacher_id: Option<Uuid>,
) -> Result<(), AppError> {
    sqlx::query("UPDATE classrooms SET teacher_id = $2, updated_at = NOW() WHERE id = $1")
        .bind(classroom_id)
        .bind(teacher_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_membership_violation(AppError::from(e)))?;

    Ok(())
}

/// Removes every membership of `member`: the roster row of a student, or the
/// teacher slot of the classroom a teacher leads. Clears the back-reference.
pub(crate) async fn detach_member(conn: &mut PgConnection, member: &Member) -> Result<(), AppError> {
    match member.role {
        UserRole::Student => {
            sqlx::query("DELETE FROM classroom_students WHERE student_id = $1")
                .bind(member.id)
                .execute(&mut *conn)
                .await?;
        }
        UserRole::Teacher => {
            sqlx::query(
                "UPDATE classrooms SET teacher_id = NULL, updated_at = NOW() WHERE teacher_id = $1",
            )
            .bind(member.id)
            .execute(&mut *conn)
            .await?;
        }
    }

    if member.classroom_id.is_some() {
        sqlx::query("UPDATE users SET classroom_id = NULL, updated_at = NOW() WHERE id = $1")
            .bind(member.id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let [a, b, c] = ids(3).try_into().unwrap();
        assert_eq!(dedup_preserving_order(&[b, a, b, c, a]), vec![b, a, c]);
        assert!(dedup_preserving_order(&[]).is_empty());
    }

    #[test]
    fn test_diff_roster() {
        let [a, b, c, d] = ids(4).try_into().unwrap();

        let diff = diff_roster(&[a, b, c], &[c, d, a]);
        assert_eq!(diff.additions, vec![d]);
        assert_eq!(diff.removals, vec![b]);
    }

    #[test]
    fn test_diff_roster_to_empty_removes_everyone() {
        let [a, b] = ids(2).try_into().unwrap();

        let diff = diff_roster(&[a, b], &[]);
        assert!(diff.additions.is_empty());
        assert_eq!(diff.removals, vec![a, b]);
    }

    #[test]
    fn test_diff_roster_reorder_is_no_change() {
        let [a, b] = ids(2).try_into().unwrap();
        assert_eq!(diff_roster(&[a, b], &[b, a]), RosterDiff::default());
    }

    #[test]
    fn test_roster_conflict_is_bad_request() {
        let err = roster_conflict("No teacher assigned to this classroom");
        assert_eq!(err.kind, rollcall_core::ErrorKind::Conflict);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
