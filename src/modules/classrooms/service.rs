use std::collections::HashMap;

use anyhow::anyhow;
use sqlx::{PgConnection, PgPool};
use sqlx::types::Json;
use tracing::{info, instrument};
use uuid::Uuid;

use rollcall_core::AppError;
use rollcall_db::with_transaction;

use crate::metrics::track_roster_operation;
use crate::modules::classrooms::model::{
    Classroom, ClassroomDetail, ClassroomRow, CreateClassroomDto, MemberSummary, validate_schedule,
};
use crate::modules::classrooms::roster::{self, map_membership_violation, roster_conflict};
use crate::modules::timetables::model::{Timetable, order_by_refs};
use crate::modules::users::model::UserRole;

pub struct ClassroomService;

impl ClassroomService {
    #[instrument(skip(db))]
    pub async fn create_classroom(
        db: &PgPool,
        dto: CreateClassroomDto,
    ) -> Result<Classroom, AppError> {
        if dto.name.trim().is_empty() {
            return Err(AppError::validation(anyhow!("Classroom name is required")));
        }
        validate_schedule(&dto.schedule)?;

        let classroom: Classroom = with_transaction(db, move |conn| {
            let dto = dto.clone();
            Box::pin(async move { Self::create_classroom_tx(conn, dto).await })
        })
        .await?;

        track_roster_operation("create");
        info!(classroom_id = %classroom.id, students = classroom.students.len(), "Classroom created");

        Ok(classroom)
    }

    async fn create_classroom_tx(
        conn: &mut PgConnection,
        dto: CreateClassroomDto,
    ) -> Result<Classroom, AppError> {
        if let Some(teacher_id) = dto.teacher {
            let teacher = roster::lock_member(conn, teacher_id)
                .await?
                .ok_or_else(|| AppError::not_found(anyhow!("Teacher not found")))?;

            if teacher.role != UserRole::Teacher {
                return Err(AppError::validation(anyhow!("User is not a teacher")));
            }
            if teacher.classroom_id.is_some() {
                return Err(roster_conflict("Teacher is already assigned to another classroom"));
            }
        }

        let requested = roster::dedup_preserving_order(&dto.students);
        let students = roster::lock_students(conn, &requested).await?;

        let row = sqlx::query_as::<_, ClassroomRow>(
            r#"INSERT INTO classrooms (name, schedule, teacher_id)
               VALUES ($1, $2, $3)
               RETURNING id, name, schedule, teacher_id, timetable_ids, created_at, updated_at"#,
        )
        .bind(dto.name.trim())
        .bind(Json(&dto.schedule))
        .bind(dto.teacher)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| map_membership_violation(AppError::from(e)))?;

        roster::detach_from_other_rosters(conn, row.id, &students).await?;
        roster::write_roster(conn, row.id, &students).await?;
        roster::set_back_refs(conn, row.id, &students).await?;
        if let Some(teacher_id) = dto.teacher {
            roster::set_back_refs(conn, row.id, &[teacher_id]).await?;
        }

        Ok(Classroom::from_row(row, students))
    }

    #[instrument(skip(db))]
    pub async fn delete_classroom(db: &PgPool, classroom_id: Uuid) -> Result<(), AppError> {
        with_transaction(db, move |conn| {
            Box::pin(async move { Self::delete_classroom_tx(conn, classroom_id).await })
        })
        .await?;

        track_roster_operation("delete");
        info!(%classroom_id, "Classroom deleted");

        Ok(())
    }

    async fn delete_classroom_tx(conn: &mut PgConnection, classroom_id: Uuid) -> Result<(), AppError> {
        roster::lock_classroom(conn, classroom_id).await?;

        sqlx::query(
            "UPDATE users SET classroom_id = NULL, updated_at = NOW() WHERE classroom_id = $1",
        )
        .bind(classroom_id)
        .execute(&mut *conn)
        .await?;

        sqlx::query("DELETE FROM classroom_students WHERE classroom_id = $1")
            .bind(classroom_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query("DELETE FROM timetables WHERE classroom_id = $1")
            .bind(classroom_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query("DELETE FROM classrooms WHERE id = $1")
            .bind(classroom_id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn assign_teacher(
        db: &PgPool,
        classroom_id: Uuid,
        teacher_id: Uuid,
    ) -> Result<Classroom, AppError> {
        let classroom: Classroom = with_transaction(db, move |conn| {
            Box::pin(async move { Self::assign_teacher_tx(conn, classroom_id, teacher_id).await })
        })
        .await?;

        track_roster_operation("assign_teacher");

        Ok(classroom)
    }

    async fn assign_teacher_tx(
        conn: &mut PgConnection,
        classroom_id: Uuid,
        teacher_id: Uuid,
    ) -> Result<Classroom, AppError> {
        let row = roster::lock_classroom(conn, classroom_id).await?;

        let teacher = roster::lock_member(conn, teacher_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Teacher not found")))?;

        if teacher.role != UserRole::Teacher {
            return Err(AppError::validation(anyhow!("User is not a teacher")));
        }

        if row.teacher_id == Some(teacher_id) {
            let students = roster::roster_student_ids(conn, classroom_id).await?;
            return Ok(Classroom::from_row(row, students));
        }

        if teacher.classroom_id.is_some() {
            return Err(roster_conflict("Teacher is already assigned to another classroom"));
        }

        if let Some(previous) = row.teacher_id {
            roster::clear_back_refs(conn, classroom_id, &[previous]).await?;
        }

        roster::set_teacher(conn, classroom_id, Some(teacher_id)).await?;
        roster::set_back_refs(conn, classroom_id, &[teacher_id]).await?;

        Self::reload(conn, classroom_id).await
    }

    #[instrument(skip(db))]
    pub async fn remove_teacher(db: &PgPool, classroom_id: Uuid) -> Result<Classroom, AppError> {
        let classroom: Classroom = with_transaction(db, move |conn| {
            Box::pin(async move { Self::remove_teacher_tx(conn, classroom_id).await })
        })
        .await?;

        track_roster_operation("remove_teacher");

        Ok(classroom)
    }

    async fn remove_teacher_tx(
        conn: &mut PgConnection,
        classroom_id: Uuid,
    ) -> Result<Classroom, AppError> {
        let row = roster::lock_classroom(conn, classroom_id).await?;

        let Some(teacher_id) = row.teacher_id else {
            return Err(roster_conflict("No teacher assigned to this classroom"));
        };

        roster::set_teacher(conn, classroom_id, None).await?;
        roster::clear_back_refs(conn, classroom_id, &[teacher_id]).await?;

        Self::reload(conn, classroom_id).await
    }

    /// Replaces the student roster with `new_students`, in order.
    #[instrument(skip(db))]
    pub async fn replace_students(
        db: &PgPool,
        classroom_id: Uuid,
        new_students: Vec<Uuid>,
    ) -> Result<Classroom, AppError> {
        let classroom: Classroom = with_transaction(db, move |conn| {
            let new_students = new_students.clone();
            Box::pin(async move { Self::replace_students_tx(conn, classroom_id, new_students).await })
        })
        .await?;

        track_roster_operation("replace_students");
        info!(%classroom_id, students = classroom.students.len(), "Classroom roster replaced");

        Ok(classroom)
    }

    async fn replace_students_tx(
        conn: &mut PgConnection,
        classroom_id: Uuid,
        new_students: Vec<Uuid>,
    ) -> Result<Classroom, AppError> {
        roster::lock_classroom(conn, classroom_id).await?;

        let requested = roster::dedup_preserving_order(&new_students);
        let students = roster::lock_students(conn, &requested).await?;
        if students.len() != requested.len() {
            return Err(AppError::validation(anyhow!(
                "One or more students are invalid or not students"
            )));
        }

        let current = roster::roster_student_ids(conn, classroom_id).await?;
        let diff = roster::diff_roster(&current, &students);

        roster::detach_from_other_rosters(conn, classroom_id, &diff.additions).await?;
        roster::write_roster(conn, classroom_id, &students).await?;
        roster::clear_back_refs(conn, classroom_id, &diff.removals).await?;
        roster::set_back_refs(conn, classroom_id, &diff.additions).await?;

        Self::reload(conn, classroom_id).await
    }

    async fn reload(conn: &mut PgConnection, classroom_id: Uuid) -> Result<Classroom, AppError> {
        let row = sqlx::query_as::<_, ClassroomRow>(
            r#"SELECT id, name, schedule, teacher_id, timetable_ids, created_at, updated_at
               FROM classrooms WHERE id = $1"#,
        )
        .bind(classroom_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Classroom not found")))?;

        let students = roster::roster_student_ids(conn, classroom_id).await?;
        Ok(Classroom::from_row(row, students))
    }

    /// All classrooms with teacher, students, and timetables resolved.
    #[instrument(skip(db))]
    pub async fn list_classrooms(db: &PgPool) -> Result<Vec<ClassroomDetail>, AppError> {
        let rows = sqlx::query_as::<_, ClassroomRow>(
            r#"SELECT id, name, schedule, teacher_id, timetable_ids, created_at, updated_at
               FROM classrooms
               ORDER BY created_at, id"#,
        )
        .fetch_all(db)
        .await?;

        let teacher_ids: Vec<Uuid> = rows.iter().filter_map(|r| r.teacher_id).collect();
        let teachers: HashMap<Uuid, MemberSummary> =
            sqlx::query_as::<_, MemberSummary>("SELECT id, name, email FROM users WHERE id = ANY($1)")
                .bind(&teacher_ids)
                .fetch_all(db)
                .await?
                .into_iter()
                .map(|t| (t.id, t))
                .collect();

        let roster_rows = sqlx::query_as::<_, (Uuid, Uuid, String, String)>(
            r#"SELECT cs.classroom_id, u.id, u.name, u.email
               FROM classroom_students cs
               JOIN users u ON u.id = cs.student_id
               ORDER BY cs.classroom_id, cs.position"#,
        )
        .fetch_all(db)
        .await?;

        let mut students: HashMap<Uuid, Vec<MemberSummary>> = HashMap::new();
        for (classroom_id, id, name, email) in roster_rows {
            students
                .entry(classroom_id)
                .or_default()
                .push(MemberSummary { id, name, email });
        }

        let mut timetables: HashMap<Uuid, Vec<Timetable>> = HashMap::new();
        for timetable in sqlx::query_as::<_, Timetable>(
            "SELECT id, classroom_id, day, periods, created_at, updated_at FROM timetables",
        )
        .fetch_all(db)
        .await?
        {
            timetables
                .entry(timetable.classroom_id)
                .or_default()
                .push(timetable);
        }

        let classrooms = rows
            .into_iter()
            .map(|row| ClassroomDetail {
                id: row.id,
                teacher: row.teacher_id.and_then(|id| teachers.get(&id).cloned()),
                students: students.remove(&row.id).unwrap_or_default(),
                timetables: order_by_refs(
                    timetables.remove(&row.id).unwrap_or_default(),
                    &row.timetable_ids,
                ),
                name: row.name,
                schedule: row.schedule.0,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect();

        Ok(classrooms)
    }
}
