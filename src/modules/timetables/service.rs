use anyhow::anyhow;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

use rollcall_core::AppError;
use rollcall_db::with_transaction;

use crate::metrics::track_timetable_operation;
use crate::modules::timetables::model::{
    DayTimetable, Timetable, TimetableRequest, order_by_refs,
};

pub struct TimetableService;

impl TimetableService {
    /// Replaces every timetable of the classroom with the supplied days.
    #[instrument(skip(db))]
    pub async fn replace_timetable(
        db: &PgPool,
        dto: TimetableRequest,
    ) -> Result<Vec<Timetable>, AppError> {
        dto.check()?;
        let days = dto.timetable.len();
        let classroom_id = dto.classroom_id;

        let timetables: Vec<Timetable> = with_transaction(db, move |conn| {
            let entries = dto.timetable.clone();
            Box::pin(async move { Self::replace_tx(conn, classroom_id, entries).await })
        })
        .await?;

        track_timetable_operation("replace", days);
        info!(%classroom_id, days, "Timetable replaced");

        Ok(timetables)
    }

    async fn replace_tx(
        conn: &mut PgConnection,
        classroom_id: Uuid,
        entries: Vec<DayTimetable>,
    ) -> Result<Vec<Timetable>, AppError> {
        Self::lock_classroom(conn, classroom_id).await?;

        sqlx::query("DELETE FROM timetables WHERE classroom_id = $1")
            .bind(classroom_id)
            .execute(&mut *conn)
            .await?;

        let mut timetables = Vec::with_capacity(entries.len());
        for entry in entries {
            let timetable = sqlx::query_as::<_, Timetable>(
                r#"INSERT INTO timetables (classroom_id, day, periods)
                   VALUES ($1, $2, $3)
                   RETURNING id, classroom_id, day, periods, created_at, updated_at"#,
            )
            .bind(classroom_id)
            .bind(entry.day)
            .bind(Json(&entry.periods))
            .fetch_one(&mut *conn)
            .await?;
            timetables.push(timetable);
        }

        let ids: Vec<Uuid> = timetables.iter().map(|t| t.id).collect();
        sqlx::query("UPDATE classrooms SET timetable_ids = $2, updated_at = NOW() WHERE id = $1")
            .bind(classroom_id)
            .bind(&ids)
            .execute(&mut *conn)
            .await?;

        Ok(timetables)
    }

    /// Upserts the supplied days; other days keep their timetables.
    #[instrument(skip(db))]
    pub async fn patch_timetable(
        db: &PgPool,
        dto: TimetableRequest,
    ) -> Result<Vec<Timetable>, AppError> {
        dto.check()?;
        let days = dto.timetable.len();
        let classroom_id = dto.classroom_id;

        let timetables: Vec<Timetable> = with_transaction(db, move |conn| {
            let entries = dto.timetable.clone();
            Box::pin(async move { Self::patch_tx(conn, classroom_id, entries).await })
        })
        .await?;

        track_timetable_operation("patch", days);
        info!(%classroom_id, days, "Timetable patched");

        Ok(timetables)
    }

    async fn patch_tx(
        conn: &mut PgConnection,
        classroom_id: Uuid,
        entries: Vec<DayTimetable>,
    ) -> Result<Vec<Timetable>, AppError> {
        let existing_ids = Self::lock_classroom(conn, classroom_id).await?;

        let mut timetables = Vec::with_capacity(entries.len());
        for entry in entries {
            let timetable = sqlx::query_as::<_, Timetable>(
                r#"INSERT INTO timetables (classroom_id, day, periods)
                   VALUES ($1, $2, $3)
                   ON CONFLICT (classroom_id, day)
                   DO UPDATE SET periods = EXCLUDED.periods, updated_at = NOW()
                   RETURNING id, classroom_id, day, periods, created_at, updated_at"#,
            )
            .bind(classroom_id)
            .bind(entry.day)
            .bind(Json(&entry.periods))
            .fetch_one(&mut *conn)
            .await?;
            timetables.push(timetable);
        }

        let created: Vec<Uuid> = timetables
            .iter()
            .map(|t| t.id)
            .filter(|id| !existing_ids.contains(id))
            .collect();

        if !created.is_empty() {
            sqlx::query(
                r#"UPDATE classrooms
                   SET timetable_ids = timetable_ids || $2, updated_at = NOW()
                   WHERE id = $1"#,
            )
            .bind(classroom_id)
            .bind(&created)
            .execute(&mut *conn)
            .await?;
        }

        Ok(timetables)
    }

    /// The classroom's timetables in reference order.
    #[instrument(skip(db))]
    pub async fn get_timetable(db: &PgPool, classroom_id: Uuid) -> Result<Vec<Timetable>, AppError> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT timetable_ids FROM classrooms WHERE id = $1")
            .bind(classroom_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Classroom not found")))?;

        let timetables = sqlx::query_as::<_, Timetable>(
            r#"SELECT id, classroom_id, day, periods, created_at, updated_at
               FROM timetables
               WHERE classroom_id = $1"#,
        )
        .bind(classroom_id)
        .fetch_all(db)
        .await?;

        Ok(order_by_refs(timetables, &ids))
    }

    /// Locks the classroom row and returns its current timetable references.
    async fn lock_classroom(
        conn: &mut PgConnection,
        classroom_id: Uuid,
    ) -> Result<Vec<Uuid>, AppError> {
        sqlx::query_scalar("SELECT timetable_ids FROM classrooms WHERE id = $1 FOR UPDATE")
            .bind(classroom_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Classroom not found")))
    }
}
