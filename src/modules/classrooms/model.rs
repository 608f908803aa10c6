use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use rollcall_core::{AppError, Weekday, is_valid_time_of_day};

use crate::modules::timetables::model::Timetable;

/// One weekly meeting slot of a classroom.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub day: Weekday,
    #[schema(example = "08:00")]
    pub start_time: String,
    #[schema(example = "14:30")]
    pub end_time: String,
}

pub fn validate_schedule(schedule: &[ScheduleEntry]) -> Result<(), AppError> {
    for entry in schedule {
        if !is_valid_time_of_day(&entry.start_time) || !is_valid_time_of_day(&entry.end_time) {
            return Err(AppError::validation(anyhow!(
                "Invalid time format for {}, expected HH:MM",
                entry.day
            )));
        }
    }
    Ok(())
}

#[derive(FromRow, Debug, Clone)]
pub(crate) struct ClassroomRow {
    pub id: Uuid,
    pub name: String,
    pub schedule: Json<Vec<ScheduleEntry>>,
    pub teacher_id: Option<Uuid>,
    pub timetable_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A classroom with its members as ids.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Classroom {
    pub id: Uuid,
    pub name: String,
    pub schedule: Vec<ScheduleEntry>,
    pub teacher: Option<Uuid>,
    pub students: Vec<Uuid>,
    pub timetables: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Classroom {
    pub(crate) fn from_row(row: ClassroomRow, students: Vec<Uuid>) -> Self {
        Self {
            id: row.id,
            name: row.name,
            schedule: row.schedule.0,
            teacher: row.teacher_id,
            students,
            timetables: row.timetable_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct MemberSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// A classroom with teacher, students, and timetables resolved.
#[derive(Serialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassroomDetail {
    pub id: Uuid,
    pub name: String,
    pub schedule: Vec<ScheduleEntry>,
    pub teacher: Option<MemberSummary>,
    pub students: Vec<MemberSummary>,
    pub timetables: Vec<Timetable>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct CreateClassroomDto {
    #[validate(length(min = 1, max = 255, message = "Classroom name is required"))]
    pub name: String,
    #[serde(default)]
    pub schedule: Vec<ScheduleEntry>,
    /// Teacher user id
    pub teacher: Option<Uuid>,
    /// Student user ids; non-students are ignored
    #[serde(default)]
    pub students: Vec<Uuid>,
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignTeacherDto {
    pub classroom_id: Uuid,
    pub teacher_id: Uuid,
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveTeacherDto {
    pub classroom_id: Uuid,
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentsDto {
    pub classroom_id: Uuid,
    pub new_students: Vec<Uuid>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ClassroomResponse {
    pub message: String,
    pub classroom: Classroom,
}
