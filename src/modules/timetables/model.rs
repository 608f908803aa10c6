use std::collections::HashSet;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use rollcall_core::{AppError, Weekday, is_valid_time_of_day};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    #[schema(example = "Mathematics")]
    pub subject: String,
    #[schema(example = "08:00")]
    pub start_time: String,
    #[schema(example = "08:45")]
    pub end_time: String,
}

/// The periods of one weekday.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct DayTimetable {
    pub day: Weekday,
    #[serde(default)]
    pub periods: Vec<Period>,
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimetableRequest {
    pub classroom_id: Uuid,
    pub timetable: Vec<DayTimetable>,
}

impl TimetableRequest {
    /// Rejects repeated days, blank subjects, and malformed times.
    pub fn check(&self) -> Result<(), AppError> {
        let mut seen = HashSet::new();
        for entry in &self.timetable {
            if !seen.insert(entry.day) {
                return Err(AppError::validation(anyhow!(
                    "Duplicate day in timetable: {}",
                    entry.day
                )));
            }

            for period in &entry.periods {
                if period.subject.trim().is_empty() {
                    return Err(AppError::validation(anyhow!(
                        "Subject is required for every period on {}",
                        entry.day
                    )));
                }
                if !is_valid_time_of_day(&period.start_time)
                    || !is_valid_time_of_day(&period.end_time)
                {
                    return Err(AppError::validation(anyhow!(
                        "Invalid time format for {} on {}, expected HH:MM",
                        period.subject,
                        entry.day
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    pub id: Uuid,
    pub classroom_id: Uuid,
    pub day: Weekday,
    #[schema(value_type = Vec<Period>)]
    pub periods: Json<Vec<Period>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct TimetablesResponse {
    pub message: String,
    pub timetables: Vec<Timetable>,
}

/// Orders timetables by their position in `ids`; unreferenced ones go last.
pub(crate) fn order_by_refs(mut timetables: Vec<Timetable>, ids: &[Uuid]) -> Vec<Timetable> {
    timetables.sort_by_key(|t| ids.iter().position(|id| *id == t.id).unwrap_or(usize::MAX));
    timetables
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(days: Vec<DayTimetable>) -> TimetableRequest {
        TimetableRequest {
            classroom_id: Uuid::new_v4(),
            timetable: days,
        }
    }

    fn day(day: Weekday, periods: Vec<(&str, &str, &str)>) -> DayTimetable {
        DayTimetable {
            day,
            periods: periods
                .into_iter()
                .map(|(subject, start, end)| Period {
                    subject: subject.to_string(),
                    start_time: start.to_string(),
                    end_time: end.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_check_accepts_distinct_days() {
        let req = request(vec![
            day(Weekday::Monday, vec![("Maths", "08:00", "08:45")]),
            day(Weekday::Tuesday, vec![]),
        ]);
        assert!(req.check().is_ok());
    }

    #[test]
    fn test_check_rejects_duplicate_days() {
        let req = request(vec![
            day(Weekday::Monday, vec![]),
            day(Weekday::Friday, vec![]),
            day(Weekday::Monday, vec![]),
        ]);
        let err = req.check().unwrap_err();
        assert_eq!(err.public_message(), "Duplicate day in timetable: Monday");
    }

    #[test]
    fn test_check_rejects_bad_periods() {
        let blank = request(vec![day(Weekday::Monday, vec![(" ", "08:00", "08:45")])]);
        assert!(blank.check().is_err());

        let bad_time = request(vec![day(Weekday::Monday, vec![("Art", "08:00", "25:00")])]);
        assert!(bad_time.check().is_err());
    }

    #[test]
    fn test_order_by_refs() {
        let now = Utc::now();
        let make = |d| Timetable {
            id: Uuid::new_v4(),
            classroom_id: Uuid::nil(),
            day: d,
            periods: Json(vec![]),
            created_at: now,
            updated_at: now,
        };
        let (mon, tue, wed) = (make(Weekday::Monday), make(Weekday::Tuesday), make(Weekday::Wednesday));
        let refs = vec![tue.id, mon.id];

        let ordered = order_by_refs(vec![mon.clone(), wed.clone(), tue.clone()], &refs);
        let days: Vec<Weekday> = ordered.iter().map(|t| t.day).collect();
        assert_eq!(days, vec![Weekday::Tuesday, Weekday::Monday, Weekday::Wednesday]);
    }
}
