//! Weekday and time-of-day types shared by classroom schedules and timetables.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

static TIME_OF_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-1]?[0-9]|2[0-3]):[0-5][0-9]$").expect("time-of-day pattern is valid")
});

/// Returns true for 24-hour `HH:MM` (or `H:MM`) strings.
pub fn is_valid_time_of_day(value: &str) -> bool {
    TIME_OF_DAY.is_match(value)
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
    sqlx::Type,
)]
#[sqlx(type_name = "weekday")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_times() {
        for time in ["00:00", "9:30", "09:30", "12:05", "23:59"] {
            assert!(is_valid_time_of_day(time), "{time} should be valid");
        }
    }

    #[test]
    fn test_invalid_times() {
        for time in ["24:00", "12:60", "1230", "12:5", "noon", "", " 09:30"] {
            assert!(!is_valid_time_of_day(time), "{time} should be invalid");
        }
    }

    #[test]
    fn test_weekday_serde_uses_capitalised_names() {
        let json = serde_json::to_string(&Weekday::Wednesday).unwrap();
        assert_eq!(json, "\"Wednesday\"");

        let day: Weekday = serde_json::from_str("\"Friday\"").unwrap();
        assert_eq!(day, Weekday::Friday);

        assert!(serde_json::from_str::<Weekday>("\"Funday\"").is_err());
    }
}
