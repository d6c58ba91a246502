//! Core domain types for the Tally tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Attendance counters and daily marks
//! - Weekdays for the class schedule
//! - GPA course rows and grading bands
//! - Tasks and expenses

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Attendance Types
// ============================================================================

/// Per-subject attendance counter
///
/// Persisted exactly as `{ "attended": <int>, "total": <int> }`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttendanceCounter {
    pub attended: u32,
    pub total: u32,
}

impl AttendanceCounter {
    pub fn new(attended: u32, total: u32) -> Self {
        Self { attended, total }
    }

    /// Apply one day's mark
    pub fn record(&mut self, status: MarkStatus) {
        self.total = self.total.saturating_add(1);
        if status == MarkStatus::Present {
            self.attended = self.attended.saturating_add(1);
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.attended <= self.total
    }
}

/// Outcome of marking a class for a day
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MarkStatus {
    Present,
    Absent,
}

impl fmt::Display for MarkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkStatus::Present => write!(f, "present"),
            MarkStatus::Absent => write!(f, "absent"),
        }
    }
}

impl FromStr for MarkStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "present" | "p" => Ok(MarkStatus::Present),
            "absent" | "a" => Ok(MarkStatus::Absent),
            other => Err(crate::Error::Validation(format!(
                "unknown mark status '{}', expected present or absent",
                other
            ))),
        }
    }
}

/// Day of the week a class meets on
///
/// Serialized with full English names so stored schedules read
/// `{ "Monday": [...] }`. Ordering follows the week starting Monday.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn of(date: NaiveDate) -> Self {
        use chrono::Datelike;
        date.weekday().into()
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
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

impl FromStr for Weekday {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Weekday::ALL
            .iter()
            .copied()
            .find(|d| {
                let name = d.to_string().to_lowercase();
                name == lower || (lower.len() >= 3 && name.starts_with(&lower))
            })
            .ok_or_else(|| crate::Error::Validation(format!("unknown weekday '{}'", s)))
    }
}

// ============================================================================
// GPA Types
// ============================================================================

/// One course row in the GPA calculator
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub id: Uuid,
    pub credits: f64,
    pub max: f64,
    pub obtained: f64,
}

impl Course {
    /// A fresh row: 4 credits out of 100 marks, nothing obtained yet
    pub fn blank() -> Self {
        Self {
            id: Uuid::new_v4(),
            credits: 4.0,
            max: 100.0,
            obtained: 0.0,
        }
    }
}

/// Editable field of a course row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CourseField {
    Credits,
    Max,
    Obtained,
}

impl FromStr for CourseField {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "credits" => Ok(CourseField::Credits),
            "max" => Ok(CourseField::Max),
            "obtained" | "received" => Ok(CourseField::Obtained),
            other => Err(crate::Error::Validation(format!(
                "unknown course field '{}'",
                other
            ))),
        }
    }
}

/// Minimum percent that earns a number of grade points
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct GradeBand {
    pub min: f64,
    pub points: f64,
}

// ============================================================================
// Task and Expense Types
// ============================================================================

/// A to-do item
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub done: bool,
    pub created_at: DateTime<Utc>,
}

/// A single spending entry
///
/// Amounts are kept in minor currency units (cents) so they survive
/// export/import without rounding.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: Uuid,
    pub amount_cents: i64,
    pub category: String,
    pub note: Option<String>,
    pub spent_on: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_record() {
        let mut counter = AttendanceCounter::default();
        counter.record(MarkStatus::Present);
        counter.record(MarkStatus::Absent);
        assert_eq!(counter, AttendanceCounter::new(1, 2));
        assert!(counter.is_consistent());
    }

    #[test]
    fn test_counter_json_shape() {
        let json = serde_json::to_string(&AttendanceCounter::new(32, 40)).unwrap();
        assert_eq!(json, r#"{"attended":32,"total":40}"#);
    }

    #[test]
    fn test_weekday_parse() {
        assert_eq!("monday".parse::<Weekday>().unwrap(), Weekday::Monday);
        assert_eq!("Thu".parse::<Weekday>().unwrap(), Weekday::Thursday);
        assert!("mo".parse::<Weekday>().is_err());
        assert!("funday".parse::<Weekday>().is_err());
    }

    #[test]
    fn test_weekday_of_date() {
        // 2024-01-15 was a Monday
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(Weekday::of(date), Weekday::Monday);
    }

    #[test]
    fn test_weekday_serializes_full_name() {
        assert_eq!(
            serde_json::to_string(&Weekday::Wednesday).unwrap(),
            "\"Wednesday\""
        );
    }

    #[test]
    fn test_mark_status_parse() {
        assert_eq!("Present".parse::<MarkStatus>().unwrap(), MarkStatus::Present);
        assert_eq!("a".parse::<MarkStatus>().unwrap(), MarkStatus::Absent);
        assert!("late".parse::<MarkStatus>().is_err());
    }
}
