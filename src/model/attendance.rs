use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Attendance lifecycle for one employee on one calendar date.
/// Never stored: always derived from the timestamp fields, so no caller
/// can set it out of sync with the record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum AttendanceStatus {
    Absent,
    Working,
    OnBreak,
    Completed,
}

/// One attendance record per (employee, date). Created by check-in,
/// mutated only through the state machine, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 42)]
    pub employee_id: u64,

    #[schema(example = "2026-08-30", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "2026-08-30T09:00:00", value_type = Option<String>)]
    pub check_in: Option<NaiveDateTime>,

    /// Present only while a break is open.
    #[schema(example = "2026-08-30T12:30:00", value_type = Option<String>)]
    pub break_start: Option<NaiveDateTime>,

    /// Accumulated break duration, fractional minutes. Non-negative and
    /// non-decreasing within the day.
    #[schema(example = 30.0)]
    pub break_minutes: f64,

    #[schema(example = "2026-08-30T17:00:00", value_type = Option<String>)]
    pub check_out: Option<NaiveDateTime>,

    /// Set once, by the check-out transition.
    #[schema(example = 8.0)]
    pub gross_hours: Option<f64>,

    #[schema(example = 7.5)]
    pub net_hours: Option<f64>,

    #[schema(example = "Finished the quarterly report")]
    pub work_note: Option<String>,
}

/// Status as a pure function of the timestamp fields. A missing record
/// is `Absent`; callers with no record pass three `None`s.
pub fn status_of(
    check_in: Option<NaiveDateTime>,
    break_start: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
) -> AttendanceStatus {
    if check_out.is_some() {
        AttendanceStatus::Completed
    } else if break_start.is_some() {
        AttendanceStatus::OnBreak
    } else if check_in.is_some() {
        AttendanceStatus::Working
    } else {
        AttendanceStatus::Absent
    }
}

impl AttendanceRecord {
    pub fn status(&self) -> AttendanceStatus {
        status_of(self.check_in, self.break_start, self.check_out)
    }

    pub fn on_break(&self) -> bool {
        self.status() == AttendanceStatus::OnBreak
    }

    pub fn break_taken(&self) -> bool {
        self.break_minutes > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn make_datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn status_follows_timestamps() {
        let t = make_datetime("2026-08-30 09:00:00");
        assert_eq!(status_of(None, None, None), AttendanceStatus::Absent);
        assert_eq!(status_of(Some(t), None, None), AttendanceStatus::Working);
        assert_eq!(status_of(Some(t), Some(t), None), AttendanceStatus::OnBreak);
        assert_eq!(
            status_of(Some(t), None, Some(t)),
            AttendanceStatus::Completed
        );
    }

    #[test]
    fn status_round_trips_through_strings() {
        assert_eq!(AttendanceStatus::OnBreak.to_string(), "OnBreak");
        assert_eq!(
            AttendanceStatus::from_str("Completed").unwrap(),
            AttendanceStatus::Completed
        );
    }
}
