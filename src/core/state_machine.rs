//! The daily attendance state machine.
//!
//! One record per (employee, date) walks `Absent → Working ⇄ OnBreak →
//! Completed`. Multiple break cycles are allowed but only one break may
//! be open at a time, and check-out is rejected while a break is open.
//! All transitions are pure: callers load the record, apply a transition,
//! and persist the result under the same row lock.

use chrono::{NaiveDate, NaiveDateTime};
use derive_more::Display;

use crate::model::attendance::AttendanceRecord;

const SECS_PER_MINUTE: f64 = 60.0;
const SECS_PER_HOUR: f64 = 3600.0;
const MINUTES_PER_HOUR: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TransitionError {
    #[display(fmt = "Already checked in today")]
    AlreadyCheckedIn,
    #[display(fmt = "Invalid break start")]
    InvalidBreakStart,
    #[display(fmt = "Invalid break end")]
    InvalidBreakEnd,
    #[display(fmt = "Invalid check out")]
    InvalidCheckOut,
}

/// Derived values returned by a successful check-out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckOutSummary {
    pub gross_hours: f64,
    pub net_hours: f64,
}

/// Derived values returned by a successful break end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakSummary {
    pub added_minutes: f64,
    pub total_minutes: f64,
}

/// Guard for check-in: a record for today already existing is the only
/// failure. The unique (employee_id, date) index backs this up against
/// races the read cannot see.
pub fn ensure_can_check_in(existing: Option<&AttendanceRecord>) -> Result<(), TransitionError> {
    match existing {
        Some(_) => Err(TransitionError::AlreadyCheckedIn),
        None => Ok(()),
    }
}

/// A fresh record for the first action of the day. `id` is assigned by
/// the store on insert.
pub fn new_check_in(employee_id: u64, date: NaiveDate, now: NaiveDateTime) -> AttendanceRecord {
    AttendanceRecord {
        id: 0,
        employee_id,
        date,
        check_in: Some(now),
        break_start: None,
        break_minutes: 0.0,
        check_out: None,
        gross_hours: None,
        net_hours: None,
        work_note: None,
    }
}

pub fn start_break(record: &mut AttendanceRecord, now: NaiveDateTime) -> Result<(), TransitionError> {
    if record.check_in.is_none() || record.break_start.is_some() || record.check_out.is_some() {
        return Err(TransitionError::InvalidBreakStart);
    }
    record.break_start = Some(now);
    Ok(())
}

/// Close the open break, folding its elapsed minutes into the running
/// total. Elapsed time is clamped at zero so `break_minutes` can never
/// decrease.
pub fn end_break(
    record: &mut AttendanceRecord,
    now: NaiveDateTime,
) -> Result<BreakSummary, TransitionError> {
    let started = record.break_start.ok_or(TransitionError::InvalidBreakEnd)?;

    let elapsed_secs = (now - started).num_seconds().max(0) as f64;
    let added_minutes = elapsed_secs / SECS_PER_MINUTE;

    record.break_minutes += added_minutes;
    record.break_start = None;

    Ok(BreakSummary {
        added_minutes,
        total_minutes: record.break_minutes,
    })
}

/// Terminal transition. Only reachable from `Working`: never before
/// check-in, never twice, and never while a break is open.
pub fn check_out(
    record: &mut AttendanceRecord,
    now: NaiveDateTime,
) -> Result<CheckOutSummary, TransitionError> {
    let checked_in = match record.check_in {
        Some(t) if record.check_out.is_none() && record.break_start.is_none() => t,
        _ => return Err(TransitionError::InvalidCheckOut),
    };

    let gross_hours = (now - checked_in).num_seconds().max(0) as f64 / SECS_PER_HOUR;
    let net_hours = gross_hours - record.break_minutes / MINUTES_PER_HOUR;

    record.check_out = Some(now);
    record.gross_hours = Some(gross_hours);
    record.net_hours = Some(net_hours);

    Ok(CheckOutSummary {
        gross_hours,
        net_hours,
    })
}

/// Work-note validation: trimmed, non-empty. Returns the text to store.
pub fn normalize_note(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use chrono::{Duration, NaiveDateTime};

    fn make_datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn working_record() -> AttendanceRecord {
        let t = make_datetime("2026-08-30 09:00:00");
        new_check_in(42, t.date(), t)
    }

    #[test]
    fn check_in_creates_working_record() {
        let rec = working_record();
        assert_eq!(rec.status(), AttendanceStatus::Working);
        assert_eq!(rec.break_minutes, 0.0);
        assert!(rec.check_out.is_none());
    }

    #[test]
    fn second_check_in_is_rejected() {
        let rec = working_record();
        assert_eq!(
            ensure_can_check_in(Some(&rec)),
            Err(TransitionError::AlreadyCheckedIn)
        );
        assert_eq!(ensure_can_check_in(None), Ok(()));
    }

    #[test]
    fn double_start_break_leaves_record_unchanged() {
        let mut rec = working_record();
        let first = make_datetime("2026-08-30 12:00:00");
        start_break(&mut rec, first).unwrap();

        let err = start_break(&mut rec, make_datetime("2026-08-30 12:05:00"));
        assert_eq!(err, Err(TransitionError::InvalidBreakStart));
        assert_eq!(rec.break_start, Some(first));
        assert_eq!(rec.break_minutes, 0.0);
    }

    #[test]
    fn break_minutes_accumulate_across_cycles() {
        let mut rec = working_record();

        start_break(&mut rec, make_datetime("2026-08-30 10:00:00")).unwrap();
        let first = end_break(&mut rec, make_datetime("2026-08-30 10:10:00")).unwrap();
        assert_eq!(first.added_minutes, 10.0);

        start_break(&mut rec, make_datetime("2026-08-30 14:00:00")).unwrap();
        let second = end_break(&mut rec, make_datetime("2026-08-30 14:05:00")).unwrap();
        assert_eq!(second.added_minutes, 5.0);
        assert_eq!(second.total_minutes, 15.0);
        assert_eq!(rec.break_minutes, 15.0);
        assert_eq!(rec.status(), AttendanceStatus::Working);
    }

    #[test]
    fn end_break_without_open_break_fails() {
        let mut rec = working_record();
        assert_eq!(
            end_break(&mut rec, make_datetime("2026-08-30 10:00:00")),
            Err(TransitionError::InvalidBreakEnd)
        );
    }

    #[test]
    fn check_out_computes_gross_and_net_hours() {
        let mut rec = working_record();
        rec.break_minutes = 30.0;

        let t = make_datetime("2026-08-30 09:00:00") + Duration::hours(8);
        let summary = check_out(&mut rec, t).unwrap();

        assert_eq!(summary.gross_hours, 8.0);
        assert_eq!(summary.net_hours, 7.5);
        assert_eq!(rec.status(), AttendanceStatus::Completed);
    }

    #[test]
    fn check_out_is_rejected_while_on_break() {
        let mut rec = working_record();
        start_break(&mut rec, make_datetime("2026-08-30 12:00:00")).unwrap();

        assert_eq!(
            check_out(&mut rec, make_datetime("2026-08-30 17:00:00")),
            Err(TransitionError::InvalidCheckOut)
        );
        assert!(rec.check_out.is_none());
    }

    #[test]
    fn check_out_is_terminal() {
        let mut rec = working_record();
        check_out(&mut rec, make_datetime("2026-08-30 17:00:00")).unwrap();

        let gross = rec.gross_hours;
        assert_eq!(
            check_out(&mut rec, make_datetime("2026-08-30 18:00:00")),
            Err(TransitionError::InvalidCheckOut)
        );
        assert_eq!(rec.gross_hours, gross);

        assert_eq!(
            start_break(&mut rec, make_datetime("2026-08-30 18:00:00")),
            Err(TransitionError::InvalidBreakStart)
        );
    }

    #[test]
    fn normalized_note_round_trips_on_the_record() {
        let mut rec = working_record();
        check_out(&mut rec, make_datetime("2026-08-30 17:00:00")).unwrap();

        // A note is an annotation, allowed even on a completed record,
        // and lands exactly as trimmed.
        rec.work_note = normalize_note("  wrapped up billing  ");
        assert_eq!(rec.work_note.as_deref(), Some("wrapped up billing"));
        assert_eq!(rec.status(), AttendanceStatus::Completed);
    }

    #[test]
    fn note_normalization_rejects_blank_text() {
        assert_eq!(normalize_note("  "), None);
        assert_eq!(normalize_note(""), None);
        assert_eq!(
            normalize_note("  wrapped up billing  "),
            Some("wrapped up billing".to_string())
        );
    }
}
