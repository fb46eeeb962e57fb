//! Read-only projections over attendance records.
//!
//! The joins are done here, in plain code over rows the store has already
//! fetched, so ordering, absent-fill, and null-safety rules are testable
//! without a database.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::model::attendance::{status_of, AttendanceRecord, AttendanceStatus};
use crate::model::employee::EmployeeName;

/// One row of the admin roster/history tables. Employees with no record
/// carry null timestamps and an `Absent` status.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RosterRow {
    #[schema(example = 1)]
    pub employee_id: u64,

    #[schema(example = "John Doe")]
    pub employee_name: String,

    #[schema(example = "2026-08-30", value_type = Option<String>)]
    pub date: Option<NaiveDate>,

    #[schema(example = "2026-08-30T09:00:00", value_type = Option<String>)]
    pub check_in: Option<NaiveDateTime>,

    #[schema(example = "2026-08-30T17:00:00", value_type = Option<String>)]
    pub check_out: Option<NaiveDateTime>,

    #[schema(example = false)]
    pub on_break: bool,

    #[schema(example = "Working")]
    pub status: String,

    #[schema(example = "Finished the quarterly report", nullable = true)]
    pub work_note: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct DashboardStats {
    #[schema(example = 25)]
    pub total_employees: u64,

    #[schema(example = 18)]
    pub present_today: u64,

    #[schema(example = 7)]
    pub absent_today: u64,
}

/// Joined row for the date-range exports (inner join, record always
/// present; the numeric columns stay nullable at the SQL level).
#[derive(Debug, Clone, FromRow)]
pub struct ExportJoinRow {
    pub employee_name: String,
    pub date: NaiveDate,
    pub check_in: Option<NaiveDateTime>,
    pub break_start: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    pub break_minutes: Option<f64>,
    pub net_hours: Option<f64>,
}

pub const ADMIN_EXPORT_HEADER: [&str; 7] = [
    "Employee",
    "Date",
    "Check In",
    "Check Out",
    "Break Minutes",
    "Net Hours",
    "Status",
];

pub const EMPLOYEE_EXPORT_HEADER: [&str; 6] = [
    "Date",
    "Check In",
    "Check Out",
    "Break Minutes",
    "Net Hours",
    "Status",
];

fn row_from_record(employee_id: u64, name: &str, record: &AttendanceRecord) -> RosterRow {
    RosterRow {
        employee_id,
        employee_name: name.to_string(),
        date: Some(record.date),
        check_in: record.check_in,
        check_out: record.check_out,
        on_break: record.on_break(),
        status: record.status().to_string(),
        work_note: record.work_note.clone(),
    }
}

fn absent_row(employee: &EmployeeName) -> RosterRow {
    RosterRow {
        employee_id: employee.id,
        employee_name: employee.name.clone(),
        date: None,
        check_in: None,
        check_out: None,
        on_break: false,
        status: AttendanceStatus::Absent.to_string(),
        work_note: None,
    }
}

/// Left-outer join of active employees against their record for a single
/// date. Every employee appears exactly once, ordered by name.
pub fn daily_roster(employees: &[EmployeeName], records: &[AttendanceRecord]) -> Vec<RosterRow> {
    let by_employee: HashMap<u64, &AttendanceRecord> =
        records.iter().map(|r| (r.employee_id, r)).collect();

    let mut rows: Vec<RosterRow> = employees
        .iter()
        .map(|e| match by_employee.get(&e.id) {
            Some(record) => row_from_record(e.id, &e.name, record),
            None => absent_row(e),
        })
        .collect();

    rows.sort_by(|a, b| {
        a.employee_name
            .cmp(&b.employee_name)
            .then(a.employee_id.cmp(&b.employee_id))
    });
    rows
}

/// All-days listing for the admin attendance view: one row per record,
/// newest date first then name; employees with no records at all are
/// appended as `Absent` rows, by name. Records of employees outside the
/// active list are dropped.
pub fn attendance_history(
    employees: &[EmployeeName],
    records: &[AttendanceRecord],
) -> Vec<RosterRow> {
    let names: HashMap<u64, &str> = employees.iter().map(|e| (e.id, e.name.as_str())).collect();

    let mut rows: Vec<RosterRow> = records
        .iter()
        .filter_map(|r| {
            names
                .get(&r.employee_id)
                .map(|name| row_from_record(r.employee_id, name, r))
        })
        .collect();

    rows.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then(a.employee_name.cmp(&b.employee_name))
            .then(a.employee_id.cmp(&b.employee_id))
    });

    let seen: HashSet<u64> = records.iter().map(|r| r.employee_id).collect();
    let mut absentees: Vec<RosterRow> = employees
        .iter()
        .filter(|e| !seen.contains(&e.id))
        .map(absent_row)
        .collect();
    absentees.sort_by(|a, b| a.employee_name.cmp(&b.employee_name));

    rows.extend(absentees);
    rows
}

/// Head-counts for the admin dashboard, derived from today's records.
pub fn dashboard_stats(
    employees: &[EmployeeName],
    today_records: &[AttendanceRecord],
) -> DashboardStats {
    let total_employees = employees.len() as u64;
    let present_today = today_records
        .iter()
        .map(|r| r.employee_id)
        .collect::<HashSet<_>>()
        .len() as u64;

    DashboardStats {
        total_employees,
        present_today,
        absent_today: total_employees.saturating_sub(present_today),
    }
}

fn format_instant(value: Option<NaiveDateTime>) -> String {
    value
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Field projection for one export row. Missing numerics render as `0`,
/// missing text as empty; break minutes are rounded for display.
fn export_fields(row: &ExportJoinRow) -> Vec<String> {
    vec![
        row.date.format("%Y-%m-%d").to_string(),
        format_instant(row.check_in),
        format_instant(row.check_out),
        row.break_minutes
            .map(|m| (m.round() as i64).to_string())
            .unwrap_or_else(|| "0".to_string()),
        row.net_hours
            .map(|h| format!("{:.2}", h))
            .unwrap_or_else(|| "0".to_string()),
        status_of(row.check_in, row.break_start, row.check_out).to_string(),
    ]
}

/// Rows for the employee's own export (no name column).
pub fn employee_export_rows(rows: &[ExportJoinRow]) -> Vec<Vec<String>> {
    rows.iter().map(export_fields).collect()
}

/// Rows for the admin report, name column first.
pub fn admin_export_rows(rows: &[ExportJoinRow]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            let mut fields = vec![row.employee_name.clone()];
            fields.extend(export_fields(row));
            fields
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn make_date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn employee(id: u64, name: &str) -> EmployeeName {
        EmployeeName {
            id,
            name: name.to_string(),
        }
    }

    fn record(employee_id: u64, date: &str, check_in: &str) -> AttendanceRecord {
        AttendanceRecord {
            id: employee_id,
            employee_id,
            date: make_date(date),
            check_in: Some(make_datetime(check_in)),
            break_start: None,
            break_minutes: 0.0,
            check_out: None,
            gross_hours: None,
            net_hours: None,
            work_note: None,
        }
    }

    #[test]
    fn roster_with_no_records_is_all_absent() {
        let employees = vec![employee(2, "Bob"), employee(1, "Alice")];
        let rows = daily_roster(&employees, &[]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].employee_name, "Alice");
        assert!(rows.iter().all(|r| r.status == "Absent"));
        assert!(rows.iter().all(|r| r.check_in.is_none() && r.date.is_none()));
    }

    #[test]
    fn roster_mixes_present_and_absent_ordered_by_name() {
        let employees = vec![employee(1, "Carol"), employee(2, "Andy")];
        let records = vec![record(1, "2026-08-30", "2026-08-30 09:00:00")];

        let rows = daily_roster(&employees, &records);
        assert_eq!(rows[0].employee_name, "Andy");
        assert_eq!(rows[0].status, "Absent");
        assert_eq!(rows[1].employee_name, "Carol");
        assert_eq!(rows[1].status, "Working");
        assert_eq!(rows[1].date, Some(make_date("2026-08-30")));
    }

    #[test]
    fn roster_rows_carry_the_work_note() {
        let employees = vec![employee(1, "Alice")];
        let mut rec = record(1, "2026-08-30", "2026-08-30 09:00:00");
        rec.work_note = Some("wrapped up billing".to_string());

        let rows = daily_roster(&employees, &[rec]);
        assert_eq!(rows[0].work_note.as_deref(), Some("wrapped up billing"));
    }

    #[test]
    fn history_orders_by_date_descending_then_name() {
        let employees = vec![employee(1, "Alice"), employee(2, "Bob"), employee(3, "Eve")];
        let records = vec![
            record(1, "2026-08-29", "2026-08-29 09:00:00"),
            record(2, "2026-08-30", "2026-08-30 09:00:00"),
            record(1, "2026-08-30", "2026-08-30 08:00:00"),
        ];

        let rows = attendance_history(&employees, &records);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].employee_name, "Alice");
        assert_eq!(rows[0].date, Some(make_date("2026-08-30")));
        assert_eq!(rows[1].employee_name, "Bob");
        assert_eq!(rows[2].date, Some(make_date("2026-08-29")));
        // Eve never attended: appended last as Absent.
        assert_eq!(rows[3].employee_name, "Eve");
        assert_eq!(rows[3].status, "Absent");
    }

    #[test]
    fn dashboard_counts_distinct_present_employees() {
        let employees = vec![employee(1, "Alice"), employee(2, "Bob"), employee(3, "Eve")];
        let records = vec![record(1, "2026-08-30", "2026-08-30 09:00:00")];

        let stats = dashboard_stats(&employees, &records);
        assert_eq!(stats.total_employees, 3);
        assert_eq!(stats.present_today, 1);
        assert_eq!(stats.absent_today, 2);
    }

    #[test]
    fn export_fields_are_null_safe() {
        let row = ExportJoinRow {
            employee_name: "Alice".to_string(),
            date: make_date("2026-08-30"),
            check_in: Some(make_datetime("2026-08-30 09:00:00")),
            break_start: None,
            check_out: None,
            break_minutes: None,
            net_hours: None,
        };

        let fields = admin_export_rows(std::slice::from_ref(&row));
        assert_eq!(
            fields[0],
            vec![
                "Alice",
                "2026-08-30",
                "2026-08-30 09:00:00",
                "",
                "0",
                "0",
                "Working"
            ]
        );
    }

    #[test]
    fn export_renders_completed_day() {
        let row = ExportJoinRow {
            employee_name: "Alice".to_string(),
            date: make_date("2026-08-30"),
            check_in: Some(make_datetime("2026-08-30 09:00:00")),
            break_start: None,
            check_out: Some(make_datetime("2026-08-30 17:00:00")),
            break_minutes: Some(30.4),
            net_hours: Some(7.5),
        };

        let fields = employee_export_rows(std::slice::from_ref(&row));
        assert_eq!(
            fields[0],
            vec![
                "2026-08-30",
                "2026-08-30 09:00:00",
                "2026-08-30 17:00:00",
                "30",
                "7.50",
                "Completed"
            ]
        );
    }
}
