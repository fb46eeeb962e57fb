//! All SQL touching the attendance table. Mutating handlers work inside
//! a transaction: the record row is locked with `FOR UPDATE`, the state
//! machine runs on the loaded value, and `save` writes the result back,
//! so two concurrent actions on the same (employee, date) serialize and
//! the loser sees the already-mutated state. Check-in itself is covered
//! by the UNIQUE (employee_id, date) index.

use chrono::NaiveDate;
use sqlx::{MySql, MySqlPool, Transaction};

use crate::core::report::ExportJoinRow;
use crate::model::attendance::AttendanceRecord;

const RECORD_COLUMNS: &str = "id, employee_id, date, check_in, break_start, break_minutes, \
                              check_out, gross_hours, net_hours, work_note";

/// True when the error is the MySQL duplicate-key violation (SQLSTATE
/// 23000), i.e. a concurrent check-in won the insert race.
pub fn is_duplicate_entry(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000"))
}

/// Today's record without locking, for read-only endpoints.
pub async fn fetch_today(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
) -> sqlx::Result<Option<AttendanceRecord>> {
    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?"
    );

    sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(employee_id)
        .bind(date)
        .fetch_optional(pool)
        .await
}

/// Today's record locked for the duration of the transaction.
pub async fn fetch_today_for_update(
    tx: &mut Transaction<'_, MySql>,
    employee_id: u64,
    date: NaiveDate,
) -> sqlx::Result<Option<AttendanceRecord>> {
    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ? FOR UPDATE"
    );

    sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&mut **tx)
        .await
}

/// Insert a freshly checked-in record; returns the assigned id.
pub async fn insert_checked_in(
    tx: &mut Transaction<'_, MySql>,
    record: &AttendanceRecord,
) -> sqlx::Result<u64> {
    let result = sqlx::query(
        "INSERT INTO attendance (employee_id, date, check_in, break_minutes) VALUES (?, ?, ?, ?)",
    )
    .bind(record.employee_id)
    .bind(record.date)
    .bind(record.check_in)
    .bind(record.break_minutes)
    .execute(&mut **tx)
    .await?;

    Ok(result.last_insert_id())
}

/// Write back the mutable columns after a transition. `employee_id` and
/// `date` are immutable; `check_in` is set only at insert.
pub async fn save(
    tx: &mut Transaction<'_, MySql>,
    record: &AttendanceRecord,
) -> sqlx::Result<()> {
    sqlx::query(
        "UPDATE attendance \
         SET break_start = ?, break_minutes = ?, check_out = ?, \
             gross_hours = ?, net_hours = ?, work_note = ? \
         WHERE id = ?",
    )
    .bind(record.break_start)
    .bind(record.break_minutes)
    .bind(record.check_out)
    .bind(record.gross_hours)
    .bind(record.net_hours)
    .bind(record.work_note.as_deref())
    .bind(record.id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Every record for one date (roster input).
pub async fn list_for_date(
    pool: &MySqlPool,
    date: NaiveDate,
) -> sqlx::Result<Vec<AttendanceRecord>> {
    let sql = format!("SELECT {RECORD_COLUMNS} FROM attendance WHERE date = ?");

    sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(date)
        .fetch_all(pool)
        .await
}

/// The full attendance table (admin history view input).
pub async fn list_all(pool: &MySqlPool) -> sqlx::Result<Vec<AttendanceRecord>> {
    let sql = format!("SELECT {RECORD_COLUMNS} FROM attendance");

    sqlx::query_as::<_, AttendanceRecord>(&sql).fetch_all(pool).await
}

/// Inner join of records to employee names within an inclusive date
/// range, optionally narrowed to one employee. Ordered by date ascending
/// then name, ready for CSV serialization.
pub async fn list_range_joined(
    pool: &MySqlPool,
    employee_id: Option<u64>,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> sqlx::Result<Vec<ExportJoinRow>> {
    let mut sql = String::from(
        "SELECT CONCAT(e.first_name, ' ', e.last_name) AS employee_name, \
                a.date, a.check_in, a.break_start, a.check_out, \
                a.break_minutes, a.net_hours \
         FROM attendance a \
         JOIN employees e ON e.id = a.employee_id \
         WHERE a.date BETWEEN ? AND ?",
    );
    if employee_id.is_some() {
        sql.push_str(" AND a.employee_id = ?");
    }
    sql.push_str(" ORDER BY a.date ASC, employee_name ASC");

    let mut query = sqlx::query_as::<_, ExportJoinRow>(&sql)
        .bind(start_date)
        .bind(end_date);
    if let Some(id) = employee_id {
        query = query.bind(id);
    }

    query.fetch_all(pool).await
}
