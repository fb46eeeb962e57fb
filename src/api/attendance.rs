use crate::auth::auth::AuthUser;
use crate::core::{clock, report, state_machine};
use crate::store;
use crate::utils::{csv, dashboard_cache};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct WorkNoteReq {
    #[schema(example = "Finished the quarterly report")]
    pub note: String,
}

#[derive(Serialize, ToSchema)]
pub struct TodayStatus {
    #[schema(example = true)]
    pub checked_in: bool,
    #[schema(example = false)]
    pub checked_out: bool,
    #[schema(example = false)]
    pub on_break: bool,
    #[schema(example = true)]
    pub break_taken: bool,
    #[schema(example = "Working")]
    pub status: String,
    #[schema(example = "Finished the quarterly report", nullable = true)]
    pub work_note: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct ExportQuery {
    /// Inclusive range start
    #[param(value_type = Option<String>, format = "date", example = "2026-08-01")]
    pub start_date: Option<NaiveDate>,
    /// Inclusive range end
    #[param(value_type = Option<String>, format = "date", example = "2026-08-31")]
    pub end_date: Option<NaiveDate>,
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance",
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully"
        })),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_profile()?;
    let now = clock::now();
    let today = clock::effective_date(now);

    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "Check-in failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let existing = store::attendance::fetch_today_for_update(&mut tx, employee_id, today)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Check-in failed to read record");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if let Err(err) = state_machine::ensure_can_check_in(existing.as_ref()) {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": err.to_string() })));
    }

    let record = state_machine::new_check_in(employee_id, today, now);
    if let Err(e) = store::attendance::insert_checked_in(&mut tx, &record).await {
        // A concurrent check-in can slip between the read and the
        // insert; the unique (employee_id, date) index catches it.
        if store::attendance::is_duplicate_entry(&e) {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Already checked in today"
            })));
        }

        tracing::error!(error = %e, employee_id, "Check-in failed");
        return Err(actix_web::error::ErrorInternalServerError(
            "Internal Server Error",
        ));
    }

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "Check-in failed to commit");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    dashboard_cache::invalidate(today).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Checked in successfully"
    })))
}

/// Check-out endpoint. Returns the derived gross/net hours.
#[utoipa::path(
    put,
    path = "/api/v1/attendance",
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully",
            "gross_hours": "8.00",
            "net_hours": "7.50"
        })),
        (status = 400, description = "Invalid check out", body = Object, example = json!({
            "message": "Invalid check out"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_profile()?;
    let now = clock::now();
    let today = clock::effective_date(now);

    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "Check-out failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(mut record) = store::attendance::fetch_today_for_update(&mut tx, employee_id, today)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Check-out failed to read record");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?
    else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": state_machine::TransitionError::InvalidCheckOut.to_string()
        })));
    };

    let summary = match state_machine::check_out(&mut record, now) {
        Ok(s) => s,
        Err(err) => {
            return Ok(HttpResponse::BadRequest().json(json!({ "message": err.to_string() })));
        }
    };

    store::attendance::save(&mut tx, &record).await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "Check-out failed to save record");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "Check-out failed to commit");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    dashboard_cache::invalidate(today).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Checked out successfully",
        "gross_hours": format!("{:.2}", summary.gross_hours),
        "net_hours": format!("{:.2}", summary.net_hours),
    })))
}

/// Start-break endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/break",
    responses(
        (status = 200, description = "Break started", body = Object, example = json!({
            "message": "Break started"
        })),
        (status = 400, description = "Invalid break start", body = Object, example = json!({
            "message": "Invalid break start"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn start_break(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_profile()?;
    let now = clock::now();
    let today = clock::effective_date(now);

    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "Start-break failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(mut record) = store::attendance::fetch_today_for_update(&mut tx, employee_id, today)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Start-break failed to read record");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?
    else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": state_machine::TransitionError::InvalidBreakStart.to_string()
        })));
    };

    if let Err(err) = state_machine::start_break(&mut record, now) {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": err.to_string() })));
    }

    store::attendance::save(&mut tx, &record).await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "Start-break failed to save record");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "Start-break failed to commit");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    dashboard_cache::invalidate(today).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Break started"
    })))
}

/// End-break endpoint. Returns the accumulated break minutes, rounded.
#[utoipa::path(
    put,
    path = "/api/v1/attendance/break",
    responses(
        (status = 200, description = "Break ended", body = Object, example = json!({
            "message": "Break ended",
            "break_minutes": 15
        })),
        (status = 400, description = "Invalid break end", body = Object, example = json!({
            "message": "Invalid break end"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn end_break(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_profile()?;
    let now = clock::now();
    let today = clock::effective_date(now);

    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "End-break failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(mut record) = store::attendance::fetch_today_for_update(&mut tx, employee_id, today)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "End-break failed to read record");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?
    else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": state_machine::TransitionError::InvalidBreakEnd.to_string()
        })));
    };

    let summary = match state_machine::end_break(&mut record, now) {
        Ok(s) => s,
        Err(err) => {
            return Ok(HttpResponse::BadRequest().json(json!({ "message": err.to_string() })));
        }
    };

    store::attendance::save(&mut tx, &record).await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "End-break failed to save record");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "End-break failed to commit");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    dashboard_cache::invalidate(today).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Break ended",
        "break_minutes": summary.total_minutes.round() as i64,
    })))
}

/// Set the free-text work note for today's record.
#[utoipa::path(
    put,
    path = "/api/v1/attendance/note",
    request_body = WorkNoteReq,
    responses(
        (status = 200, description = "Note saved", body = Object, example = json!({
            "message": "Note saved"
        })),
        (status = 400, description = "Note cannot be empty"),
        (status = 404, description = "No attendance record found for today"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn set_work_note(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<WorkNoteReq>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_profile()?;
    let now = clock::now();
    let today = clock::effective_date(now);

    let Some(note) = state_machine::normalize_note(&payload.note) else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Note cannot be empty"
        })));
    };

    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "Work-note failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(mut record) = store::attendance::fetch_today_for_update(&mut tx, employee_id, today)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Work-note failed to read record");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?
    else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "No attendance record found for today"
        })));
    };

    record.work_note = Some(note);

    store::attendance::save(&mut tx, &record).await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "Work-note failed to save record");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "Work-note failed to commit");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // The note shows up in the cached dashboard roster rows.
    dashboard_cache::invalidate(today).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Note saved"
    })))
}

/// Today's attendance snapshot for the signed-in employee.
#[utoipa::path(
    get,
    path = "/api/v1/attendance/today",
    responses(
        (status = 200, description = "Today's status", body = TodayStatus),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_profile()?;
    let today = clock::effective_date(clock::now());

    let record = store::attendance::fetch_today(pool.get_ref(), employee_id, today)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to fetch today's record");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let status = match record {
        Some(rec) => TodayStatus {
            checked_in: rec.check_in.is_some(),
            checked_out: rec.check_out.is_some(),
            on_break: rec.on_break(),
            break_taken: rec.break_taken(),
            status: rec.status().to_string(),
            work_note: rec.work_note,
        },
        None => TodayStatus {
            checked_in: false,
            checked_out: false,
            on_break: false,
            break_taken: false,
            status: crate::model::attendance::AttendanceStatus::Absent.to_string(),
            work_note: None,
        },
    };

    Ok(HttpResponse::Ok().json(status))
}

/// CSV export of the signed-in employee's own records in a date range.
#[utoipa::path(
    get,
    path = "/api/v1/attendance/export",
    params(ExportQuery),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv"),
        (status = 400, description = "Missing date range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn export_my_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ExportQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_profile()?;

    let (Some(start_date), Some(end_date)) = (query.start_date, query.end_date) else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Missing date range"
        })));
    };
    if start_date > end_date {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "start_date cannot be after end_date"
        })));
    }

    let rows =
        store::attendance::list_range_joined(pool.get_ref(), Some(employee_id), start_date, end_date)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, employee_id, "Employee CSV export failed");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

    let body = csv::build_csv(
        &report::EMPLOYEE_EXPORT_HEADER,
        &report::employee_export_rows(&rows),
    );

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            "Content-Disposition",
            "attachment; filename=my-attendance.csv",
        ))
        .body(body))
}
