use crate::auth::auth::AuthUser;
use crate::core::{clock, report};
use crate::store;
use crate::utils::{csv, dashboard_cache};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams)]
pub struct RosterQuery {
    /// Roster date; omit for the full history listing
    #[param(value_type = Option<String>, format = "date", example = "2026-08-30")]
    pub date: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams)]
pub struct ReportQuery {
    /// Numeric employee id, or "all" (the default) for everyone
    #[param(example = "all")]
    pub employee_id: Option<String>,
    #[param(value_type = Option<String>, format = "date", example = "2026-08-01")]
    pub start_date: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = "date", example = "2026-08-31")]
    pub end_date: Option<NaiveDate>,
}

/// Admin attendance view: roster for one date, or the full history when
/// no date is given.
#[utoipa::path(
    get,
    path = "/api/v1/admin/attendance",
    params(RosterQuery),
    responses(
        (status = 200, description = "Attendance rows", body = Object, example = json!({
            "attendance": [{
                "employee_id": 1,
                "employee_name": "John Doe",
                "date": "2026-08-30",
                "check_in": "2026-08-30T09:00:00",
                "check_out": null,
                "on_break": false,
                "status": "Working",
                "work_note": null
            }]
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn attendance_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<RosterQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employees = store::employee::list_active(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to list active employees");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let rows = match query.date {
        Some(date) => {
            let records = store::attendance::list_for_date(pool.get_ref(), date)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, %date, "Failed to list records for date");
                    actix_web::error::ErrorInternalServerError("Internal Server Error")
                })?;
            report::daily_roster(&employees, &records)
        }
        None => {
            let records = store::attendance::list_all(pool.get_ref()).await.map_err(|e| {
                tracing::error!(error = %e, "Failed to list attendance history");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;
            report::attendance_history(&employees, &records)
        }
    };

    Ok(HttpResponse::Ok().json(json!({ "attendance": rows })))
}

/// Admin dashboard: head-counts plus today's roster. Served from a
/// short-lived cache; attendance actions invalidate it.
#[utoipa::path(
    get,
    path = "/api/v1/admin/dashboard",
    responses(
        (status = 200, description = "Dashboard payload", body = Object, example = json!({
            "stats": { "total_employees": 25, "present_today": 18, "absent_today": 7 },
            "today_attendance": []
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn dashboard(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let today = clock::effective_date(clock::now());

    if let Some(payload) = dashboard_cache::get(today).await {
        return Ok(HttpResponse::Ok().json(payload));
    }

    let payload = dashboard_cache::compute(pool.get_ref(), today).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to build dashboard payload");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;
    dashboard_cache::put(today, payload.clone()).await;

    Ok(HttpResponse::Ok().json(payload))
}

/// Company-wide (or single-employee) attendance report as CSV.
#[utoipa::path(
    get,
    path = "/api/v1/admin/reports/attendance",
    params(ReportQuery),
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
    tag = "Admin"
)]
pub async fn export_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

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

    let employee_id = match query.employee_id.as_deref() {
        None | Some("all") => None,
        Some(raw) => match raw.parse::<u64>() {
            Ok(id) => Some(id),
            Err(_) => {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "message": "employee_id must be a number or \"all\""
                })));
            }
        },
    };

    let rows = store::attendance::list_range_joined(pool.get_ref(), employee_id, start_date, end_date)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Admin CSV export failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let body = csv::build_csv(
        &report::ADMIN_EXPORT_HEADER,
        &report::admin_export_rows(&rows),
    );

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            "Content-Disposition",
            "attachment; filename=attendance-report.csv",
        ))
        .body(body))
}
