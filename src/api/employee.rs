use crate::auth::auth::AuthUser;
use crate::model::employee::Employee;
use crate::utils::db_utils::{build_update_sql, execute_update};
use crate::utils::email_filter;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::ToSchema;
use uuid::Uuid;

/// Columns the dynamic PUT may touch. Everything else on the employee
/// row is server-managed.
const UPDATABLE_COLUMNS: &[&str] = &[
    "employee_code",
    "first_name",
    "last_name",
    "email",
    "phone",
    "hire_date",
    "is_active",
];

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    /// Generated when omitted
    #[schema(example = "EMP-3000", value_type = Option<String>)]
    pub employee_code: Option<String>,
    #[schema(example = "John", value_type = String)]
    pub first_name: String,
    #[schema(example = "Doe", value_type = String)]
    pub last_name: String,
    #[schema(example = "john@email.com", format = "email", value_type = String)]
    pub email: String,
    #[schema(example = "+8801712345678", value_type = Option<String>)]
    pub phone: Option<String>,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub hire_date: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    #[schema(
    example = json!([{
        "id": 1,
        "employee_code": "EMP-001",
        "first_name": "John",
        "last_name": "Doe",
        "email": "john.doe@company.com",
        "phone": "+8801712345678",
        "hire_date": "2024-01-01",
        "is_active": true
    }])
)]
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 5)]
    pub per_page: u32,
    #[schema(example = 10)]
    pub total: i64,
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = CreateEmployee,
    responses(
        (status = 200, description = "Employee created successfully", body = Object, example = json!({
            "message": "Employee created successfully"
        })),
        (status = 400, description = "Duplicate email", body = Object, example = json!({
            "message": "Employee with this email already exists"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let email = payload.email.trim().to_lowercase();

    // Filter hit means "maybe taken": confirm against the table before
    // rejecting. A miss is definitive and skips the SELECT.
    if email_filter::might_exist(&email) {
        let taken = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE email = ?")
            .bind(&email)
            .fetch_one(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Duplicate email check failed");
                ErrorInternalServerError("Internal Server Error")
            })?;

        if taken > 0 {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Employee with this email already exists"
            })));
        }
    }

    let employee_code = payload
        .employee_code
        .clone()
        .unwrap_or_else(|| format!("EMP-{}", Uuid::new_v4()));

    let result = sqlx::query(
        "INSERT INTO employees \
         (employee_code, first_name, last_name, email, phone, hire_date, is_active) \
         VALUES (?, ?, ?, ?, ?, ?, 1)",
    )
    .bind(&employee_code)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&email)
    .bind(payload.phone.as_deref())
    .bind(payload.hire_date)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            email_filter::insert(&email);
            Ok(HttpResponse::Ok().json(json!({
                "message": "Employee created successfully"
            })))
        }
        Err(e) => {
            error!(error = %e, "Failed to create employee");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Something went wrong, Contact with system admin"
            })))
        }
    }
}

// -------------------- Handler --------------------

#[utoipa::path(
    get,
    path = "/api/v1/employees",
    params(
        ("page",  Query, description = "Page number"),
        ("per_page", Query, description = "Items per page"),
        ("is_active", Query, description = "Filter by active flag"),
        ("search", Query, description = "Search by name or email")
    ),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse)
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let like = query.search.as_ref().map(|s| format!("%{}%", s));

    if query.is_active.is_some() {
        conditions.push("is_active = ?");
    }
    if like.is_some() {
        conditions.push("(first_name LIKE ? OR last_name LIKE ? OR email LIKE ?)");
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) as total FROM employees {}", where_clause);
    debug!(sql = %count_sql, "Counting employees");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(is_active) = query.is_active {
        count_query = count_query.bind(is_active);
    }
    if let Some(like) = &like {
        count_query = count_query.bind(like).bind(like).bind(like);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count employees");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT * FROM employees {} ORDER BY id DESC LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, page, per_page, offset, "Fetching employees");

    let mut data_query = sqlx::query_as::<_, Employee>(&data_sql);
    if let Some(is_active) = query.is_active {
        data_query = data_query.bind(is_active);
    }
    if let Some(like) = &like {
        data_query = data_query.bind(like).bind(like).bind(like);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let employees = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch employees");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/v1/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee updated successfully"),
        (status = 400, description = "Unknown or read-only field"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();
    let mut body = body.into_inner();
    let new_email = normalize_email_field(&mut body);

    // An email change must resync the duplicate filter, so the current
    // address is read up front the same way delete does.
    let old_email = if new_email.is_some() {
        sqlx::query_scalar::<_, String>("SELECT email FROM employees WHERE id = ?")
            .bind(employee_id)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, employee_id, "Failed to fetch employee for update");
                ErrorInternalServerError("Internal Server Error")
            })?
    } else {
        None
    };

    let update = build_update_sql("employees", &body, UPDATABLE_COLUMNS, "id", employee_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().body("Employee not found"));
    }

    if let Some(new_email) = new_email {
        if let Some(old_email) = old_email {
            if old_email.trim().to_lowercase() != new_email {
                email_filter::remove(&old_email);
            }
        }
        email_filter::insert(&new_email);
    }

    Ok(HttpResponse::Ok().body("Employee updated successfully"))
}

/// Lowercase a pending email change in place so the stored value matches
/// what the duplicate filter tracks; returns the normalized address when
/// the payload carries one.
fn normalize_email_field(body: &mut Value) -> Option<String> {
    let field = body.get_mut("email")?;
    let normalized = field.as_str()?.trim().to_lowercase();
    *field = Value::String(normalized.clone());
    Some(normalized)
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/v1/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error", body = Object)
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let employee_id = path.into_inner();

    let email = sqlx::query_scalar::<_, String>("SELECT email FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to fetch employee for delete");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(email) = email else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    };

    let result = sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(employee_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) => {
            if res.rows_affected() == 0 {
                return Ok(HttpResponse::NotFound().json(json!({
                    "message": "Employee not found"
                })));
            }

            email_filter::remove(&email);

            Ok(HttpResponse::Ok().json(json!({
                "message": "Successfully deleted"
            })))
        }

        Err(e) => {
            error!(error = %e, employee_id, "Failed to delete employee");

            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/v1/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id: u64 = path.into_inner();

    let employee = sqlx::query_as::<_, Employee>(
        "SELECT id, employee_code, first_name, last_name, email, phone, hire_date, is_active \
         FROM employees WHERE id = ?",
    )
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to fetch employee");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match employee {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Employee not found"
        }))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_change_is_normalized_and_resyncs_the_filter() {
        email_filter::insert("old.addr@company.com");

        let mut body = json!({ "email": "  New.Addr@Company.com ", "phone": "123" });
        let new_email = normalize_email_field(&mut body).unwrap();
        assert_eq!(new_email, "new.addr@company.com");
        assert_eq!(body["email"], "new.addr@company.com");

        // What update_employee does after a successful write: the old
        // address leaves the filter, the new one enters, so a later
        // create with the new address cannot skip the duplicate check.
        email_filter::remove("old.addr@company.com");
        email_filter::insert(&new_email);
        assert!(email_filter::might_exist("NEW.ADDR@company.com"));
        assert!(!email_filter::might_exist("old.addr@company.com"));
    }

    #[test]
    fn payload_without_email_is_left_untouched() {
        let mut body = json!({ "phone": "123" });
        assert!(normalize_email_field(&mut body).is_none());
        assert_eq!(body, json!({ "phone": "123" }));
    }
}
