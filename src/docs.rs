use crate::api::attendance::{TodayStatus, WorkNoteReq};
use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery};
use crate::core::report::{DashboardStats, RosterRow};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::employee::{Employee, EmployeeName};
use crate::utils::dashboard_cache::DashboardPayload;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Tracker API",
        version = "1.0.0",
        description = r#"
## Employee Attendance Tracker

This API powers a daily attendance tracker for a small company.

### 🔹 Key Features
- **Attendance Actions**
  - Check-in / check-out, break start/end, daily work note
- **Employee Self-Service**
  - Today's status snapshot, personal CSV export over a date range
- **Admin Views**
  - Daily roster, dashboard head-counts, company-wide CSV reports
- **Employee Management**
  - Create, update, list, and view employee profiles

### 🔐 Security
All endpoints require **JWT Bearer authentication** issued by the
company identity provider. Admin/HR roles gate the management and
reporting endpoints.

### 📦 Response Format
- JSON-based RESTful responses; CSV attachments for the exports

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::start_break,
        crate::api::attendance::end_break,
        crate::api::attendance::set_work_note,
        crate::api::attendance::today_status,
        crate::api::attendance::export_my_attendance,

        crate::api::admin::attendance_list,
        crate::api::admin::dashboard,
        crate::api::admin::export_report,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee
    ),
    components(
        schemas(
            AttendanceRecord,
            AttendanceStatus,
            TodayStatus,
            WorkNoteReq,
            RosterRow,
            DashboardStats,
            DashboardPayload,
            CreateEmployee,
            Employee,
            EmployeeName,
            EmployeeQuery,
            EmployeeListResponse
        )
    ),
    tags(
        (name = "Attendance", description = "Attendance action and self-service APIs"),
        (name = "Admin", description = "Roster, dashboard and reporting APIs"),
        (name = "Employee", description = "Employee management APIs"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
