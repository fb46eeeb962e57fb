use sqlx::MySqlPool;

use crate::model::employee::EmployeeName;

/// Active employees as (id, display name), the left side of every
/// roster join.
pub async fn list_active(pool: &MySqlPool) -> sqlx::Result<Vec<EmployeeName>> {
    sqlx::query_as::<_, EmployeeName>(
        "SELECT id, CONCAT(first_name, ' ', last_name) AS name \
         FROM employees WHERE is_active = 1 ORDER BY name",
    )
    .fetch_all(pool)
    .await
}
