use anyhow::Result;
use chrono::NaiveDate;
use moka::future::Cache;
use once_cell::sync::Lazy;
use serde::Serialize;
use sqlx::MySqlPool;
use std::time::Duration;
use utoipa::ToSchema;

use crate::core::report::{self, DashboardStats, RosterRow};
use crate::store;

/// The admin dashboard is polled by the UI; a short TTL absorbs the
/// polling load while attendance actions invalidate eagerly.
const CACHE_TTL_SECS: u64 = 15;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardPayload {
    pub stats: DashboardStats,
    pub today_attendance: Vec<RosterRow>,
}

static DASHBOARD_CACHE: Lazy<Cache<NaiveDate, DashboardPayload>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(8) // one live entry plus day-boundary stragglers
        .time_to_live(Duration::from_secs(CACHE_TTL_SECS))
        .build()
});

pub async fn get(date: NaiveDate) -> Option<DashboardPayload> {
    DASHBOARD_CACHE.get(&date).await
}

pub async fn put(date: NaiveDate, payload: DashboardPayload) {
    DASHBOARD_CACHE.insert(date, payload).await;
}

/// Drop the cached payload after an attendance mutation so the next
/// dashboard poll sees the new state.
pub async fn invalidate(date: NaiveDate) {
    DASHBOARD_CACHE.invalidate(&date).await;
}

/// Build the dashboard payload for a date from the store.
pub async fn compute(pool: &MySqlPool, date: NaiveDate) -> sqlx::Result<DashboardPayload> {
    let employees = store::employee::list_active(pool).await?;
    let records = store::attendance::list_for_date(pool, date).await?;

    Ok(DashboardPayload {
        stats: report::dashboard_stats(&employees, &records),
        today_attendance: report::daily_roster(&employees, &records),
    })
}

/// Prefill today's payload at startup so the first dashboard hit is warm.
pub async fn warmup_dashboard_cache(pool: &MySqlPool, date: NaiveDate) -> Result<()> {
    let payload = compute(pool, date).await?;
    let present = payload.stats.present_today;

    put(date, payload).await;

    log::info!(
        "Dashboard cache warmup complete: {} present on {}",
        present,
        date
    );
    Ok(())
}
