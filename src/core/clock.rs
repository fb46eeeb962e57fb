use chrono::{NaiveDate, NaiveDateTime, Utc};

/// Wall-clock instant, UTC. Handlers read this once per request and
/// derive the effective date from the same instant, so "now" and
/// "today" can never straddle a day boundary within one action.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Calendar date a given instant is attributed to (UTC day boundary).
pub fn effective_date(instant: NaiveDateTime) -> NaiveDate {
    instant.date()
}
