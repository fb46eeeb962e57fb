pub mod csv;
pub mod dashboard_cache;
pub mod db_utils;
pub mod email_filter;
