//! Database module for search accounting.
//!
//! Uses `rusqlite` (bundled `SQLite`) to count how often each search
//! term was settled and which movie it surfaced first.

mod connection;
mod migrations;
/// Search metrics CRUD operations.
pub mod search_metrics;

#[allow(clippy::module_name_repetitions)]
pub use connection::{open_db, resolve_db_path};
#[allow(clippy::module_name_repetitions)]
pub use search_metrics::{
    SearchMetric, SqliteSearchMetrics, load_search_metric, load_trending, normalize_term,
    record_search, record_search_at,
};
