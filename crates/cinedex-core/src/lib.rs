//! Fetch pipeline for cinedex.
//!
//! Turns raw keystrokes into settled queries, runs remote lookups
//! against the latest query only, and reports successful searches.

/// Debounced value pipeline.
pub mod debounce;
/// Async fetch controller.
pub mod fetch;
/// Movie listing and detail producers.
pub mod lookup;
/// Search session and search accounting.
pub mod search;

pub use debounce::{DEFAULT_DEBOUNCE, Debouncer};
pub use fetch::{FetchController, FetchError, FetchState};
pub use lookup::{movie_credits, movie_details, popular_movies};
pub use search::{
    LocalSearchMetrics, SearchAccounting, SearchMetrics, SearchOptions, SearchSession,
    movie_search,
};
