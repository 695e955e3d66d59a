//! Request pacing for the TMDB API.

use std::time::{Duration, Instant};

/// Default minimum interval between requests (~40 req/s).
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(25);

/// Keeps a minimum gap between consecutive TMDB requests.
///
/// TMDB allows roughly 40 requests per second. A live search session can
/// issue a details and a credits request back to back, so requests made
/// through one client are spaced by `min_interval`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbRateLimiter {
    /// Minimum interval between requests.
    min_interval: Duration,
    /// When the previous request was let through.
    last_request: Option<Instant>,
}

impl TmdbRateLimiter {
    /// Creates a limiter with the given minimum interval.
    pub(crate) const fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    /// Creates a limiter with the default interval (25ms).
    pub(crate) const fn default_interval() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }

    /// Sleeps until the next request may be sent.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let remaining = self.min_interval.saturating_sub(last.elapsed());
            if !remaining.is_zero() {
                tokio::time::sleep(remaining).await;
            }
        }

        self.last_request = Some(Instant::now());
    }
}
