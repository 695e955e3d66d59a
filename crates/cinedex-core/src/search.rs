//! Debounced movie search with search accounting.
//!
//! A [`SearchSession`] wires a [`Debouncer`] to a [`FetchController`]: the
//! settled query becomes the controller's key, and every settled, non-empty
//! result list is reported to a [`SearchMetrics`] backend once.

#![allow(clippy::future_not_send)]

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use cinedex_api::tmdb::{DEFAULT_LANGUAGE, MovieSummary, SearchMovieParams, TmdbApi};
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::debounce::{DEFAULT_DEBOUNCE, Debouncer};
use crate::fetch::{FetchController, FetchState};

/// Search accounting backend.
///
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(SearchMetrics: Send)]
pub trait LocalSearchMetrics {
    /// Records one search for `query` whose first result is `movie`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot store the record.
    async fn record_search(&self, query: &str, movie: &MovieSummary) -> Result<()>;
}

/// Options for a search session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Quiet window before typed input is searched.
    pub debounce: Duration,
    /// Response language.
    pub language: String,
    /// Optional release year filter.
    pub year: Option<u32>,
    /// Report settled results to the metrics backend.
    pub record: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            language: String::from(DEFAULT_LANGUAGE),
            year: None,
            record: true,
        }
    }
}

/// Builds the search producer for a [`FetchController`].
///
/// A blank query resolves to an empty list without calling `api`, and
/// does so without suspending.
pub fn movie_search<A>(
    api: Arc<A>,
    options: &SearchOptions,
) -> impl Fn(String) -> BoxFuture<'static, Result<Vec<MovieSummary>>> + Send + Sync + 'static
where
    A: TmdbApi + Send + Sync + 'static,
{
    let language = options.language.clone();
    let year = options.year;
    move |query: String| search_movies(Arc::clone(&api), query, language.clone(), year).boxed()
}

/// Runs one search.
async fn search_movies<A>(
    api: Arc<A>,
    query: String,
    language: String,
    year: Option<u32>,
) -> Result<Vec<MovieSummary>>
where
    A: TmdbApi + Send + Sync,
{
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let mut params = SearchMovieParams::new(query).language(language);
    if let Some(year) = year {
        params = params.year(year);
    }
    tracing::debug!(query, "searching movies");
    let response = api
        .search_movie(&params)
        .await
        .context("Failed to fetch movies")?;
    Ok(response.results)
}

/// Reports settled search results once per (query, result ids) pairing.
pub struct SearchAccounting<M> {
    metrics: Arc<M>,
    last: Mutex<Option<(String, Vec<u64>)>>,
}

impl<M> SearchAccounting<M>
where
    M: SearchMetrics + Send + Sync + 'static,
{
    /// Creates accounting over `metrics`.
    #[must_use]
    pub const fn new(metrics: Arc<M>) -> Self {
        Self {
            metrics,
            last: Mutex::new(None),
        }
    }

    /// Inspects a state published for `query` and reports it if eligible.
    ///
    /// Returns `true` when a report was dispatched. The report runs on a
    /// spawned task; its failures are logged only.
    pub fn observe(&self, query: &str, state: &FetchState<Vec<MovieSummary>>) -> bool {
        let Some(movie) = self.claim(query, state) else {
            return false;
        };

        let metrics = Arc::clone(&self.metrics);
        let query = query.to_owned();
        tokio::spawn(async move {
            if let Err(e) = metrics.record_search(&query, &movie).await {
                tracing::warn!(query, error = format!("{e:#}"), "failed to record search");
            }
        });
        true
    }

    /// Marks `(query, result ids)` as reported and returns the movie to
    /// report, or `None` when the state is not eligible or was already
    /// reported.
    ///
    /// Loading and failed states, blank queries and empty result lists
    /// are never eligible.
    pub fn claim(
        &self,
        query: &str,
        state: &FetchState<Vec<MovieSummary>>,
    ) -> Option<MovieSummary> {
        if state.loading || state.error.is_some() || query.trim().is_empty() {
            return None;
        }
        let movies = state.data.as_deref()?;
        let first = movies.first()?;

        let ids: Vec<u64> = movies.iter().map(|movie| movie.id).collect();
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if last
            .as_ref()
            .is_some_and(|(q, seen)| q == query && *seen == ids)
        {
            return None;
        }
        *last = Some((query.to_owned(), ids));
        drop(last);

        Some(first.clone())
    }

    /// Returns the metrics backend.
    #[must_use]
    pub fn metrics(&self) -> &M {
        &self.metrics
    }
}

impl<M> fmt::Debug for SearchAccounting<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchAccounting")
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

/// Typed query in, settled search results out.
pub struct SearchSession {
    query: Debouncer<String>,
    results: Arc<FetchController<String, Vec<MovieSummary>>>,
    driver: JoinHandle<()>,
}

impl SearchSession {
    /// Starts a session with an empty query.
    #[must_use]
    #[instrument(skip_all)]
    pub fn spawn<A, M>(api: Arc<A>, metrics: Arc<M>, options: &SearchOptions) -> Self
    where
        A: TmdbApi + Send + Sync + 'static,
        M: SearchMetrics + Send + Sync + 'static,
    {
        let query = Debouncer::spawn(String::new(), options.debounce);
        let producer = movie_search(api, options);
        let results = Arc::new(if options.record {
            let accounting = SearchAccounting::new(metrics);
            FetchController::observed(
                String::new(),
                producer,
                move |query: &String, state: &FetchState<Vec<MovieSummary>>| {
                    accounting.observe(query, state);
                },
            )
        } else {
            FetchController::new(String::new(), producer)
        });
        let driver = tokio::spawn(drive(query.subscribe(), Arc::clone(&results)));
        Self {
            query,
            results,
            driver,
        }
    }

    /// Replaces the typed query. Returns `false` when it is unchanged.
    pub fn input(&self, raw: impl Into<String>) -> bool {
        self.query.push(raw.into())
    }

    /// Searches the typed query now, skipping the quiet window.
    pub fn submit(&self) {
        self.query.flush();
        self.results.set_key(self.query.settled());
    }

    /// Returns the typed query.
    #[must_use]
    pub fn raw_query(&self) -> String {
        self.query.raw()
    }

    /// Returns the query the current results belong to.
    #[must_use]
    pub fn settled_query(&self) -> String {
        self.results.key()
    }

    /// Returns a snapshot of the search results.
    #[must_use]
    pub fn state(&self) -> FetchState<Vec<MovieSummary>> {
        self.results.state()
    }

    /// Subscribes to result changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FetchState<Vec<MovieSummary>>> {
        self.results.subscribe()
    }

    /// Runs the current query again.
    pub fn refetch(&self) {
        self.results.refetch();
    }

    /// Clears the results.
    pub fn reset(&self) {
        self.results.reset();
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

impl fmt::Debug for SearchSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchSession")
            .field("query", &self.query)
            .field("results", &self.results)
            .finish_non_exhaustive()
    }
}

/// Feeds settled queries into the controller.
async fn drive(
    mut settled: watch::Receiver<String>,
    results: Arc<FetchController<String, Vec<MovieSummary>>>,
) {
    while settled.changed().await.is_ok() {
        let query = settled.borrow_and_update().clone();
        results.set_key(query);
    }
}
