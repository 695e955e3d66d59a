//! Search metrics CRUD operations.

use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use cinedex_api::tmdb::MovieSummary;
use cinedex_api::tmdb::images::poster_url;
use cinedex_core::SearchMetrics;
use rusqlite::{Connection, OptionalExtension};
use unicode_normalization::UnicodeNormalization;

/// One row of the search metrics table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMetric {
    /// Normalized search term.
    pub search_term: String,
    /// Number of settled searches for the term.
    pub count: u32,
    /// TMDB ID of the first result of the latest search.
    pub movie_id: u64,
    /// Title of that movie.
    pub title: String,
    /// Poster URL of that movie.
    pub poster_url: String,
    /// RFC 3339 timestamp of the first search.
    pub first_searched_at: String,
    /// RFC 3339 timestamp of the latest search.
    pub last_searched_at: String,
}

/// Normalizes a search term: NFKC, trimmed, lowercase.
#[must_use]
pub fn normalize_term(query: &str) -> String {
    query.nfkc().collect::<String>().trim().to_lowercase()
}

/// Records one search at the current time.
///
/// # Errors
///
/// Returns an error if the term is blank or the database operation fails.
pub fn record_search(conn: &Connection, query: &str, movie: &MovieSummary) -> Result<()> {
    record_search_at(conn, query, movie, Utc::now())
}

/// Records one search at `at`.
///
/// Increments `count` for an existing term and refreshes the movie
/// columns and `last_searched_at`; inserts a new row with `count = 1`
/// otherwise. `first_searched_at` is only written on insert.
///
/// # Errors
///
/// Returns an error if the term is blank or the database operation fails.
pub fn record_search_at(
    conn: &Connection,
    query: &str,
    movie: &MovieSummary,
    at: DateTime<Utc>,
) -> Result<()> {
    let term = normalize_term(query);
    anyhow::ensure!(!term.is_empty(), "search term is blank");

    let poster = poster_url(movie.poster_path.as_deref());
    let timestamp = at.to_rfc3339_opts(SecondsFormat::Micros, true);

    conn.execute(
        "INSERT INTO search_metrics (
            search_term, count, movie_id, title, poster_url,
            first_searched_at, last_searched_at
        ) VALUES (?1, 1, ?2, ?3, ?4, ?5, ?5)
        ON CONFLICT(search_term) DO UPDATE SET
            count = search_metrics.count + 1,
            movie_id = excluded.movie_id,
            title = excluded.title,
            poster_url = excluded.poster_url,
            last_searched_at = excluded.last_searched_at",
        rusqlite::params![term, movie.id, movie.title, poster, timestamp],
    )
    .with_context(|| format!("failed to record search for {term:?}"))?;

    tracing::debug!(term, movie_id = movie.id, "recorded search");
    Ok(())
}

/// Loads the most searched terms, most recent first on equal counts.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn load_trending(conn: &Connection, limit: u32) -> Result<Vec<SearchMetric>> {
    let mut stmt = conn
        .prepare(
            "SELECT search_term, count, movie_id, title, poster_url,
                    first_searched_at, last_searched_at
             FROM search_metrics
             ORDER BY count DESC, last_searched_at DESC
             LIMIT ?1",
        )
        .context("failed to prepare trending query")?;

    let rows = stmt
        .query_map([limit], map_row)
        .context("failed to query trending searches")?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.context("failed to read search metric row")?);
    }
    Ok(result)
}

/// Loads the metric for one term (normalized before lookup).
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn load_search_metric(conn: &Connection, query: &str) -> Result<Option<SearchMetric>> {
    conn.query_row(
        "SELECT search_term, count, movie_id, title, poster_url,
                first_searched_at, last_searched_at
         FROM search_metrics
         WHERE search_term = ?1",
        [normalize_term(query)],
        map_row,
    )
    .optional()
    .context("failed to query search metric")
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SearchMetric> {
    Ok(SearchMetric {
        search_term: row.get(0)?,
        count: row.get(1)?,
        movie_id: row.get(2)?,
        title: row.get(3)?,
        poster_url: row.get(4)?,
        first_searched_at: row.get(5)?,
        last_searched_at: row.get(6)?,
    })
}

/// [`SearchMetrics`] backend over a `SQLite` connection.
#[derive(Debug)]
pub struct SqliteSearchMetrics {
    conn: Mutex<Connection>,
}

impl SqliteSearchMetrics {
    /// Wraps an open (migrated) connection.
    #[must_use]
    pub const fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl SearchMetrics for SqliteSearchMetrics {
    async fn record_search(&self, query: &str, movie: &MovieSummary) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        record_search(&conn, query, movie)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::TimeZone;

    use super::*;
    use crate::migrations::run_migrations;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn movie(id: u64, title: &str, poster_path: Option<&str>) -> MovieSummary {
        MovieSummary {
            id,
            title: String::from(title),
            poster_path: poster_path.map(String::from),
            ..MovieSummary::default()
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_normalize_term() {
        assert_eq!(normalize_term("  Dune "), "dune");
        assert_eq!(normalize_term("ＤＵＮＥ"), "dune");
        assert_eq!(normalize_term("Amélie"), "amélie");
        assert_eq!(normalize_term("   "), "");
    }

    #[test]
    fn test_first_search_inserts_row() {
        // Arrange
        let conn = setup_db();
        let dune = movie(438_631, "Dune", Some("/d5NXSklXo0qyIYkgV94XAgMIckC.jpg"));

        // Act
        record_search_at(&conn, "Dune", &dune, at(9)).unwrap();

        // Assert
        let metric = load_search_metric(&conn, "dune").unwrap().unwrap();
        assert_eq!(metric.search_term, "dune");
        assert_eq!(metric.count, 1);
        assert_eq!(metric.movie_id, 438_631);
        assert_eq!(metric.title, "Dune");
        assert_eq!(
            metric.poster_url,
            "https://image.tmdb.org/t/p/w500/d5NXSklXo0qyIYkgV94XAgMIckC.jpg"
        );
        assert_eq!(metric.first_searched_at, "2026-03-01T09:00:00.000000Z");
        assert_eq!(metric.last_searched_at, "2026-03-01T09:00:00.000000Z");
    }

    #[test]
    fn test_repeat_search_increments_and_refreshes() {
        // Arrange
        let conn = setup_db();
        record_search_at(&conn, "dune", &movie(438_631, "Dune", None), at(9)).unwrap();

        // Act
        let sequel = movie(693_134, "Dune: Part Two", None);
        record_search_at(&conn, "Dune ", &sequel, at(10)).unwrap();
        record_search_at(&conn, "DUNE", &sequel, at(11)).unwrap();

        // Assert
        let metric = load_search_metric(&conn, "DUNE").unwrap().unwrap();
        assert_eq!(metric.count, 3);
        assert_eq!(metric.movie_id, 693_134);
        assert_eq!(metric.title, "Dune: Part Two");
        assert_eq!(metric.poster_url, cinedex_api::tmdb::images::POSTER_PLACEHOLDER);
        assert_eq!(metric.first_searched_at, "2026-03-01T09:00:00.000000Z");
        assert_eq!(metric.last_searched_at, "2026-03-01T11:00:00.000000Z");
    }

    #[test]
    fn test_blank_term_is_rejected() {
        // Arrange
        let conn = setup_db();

        // Act
        let result = record_search(&conn, "  ", &movie(1, "x", None));

        // Assert
        assert!(result.is_err());
        assert!(load_trending(&conn, 10).unwrap().is_empty());
    }

    #[test]
    fn test_load_search_metric_missing() {
        // Arrange
        let conn = setup_db();

        // Act
        let metric = load_search_metric(&conn, "heat").unwrap();

        // Assert
        assert!(metric.is_none());
    }

    #[test]
    fn test_load_trending_order_and_limit() {
        // Arrange
        let conn = setup_db();
        let dune = movie(438_631, "Dune", None);
        let alien = movie(348, "Alien", None);
        let heat = movie(949, "Heat", None);
        record_search_at(&conn, "dune", &dune, at(1)).unwrap();
        record_search_at(&conn, "dune", &dune, at(2)).unwrap();
        record_search_at(&conn, "alien", &alien, at(3)).unwrap();
        record_search_at(&conn, "heat", &heat, at(4)).unwrap();

        // Act
        let all = load_trending(&conn, 10).unwrap();
        let top = load_trending(&conn, 2).unwrap();

        // Assert
        let terms: Vec<&str> = all.iter().map(|m| m.search_term.as_str()).collect();
        assert_eq!(terms, vec!["dune", "heat", "alien"]);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].count, 2);
    }

    #[tokio::test]
    async fn test_sqlite_search_metrics_backend() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let metrics = SqliteSearchMetrics::new(crate::open_db(Some(dir.path())).unwrap());
        let dune = movie(438_631, "Dune", None);

        // Act
        metrics.record_search("dune", &dune).await.unwrap();
        metrics.record_search("Dune", &dune).await.unwrap();

        // Assert
        let conn = crate::open_db(Some(dir.path())).unwrap();
        let metric = load_search_metric(&conn, "dune").unwrap().unwrap();
        assert_eq!(metric.count, 2);
    }
}
