//! Schema version management using `PRAGMA user_version`.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Current schema version.
const CURRENT_VERSION: u32 = 3;

/// Runs database migrations up to `CURRENT_VERSION`.
///
/// # Errors
///
/// Returns an error if any SQL statement fails.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version")?;

    if version < 1 {
        migrate_v1(conn).context("migration to v1 failed")?;
    }
    if version < 2 {
        migrate_v2(conn).context("migration to v2 failed")?;
    }
    if version < 3 {
        migrate_v3(conn).context("migration to v3 failed")?;
    }

    conn.pragma_update(None, "user_version", CURRENT_VERSION)
        .context("failed to update user_version")?;

    Ok(())
}

/// Migration to v1: create the `search_metrics` table.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS search_metrics (
            search_term       TEXT PRIMARY KEY,
            count             INTEGER NOT NULL DEFAULT 1,
            movie_id          INTEGER NOT NULL,
            title             TEXT NOT NULL,
            poster_url        TEXT NOT NULL
        );",
    )
    .context("failed to create search_metrics table")?;

    Ok(())
}

/// Migration to v2: add `last_searched_at` and the trending index.
fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "ALTER TABLE search_metrics ADD COLUMN last_searched_at TEXT NOT NULL DEFAULT '';
         CREATE INDEX IF NOT EXISTS idx_search_metrics_trending
             ON search_metrics(count DESC, last_searched_at DESC);",
    )
    .context("failed to add last_searched_at column")?;

    Ok(())
}

/// Migration to v3: add `first_searched_at`, backfilled from `last_searched_at`.
fn migrate_v3(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "ALTER TABLE search_metrics ADD COLUMN first_searched_at TEXT NOT NULL DEFAULT '';
         UPDATE search_metrics SET first_searched_at = last_searched_at;",
    )
    .context("failed to add first_searched_at column")?;

    Ok(())
}
