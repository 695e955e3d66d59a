//! Database connection management.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;

use super::migrations::run_migrations;

/// Database file name.
const DB_FILE_NAME: &str = "cinedex.db";

/// Opens (or creates) the database and runs migrations.
///
/// - If `dir` is `Some`, uses `{dir}/cinedex.db`.
/// - Otherwise uses `~/.local/share/cinedex/cinedex.db`.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migrations fail.
pub fn open_db(dir: Option<&Path>) -> Result<Connection> {
    let db_path = resolve_db_path(dir)?;

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    tracing::debug!(path = %db_path.display(), "opened database");

    run_migrations(&conn).context("database migration failed")?;

    Ok(conn)
}

/// Resolves the database file path.
///
/// # Errors
///
/// Returns an error if `dir` is `None` and `HOME` is not set.
pub fn resolve_db_path(dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(d) = dir {
        return Ok(d.join(DB_FILE_NAME));
    }

    let home = std::env::var("HOME").context("HOME environment variable is not set")?;
    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("cinedex")
        .join(DB_FILE_NAME))
}
