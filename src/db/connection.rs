use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Ensure the store file exists, create the snapshot table lazily, and return
/// a live connection.
pub fn ensure_schema(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    let conn = Connection::open(path).context("failed to open snapshot store")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshots (
            name TEXT PRIMARY KEY,
            data BLOB NOT NULL,
            saved_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("failed to create snapshots table")?;

    Ok(conn)
}
