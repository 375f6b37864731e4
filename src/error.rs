//! Error type shared by every codec and the document layer.

use thiserror::Error;

/// Failures the conversion engine can report. All of them are recoverable:
/// callers surface the message and keep the previously open table.
#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Parse error: {0}")]
    ParseFailure(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("No tables found in snapshot")]
    NoTablesInSnapshot,

    #[error("SQLite engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Table has no columns")]
    NoColumns,

    #[error("Table is locked, unlock to edit")]
    Locked,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ForgeError>;
