//! Core library for dataforge, a small table editor that converts between
//! JSON, CSV and SQLite.
//!
//! The codecs (`csv`, `normalize`, `relational`, `export`) are pure
//! transformations over fully loaded input. [`Document`] holds the open table
//! and routes imports, exports and snapshot saves through them; the `ui`
//! module is the terminal front-end on top.
pub mod cell;
pub mod config;
pub mod csv;
pub mod db;
pub mod document;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod relational;
pub mod ui;

pub use config::Config;
pub use db::{SnapshotStore, SqliteStore};
pub use document::{Document, FileImport, PasteFormat, PendingTable};
pub use error::{ForgeError, Result};
pub use export::ExportFormat;
pub use models::{ColumnSchema, ColumnType, Table};
pub use normalize::{normalize, Normalized, Shape};
pub use relational::{Engine, Snapshot, SnapshotImport};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
