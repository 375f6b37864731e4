//! The open document: the table being edited plus the bookkeeping around it
//! (tracked filename, demo flag, view-only lock).
//!
//! Every import parses into a fresh [`Table`] first and only swaps it in once
//! parsing succeeded, so a failed import never disturbs what is on screen.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::csv;
use crate::db::SnapshotStore;
use crate::error::{ForgeError, Result};
use crate::export::ExportFormat;
use crate::models::Table;
use crate::normalize::normalize;
use crate::relational::{Engine, Snapshot, SnapshotImport};

/// Filename shown for a table that was never saved or loaded.
pub const NEW_FILENAME: &str = "New";
/// Table name used for exports while the filename is still [`NEW_FILENAME`].
pub const FALLBACK_TABLE_NAME: &str = "table1";
const DEMO_FILENAME: &str = "demo";
const KNOWN_EXTENSIONS: [&str; 4] = ["json", "sqlite", "db", "csv"];

/// Strip a known data-file extension (case-insensitive) from a file name.
pub fn strip_known_extension(file_name: &str) -> &str {
    if let Some((stem, ext)) = file_name.rsplit_once('.') {
        if KNOWN_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)) {
            return stem;
        }
    }
    file_name
}

/// Which parser accepted pasted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteFormat {
    Json,
    Csv,
}

/// A multi-table SQLite file waiting for the user to pick a table.
#[derive(Debug)]
pub struct PendingTable {
    snapshot: Snapshot,
    source: String,
}

impl PendingTable {
    pub fn table_names(&self) -> &[String] {
        self.snapshot.table_names()
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Outcome of importing a file from disk.
#[derive(Debug)]
pub enum FileImport {
    Loaded { rows: usize },
    ChooseTable(PendingTable),
}

#[derive(Debug, Clone)]
pub struct Document {
    table: Table,
    filename: String,
    is_demo: bool,
    locked: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::demo()
    }
}

impl Document {
    /// Demo content, as shown on first launch.
    pub fn demo() -> Self {
        Self {
            table: Table::demo(),
            filename: DEMO_FILENAME.to_string(),
            is_demo: true,
            locked: false,
        }
    }

    /// Wrap an already built table under a tracked filename.
    pub fn with_table(table: Table, filename: &str) -> Self {
        Self {
            table,
            filename: filename.to_string(),
            is_demo: false,
            locked: false,
        }
    }

    /// Start over with one blank column and row.
    pub fn new_table(&mut self) {
        self.table = Table::blank();
        self.filename = NEW_FILENAME.to_string();
        self.is_demo = false;
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn is_demo(&self) -> bool {
        self.is_demo
    }

    /// Name used for exports and saves.
    pub fn table_name(&self) -> &str {
        if self.filename.is_empty() || self.filename == NEW_FILENAME {
            FALLBACK_TABLE_NAME
        } else {
            &self.filename
        }
    }

    /// Track a file name, minus any known data extension.
    pub fn set_filename(&mut self, raw: &str) {
        self.filename = strip_known_extension(raw).to_string();
        self.is_demo = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Flip the view-only lock and return the new state.
    pub fn toggle_lock(&mut self) -> bool {
        self.locked = !self.locked;
        self.locked
    }

    /// Mutable access for edits, refused while locked.
    pub fn edit(&mut self) -> Result<&mut Table> {
        if self.locked {
            return Err(ForgeError::Locked);
        }
        Ok(&mut self.table)
    }

    fn replace(&mut self, table: Table) {
        self.table = table;
    }

    pub fn import_json_text(&mut self, text: &str) -> Result<usize> {
        if text.trim().is_empty() {
            return Err(ForgeError::EmptyInput("JSON input is empty".into()));
        }
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|err| ForgeError::ParseFailure(format!("JSON parse error: {err}")))?;
        let normalized = normalize(&value);
        let rows = normalized.rows.len();
        self.replace(Table::new(normalized.headers, normalized.rows, normalized.schema));
        Ok(rows)
    }

    pub fn import_csv_text(&mut self, text: &str) -> Result<usize> {
        let records = csv::parse(text)?;
        let rows = records.rows.len();
        self.replace(Table::new(records.headers, records.rows, None));
        Ok(rows)
    }

    /// Pasted text: JSON when it parses as JSON, CSV otherwise.
    pub fn import_paste(&mut self, text: &str) -> Result<PasteFormat> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ForgeError::EmptyInput("nothing pasted yet".into()));
        }
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
            let normalized = normalize(&value);
            self.replace(Table::new(normalized.headers, normalized.rows, normalized.schema));
            info!("imported JSON from paste");
            return Ok(PasteFormat::Json);
        }
        self.import_csv_text(trimmed)?;
        info!("imported CSV from paste");
        Ok(PasteFormat::Csv)
    }

    /// Import a file, choosing the parser by extension. Unknown extensions
    /// are treated like pasted text.
    pub fn import_file(&mut self, path: &Path, engine: Option<&Engine>) -> Result<FileImport> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let rows = match ext.as_str() {
            "sqlite" | "db" => {
                let engine = require_engine(engine)?;
                let bytes = fs::read(path)?;
                match engine.open_snapshot(&bytes)?.into_import()? {
                    SnapshotImport::Single { table, .. } => {
                        let rows = table.row_count();
                        self.replace(table);
                        rows
                    }
                    SnapshotImport::Choose(snapshot) => {
                        info!(file = %path.display(), tables = snapshot.table_names().len(), "snapshot needs a table choice");
                        return Ok(FileImport::ChooseTable(PendingTable {
                            snapshot,
                            source: file_name,
                        }));
                    }
                }
            }
            "json" => self.import_json_text(&fs::read_to_string(path)?)?,
            "csv" => self.import_csv_text(&fs::read_to_string(path)?)?,
            _ => {
                self.import_paste(&fs::read_to_string(path)?)?;
                self.table.row_count()
            }
        };

        self.set_filename(&file_name);
        info!(file = %path.display(), rows, "imported file");
        Ok(FileImport::Loaded { rows })
    }

    /// Finish a multi-table import with the table the user picked.
    pub fn choose_table(&mut self, pending: &PendingTable, table_name: &str) -> Result<usize> {
        let table = pending.snapshot.load(table_name)?;
        let rows = table.row_count();
        self.replace(table);
        self.set_filename(pending.source());
        Ok(rows)
    }

    /// Serialize the table under its resolved name.
    pub fn export(&self, format: ExportFormat, engine: Option<&Engine>) -> Result<Vec<u8>> {
        format.render(self.table_name(), &self.table, engine)
    }

    /// Write the rendered format to `path`.
    pub fn export_to(&self, format: ExportFormat, engine: Option<&Engine>, path: &Path) -> Result<usize> {
        let bytes = self.export(format, engine)?;
        fs::write(path, &bytes)?;
        info!(file = %path.display(), format = format.label(), bytes = bytes.len(), "exported table");
        Ok(bytes.len())
    }

    /// Save a named snapshot. Saving under an existing name overwrites it.
    pub fn save_snapshot(
        &mut self,
        store: &dyn SnapshotStore,
        engine: Option<&Engine>,
        name: &str,
    ) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ForgeError::EmptyInput("please enter a name".into()));
        }
        let engine = require_engine(engine)?;
        let blob = engine.export_snapshot(name, &self.table)?;
        store.save(name, &blob)?;
        self.filename = name.to_string();
        self.is_demo = false;
        info!(name, "saved snapshot");
        Ok(())
    }

    /// Load a named snapshot. A snapshot holding several tables is handed
    /// back for the caller to pick from, like a multi-table file import.
    pub fn open_snapshot(
        &mut self,
        store: &dyn SnapshotStore,
        engine: Option<&Engine>,
        name: &str,
    ) -> Result<FileImport> {
        let engine = require_engine(engine)?;
        let blob = store.load(name)?;
        match engine.open_snapshot(&blob)?.into_import()? {
            SnapshotImport::Single { table, .. } => {
                let rows = table.row_count();
                self.replace(table);
                self.filename = name.to_string();
                self.is_demo = false;
                info!(name, rows, "opened snapshot");
                Ok(FileImport::Loaded { rows })
            }
            SnapshotImport::Choose(snapshot) => {
                info!(name, tables = snapshot.table_names().len(), "snapshot needs a table choice");
                Ok(FileImport::ChooseTable(PendingTable {
                    snapshot,
                    source: name.to_string(),
                }))
            }
        }
    }

    /// Delete the snapshot backing this document and fall back to the demo
    /// table. Unsaved and demo documents have nothing to delete.
    pub fn delete_snapshot(&mut self, store: &dyn SnapshotStore) -> Result<String> {
        if self.filename == NEW_FILENAME || self.is_demo {
            return Err(ForgeError::NotFound("no saved file to delete".into()));
        }
        let name = self.filename.clone();
        store.delete(&name)?;
        let locked = self.locked;
        *self = Self::demo();
        self.locked = locked;
        info!(name = %name, "deleted snapshot");
        Ok(name)
    }
}

fn require_engine(engine: Option<&Engine>) -> Result<&Engine> {
    engine.ok_or_else(|| {
        warn!("relational feature requested without an engine");
        ForgeError::EngineUnavailable("SQLite features are disabled".into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_only_known_extensions() {
        assert_eq!(strip_known_extension("people.csv"), "people");
        assert_eq!(strip_known_extension("people.SQLite"), "people");
        assert_eq!(strip_known_extension("archive.tar.db"), "archive.tar");
        assert_eq!(strip_known_extension("notes.txt"), "notes.txt");
        assert_eq!(strip_known_extension("plain"), "plain");
    }

    #[test]
    fn table_name_falls_back_for_new_documents() {
        let mut doc = Document::demo();
        assert_eq!(doc.table_name(), "demo");
        doc.new_table();
        assert_eq!(doc.filename(), NEW_FILENAME);
        assert_eq!(doc.table_name(), FALLBACK_TABLE_NAME);
        doc.set_filename("inventory.json");
        assert_eq!(doc.table_name(), "inventory");
        assert!(!doc.is_demo());
    }

    #[test]
    fn locked_document_refuses_edits() {
        let mut doc = Document::demo();
        assert!(doc.toggle_lock());
        assert!(matches!(doc.edit(), Err(ForgeError::Locked)));
        assert!(!doc.toggle_lock());
        doc.edit().unwrap().add_row();
        assert_eq!(doc.table().row_count(), 4);
    }

    #[test]
    fn failed_imports_leave_table_untouched() {
        let mut doc = Document::demo();
        let before = doc.table().clone();

        assert!(matches!(doc.import_json_text("{not json"), Err(ForgeError::ParseFailure(_))));
        assert!(matches!(doc.import_csv_text("   "), Err(ForgeError::EmptyInput(_))));
        assert!(matches!(doc.import_paste(""), Err(ForgeError::EmptyInput(_))));

        assert_eq!(doc.table(), &before);
        assert_eq!(doc.filename(), "demo");
    }

    #[test]
    fn paste_prefers_json_then_csv() {
        let mut doc = Document::demo();
        assert_eq!(doc.import_paste(r#"[{"a": 1}]"#).unwrap(), PasteFormat::Json);
        assert_eq!(doc.table().headers(), &["a".to_string()]);

        assert_eq!(doc.import_paste("x,y\n1,2\n").unwrap(), PasteFormat::Csv);
        assert_eq!(doc.table().headers(), &["x".to_string(), "y".to_string()]);
        assert_eq!(doc.table().row_count(), 1);
    }

    #[test]
    fn relational_features_need_an_engine() {
        let doc = Document::demo();
        assert!(matches!(
            doc.export(ExportFormat::Sqlite, None),
            Err(ForgeError::EngineUnavailable(_))
        ));
        assert!(doc.export(ExportFormat::Sql, None).is_ok());
    }
}
