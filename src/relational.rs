//! SQLite side of the conversion engine: DDL/DML text generation, database
//! snapshot export, and snapshot import with schema inference.
//!
//! Snapshots are whole SQLite database files handled as byte blobs. The
//! [`Engine`] owns a scratch directory where those files are materialized so
//! `rusqlite` can open them.

use std::fs;
use std::io::Write;

use rusqlite::{params_from_iter, Connection, OpenFlags};
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info};

use crate::cell::ToCell;
use crate::error::{ForgeError, Result};
use crate::models::{ColumnSchema, ColumnType, Table};

/// Quote an identifier for SQLite, doubling embedded double quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a value as a SQL string literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// One column of a `CREATE TABLE`. A primary key already implies NOT NULL
/// and UNIQUE, so those clauses are only written for non-key columns.
pub fn column_definition(header: &str, schema: &ColumnSchema) -> String {
    let mut def = format!("{} {}", quote_identifier(header), schema.column_type);
    if schema.pk {
        def.push_str(" PRIMARY KEY");
    }
    if schema.notnull && !schema.pk {
        def.push_str(" NOT NULL");
    }
    if schema.unique && !schema.pk {
        def.push_str(" UNIQUE");
    }
    def
}

fn column_definitions(table: &Table) -> Vec<String> {
    table
        .headers()
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let schema = table.schema_for(idx).copied().unwrap_or_default();
            column_definition(header, &schema)
        })
        .collect()
}

/// Single-line `CREATE TABLE` statement for `table` under `name`.
pub fn create_table_sql(name: &str, table: &Table) -> String {
    format!(
        "CREATE TABLE {} ({})",
        quote_identifier(name),
        column_definitions(table).join(", ")
    )
}

/// Human-readable SQL script: drop, create, then one INSERT per row with
/// inline literals. Meant for reading or pasting into a SQL tool.
pub fn sql_text(name: &str, table: &Table) -> String {
    let ident = quote_identifier(name);
    let mut lines = vec![
        "-- dataforge SQL export".to_string(),
        format!("-- Table: {name}"),
        String::new(),
        format!("DROP TABLE IF EXISTS {ident};"),
    ];

    let defs = column_definitions(table)
        .into_iter()
        .map(|def| format!("  {def}"))
        .collect::<Vec<_>>()
        .join(",\n");
    lines.push(format!("CREATE TABLE {ident} (\n{defs}\n);"));
    lines.push(String::new());

    for row in table.rows() {
        let values = row
            .iter()
            .map(|v| quote_literal(v))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("INSERT INTO {ident} VALUES ({values});"));
    }

    lines.join("\n")
}

/// Owns the scratch space SQLite files are written to. Creating it is the
/// only point where the relational engine can be unavailable.
#[derive(Debug)]
pub struct Engine {
    scratch: TempDir,
}

impl Engine {
    pub fn new() -> Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("dataforge-")
            .tempdir()
            .map_err(|err| ForgeError::EngineUnavailable(err.to_string()))?;
        Connection::open_in_memory()
            .map_err(|err| ForgeError::EngineUnavailable(err.to_string()))?;
        debug!(path = %scratch.path().display(), "SQLite engine ready");
        Ok(Self { scratch })
    }

    fn scratch_file(&self) -> Result<NamedTempFile> {
        Ok(NamedTempFile::new_in(self.scratch.path())?)
    }

    /// Write `table` into a fresh database as table `name` and return the
    /// database file bytes.
    pub fn export_snapshot(&self, name: &str, table: &Table) -> Result<Vec<u8>> {
        if table.column_count() == 0 {
            return Err(ForgeError::NoColumns);
        }

        let file = self.scratch_file()?;
        {
            let mut conn = Connection::open(file.path())?;
            write_table(&mut conn, name, table)?;
            conn.close().map_err(|(_, err)| err)?;
        }
        let bytes = fs::read(file.path())?;
        info!(table = name, rows = table.row_count(), bytes = bytes.len(), "exported snapshot");
        Ok(bytes)
    }

    /// Open snapshot bytes for reading. Bytes that are not a SQLite database
    /// fail with [`ForgeError::ParseFailure`].
    pub fn open_snapshot(&self, bytes: &[u8]) -> Result<Snapshot> {
        let mut file = self.scratch_file()?;
        file.write_all(bytes)?;
        file.flush()?;

        let conn = Connection::open_with_flags(file.path(), OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|err| ForgeError::ParseFailure(format!("not a SQLite database: {err}")))?;
        let tables = list_tables(&conn)
            .map_err(|err| ForgeError::ParseFailure(format!("not a SQLite database: {err}")))?;
        debug!(?tables, "opened snapshot");

        Ok(Snapshot {
            conn,
            tables,
            _file: file,
        })
    }
}

fn write_table(conn: &mut Connection, name: &str, table: &Table) -> Result<()> {
    let width = table.column_count();
    let tx = conn.transaction()?;
    tx.execute(&create_table_sql(name, table), [])?;
    {
        let placeholders = vec!["?"; width].join(", ");
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} VALUES ({placeholders})",
            quote_identifier(name)
        ))?;
        for row in table.rows() {
            let values = (0..width).map(|i| row.get(i).map(String::as_str).unwrap_or(""));
            stmt.execute(params_from_iter(values))?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn list_tables(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND substr(name, 1, 7) <> 'sqlite_'
         ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
}

/// An opened snapshot. Keeps the backing scratch file alive while open.
#[derive(Debug)]
pub struct Snapshot {
    conn: Connection,
    tables: Vec<String>,
    _file: NamedTempFile,
}

/// What importing a snapshot produced.
#[derive(Debug)]
pub enum SnapshotImport {
    /// Exactly one table, already loaded.
    Single { table_name: String, table: Table },
    /// Several tables; the caller picks one with [`Snapshot::load`].
    Choose(Snapshot),
}

impl Snapshot {
    /// User tables in name order.
    pub fn table_names(&self) -> &[String] {
        &self.tables
    }

    /// Load a single table directly, or hand back the snapshot when there
    /// is a choice to make.
    pub fn into_import(self) -> Result<SnapshotImport> {
        match self.tables.as_slice() {
            [] => Err(ForgeError::NoTablesInSnapshot),
            [only] => {
                let table_name = only.clone();
                let table = self.load(&table_name)?;
                Ok(SnapshotImport::Single { table_name, table })
            }
            _ => Ok(SnapshotImport::Choose(self)),
        }
    }

    /// Read every row of `name` and rebuild its schema from column metadata.
    /// Uniqueness cannot be recovered this way and always comes back false.
    pub fn load(&self, name: &str) -> Result<Table> {
        if !self.tables.iter().any(|t| t == name) {
            return Err(ForgeError::NotFound(format!("table {name}")));
        }
        let ident = quote_identifier(name);

        let mut stmt = self.conn.prepare(&format!("SELECT * FROM {ident}"))?;
        let headers: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = headers.len();
        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get_ref(i).map(|v| v.to_cell_string()))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info({ident})"))?;
        let schema = stmt
            .query_map([], |row| {
                let declared: Option<String> = row.get(2)?;
                let notnull: i64 = row.get(3)?;
                let pk: i64 = row.get(5)?;
                Ok(ColumnSchema::new(
                    ColumnType::from_declared(declared.as_deref().unwrap_or("")),
                    pk == 1,
                    notnull == 1,
                    false,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        info!(table = name, rows = rows.len(), "loaded table from snapshot");
        Ok(Table::new(headers, rows, Some(schema)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Table {
        Table::new(
            strings(&["id", "a\"b", "note"]),
            vec![strings(&["1", "x", "it's"]), strings(&["2", "", "plain"])],
            Some(vec![
                ColumnSchema::new(ColumnType::Integer, true, true, true),
                ColumnSchema::new(ColumnType::Text, false, true, true),
                ColumnSchema::default(),
            ]),
        )
    }

    #[test]
    fn identifiers_double_embedded_quotes() {
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
        assert!(create_table_sql("t", &sample()).contains("\"a\"\"b\" TEXT NOT NULL UNIQUE"));
    }

    #[test]
    fn primary_key_suppresses_other_constraints() {
        let def = column_definition("id", &ColumnSchema::new(ColumnType::Integer, true, true, true));
        assert_eq!(def, "\"id\" INTEGER PRIMARY KEY");
    }

    #[test]
    fn sql_text_layout() {
        let text = sql_text("people", &sample());
        let expected = [
            "-- dataforge SQL export",
            "-- Table: people",
            "",
            "DROP TABLE IF EXISTS \"people\";",
            "CREATE TABLE \"people\" (",
            "  \"id\" INTEGER PRIMARY KEY,",
            "  \"a\"\"b\" TEXT NOT NULL UNIQUE,",
            "  \"note\" TEXT",
            ");",
            "",
            "INSERT INTO \"people\" VALUES ('1', 'x', 'it''s');",
            "INSERT INTO \"people\" VALUES ('2', '', 'plain');",
        ]
        .join("\n");
        assert_eq!(text, expected);
    }

    #[test]
    fn sql_text_executes_in_sqlite() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&sql_text("people", &sample())).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM people", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn snapshot_round_trip_restores_schema_flags() {
        let engine = Engine::new().unwrap();
        let bytes = engine.export_snapshot("people", &sample()).unwrap();
        assert!(bytes.starts_with(b"SQLite format 3\0"));

        let snapshot = engine.open_snapshot(&bytes).unwrap();
        assert_eq!(snapshot.table_names(), &strings(&["people"]));
        let SnapshotImport::Single { table_name, table } = snapshot.into_import().unwrap() else {
            panic!("expected a single table");
        };
        assert_eq!(table_name, "people");
        assert_eq!(table.headers(), sample().headers());
        assert_eq!(table.rows(), sample().rows());
        assert_eq!(
            table.schema(),
            &[
                ColumnSchema::new(ColumnType::Integer, true, false, false),
                ColumnSchema::new(ColumnType::Text, false, true, false),
                ColumnSchema::default(),
            ]
        );
    }

    #[test]
    fn export_without_columns_fails() {
        let engine = Engine::new().unwrap();
        let result = engine.export_snapshot("t", &Table::default());
        assert!(matches!(result, Err(ForgeError::NoColumns)));
    }

    #[test]
    fn garbage_bytes_are_a_parse_failure() {
        let engine = Engine::new().unwrap();
        let result = engine.open_snapshot(b"definitely not a database file, just text padding it out");
        assert!(matches!(result, Err(ForgeError::ParseFailure(_))));
    }

    #[test]
    fn unknown_table_is_not_found() {
        let engine = Engine::new().unwrap();
        let bytes = engine.export_snapshot("people", &sample()).unwrap();
        let snapshot = engine.open_snapshot(&bytes).unwrap();
        assert!(matches!(snapshot.load("nope"), Err(ForgeError::NotFound(_))));
    }
}
