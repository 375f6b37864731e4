use std::fs;
use std::path::Path;

use dataforge::{
    ColumnSchema, ColumnType, Document, Engine, ExportFormat, FileImport, ForgeError,
    SnapshotStore, SqliteStore, Table,
};
use pretty_assertions::assert_eq;
use rusqlite::Connection;
use tempfile::tempdir;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn write_two_table_db(path: &Path) {
    let conn = Connection::open(path).expect("open db");
    conn.execute_batch(
        "CREATE TABLE pets (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
         INSERT INTO pets VALUES (1, 'Rex'), (2, 'Tom');
         CREATE TABLE owners (name VARCHAR(40), weight REAL, photo BLOB);
         INSERT INTO owners VALUES ('Ann', 61.5, NULL), ('Bob', 80.0, x'6869');",
    )
    .expect("seed db");
}

#[test]
fn json_file_converts_to_csv() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("people.json");
    let output = dir.path().join("people.csv");
    fs::write(
        &input,
        r#"[{"name": "Ann", "note": "likes \"tea\", cake"}, {"name": "Bob", "age": 40}]"#,
    )
    .expect("write input");

    let mut doc = Document::demo();
    let outcome = doc.import_file(&input, None).expect("import");
    assert!(matches!(outcome, FileImport::Loaded { rows: 2 }));
    assert_eq!(doc.filename(), "people");

    doc.export_to(ExportFormat::Csv, None, &output).expect("export");
    let text = fs::read_to_string(&output).expect("read output");
    // headers come from the first object, so Bob's age is dropped
    assert_eq!(text, "name,note\r\nAnn,\"likes \"\"tea\"\", cake\"\r\nBob,");
}

#[test]
fn multi_table_sqlite_waits_for_a_choice() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("zoo.sqlite");
    write_two_table_db(&path);
    let engine = Engine::new().expect("engine");

    let mut doc = Document::demo();
    let pending = match doc.import_file(&path, Some(&engine)).expect("import") {
        FileImport::ChooseTable(pending) => pending,
        other => panic!("expected a table choice, got {other:?}"),
    };
    assert_eq!(pending.table_names(), &strings(&["owners", "pets"]));
    assert_eq!(doc.table(), &Table::demo());

    let rows = doc.choose_table(&pending, "owners").expect("choose");
    assert_eq!(rows, 2);
    assert_eq!(doc.filename(), "zoo");
    let table = doc.table();
    assert_eq!(table.headers(), &strings(&["name", "weight", "photo"]));
    assert_eq!(table.rows()[0], strings(&["Ann", "61.5", ""]));
    assert_eq!(table.rows()[1], strings(&["Bob", "80", "hi"]));
    let types: Vec<ColumnType> = table.schema().iter().map(|s| s.column_type).collect();
    assert_eq!(
        types,
        vec![ColumnType::Text, ColumnType::Real, ColumnType::Blob]
    );

    let err = doc.choose_table(&pending, "keepers").unwrap_err();
    assert!(matches!(err, ForgeError::NotFound(_)));
}

#[test]
fn sqlite_without_engine_is_refused() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("zoo.db");
    write_two_table_db(&path);

    let mut doc = Document::demo();
    let err = doc.import_file(&path, None).unwrap_err();
    assert!(matches!(err, ForgeError::EngineUnavailable(_)));
}

#[test]
fn snapshots_round_trip_through_the_store() {
    let dir = tempdir().expect("tempdir");
    let store = SqliteStore::open(&dir.path().join("store.sqlite")).expect("store");
    let engine = Engine::new().expect("engine");

    let table = Table::new(
        strings(&["id", "label"]),
        vec![strings(&["1", "first"]), strings(&["2", "it's"])],
        Some(vec![
            ColumnSchema::new(ColumnType::Integer, true, false, false),
            ColumnSchema::new(ColumnType::Text, false, true, false),
        ]),
    );
    let mut doc = Document::with_table(table.clone(), "New");
    doc.save_snapshot(&store, Some(&engine), "  tasks ").expect("save");
    assert_eq!(doc.filename(), "tasks");
    assert_eq!(store.list_names().expect("list"), strings(&["tasks"]));

    let mut other = Document::demo();
    let outcome = other
        .open_snapshot(&store, Some(&engine), "tasks")
        .expect("open");
    assert!(matches!(outcome, FileImport::Loaded { rows: 2 }));
    assert_eq!(other.table(), &table);
    assert!(!other.is_demo());

    let deleted = other.delete_snapshot(&store).expect("delete");
    assert_eq!(deleted, "tasks");
    assert!(other.is_demo());
    assert!(store.list_names().expect("list").is_empty());
}

#[test]
fn multi_table_snapshot_is_not_auto_selected() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("zoo.sqlite");
    write_two_table_db(&db_path);
    let store = SqliteStore::open(&dir.path().join("store.sqlite")).expect("store");
    store
        .save("zoo", &fs::read(&db_path).expect("read db"))
        .expect("save blob");
    let engine = Engine::new().expect("engine");

    let mut doc = Document::demo();
    let pending = match doc.open_snapshot(&store, Some(&engine), "zoo").expect("open") {
        FileImport::ChooseTable(pending) => pending,
        other => panic!("expected a table choice, got {other:?}"),
    };
    assert_eq!(pending.table_names(), &strings(&["owners", "pets"]));
    assert_eq!(doc.table(), &Table::demo());
    assert!(doc.is_demo());

    let rows = doc.choose_table(&pending, "pets").expect("choose");
    assert_eq!(rows, 2);
    assert_eq!(doc.filename(), "zoo");
    assert_eq!(doc.table().headers(), &strings(&["id", "name"]));
    assert!(doc.table().schema()[0].pk);
}

#[test]
fn store_errors_surface_as_typed_errors() {
    let dir = tempdir().expect("tempdir");
    let store = SqliteStore::open(&dir.path().join("store.sqlite")).expect("store");
    let engine = Engine::new().expect("engine");
    let mut doc = Document::demo();

    let err = doc.save_snapshot(&store, Some(&engine), "   ").unwrap_err();
    assert!(matches!(err, ForgeError::EmptyInput(_)));

    let err = doc.open_snapshot(&store, Some(&engine), "ghost").unwrap_err();
    assert!(matches!(err, ForgeError::NotFound(_)));

    let err = doc.delete_snapshot(&store).unwrap_err();
    assert!(matches!(err, ForgeError::NotFound(_)));
}

#[test]
fn failed_imports_leave_the_document_alone() {
    let dir = tempdir().expect("tempdir");
    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{\"a\": [1, 2").expect("write");

    let mut doc = Document::demo();
    let err = doc.import_file(&broken, None).unwrap_err();
    assert!(matches!(err, ForgeError::ParseFailure(_)));
    assert_eq!(doc.table(), &Table::demo());
    assert!(doc.is_demo());

    let missing = dir.path().join("missing.csv");
    assert!(doc.import_file(&missing, None).is_err());
    assert_eq!(doc.table(), &Table::demo());
}

#[test]
fn entity_json_reads_back_as_the_same_grid() {
    let dir = tempdir().expect("tempdir");
    let output = dir.path().join("catalog.json");

    let doc = Document::with_table(Table::demo(), "catalog");
    doc.export_to(ExportFormat::EntityJson, None, &output)
        .expect("export");

    let mut reloaded = Document::demo();
    reloaded.import_file(&output, None).expect("import");
    assert_eq!(reloaded.table().headers(), Table::demo().headers());
    assert_eq!(reloaded.table().rows(), Table::demo().rows());
}

#[test]
fn sqlite_export_is_a_real_database() {
    let dir = tempdir().expect("tempdir");
    let output = dir.path().join("catalog.sqlite");
    let engine = Engine::new().expect("engine");

    let doc = Document::with_table(Table::demo(), "catalog");
    doc.export_to(ExportFormat::Sqlite, Some(&engine), &output)
        .expect("export");

    let conn = Connection::open(&output).expect("open export");
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM \"catalog\"", [], |row| row.get(0))
        .expect("count");
    assert_eq!(count, 3);
}
