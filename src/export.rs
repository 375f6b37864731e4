//! Download formats. Each one is a pure function of the table name and the
//! table; SQL and snapshot output delegate to [`crate::relational`].

use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::csv;
use crate::error::{ForgeError, Result};
use crate::models::{ColumnSchema, Table};
use crate::relational::{self, Engine};

/// Every format the editor can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    EntityJson,
    Sql,
    Sqlite,
    Csv,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Json,
        ExportFormat::EntityJson,
        ExportFormat::Sql,
        ExportFormat::Sqlite,
        ExportFormat::Csv,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
            ExportFormat::EntityJson => "Entity JSON",
            ExportFormat::Sql => "SQL script",
            ExportFormat::Sqlite => "SQLite database",
            ExportFormat::Csv => "CSV",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::EntityJson => "entity.json",
            ExportFormat::Sql => "sql",
            ExportFormat::Sqlite => "sqlite",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Json | ExportFormat::EntityJson => "application/json",
            ExportFormat::Sql => "text/plain",
            ExportFormat::Sqlite => "application/octet-stream",
            ExportFormat::Csv => "text/csv",
        }
    }

    pub fn needs_engine(self) -> bool {
        matches!(self, ExportFormat::Sqlite)
    }

    /// Pick a format from an output path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if file_name.ends_with(".entity.json") {
            return Some(ExportFormat::EntityJson);
        }
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "sql" => Some(ExportFormat::Sql),
            "sqlite" | "db" => Some(ExportFormat::Sqlite),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    /// Default download file name for a table.
    pub fn file_name(self, table_name: &str) -> String {
        format!("{table_name}.{}", self.extension())
    }

    /// Serialize `table` in this format.
    pub fn render(self, name: &str, table: &Table, engine: Option<&Engine>) -> Result<Vec<u8>> {
        let bytes = match self {
            ExportFormat::Json => json(table)?.into_bytes(),
            ExportFormat::EntityJson => entity_json(name, table)?.into_bytes(),
            ExportFormat::Sql => relational::sql_text(name, table).into_bytes(),
            ExportFormat::Csv => csv::serialize(table.headers(), table.rows()).into_bytes(),
            ExportFormat::Sqlite => {
                let engine = engine.ok_or_else(|| {
                    ForgeError::EngineUnavailable("SQLite export is disabled".into())
                })?;
                engine.export_snapshot(name, table)?
            }
        };
        Ok(bytes)
    }
}

#[derive(Serialize)]
struct PlainJson<'a> {
    headers: &'a [String],
    rows: &'a [Vec<String>],
    #[serde(rename = "_schema")]
    schema: &'a [ColumnSchema],
}

/// `{"headers": [...], "rows": [[...]], "_schema": [...]}`, pretty-printed.
pub fn json(table: &Table) -> Result<String> {
    let doc = PlainJson {
        headers: table.headers(),
        rows: table.rows(),
        schema: table.schema(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// `{name: [headers, row, row, ...]}`, the wrapper the entity matcher reads.
pub fn entity_json(name: &str, table: &Table) -> Result<String> {
    let mut lines = Vec::with_capacity(table.row_count() + 1);
    lines.push(serde_json::to_value(table.headers())?);
    for row in table.rows() {
        lines.push(serde_json::to_value(row)?);
    }
    let mut doc = Map::new();
    doc.insert(name.to_string(), Value::Array(lines));
    Ok(serde_json::to_string_pretty(&Value::Object(doc))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ColumnType;
    use crate::normalize::{classify, normalize, Shape};
    use pretty_assertions::assert_eq;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Table {
        Table::new(
            strings(&["name", "age"]),
            vec![strings(&["Ann", "30"]), strings(&["Bo, \"B\"", ""])],
            Some(vec![
                ColumnSchema::new(ColumnType::Text, true, false, false),
                ColumnSchema::new(ColumnType::Integer, false, true, false),
            ]),
        )
    }

    #[test]
    fn formats_carry_their_media_types() {
        let mimes: Vec<&str> = ExportFormat::ALL.iter().map(|f| f.mime()).collect();
        assert_eq!(
            mimes,
            vec![
                "application/json",
                "application/json",
                "text/plain",
                "application/octet-stream",
                "text/csv",
            ]
        );
    }

    #[test]
    fn plain_json_shape() {
        let text = json(&Table::new(strings(&["a"]), vec![strings(&["1"])], None)).unwrap();
        let expected = r#"{
  "headers": [
    "a"
  ],
  "rows": [
    [
      "1"
    ]
  ],
  "_schema": [
    {
      "type": "TEXT",
      "pk": false,
      "notnull": false,
      "unique": false
    }
  ]
}"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn plain_json_normalizes_back_with_schema() {
        let table = sample();
        let value: Value = serde_json::from_str(&json(&table).unwrap()).unwrap();
        let (shape, n) = classify(&value);
        assert_eq!(shape, Shape::HeadersRows);
        assert_eq!(n.headers, table.headers());
        assert_eq!(n.rows, table.rows());
        assert_eq!(n.schema.as_deref(), Some(table.schema()));
    }

    #[test]
    fn entity_json_normalizes_back() {
        let table = sample();
        let value: Value = serde_json::from_str(&entity_json("people", &table).unwrap()).unwrap();
        let n = normalize(&value);
        assert_eq!(n.headers, table.headers());
        assert_eq!(n.rows, table.rows());
        assert_eq!(n.schema, None);
    }

    #[test]
    fn entity_json_without_rows_still_matches_entity() {
        let table = Table::new(strings(&["only"]), vec![], None);
        let value: Value = serde_json::from_str(&entity_json("t", &table).unwrap()).unwrap();
        let (shape, n) = classify(&value);
        assert_eq!(shape, Shape::Entity);
        assert_eq!(n.headers, strings(&["only"]));
        assert!(n.rows.is_empty());
    }

    #[test]
    fn formats_from_paths() {
        assert_eq!(ExportFormat::from_path(Path::new("a/b.entity.json")), Some(ExportFormat::EntityJson));
        assert_eq!(ExportFormat::from_path(Path::new("b.JSON")), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_path(Path::new("b.db")), Some(ExportFormat::Sqlite));
        assert_eq!(ExportFormat::from_path(Path::new("b.txt")), None);
        assert_eq!(ExportFormat::EntityJson.file_name("t"), "t.entity.json");
    }

    #[test]
    fn sqlite_without_engine_is_unavailable() {
        let result = ExportFormat::Sqlite.render("t", &sample(), None);
        assert!(matches!(result, Err(ForgeError::EngineUnavailable(_))));
    }

    #[test]
    fn csv_render_matches_codec() {
        let bytes = ExportFormat::Csv.render("t", &sample(), None).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "name,age\r\nAnn,30\r\n\"Bo, \"\"B\"\"\","
        );
    }
}
