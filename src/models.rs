//! Canonical in-memory table. Every ingestion path produces a [`Table`] and
//! every export path reads one, so the types here stay plain data holders with
//! the structural edit operations the grid needs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// SQLite storage class chosen for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum ColumnType {
    #[default]
    Text,
    Integer,
    Real,
    Blob,
    Numeric,
}

impl ColumnType {
    /// Every type in the order the schema editor cycles through them.
    pub const ALL: [ColumnType; 5] = [
        ColumnType::Text,
        ColumnType::Integer,
        ColumnType::Real,
        ColumnType::Blob,
        ColumnType::Numeric,
    ];

    pub fn as_sql(self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Blob => "BLOB",
            ColumnType::Numeric => "NUMERIC",
        }
    }

    /// Map a declared SQLite column type onto one of the five storage classes
    /// using SQLite's affinity rules. An empty declaration means TEXT.
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.trim().to_ascii_uppercase();
        if upper.is_empty() {
            ColumnType::Text
        } else if upper.contains("INT") {
            ColumnType::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            ColumnType::Text
        } else if upper.contains("BLOB") {
            ColumnType::Blob
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            ColumnType::Real
        } else {
            ColumnType::Numeric
        }
    }

    /// Next type in [`ColumnType::ALL`], wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl From<String> for ColumnType {
    fn from(value: String) -> Self {
        ColumnType::from_declared(&value)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Per-column relational overlay. Only relational output reads it; in-memory
/// edits never enforce the constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnSchema {
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
    #[serde(default)]
    pub pk: bool,
    #[serde(default)]
    pub notnull: bool,
    #[serde(default)]
    pub unique: bool,
}

impl ColumnSchema {
    pub fn new(column_type: ColumnType, pk: bool, notnull: bool, unique: bool) -> Self {
        Self {
            column_type,
            pk,
            notnull,
            unique,
        }
    }
}

/// Headers, rows and schema of the one open table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    schema: Vec<ColumnSchema>,
}

impl Table {
    /// Build a table, forcing rows and schema to the header width.
    pub fn new(
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        schema: Option<Vec<ColumnSchema>>,
    ) -> Self {
        let mut table = Self::default();
        table.replace(headers, rows, schema);
        table
    }

    /// The zero-state content shown on first launch.
    pub fn demo() -> Self {
        let rows = [
            ["1", "users", "table", "Registered accounts with auth info"],
            ["2", "products", "table", "Catalogue items with pricing & stock"],
            ["3", "orders", "table", "Purchase records linking users to products"],
        ];
        Self::new(
            ["id", "name", "type", "description"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            rows.iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
            None,
        )
    }

    /// One blank column and one blank row.
    pub fn blank() -> Self {
        let mut table = Self::default();
        table.add_column("");
        table.add_row();
        table
    }

    /// Replace everything at once. Short rows are padded with empty cells and
    /// long rows truncated; a missing or short schema is filled with defaults.
    pub fn replace(
        &mut self,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        schema: Option<Vec<ColumnSchema>>,
    ) {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        let mut schema = schema.unwrap_or_default();
        schema.resize(width, ColumnSchema::default());

        self.headers = headers;
        self.rows = rows;
        self.schema = schema;
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn schema(&self) -> &[ColumnSchema] {
        &self.schema
    }

    pub fn schema_for(&self, col: usize) -> Option<&ColumnSchema> {
        self.schema.get(col)
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col)).map(String::as_str)
    }

    pub fn add_column(&mut self, name: &str) {
        self.headers.push(name.to_string());
        self.schema.push(ColumnSchema::default());
        for row in &mut self.rows {
            row.push(String::new());
        }
    }

    pub fn add_row(&mut self) {
        self.rows.push(vec![String::new(); self.headers.len()]);
    }

    /// Drop the last row. Does nothing on an empty table.
    pub fn remove_row(&mut self) {
        self.rows.pop();
    }

    /// Drop the last column along with its schema entry and trailing cells.
    pub fn remove_column(&mut self) {
        if self.headers.pop().is_none() {
            return;
        }
        self.schema.pop();
        for row in &mut self.rows {
            row.pop();
        }
    }

    /// Overwrite a cell. Returns `false` when the coordinates are out of range.
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) -> bool {
        match self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(cell) => {
                *cell = value.into();
                true
            }
            None => false,
        }
    }

    pub fn set_header(&mut self, col: usize, value: impl Into<String>) -> bool {
        match self.headers.get_mut(col) {
            Some(header) => {
                *header = value.into();
                true
            }
            None => false,
        }
    }

    pub fn set_column_type(&mut self, col: usize, column_type: ColumnType) -> bool {
        match self.schema.get_mut(col) {
            Some(schema) => {
                schema.column_type = column_type;
                true
            }
            None => false,
        }
    }

    pub fn toggle_pk(&mut self, col: usize) -> bool {
        self.toggle_flag(col, |s| &mut s.pk)
    }

    pub fn toggle_notnull(&mut self, col: usize) -> bool {
        self.toggle_flag(col, |s| &mut s.notnull)
    }

    pub fn toggle_unique(&mut self, col: usize) -> bool {
        self.toggle_flag(col, |s| &mut s.unique)
    }

    fn toggle_flag(&mut self, col: usize, field: impl FnOnce(&mut ColumnSchema) -> &mut bool) -> bool {
        match self.schema.get_mut(col) {
            Some(schema) => {
                let flag = field(schema);
                *flag = !*flag;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn replace_pads_and_truncates_rows() {
        let table = Table::new(
            strings(&["a", "b"]),
            vec![strings(&["1"]), strings(&["1", "2", "3"])],
            None,
        );
        assert_eq!(table.rows(), &[strings(&["1", ""]), strings(&["1", "2"])]);
        assert_eq!(table.schema().len(), 2);
    }

    #[test]
    fn replace_fills_short_schema_with_defaults() {
        let pk = ColumnSchema::new(ColumnType::Integer, true, false, false);
        let table = Table::new(strings(&["id", "name"]), vec![], Some(vec![pk]));
        assert_eq!(table.schema(), &[pk, ColumnSchema::default()]);
    }

    #[test]
    fn add_then_remove_column_restores_shape() {
        let mut table = Table::demo();
        let before = (table.column_count(), table.schema().len(), table.rows()[0].len());

        table.add_column("extra");
        assert_eq!(table.column_count(), before.0 + 1);
        assert!(table.rows().iter().all(|row| row.len() == before.0 + 1));
        assert_eq!(table.cell(0, before.0), Some(""));

        table.remove_column();
        let after = (table.column_count(), table.schema().len(), table.rows()[0].len());
        assert_eq!(before, after);
    }

    #[test]
    fn removals_on_empty_table_are_noops() {
        let mut table = Table::default();
        table.remove_row();
        table.remove_column();
        assert_eq!(table.column_count(), 0);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn add_row_matches_header_width() {
        let mut table = Table::demo();
        table.add_row();
        assert_eq!(table.rows().last().map(Vec::len), Some(4));
    }

    #[test]
    fn out_of_range_edits_report_false() {
        let mut table = Table::blank();
        assert!(table.set_cell(0, 0, "x"));
        assert!(!table.set_cell(3, 0, "x"));
        assert!(!table.set_header(1, "x"));
        assert!(!table.toggle_pk(5));
        assert_eq!(table.cell(0, 0), Some("x"));
    }

    #[test]
    fn declared_types_follow_affinity_rules() {
        assert_eq!(ColumnType::from_declared(""), ColumnType::Text);
        assert_eq!(ColumnType::from_declared("BIGINT"), ColumnType::Integer);
        assert_eq!(ColumnType::from_declared("varchar(20)"), ColumnType::Text);
        assert_eq!(ColumnType::from_declared("DOUBLE"), ColumnType::Real);
        assert_eq!(ColumnType::from_declared("blob"), ColumnType::Blob);
        assert_eq!(ColumnType::from_declared("DECIMAL(10,2)"), ColumnType::Numeric);
        for ty in ColumnType::ALL {
            assert_eq!(ColumnType::from_declared(ty.as_sql()), ty);
        }
    }

    #[test]
    fn schema_serializes_with_original_keys() {
        let json = serde_json::to_string(&ColumnSchema::default()).unwrap();
        assert_eq!(
            json,
            r#"{"type":"TEXT","pk":false,"notnull":false,"unique":false}"#
        );
        let parsed: ColumnSchema = serde_json::from_str(r#"{"type":"integer","pk":true}"#).unwrap();
        assert_eq!(parsed, ColumnSchema::new(ColumnType::Integer, true, false, false));
    }
}
