//! Turns JSON of unknown shape into headers, rows and an optional schema.
//!
//! Shapes are tried in a fixed priority order and the first matcher that
//! accepts the value wins. Single-key wrappers must be tried before the
//! generic object case or they would be flattened into one row.

use serde_json::{Map, Value};
use tracing::debug;

use crate::cell::ToCell;
use crate::models::ColumnSchema;

/// Key under which exports carry the column schema.
pub const SCHEMA_KEY: &str = "_schema";

/// Result of normalizing one JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub schema: Option<Vec<ColumnSchema>>,
}

/// Which matcher accepted the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `{ "name": [[headers], [row], ...] }`
    Entity,
    /// `{ "name": { "header": [...], "row": [[...]] } }`
    HeaderRow,
    /// `{ "headers": [...], "rows": [[...]] }`
    HeadersRows,
    ArrayOfObjects,
    Object,
    Primitives,
    Mixed,
    Scalar,
}

type Matcher = fn(&Value) -> Option<Normalized>;

const MATCHERS: [(Shape, Matcher); 8] = [
    (Shape::Entity, match_entity),
    (Shape::HeaderRow, match_header_row),
    (Shape::HeadersRows, match_headers_rows),
    (Shape::ArrayOfObjects, match_array_of_objects),
    (Shape::Object, match_object),
    (Shape::Primitives, match_primitives),
    (Shape::Mixed, match_mixed),
    (Shape::Scalar, match_scalar),
];

/// Normalize any JSON value into table form.
pub fn normalize(data: &Value) -> Normalized {
    classify(data).1
}

/// Like [`normalize`] but also reports which shape matched.
pub fn classify(data: &Value) -> (Shape, Normalized) {
    for (shape, matcher) in MATCHERS {
        if let Some(normalized) = matcher(data) {
            debug!(?shape, columns = normalized.headers.len(), "normalized JSON input");
            return (shape, normalized);
        }
    }
    // match_scalar accepts everything
    (Shape::Scalar, scalar(data))
}

fn match_entity(data: &Value) -> Option<Normalized> {
    let obj = data.as_object()?;
    let mut payload = obj.iter().filter(|(key, _)| key.as_str() != SCHEMA_KEY);
    let (_, value) = payload.next()?;
    if payload.next().is_some() {
        return None;
    }

    let items = value.as_array()?;
    let (first, rest) = items.split_first()?;
    let headers = first.as_array()?;
    if !rest.iter().all(Value::is_array) {
        return None;
    }

    Some(Normalized {
        headers: cells(headers),
        rows: rest.iter().map(row_cells).collect(),
        schema: obj.get(SCHEMA_KEY).and_then(parse_schema),
    })
}

fn match_header_row(data: &Value) -> Option<Normalized> {
    let obj = single_key(data)?;
    let (_, inner) = obj.iter().next()?;
    let inner = inner.as_object()?;
    let headers = inner.get("header")?.as_array()?;
    let rows = inner.get("row")?.as_array()?;

    Some(Normalized {
        headers: cells(headers),
        rows: rows.iter().map(row_cells).collect(),
        schema: inner.get(SCHEMA_KEY).and_then(parse_schema),
    })
}

fn match_headers_rows(data: &Value) -> Option<Normalized> {
    let obj = data.as_object()?;
    let headers = obj.get("headers")?.as_array()?;
    let rows = obj.get("rows")?.as_array()?;

    Some(Normalized {
        headers: cells(headers),
        rows: rows.iter().map(row_cells).collect(),
        schema: obj.get(SCHEMA_KEY).and_then(parse_schema),
    })
}

/// Headers come from the first element only; later keys are dropped.
fn match_array_of_objects(data: &Value) -> Option<Normalized> {
    let items = data.as_array()?;
    let headers: Vec<String> = items.first()?.as_object()?.keys().cloned().collect();

    let rows = items
        .iter()
        .map(|item| project(item.as_object(), &headers))
        .collect();

    Some(Normalized {
        headers,
        rows,
        schema: None,
    })
}

fn match_object(data: &Value) -> Option<Normalized> {
    let obj = data.as_object()?;
    Some(Normalized {
        headers: obj.keys().cloned().collect(),
        rows: vec![obj.values().map(ToCell::to_cell_string).collect()],
        schema: None,
    })
}

fn match_primitives(data: &Value) -> Option<Normalized> {
    let items = data.as_array()?;
    if items.iter().any(is_container) {
        return None;
    }
    Some(Normalized {
        headers: synthetic_headers(items.len()),
        rows: vec![cells(items)],
        schema: None,
    })
}

/// Headers are the union of object keys in first-seen order.
fn match_mixed(data: &Value) -> Option<Normalized> {
    let items = data.as_array()?;

    let mut headers: Vec<String> = Vec::new();
    for obj in items.iter().filter_map(Value::as_object) {
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    if headers.is_empty() {
        headers = synthetic_headers(items.len());
        let rows = items.iter().map(|item| vec![item.to_cell_string()]).collect();
        return Some(Normalized {
            headers,
            rows,
            schema: None,
        });
    }

    let rows = items
        .iter()
        .map(|item| match item.as_object() {
            Some(obj) => project(Some(obj), &headers),
            None => vec![item.to_cell_string()],
        })
        .collect();

    Some(Normalized {
        headers,
        rows,
        schema: None,
    })
}

fn match_scalar(data: &Value) -> Option<Normalized> {
    Some(scalar(data))
}

fn scalar(data: &Value) -> Normalized {
    Normalized {
        headers: vec!["Value".to_string()],
        rows: vec![vec![data.to_cell_string()]],
        schema: None,
    }
}

fn single_key(data: &Value) -> Option<&Map<String, Value>> {
    data.as_object().filter(|obj| obj.len() == 1)
}

fn is_container(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

fn cells(values: &[Value]) -> Vec<String> {
    values.iter().map(ToCell::to_cell_string).collect()
}

/// Array rows map cell by cell; anything else becomes a one-cell row.
fn row_cells(value: &Value) -> Vec<String> {
    match value.as_array() {
        Some(items) => cells(items),
        None => vec![value.to_cell_string()],
    }
}

fn project(obj: Option<&Map<String, Value>>, headers: &[String]) -> Vec<String> {
    headers
        .iter()
        .map(|key| {
            obj.and_then(|o| o.get(key))
                .map(ToCell::to_cell_string)
                .unwrap_or_default()
        })
        .collect()
}

fn synthetic_headers(count: usize) -> Vec<String> {
    (1..=count).map(|n| format!("Column {n}")).collect()
}

/// Entries that do not deserialize fall back to the default column schema.
fn parse_schema(value: &Value) -> Option<Vec<ColumnSchema>> {
    let entries = value.as_array()?;
    Some(
        entries
            .iter()
            .map(|entry| serde_json::from_value(entry.clone()).unwrap_or_default())
            .collect(),
    )
}
