//! Coercion of foreign values into cell text. JSON imports and SQLite reads
//! both go through [`ToCell`], so a number or a null renders the same way no
//! matter where it came from.

use rusqlite::types::ValueRef;
use serde_json::Value;

/// Total conversion of a foreign value into the string stored in a cell.
pub trait ToCell {
    fn to_cell_string(&self) -> String;
}

impl ToCell for Value {
    fn to_cell_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::String(s) => s.clone(),
            Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
                (Some(i), _, _) => i.to_string(),
                (_, Some(u), _) => u.to_string(),
                (_, _, Some(f)) => format_float(f),
                _ => n.to_string(),
            },
            Value::Array(_) | Value::Object(_) => self.to_string(),
        }
    }
}

impl ToCell for ValueRef<'_> {
    fn to_cell_string(&self) -> String {
        match *self {
            ValueRef::Null => String::new(),
            ValueRef::Integer(i) => i.to_string(),
            ValueRef::Real(f) => format_float(f),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                String::from_utf8_lossy(bytes).into_owned()
            }
        }
    }
}

/// Whole floats print without a fractional part (`3.0` becomes `3`).
fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_values_become_cell_text() {
        assert_eq!(json!(null).to_cell_string(), "");
        assert_eq!(json!(true).to_cell_string(), "true");
        assert_eq!(json!(30).to_cell_string(), "30");
        assert_eq!(json!(-4).to_cell_string(), "-4");
        assert_eq!(json!(1.5).to_cell_string(), "1.5");
        assert_eq!(json!(2.0).to_cell_string(), "2");
        assert_eq!(json!("Ann").to_cell_string(), "Ann");
        assert_eq!(json!([1, 2]).to_cell_string(), "[1,2]");
        assert_eq!(json!({"k": "v"}).to_cell_string(), r#"{"k":"v"}"#);
    }

    #[test]
    fn sqlite_values_become_cell_text() {
        assert_eq!(ValueRef::Null.to_cell_string(), "");
        assert_eq!(ValueRef::Integer(7).to_cell_string(), "7");
        assert_eq!(ValueRef::Real(3.0).to_cell_string(), "3");
        assert_eq!(ValueRef::Real(0.25).to_cell_string(), "0.25");
        assert_eq!(ValueRef::Text(b"hi").to_cell_string(), "hi");
    }
}
