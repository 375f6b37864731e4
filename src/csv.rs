//! RFC-4180 style CSV reading and writing.
//!
//! The scanner is hand-rolled rather than split-on-comma: quoted fields may
//! contain separators, quotes (doubled) and line breaks. Every cell stays a
//! string; there is no type sniffing.

use crate::error::{ForgeError, Result};

/// Header line plus data lines as read from CSV text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Records {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Parse CSV text. The first line becomes the headers.
pub fn parse(text: &str) -> Result<Records> {
    if text.trim().is_empty() {
        return Err(ForgeError::EmptyInput("CSV input is empty".into()));
    }
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut lines = scan(text).into_iter();
    let headers = lines
        .next()
        .ok_or_else(|| ForgeError::ParseFailure("could not parse CSV".into()))?;
    if headers.is_empty() {
        return Err(ForgeError::ParseFailure("no headers found in CSV".into()));
    }
    Ok(Records {
        headers,
        rows: lines.collect(),
    })
}

fn scan(text: &str) -> Vec<Vec<String>> {
    let mut lines = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    // A quoted field marks the line as deliberate even if every field is empty.
    let mut line_quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' => {
                in_quotes = true;
                line_quoted = true;
            }
            ',' => row.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                row.push(std::mem::take(&mut field));
                lines.push(std::mem::take(&mut row));
                line_quoted = false;
            }
            '\n' => {
                row.push(std::mem::take(&mut field));
                lines.push(std::mem::take(&mut row));
                line_quoted = false;
            }
            _ => field.push(ch),
        }
    }

    row.push(field);
    if line_quoted || row.iter().any(|f| !f.is_empty()) {
        lines.push(row);
    }
    lines
}

/// Write headers and rows as CSV, lines joined with `\r\n`.
pub fn serialize(headers: &[String], rows: &[Vec<String>]) -> String {
    std::iter::once(headers)
        .chain(rows.iter().map(Vec::as_slice))
        .map(serialize_line)
        .collect::<Vec<_>>()
        .join("\r\n")
}

fn serialize_line(fields: &[String]) -> String {
    let mut line = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",");
    // A blank or whitespace-only line would read back as a discarded trailing
    // line, or as empty input when it is the only line.
    if !fields.is_empty() && !line.contains('"') && fields.iter().all(|f| f.trim().is_empty()) {
        line.insert_str(0, "\"\"");
    }
    line
}

fn escape_field(field: &str) -> String {
    // A leading U+FEFF would be taken for a byte order mark.
    if field.contains(['"', ',', '\n', '\r']) || field.starts_with('\u{feff}') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
