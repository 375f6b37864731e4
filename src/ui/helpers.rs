use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::models::ColumnSchema;

/// Shorten `text` to at most `width` characters, marking the cut with `…`.
pub(crate) fn fit_cell(text: &str, width: usize) -> String {
    let flat = text.replace(['\r', '\n'], "⏎");
    if flat.chars().count() <= width {
        return flat;
    }
    if width == 0 {
        return String::new();
    }
    let mut cut: String = flat.chars().take(width - 1).collect();
    cut.push('…');
    cut
}

/// Compact schema badge shown under each header, e.g. `INTEGER PK NN`.
pub(crate) fn schema_badge(schema: &ColumnSchema) -> String {
    let mut badge = schema.column_type.to_string();
    if schema.pk {
        badge.push_str(" PK");
    }
    if schema.notnull {
        badge.push_str(" NN");
    }
    if schema.unique {
        badge.push_str(" UQ");
    }
    badge
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ColumnType;

    #[test]
    fn cells_are_flattened_and_cut() {
        assert_eq!(fit_cell("short", 10), "short");
        assert_eq!(fit_cell("a\nb", 10), "a⏎b");
        assert_eq!(fit_cell("abcdefgh", 4), "abc…");
        assert_eq!(fit_cell("abc", 0), "");
    }

    #[test]
    fn badge_lists_flags() {
        let schema = ColumnSchema::new(ColumnType::Integer, true, false, true);
        assert_eq!(schema_badge(&schema), "INTEGER PK UQ");
    }

    #[test]
    fn surfaces_root_cause() {
        let err = anyhow::anyhow!("disk full").context("failed to save");
        assert_eq!(surface_error(&err), "disk full");
    }
}
