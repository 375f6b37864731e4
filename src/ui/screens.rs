use std::cmp::min;

use crate::document::PendingTable;
use crate::export::ExportFormat;

/// Selection state for a vertical list of choices.
pub(crate) struct ListPicker<T> {
    pub(crate) items: Vec<T>,
    pub(crate) selected: usize,
}

impl<T> ListPicker<T> {
    pub(crate) fn new(items: Vec<T>) -> Self {
        Self { items, selected: 0 }
    }

    pub(crate) fn current(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.items.is_empty() {
            self.selected = 0;
            return;
        }
        let len = self.items.len() as isize;
        let next = (self.selected as isize + offset).clamp(0, len - 1);
        self.selected = next as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.items.len().saturating_sub(1);
    }
}

impl ListPicker<ExportFormat> {
    pub(crate) fn formats() -> Self {
        Self::new(ExportFormat::ALL.to_vec())
    }
}

/// A multi-table SQLite import waiting on the user's pick.
pub(crate) struct TableChoice {
    pub(crate) pending: PendingTable,
    pub(crate) picker: ListPicker<String>,
}

impl TableChoice {
    pub(crate) fn new(pending: PendingTable) -> Self {
        let picker = ListPicker::new(pending.table_names().to_vec());
        Self { pending, picker }
    }
}

/// Cursor over the grid. Row 0 is the header line, data rows start at 1.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub(crate) struct GridCursor {
    pub(crate) row: usize,
    pub(crate) col: usize,
}

impl GridCursor {
    pub(crate) fn data_row(&self) -> Option<usize> {
        self.row.checked_sub(1)
    }

    pub(crate) fn move_by(&mut self, rows: isize, cols: isize, row_count: usize, col_count: usize) {
        let max_row = row_count as isize;
        let max_col = col_count.saturating_sub(1) as isize;
        self.row = (self.row as isize + rows).clamp(0, max_row) as usize;
        self.col = (self.col as isize + cols).clamp(0, max_col) as usize;
    }

    /// Pull the cursor back inside a table that shrank.
    pub(crate) fn clamp(&mut self, row_count: usize, col_count: usize) {
        self.row = min(self.row, row_count);
        self.col = min(self.col, col_count.saturating_sub(1));
    }
}

/// First index of a window of `capacity` items that keeps `selected` visible.
pub(crate) fn window_start(selected: usize, capacity: usize, len: usize) -> usize {
    let capacity = capacity.max(1);
    let mut start = if selected >= capacity {
        selected + 1 - capacity
    } else {
        0
    };
    if start + capacity > len {
        start = len.saturating_sub(capacity);
    }
    start
}
