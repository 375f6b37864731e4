use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::export::ExportFormat;

/// Single-line text buffer used by every prompt and the cell editor.
#[derive(Default, Clone)]
pub(crate) struct TextInput {
    pub(crate) value: String,
}

impl TextInput {
    pub(crate) fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
        }
    }

    /// Append a character, ignoring control characters.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.value.push(ch);
        true
    }

    /// Append pasted text verbatim, line breaks included.
    pub(crate) fn push_str(&mut self, text: &str) {
        self.value.push_str(text);
    }

    pub(crate) fn backspace(&mut self) {
        self.value.pop();
    }

    pub(crate) fn value_len(&self) -> usize {
        self.value.chars().count()
    }

    /// Render `label: value` with a placeholder when empty.
    pub(crate) fn build_line(&self, label: &str, placeholder: &str) -> Line<'static> {
        let (display, style) = if self.value.is_empty() {
            (placeholder.to_string(), Style::default().fg(Color::DarkGray))
        } else {
            (
                self.value.replace(['\r', '\n'], "⏎"),
                Style::default().fg(Color::Yellow),
            )
        };
        Line::from(vec![Span::raw(format!("{label}: ")), Span::styled(display, style)])
    }
}

/// What the cell editor is writing to.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum CellTarget {
    Header(usize),
    Cell { row: usize, col: usize },
}

/// In-place editor for a header or a data cell.
#[derive(Clone)]
pub(crate) struct CellEditor {
    pub(crate) target: CellTarget,
    pub(crate) input: TextInput,
}

impl CellEditor {
    pub(crate) fn new(target: CellTarget, current: &str) -> Self {
        Self {
            target,
            input: TextInput::with_value(current),
        }
    }

    pub(crate) fn title(&self) -> String {
        match self.target {
            CellTarget::Header(col) => format!("Header {}", col + 1),
            CellTarget::Cell { row, col } => format!("Row {}, Column {}", row + 1, col + 1),
        }
    }
}

/// Which action a prompt submits to.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum PromptKind {
    ImportFile,
    Paste,
    Export(ExportFormat),
    Save,
}

impl PromptKind {
    pub(crate) fn title(self) -> String {
        match self {
            PromptKind::ImportFile => "Import File".to_string(),
            PromptKind::Paste => "Paste JSON or CSV".to_string(),
            PromptKind::Export(format) => format!("Export {}", format.label()),
            PromptKind::Save => "Save Snapshot".to_string(),
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            PromptKind::ImportFile | PromptKind::Export(_) => "Path",
            PromptKind::Paste => "Data",
            PromptKind::Save => "Name",
        }
    }

    pub(crate) fn placeholder(self) -> &'static str {
        match self {
            PromptKind::ImportFile => "<.json, .csv, .sqlite or .db file>",
            PromptKind::Paste => "<paste here>",
            PromptKind::Export(_) => "<output file>",
            PromptKind::Save => "<required>",
        }
    }
}

/// Free-text prompt shown as a modal.
#[derive(Clone)]
pub(crate) struct Prompt {
    pub(crate) kind: PromptKind,
    pub(crate) input: TextInput,
    pub(crate) error: Option<String>,
}

impl Prompt {
    pub(crate) fn new(kind: PromptKind, initial: &str) -> Self {
        Self {
            kind,
            input: TextInput::with_value(initial),
            error: None,
        }
    }
}

/// Yes/no confirmations.
#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) enum Confirm {
    NewTable,
    DeleteSnapshot { name: String },
}

impl Confirm {
    pub(crate) fn title(&self) -> &'static str {
        match self {
            Confirm::NewTable => "New Table",
            Confirm::DeleteSnapshot { .. } => "Delete Snapshot",
        }
    }

    pub(crate) fn message(&self) -> String {
        match self {
            Confirm::NewTable => "Start a new table? Unsaved changes will be lost.".to_string(),
            Confirm::DeleteSnapshot { name } => format!("Delete saved table '{name}' permanently?"),
        }
    }
}
