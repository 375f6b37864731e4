use std::cmp::min;
use std::iter;
use std::mem;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table as GridWidget,
    Wrap,
};
use ratatui::Frame;
use tracing::{info, warn};

use crate::db::SnapshotStore;
use crate::document::{Document, FileImport, PasteFormat, NEW_FILENAME};
use crate::export::ExportFormat;
use crate::models::Table;
use crate::relational::Engine;

use super::forms::{CellEditor, CellTarget, Confirm, Prompt, PromptKind};
use super::helpers::{centered_rect, fit_cell, schema_badge, surface_error};
use super::screens::{window_start, GridCursor, ListPicker, TableChoice};

/// Footer space reserved for the status line and key hints.
const FOOTER_HEIGHT: u16 = 4;
/// Characters shown per grid column before a cell is cut.
const COLUMN_WIDTH: u16 = 18;
/// Width of the row-number gutter.
const GUTTER_WIDTH: u16 = 5;
/// Rows skipped by PageUp/PageDown.
const PAGE_ROWS: isize = 10;

/// Fine-grained modes layered over the grid.
enum Mode {
    Normal,
    EditingCell(CellEditor),
    Prompt(Prompt),
    ChoosingExport(ListPicker<ExportFormat>),
    OpeningSnapshot(ListPicker<String>),
    ChoosingTable(TableChoice),
    Confirm(Confirm),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    doc: Document,
    store: Option<Box<dyn SnapshotStore>>,
    engine: Option<Engine>,
    cursor: GridCursor,
    show_schema: bool,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    /// Start with `doc` locked for viewing. Without an engine the relational
    /// features are disabled, and without a store saving and opening are;
    /// everything else keeps working.
    pub fn new(
        mut doc: Document,
        store: Option<Box<dyn SnapshotStore>>,
        engine: Option<Engine>,
    ) -> Self {
        doc.set_locked(true);
        let mut app = Self {
            doc,
            store,
            engine,
            cursor: GridCursor::default(),
            show_schema: false,
            mode: Mode::Normal,
            status: None,
        };
        if app.engine.is_none() {
            app.set_status(
                "SQLite unavailable: .sqlite import/export and saving are disabled.",
                StatusKind::Error,
            );
        } else if app.store.is_none() {
            app.set_status(
                "Snapshot store unavailable: saving and opening are disabled.",
                StatusKind::Error,
            );
        } else {
            app.set_status("Table locked, view only. Press l to unlock.", StatusKind::Info);
        }
        app
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Import a file given on the command line.
    pub fn open_path(&mut self, path: &Path) {
        match self.import_path(path) {
            Ok(Some(mode)) => self.mode = mode,
            Ok(None) => {}
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::EditingCell(editor) => self.handle_edit_cell(code, editor)?,
            Mode::Prompt(prompt) => self.handle_prompt(code, prompt)?,
            Mode::ChoosingExport(picker) => self.handle_choose_export(code, picker)?,
            Mode::OpeningSnapshot(picker) => self.handle_open_snapshot(code, picker)?,
            Mode::ChoosingTable(choice) => self.handle_choose_table(code, choice)?,
            Mode::Confirm(confirm) => self.handle_confirm(code, confirm)?,
        };

        Ok(exit)
    }

    /// Bracketed paste: text goes into the open editor, or opens the paste
    /// import prompt from the grid.
    pub(crate) fn handle_paste(&mut self, text: &str) {
        match &mut self.mode {
            Mode::EditingCell(editor) => editor.input.push_str(text),
            Mode::Prompt(prompt) => prompt.input.push_str(text),
            Mode::Normal => self.mode = Mode::Prompt(Prompt::new(PromptKind::Paste, text)),
            _ => {}
        }
    }

    /// Quick save under the current name, or ask for one.
    pub(crate) fn handle_ctrl_s(&mut self) -> Result<()> {
        if !matches!(self.mode, Mode::Normal) {
            return Ok(());
        }
        if self.doc.filename() == NEW_FILENAME || self.doc.is_demo() {
            self.mode = Mode::Prompt(Prompt::new(PromptKind::Save, ""));
            return Ok(());
        }
        let name = self.doc.filename().to_string();
        if let Err(err) = self.save_snapshot(&name) {
            self.set_status(surface_error(&err), StatusKind::Error);
        }
        Ok(())
    }

    pub(crate) fn handle_ctrl_l(&mut self) -> Result<()> {
        if matches!(self.mode, Mode::Normal) {
            self.toggle_lock();
        }
        Ok(())
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let rows = self.doc.table().row_count();
        let cols = self.doc.table().column_count();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Up => self.cursor.move_by(-1, 0, rows, cols),
            KeyCode::Down => self.cursor.move_by(1, 0, rows, cols),
            KeyCode::Left => self.cursor.move_by(0, -1, rows, cols),
            KeyCode::Right => self.cursor.move_by(0, 1, rows, cols),
            KeyCode::PageUp => self.cursor.move_by(-PAGE_ROWS, 0, rows, cols),
            KeyCode::PageDown => self.cursor.move_by(PAGE_ROWS, 0, rows, cols),
            KeyCode::Home => self.cursor.col = 0,
            KeyCode::End => self.cursor.col = cols.saturating_sub(1),
            KeyCode::Enter | KeyCode::Char('e') | KeyCode::Char('E') => {
                if let Some(editor) = self.open_cell_editor() {
                    self.clear_status();
                    return Ok(Mode::EditingCell(editor));
                }
            }
            KeyCode::Char('+') => self.apply_edit("Row added.", |t| t.add_row()),
            KeyCode::Char('-') => self.apply_edit("Last row removed.", |t| t.remove_row()),
            KeyCode::Char('>') => self.apply_edit("Column added.", |t| t.add_column("")),
            KeyCode::Char('<') => self.apply_edit("Last column removed.", |t| t.remove_column()),
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.show_schema = !self.show_schema;
                let message = if self.show_schema {
                    "Schema row shown."
                } else {
                    "Schema row hidden."
                };
                self.set_status(message, StatusKind::Info);
            }
            KeyCode::Char('t') | KeyCode::Char('T') => {
                let col = self.cursor.col;
                self.apply_schema_edit(|t| {
                    if let Some(next) = t.schema_for(col).map(|s| s.column_type.next()) {
                        t.set_column_type(col, next);
                    }
                });
            }
            KeyCode::Char('k') | KeyCode::Char('K') => {
                let col = self.cursor.col;
                self.apply_schema_edit(|t| {
                    t.toggle_pk(col);
                });
            }
            KeyCode::Char('n') => {
                let col = self.cursor.col;
                self.apply_schema_edit(|t| {
                    t.toggle_notnull(col);
                });
            }
            KeyCode::Char('u') | KeyCode::Char('U') => {
                let col = self.cursor.col;
                self.apply_schema_edit(|t| {
                    t.toggle_unique(col);
                });
            }
            KeyCode::Char('l') | KeyCode::Char('L') => self.toggle_lock(),
            KeyCode::Char('i') | KeyCode::Char('I') => {
                self.clear_status();
                return Ok(Mode::Prompt(Prompt::new(PromptKind::ImportFile, "")));
            }
            KeyCode::Char('v') | KeyCode::Char('V') => {
                self.clear_status();
                return Ok(Mode::Prompt(Prompt::new(PromptKind::Paste, "")));
            }
            KeyCode::Char('x') | KeyCode::Char('X') => {
                self.clear_status();
                return Ok(Mode::ChoosingExport(ListPicker::formats()));
            }
            KeyCode::Char('w') | KeyCode::Char('W') => {
                self.clear_status();
                let initial = if self.doc.filename() == NEW_FILENAME || self.doc.is_demo() {
                    ""
                } else {
                    self.doc.filename()
                };
                return Ok(Mode::Prompt(Prompt::new(PromptKind::Save, initial)));
            }
            KeyCode::Char('o') | KeyCode::Char('O') => match self.saved_names() {
                Ok(names) if names.is_empty() => {
                    self.set_status("No saved tables yet.", StatusKind::Info);
                }
                Ok(names) => {
                    self.clear_status();
                    return Ok(Mode::OpeningSnapshot(ListPicker::new(names)));
                }
                Err(err) => {
                    warn!(error = %err, "listing snapshots failed");
                    self.set_status(surface_error(&err), StatusKind::Error);
                }
            },
            KeyCode::Char('D') => {
                if self.doc.filename() == NEW_FILENAME || self.doc.is_demo() {
                    self.set_status("No saved file to delete.", StatusKind::Error);
                } else {
                    return Ok(Mode::Confirm(Confirm::DeleteSnapshot {
                        name: self.doc.filename().to_string(),
                    }));
                }
            }
            KeyCode::Char('N') => return Ok(Mode::Confirm(Confirm::NewTable)),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_edit_cell(&mut self, code: KeyCode, mut editor: CellEditor) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Backspace => editor.input.backspace(),
            KeyCode::Enter => match self.doc.edit() {
                Ok(table) => {
                    let value = editor.input.value.clone();
                    match editor.target {
                        CellTarget::Header(col) => table.set_header(col, value),
                        CellTarget::Cell { row, col } => table.set_cell(row, col, value),
                    };
                    self.clear_status();
                    keep_open = false;
                }
                Err(err) => {
                    self.set_status(err.to_string(), StatusKind::Error);
                    keep_open = false;
                }
            },
            KeyCode::Char(ch) => {
                editor.input.push_char(ch);
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::EditingCell(editor))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_prompt(&mut self, code: KeyCode, mut prompt: Prompt) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status(format!("{} cancelled.", prompt.kind.title()), StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Backspace => {
                prompt.input.backspace();
                Ok(Mode::Prompt(prompt))
            }
            KeyCode::Enter => match self.submit_prompt(&prompt) {
                Ok(next) => Ok(next.unwrap_or(Mode::Normal)),
                Err(err) => {
                    let message = surface_error(&err);
                    prompt.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                    Ok(Mode::Prompt(prompt))
                }
            },
            KeyCode::Char(ch) => {
                if prompt.input.push_char(ch) {
                    prompt.error = None;
                }
                Ok(Mode::Prompt(prompt))
            }
            _ => Ok(Mode::Prompt(prompt)),
        }
    }

    fn submit_prompt(&mut self, prompt: &Prompt) -> Result<Option<Mode>> {
        let value = prompt.input.value.trim();
        match prompt.kind {
            PromptKind::ImportFile => self.import_path(&PathBuf::from(value)),
            PromptKind::Paste => {
                let format = self.doc.import_paste(&prompt.input.value)?;
                self.reset_cursor();
                let message = match format {
                    PasteFormat::Json => "Imported JSON from paste.",
                    PasteFormat::Csv => "Imported CSV from paste.",
                };
                self.set_status(message, StatusKind::Info);
                Ok(None)
            }
            PromptKind::Export(format) => {
                let path = PathBuf::from(value);
                let bytes = self
                    .doc
                    .export_to(format, self.engine.as_ref(), &path)
                    .with_context(|| format!("failed to export {}", path.display()))?;
                self.set_status(
                    format!("Exported {} ({bytes} bytes).", path.display()),
                    StatusKind::Info,
                );
                Ok(None)
            }
            PromptKind::Save => {
                self.save_snapshot(value)?;
                Ok(None)
            }
        }
    }

    fn handle_choose_export(
        &mut self,
        code: KeyCode,
        mut picker: ListPicker<ExportFormat>,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Export cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Up => {
                picker.move_selection(-1);
                Ok(Mode::ChoosingExport(picker))
            }
            KeyCode::Down => {
                picker.move_selection(1);
                Ok(Mode::ChoosingExport(picker))
            }
            KeyCode::Enter => {
                let Some(format) = picker.current().copied() else {
                    return Ok(Mode::Normal);
                };
                if format.needs_engine() && self.engine.is_none() {
                    self.set_status("SQLite engine unavailable.", StatusKind::Error);
                    return Ok(Mode::ChoosingExport(picker));
                }
                let file_name = format.file_name(self.doc.table_name());
                Ok(Mode::Prompt(Prompt::new(PromptKind::Export(format), &file_name)))
            }
            _ => Ok(Mode::ChoosingExport(picker)),
        }
    }

    fn handle_open_snapshot(&mut self, code: KeyCode, mut picker: ListPicker<String>) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.clear_status();
                Ok(Mode::Normal)
            }
            KeyCode::Up => {
                picker.move_selection(-1);
                Ok(Mode::OpeningSnapshot(picker))
            }
            KeyCode::Down => {
                picker.move_selection(1);
                Ok(Mode::OpeningSnapshot(picker))
            }
            KeyCode::Home => {
                picker.select_first();
                Ok(Mode::OpeningSnapshot(picker))
            }
            KeyCode::End => {
                picker.select_last();
                Ok(Mode::OpeningSnapshot(picker))
            }
            KeyCode::Enter => {
                let Some(name) = picker.current().cloned() else {
                    return Ok(Mode::Normal);
                };
                match self.open_saved(&name) {
                    Ok(next) => Ok(next.unwrap_or(Mode::Normal)),
                    Err(err) => {
                        warn!(name = %name, error = %err, "snapshot load failed");
                        self.set_status(
                            format!("Load error: {}", surface_error(&err)),
                            StatusKind::Error,
                        );
                        Ok(Mode::OpeningSnapshot(picker))
                    }
                }
            }
            _ => Ok(Mode::OpeningSnapshot(picker)),
        }
    }

    fn handle_choose_table(&mut self, code: KeyCode, mut choice: TableChoice) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Import cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Up => {
                choice.picker.move_selection(-1);
                Ok(Mode::ChoosingTable(choice))
            }
            KeyCode::Down => {
                choice.picker.move_selection(1);
                Ok(Mode::ChoosingTable(choice))
            }
            KeyCode::Enter => {
                let Some(name) = choice.picker.current().cloned() else {
                    return Ok(Mode::Normal);
                };
                match self.doc.choose_table(&choice.pending, &name) {
                    Ok(rows) => {
                        self.reset_cursor();
                        self.set_status(format!("Loaded \"{name}\" ({rows} rows)."), StatusKind::Info);
                        Ok(Mode::Normal)
                    }
                    Err(err) => {
                        self.set_status(format!("Table read error: {err}"), StatusKind::Error);
                        Ok(Mode::ChoosingTable(choice))
                    }
                }
            }
            _ => Ok(Mode::ChoosingTable(choice)),
        }
    }

    fn handle_confirm(&mut self, code: KeyCode, confirm: Confirm) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => match &confirm {
                Confirm::NewTable => {
                    self.doc.new_table();
                    self.reset_cursor();
                    self.set_status("Started a new table.", StatusKind::Info);
                    Ok(Mode::Normal)
                }
                Confirm::DeleteSnapshot { .. } => match self.delete_current() {
                    Ok(name) => {
                        self.reset_cursor();
                        self.set_status(format!("Deleted: {name}."), StatusKind::Info);
                        Ok(Mode::Normal)
                    }
                    Err(err) => {
                        self.set_status(
                            format!("Delete error: {}", surface_error(&err)),
                            StatusKind::Error,
                        );
                        Ok(Mode::Normal)
                    }
                },
            },
            _ => Ok(Mode::Confirm(confirm)),
        }
    }

    fn import_path(&mut self, path: &Path) -> Result<Option<Mode>> {
        let outcome = self
            .doc
            .import_file(path, self.engine.as_ref())
            .with_context(|| format!("failed to import {}", path.display()))?;
        match outcome {
            FileImport::Loaded { rows } => {
                self.reset_cursor();
                self.set_status(
                    format!("Imported: {} ({rows} rows).", path.display()),
                    StatusKind::Info,
                );
                Ok(None)
            }
            FileImport::ChooseTable(pending) => {
                self.set_status(
                    format!("{} tables found, choose one to load.", pending.table_names().len()),
                    StatusKind::Info,
                );
                Ok(Some(Mode::ChoosingTable(TableChoice::new(pending))))
            }
        }
    }

    fn saved_names(&self) -> Result<Vec<String>> {
        let store = require_store(self.store.as_deref())?;
        store.list_names().context("could not list files")
    }

    fn open_saved(&mut self, name: &str) -> Result<Option<Mode>> {
        let store = require_store(self.store.as_deref())?;
        match self.doc.open_snapshot(store, self.engine.as_ref(), name)? {
            FileImport::Loaded { rows } => {
                self.reset_cursor();
                self.set_status(format!("Loaded: {name} ({rows} rows)."), StatusKind::Info);
                Ok(None)
            }
            FileImport::ChooseTable(pending) => {
                self.set_status(
                    format!(
                        "{name} holds {} tables, choose one to load.",
                        pending.table_names().len()
                    ),
                    StatusKind::Info,
                );
                Ok(Some(Mode::ChoosingTable(TableChoice::new(pending))))
            }
        }
    }

    fn delete_current(&mut self) -> Result<String> {
        let store = require_store(self.store.as_deref())?;
        Ok(self.doc.delete_snapshot(store)?)
    }

    fn save_snapshot(&mut self, name: &str) -> Result<()> {
        let store = require_store(self.store.as_deref())?;
        self.doc
            .save_snapshot(store, self.engine.as_ref(), name)
            .context("save error")?;
        self.set_status(format!("Saved: {}.", self.doc.filename()), StatusKind::Info);
        Ok(())
    }

    fn open_cell_editor(&mut self) -> Option<CellEditor> {
        if self.doc.is_locked() {
            self.set_status("Table is locked, press l to unlock.", StatusKind::Error);
            return None;
        }
        let table = self.doc.table();
        if table.column_count() == 0 {
            self.set_status("No columns yet. Press > to add one.", StatusKind::Error);
            return None;
        }
        let col = self.cursor.col;
        let (target, current) = match self.cursor.data_row() {
            None => (
                CellTarget::Header(col),
                table.headers().get(col).cloned().unwrap_or_default(),
            ),
            Some(row) => (
                CellTarget::Cell { row, col },
                table.cell(row, col).unwrap_or_default().to_string(),
            ),
        };
        Some(CellEditor::new(target, &current))
    }

    fn apply_edit(&mut self, message: &str, edit: impl FnOnce(&mut Table)) {
        match self.doc.edit() {
            Ok(table) => {
                edit(table);
                self.clamp_cursor();
                self.set_status(message, StatusKind::Info);
            }
            Err(err) => self.set_status(err.to_string(), StatusKind::Error),
        }
    }

    fn apply_schema_edit(&mut self, edit: impl FnOnce(&mut Table)) {
        if !self.show_schema {
            self.set_status("Press s to show the schema row first.", StatusKind::Error);
            return;
        }
        self.apply_edit("Schema updated.", edit);
    }

    fn toggle_lock(&mut self) {
        let locked = self.doc.toggle_lock();
        info!(locked, "toggled table lock");
        if locked {
            self.set_status("Table locked, view only.", StatusKind::Info);
        } else {
            self.set_status("Table unlocked.", StatusKind::Info);
        }
    }

    fn reset_cursor(&mut self) {
        self.cursor = GridCursor::default();
    }

    fn clamp_cursor(&mut self) {
        let table = self.doc.table();
        self.cursor.clamp(table.row_count(), table.column_count());
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT.min(area.height)),
            ])
            .split(area);

        self.draw_title(frame, chunks[0]);
        self.draw_grid(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::Normal => {}
            Mode::EditingCell(editor) => self.draw_cell_editor(frame, area, editor),
            Mode::Prompt(prompt) => self.draw_prompt(frame, area, prompt),
            Mode::ChoosingExport(picker) => {
                let items = picker
                    .items
                    .iter()
                    .map(|f| format!("{:<16} .{}", f.label(), f.extension()))
                    .collect();
                self.draw_list(frame, area, "Export As", items, picker.selected);
            }
            Mode::OpeningSnapshot(picker) => {
                self.draw_list(frame, area, "Open Saved Table", picker.items.clone(), picker.selected);
            }
            Mode::ChoosingTable(choice) => {
                let title = format!("Tables in {}", choice.pending.source());
                self.draw_list(frame, area, &title, choice.picker.items.clone(), choice.picker.selected);
            }
            Mode::Confirm(confirm) => self.draw_confirm(frame, area, confirm),
        }
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect) {
        let table = self.doc.table();
        let mut spans = vec![
            Span::styled(
                format!(" {} ", self.doc.filename()),
                Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                "  {} rows × {} columns",
                table.row_count(),
                table.column_count()
            )),
        ];
        if self.doc.is_demo() {
            spans.push(Span::styled("  demo data", Style::default().fg(Color::Yellow)));
        }
        if self.doc.is_locked() {
            spans.push(Span::styled("  [locked]", Style::default().fg(Color::Magenta)));
        }
        if self.engine.is_none() {
            spans.push(Span::styled("  [no SQLite]", Style::default().fg(Color::Red)));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_grid(&self, frame: &mut Frame, area: Rect) {
        let table = self.doc.table();
        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if table.column_count() == 0 {
            let message = Paragraph::new("No columns. Press '>' to add one.")
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(message, inner);
            return;
        }

        let col_count = table.column_count();
        let visible_cols = (inner.width.saturating_sub(GUTTER_WIDTH) / (COLUMN_WIDTH + 1)).max(1) as usize;
        let col_start = window_start(self.cursor.col, visible_cols, col_count);
        let col_end = min(col_start + visible_cols, col_count);

        let header_lines = if self.show_schema { 2 } else { 1 };
        let visible_rows = inner.height.saturating_sub(header_lines) as usize;
        let row_count = table.row_count();
        let row_start = window_start(self.cursor.data_row().unwrap_or(0), visible_rows, row_count);
        let row_end = min(row_start + visible_rows, row_count);

        let width = COLUMN_WIDTH as usize;
        let selected = Style::default().fg(Color::Black).bg(Color::Yellow);

        let header_cells = (col_start..col_end).map(|col| {
            let mut text = table.headers()[col].clone();
            if table.schema_for(col).is_some_and(|s| s.pk) {
                text.push_str(" [PK]");
            }
            let cell = Cell::from(fit_cell(&text, width));
            if self.cursor.row == 0 && self.cursor.col == col {
                cell.style(selected)
            } else {
                cell
            }
        });
        let header = Row::new(iter::once(Cell::from("#")).chain(header_cells))
            .style(Style::default().add_modifier(Modifier::BOLD));

        let mut rows = Vec::with_capacity(row_end - row_start + 1);
        if self.show_schema {
            let badges = (col_start..col_end).map(|col| {
                let badge = table.schema_for(col).map(schema_badge).unwrap_or_default();
                Cell::from(fit_cell(&badge, width))
            });
            rows.push(
                Row::new(iter::once(Cell::from("type")).chain(badges))
                    .style(Style::default().fg(Color::Cyan)),
            );
        }
        for row_idx in row_start..row_end {
            let cells = (col_start..col_end).map(|col| {
                let value = table.cell(row_idx, col).unwrap_or_default();
                let cell = Cell::from(fit_cell(value, width));
                if self.cursor.data_row() == Some(row_idx) && self.cursor.col == col {
                    cell.style(selected)
                } else {
                    cell
                }
            });
            let gutter = Cell::from(format!("{}", row_idx + 1))
                .style(Style::default().fg(Color::DarkGray));
            rows.push(Row::new(iter::once(gutter).chain(cells)));
        }

        let widths = iter::once(Constraint::Length(GUTTER_WIDTH))
            .chain(iter::repeat(Constraint::Length(COLUMN_WIDTH)).take(col_end - col_start));
        let grid = GridWidget::new(rows, widths).header(header).column_spacing(1);
        frame.render_widget(grid, inner);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let mut lines = vec![status_line];
        lines.extend(self.footer_instructions());

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Vec<Line<'static>> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let hint = |pairs: &[(&'static str, &'static str)]| {
            let mut spans = Vec::new();
            for (key, label) in pairs {
                spans.push(Span::styled(*key, key_style));
                spans.push(Span::raw(format!(" {label}   ")));
            }
            Line::from(spans)
        };

        match &self.mode {
            Mode::Normal => vec![
                hint(&[
                    ("[Enter]", "Edit"),
                    ("[+/-]", "Row"),
                    ("[>/<]", "Column"),
                    ("[s]", "Schema"),
                    ("[t/k/n/u]", "Type/PK/NN/UQ"),
                    ("[l]", "Lock"),
                ]),
                hint(&[
                    ("[i]", "Import"),
                    ("[v]", "Paste"),
                    ("[x]", "Export"),
                    ("[w]", "Save"),
                    ("[o]", "Open"),
                    ("[D]", "Delete"),
                    ("[N]", "New"),
                    ("[q]", "Quit"),
                ]),
            ],
            Mode::EditingCell(_) | Mode::Prompt(_) => {
                vec![hint(&[("[Enter]", "Confirm"), ("[Esc]", "Cancel")])]
            }
            Mode::ChoosingExport(_) | Mode::OpeningSnapshot(_) | Mode::ChoosingTable(_) => {
                vec![hint(&[("[↑↓]", "Navigate"), ("[Enter]", "Choose"), ("[Esc]", "Cancel")])]
            }
            Mode::Confirm(_) => vec![hint(&[("[y]", "Confirm"), ("[n/Esc]", "Cancel")])],
        }
    }

    fn draw_input_popup(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        line: Line<'static>,
        cursor_offset: usize,
        error: Option<&str>,
    ) {
        let popup_area = centered_rect(70, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![line, Line::from("")];
        if let Some(error) = error {
            lines.push(Line::from(Span::styled(
                error.to_string(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to confirm • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);

        let cursor_x = inner
            .x
            .saturating_add(cursor_offset as u16)
            .min(inner.right().saturating_sub(1));
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_cell_editor(&self, frame: &mut Frame, area: Rect, editor: &CellEditor) {
        self.draw_input_popup(
            frame,
            area,
            &editor.title(),
            editor.input.build_line("Value", "<empty>"),
            "Value: ".len() + editor.input.value_len(),
            None,
        );
    }

    fn draw_prompt(&self, frame: &mut Frame, area: Rect, prompt: &Prompt) {
        let label = prompt.kind.label();
        self.draw_input_popup(
            frame,
            area,
            &prompt.kind.title(),
            prompt.input.build_line(label, prompt.kind.placeholder()),
            label.len() + 2 + prompt.input.value_len(),
            prompt.error.as_deref(),
        );
    }

    fn draw_list(&self, frame: &mut Frame, area: Rect, title: &str, items: Vec<String>, selected: usize) {
        let popup_area = centered_rect(50, 50, area);
        frame.render_widget(Clear, popup_area);

        let list_items: Vec<ListItem> = items.into_iter().map(ListItem::new).collect();
        let list = List::new(list_items)
            .block(Block::default().title(title.to_string()).borders(Borders::ALL))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut state = ListState::default();
        state.select(Some(selected));
        frame.render_stateful_widget(list, popup_area, &mut state);
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, confirm: &Confirm) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(confirm.title()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(confirm.message()),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }
}

fn require_store(store: Option<&dyn SnapshotStore>) -> Result<&dyn SnapshotStore> {
    store.ok_or_else(|| anyhow!("snapshot store unavailable"))
}
