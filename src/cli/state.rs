use std::path::Path;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::widgets::TableState;
use tokio::sync::mpsc;

use crate::assist::{
    encode_receipt_data_uri, AnalyzeReceiptRequest, AssistError, CategorySuggester,
    CategorySuggestion, LlmProvider, ReceiptAnalyzer, ReceiptFields, SuggestCategoryRequest,
    MIN_SUGGESTION_DESCRIPTION,
};
use crate::config::Config;
use crate::form::{FieldError, FormController, FormState, SubmitError, SubmitOutcome, SuggestionOutcome};
use crate::model::{category, Expense, ExpenseId};
use crate::repository::ExpenseRepository;

use super::input::LineEdit;
use super::util;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Expenses,
    Help,
}

/// Form fields in focus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFocus {
    Amount,
    Date,
    Category,
    Notes,
    Receipt,
}

impl FormFocus {
    fn next(self) -> Self {
        use FormFocus::*;
        match self {
            Amount => Date,
            Date => Category,
            Category => Notes,
            Notes => Receipt,
            Receipt => Amount,
        }
    }

    fn prev(self) -> Self {
        use FormFocus::*;
        match self {
            Amount => Receipt,
            Date => Amount,
            Category => Date,
            Notes => Category,
            Receipt => Notes,
        }
    }

    fn is_text(self) -> bool {
        self != FormFocus::Category
    }
}

/// Results coming back from spawned assist tasks.
pub enum AssistReply {
    Receipt {
        generation: u64,
        result: Result<ReceiptFields, AssistError>,
    },
    Suggestion {
        generation: u64,
        result: Result<CategorySuggestion, AssistError>,
    },
}

/// Line editors backing the form's text fields.
#[derive(Debug, Default)]
pub struct FormEdits {
    pub amount: LineEdit,
    pub date: LineEdit,
    pub notes: LineEdit,
    pub receipt: LineEdit,
}

pub struct App {
    pub repo: ExpenseRepository,
    provider: Arc<LlmProvider>,
    pub form: FormController,
    pub tab: Tab,
    /// Cached `list()` snapshot backing the table.
    pub rows: Vec<Expense>,
    pub tsel: TableState,
    pub focus: FormFocus,
    pub editing: bool,
    pub edits: FormEdits,
    /// Selection into the category registry, None = unset.
    pub cat_index: Option<usize>,
    pub form_errors: Vec<FieldError>,
    pub confirm_delete: Option<ExpenseId>,
    pub status: String,
    pub quit: bool,
    assist_tx: mpsc::UnboundedSender<AssistReply>,
    assist_rx: mpsc::UnboundedReceiver<AssistReply>,
}

impl App {
    pub fn new(config: &Config, repo: ExpenseRepository) -> anyhow::Result<Self> {
        let provider = Arc::new(LlmProvider::new(config.assist.clone())?);
        let (assist_tx, assist_rx) = mpsc::unbounded_channel();

        let mut app = Self {
            repo,
            provider,
            form: FormController::new(),
            tab: Tab::Expenses,
            rows: Vec::new(),
            tsel: TableState::default(),
            focus: FormFocus::Amount,
            editing: false,
            edits: FormEdits::default(),
            cat_index: None,
            form_errors: Vec::new(),
            confirm_delete: None,
            status: "n: new expense | e: edit | x: delete | ?: help | q: quit".to_string(),
            quit: false,
            assist_tx,
            assist_rx,
        };
        app.refresh_rows();
        Ok(app)
    }

    pub fn refresh_rows(&mut self) {
        self.rows = self.repo.list();
        let len = self.rows.len();
        match (len, self.tsel.selected()) {
            (0, _) => self.tsel.select(None),
            (n, Some(i)) if i >= n => self.tsel.select(Some(n - 1)),
            (_, None) => self.tsel.select(Some(0)),
            _ => {}
        }
    }

    pub fn selected_expense(&self) -> Option<&Expense> {
        let idx = self.tsel.selected()?;
        self.rows.get(idx)
    }

    fn move_row(&mut self, delta: isize) {
        let n = self.rows.len();
        if n == 0 {
            self.tsel.select(None);
            return;
        }
        let cur = self.tsel.selected().unwrap_or(0) as isize;
        let next = (cur + delta).rem_euclid(n as isize) as usize;
        self.tsel.select(Some(next));
    }

    fn move_category(&mut self, delta: i32) {
        let len = category::CATEGORIES.len() as i32;
        let cur = self.cat_index.map(|i| i as i32).unwrap_or(-1);
        let next = if cur < 0 && delta < 0 {
            len - 1
        } else {
            (cur + delta).rem_euclid(len)
        };
        self.cat_index = Some(next as usize);
    }

    pub fn handle_key(&mut self, k: KeyEvent) {
        if k.kind != KeyEventKind::Press {
            return;
        }

        if self.confirm_delete.is_some() {
            self.handle_confirm_key(k);
            return;
        }

        if self.form.is_open() {
            self.handle_form_key(k);
            return;
        }

        match k.code {
            KeyCode::Char('q') => {
                self.quit = true;
                return;
            }
            KeyCode::Char('?') => {
                self.tab = Tab::Help;
                return;
            }
            _ => {}
        }

        match self.tab {
            Tab::Expenses => match k.code {
                KeyCode::Up => self.move_row(-1),
                KeyCode::Down => self.move_row(1),
                KeyCode::Char('n') => self.open_form_new(),
                KeyCode::Char('e') | KeyCode::Enter => self.open_form_edit(),
                KeyCode::Char('x') | KeyCode::Delete => {
                    self.confirm_delete = self.selected_expense().map(|e| e.id);
                }
                KeyCode::Char('r') => {
                    self.refresh_rows();
                    self.status = "Reloaded.".to_string();
                }
                _ => {}
            },
            Tab::Help => match k.code {
                KeyCode::Esc | KeyCode::Char('b') => self.tab = Tab::Expenses,
                _ => {}
            },
        }
    }

    fn handle_confirm_key(&mut self, k: KeyEvent) {
        match k.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                if let Some(id) = self.confirm_delete.take() {
                    if self.repo.remove(id) {
                        self.status = "Deleted.".to_string();
                    }
                    self.refresh_rows();
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.confirm_delete = None;
            }
            _ => {}
        }
    }

    fn open_form_new(&mut self) {
        self.form.open_new(util::today());
        self.form_errors.clear();
        self.focus = FormFocus::Amount;
        self.editing = false;
        self.seed_edits();
        self.status = "Fill in the details or scan a receipt to start.".to_string();
    }

    fn open_form_edit(&mut self) {
        let Some(expense) = self.selected_expense().cloned() else {
            return;
        };
        self.form.open_edit(&expense);
        self.form_errors.clear();
        self.focus = FormFocus::Amount;
        self.editing = false;
        self.seed_edits();
        self.status = "Update the details of your expense.".to_string();
    }

    /// Copies form fields into the line editors, after opening the form or
    /// applying an assist result.
    fn seed_edits(&mut self) {
        self.edits.amount.set(self.form.fields.amount.clone());
        self.edits.date.set(self.form.fields.date.clone());
        self.edits.notes.set(self.form.fields.notes.clone());
        self.edits.receipt.set(self.form.fields.receipt_path.clone());
        self.cat_index = category::position(&self.form.fields.category);
    }

    /// Copies line editor values back into the form fields, before any
    /// validate, submit or assist call.
    fn sync_form(&mut self) {
        self.form.fields.amount = self.edits.amount.value().to_string();
        self.form.fields.date = self.edits.date.value().to_string();
        self.form.fields.notes = self.edits.notes.value().to_string();
        self.form.fields.receipt_path = self.edits.receipt.value().to_string();
        self.form.fields.category = self
            .cat_index
            .and_then(|i| category::CATEGORIES.get(i))
            .map(|c| c.value.to_string())
            .unwrap_or_default();
    }

    fn handle_form_key(&mut self, k: KeyEvent) {
        if k.modifiers.contains(KeyModifiers::CONTROL) {
            match k.code {
                KeyCode::Char('s') => self.submit_form(),
                KeyCode::Char('g') => self.request_suggestion(),
                KeyCode::Char('r') => self.request_receipt_analysis(),
                _ => {}
            }
            return;
        }

        if self.editing {
            self.handle_edit_key(k);
            return;
        }

        match k.code {
            KeyCode::Esc => {
                self.form.cancel();
                self.form_errors.clear();
                self.status = "Canceled.".to_string();
            }
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            KeyCode::Up if self.focus == FormFocus::Category => self.move_category(-1),
            KeyCode::Down if self.focus == FormFocus::Category => self.move_category(1),
            KeyCode::Enter if self.focus.is_text() => self.editing = true,
            _ => {}
        }
    }

    fn handle_edit_key(&mut self, k: KeyEvent) {
        let Some(edit) = self.current_edit() else {
            self.editing = false;
            return;
        };
        match k.code {
            KeyCode::Char(c) => edit.push(c),
            KeyCode::Backspace => edit.backspace(),
            KeyCode::Delete => edit.delete(),
            KeyCode::Left => edit.left(),
            KeyCode::Right => edit.right(),
            KeyCode::Enter | KeyCode::Esc => self.editing = false,
            KeyCode::Tab => {
                self.focus = self.focus.next();
                self.editing = self.focus.is_text();
            }
            KeyCode::BackTab => {
                self.focus = self.focus.prev();
                self.editing = self.focus.is_text();
            }
            _ => {}
        }
    }

    fn current_edit(&mut self) -> Option<&mut LineEdit> {
        match self.focus {
            FormFocus::Amount => Some(&mut self.edits.amount),
            FormFocus::Date => Some(&mut self.edits.date),
            FormFocus::Notes => Some(&mut self.edits.notes),
            FormFocus::Receipt => Some(&mut self.edits.receipt),
            FormFocus::Category => None,
        }
    }

    fn submit_form(&mut self) {
        self.sync_form();
        match self.form.submit(&mut self.repo, util::today()) {
            Ok(SubmitOutcome::Created(_)) => {
                self.form_errors.clear();
                self.refresh_rows();
                self.status = "Saved.".to_string();
            }
            Ok(SubmitOutcome::Updated(_)) => {
                self.form_errors.clear();
                self.refresh_rows();
                self.status = "Updated.".to_string();
            }
            Err(SubmitError::Invalid(errors)) => {
                self.form_errors = errors;
                self.status = "Please fix the highlighted fields.".to_string();
            }
            Err(SubmitError::Repository(err)) => {
                self.status = format!("Save failed: {err}");
            }
            Err(SubmitError::Closed) => {}
        }
    }

    fn request_suggestion(&mut self) {
        self.sync_form();
        let description = self.form.fields.notes.trim().to_string();
        if description.chars().count() < MIN_SUGGESTION_DESCRIPTION {
            self.status = "Please enter a more descriptive note to get a suggestion.".to_string();
            return;
        }
        let Some(generation) = self.form.begin_assist() else {
            self.status = "An assist request is already running.".to_string();
            return;
        };

        let provider = Arc::clone(&self.provider);
        let tx = self.assist_tx.clone();
        tokio::spawn(async move {
            let result = provider
                .suggest_category(SuggestCategoryRequest { description })
                .await;
            let _ = tx.send(AssistReply::Suggestion { generation, result });
        });
        self.status = "Asking for a category suggestion…".to_string();
    }

    fn request_receipt_analysis(&mut self) {
        self.sync_form();
        let path = self.form.fields.receipt_path.trim().to_string();
        if path.is_empty() {
            self.status = "Enter a receipt image path first.".to_string();
            return;
        }
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.status = format!("Could not read {path}: {err}");
                return;
            }
        };
        let Some(generation) = self.form.begin_assist() else {
            self.status = "An assist request is already running.".to_string();
            return;
        };

        let data_uri = encode_receipt_data_uri(mime_for(Path::new(&path)), &bytes);
        let provider = Arc::clone(&self.provider);
        let tx = self.assist_tx.clone();
        tokio::spawn(async move {
            let result = provider
                .analyze_receipt(AnalyzeReceiptRequest { receipt_data_uri: data_uri })
                .await;
            let _ = tx.send(AssistReply::Receipt { generation, result });
        });
        self.status = "Analyzing receipt…".to_string();
    }

    /// Drains finished assist tasks. Stale results (form closed or reopened
    /// since the request) are dropped by the controller.
    pub fn poll_assist(&mut self) {
        while let Ok(reply) = self.assist_rx.try_recv() {
            match reply {
                AssistReply::Receipt { generation, result: Ok(fields) } => {
                    if self.form.apply_receipt(generation, &fields, util::today()) {
                        self.seed_edits();
                        self.status =
                            "Receipt analyzed; review the pre-filled fields.".to_string();
                    }
                }
                AssistReply::Receipt { generation, result: Err(err) } => {
                    self.form.finish_assist(generation);
                    self.status = format!("Failed to analyze the receipt: {err}");
                }
                AssistReply::Suggestion { generation, result: Ok(suggestion) } => {
                    match self.form.apply_suggestion(generation, &suggestion) {
                        SuggestionOutcome::Applied(matched) => {
                            self.cat_index = category::position(matched.value);
                            self.status = format!("Category set to \"{}\".", matched.label);
                        }
                        SuggestionOutcome::NoMatch => {
                            self.status = format!(
                                "No matching category for \"{}\"; pick one manually.",
                                suggestion.category.trim()
                            );
                        }
                        SuggestionOutcome::Stale => {}
                    }
                }
                AssistReply::Suggestion { generation, result: Err(err) } => {
                    self.form.finish_assist(generation);
                    self.status = format!("Failed to get a suggestion: {err}");
                }
            }
        }
    }

    pub fn form_title(&self) -> &'static str {
        match self.form.state() {
            FormState::Editing(_) => "Edit Expense",
            _ => "Add New Expense",
        }
    }
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
