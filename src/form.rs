//! Expense form state machine: {Closed, Creating, Editing}. Independent of
//! any UI toolkit; the terminal layer is a thin adapter dispatching intents
//! into it. All field input arrives as text buffers and is validated here
//! before anything reaches the repository.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::assist::{CategorySuggestion, ReceiptFields};
use crate::model::{category, Category, Expense, ExpenseDraft, ExpenseId};
use crate::repository::{ExpenseRepository, RepositoryError};

pub const NOTES_MIN: usize = 3;
pub const NOTES_MAX: usize = 100;

/// Oldest date the form accepts, matching the original picker's lower bound.
pub fn min_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).expect("valid minimum date")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Closed,
    Creating,
    Editing(ExpenseId),
}

/// Field-level validation failures, surfaced inline on the form. They never
/// reach the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("amount must be a positive number")]
    Amount,
    #[error("date must be YYYY-MM-DD, not in the future and not before 1900-01-01")]
    Date,
    #[error("notes must be 3-100 characters")]
    Notes,
    #[error("category is required")]
    Category,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("form is not open")]
    Closed,
    #[error("validation failed")]
    Invalid(Vec<FieldError>),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, PartialEq)]
pub enum SubmitOutcome {
    Created(Expense),
    Updated(ExpenseId),
}

/// What happened to a category suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionOutcome {
    /// Label matched a registry entry; the category field was set.
    Applied(&'static Category),
    /// Label matched nothing; the field is untouched and the user should be
    /// told no suggestion was applied.
    NoMatch,
    /// The result arrived for a form that has since closed or switched
    /// records; it was discarded.
    Stale,
}

/// Text buffers backing the form. The receipt path is a terminal-side
/// convenience for picking the image to analyze; it is never part of the
/// committed record.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormFields {
    pub amount: String,
    pub date: String,
    pub category: String,
    pub notes: String,
    pub receipt_path: String,
}

#[derive(Debug)]
pub struct FormController {
    state: FormState,
    pub fields: FormFields,
    /// Bumped on every open and close. Assist results carry the generation
    /// they were requested under; a mismatch means the result is stale.
    generation: u64,
    assist_in_flight: bool,
}

impl Default for FormController {
    fn default() -> Self {
        Self::new()
    }
}

impl FormController {
    pub fn new() -> Self {
        Self {
            state: FormState::Closed,
            fields: FormFields::default(),
            generation: 0,
            assist_in_flight: false,
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != FormState::Closed
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn assist_in_flight(&self) -> bool {
        self.assist_in_flight
    }

    /// Closed → Creating, with today pre-filled as the date.
    pub fn open_new(&mut self, today: NaiveDate) {
        self.bump();
        self.state = FormState::Creating;
        self.fields = FormFields {
            date: today.format("%Y-%m-%d").to_string(),
            ..FormFields::default()
        };
    }

    /// Closed → Editing, pre-populated from the record being edited.
    pub fn open_edit(&mut self, expense: &Expense) {
        self.bump();
        self.state = FormState::Editing(expense.id);
        self.fields = FormFields {
            amount: expense.amount.to_string(),
            date: expense.date.format("%Y-%m-%d").to_string(),
            category: expense.category.clone(),
            notes: expense.notes.clone(),
            receipt_path: String::new(),
        };
    }

    /// {Creating, Editing} → Closed without committing.
    pub fn cancel(&mut self) {
        self.close();
    }

    /// Marks an assist request as outstanding and hands back the generation
    /// to stamp it with. `None` while another request is in flight or the
    /// form is closed; the UI uses that to disable the trigger.
    pub fn begin_assist(&mut self) -> Option<u64> {
        if !self.is_open() || self.assist_in_flight {
            return None;
        }
        self.assist_in_flight = true;
        Some(self.generation)
    }

    /// Clears the in-flight flag after a failed call, so the user can retry.
    pub fn finish_assist(&mut self, generation: u64) {
        if generation == self.generation {
            self.assist_in_flight = false;
        }
    }

    /// The validation gate. Either a committable draft or the full list of
    /// field errors; nothing in between.
    pub fn validate(&self, today: NaiveDate) -> Result<ExpenseDraft, Vec<FieldError>> {
        let mut errors = Vec::new();

        let amount = Decimal::from_str_exact(self.fields.amount.trim())
            .ok()
            .filter(|a| a.is_sign_positive() && !a.is_zero());
        if amount.is_none() {
            errors.push(FieldError::Amount);
        }

        let date = NaiveDate::parse_from_str(self.fields.date.trim(), "%Y-%m-%d")
            .ok()
            .filter(|d| *d <= today && *d >= min_date());
        if date.is_none() {
            errors.push(FieldError::Date);
        }

        let notes = self.fields.notes.trim();
        let notes_len = notes.chars().count();
        if !(NOTES_MIN..=NOTES_MAX).contains(&notes_len) {
            errors.push(FieldError::Notes);
        }

        if category::find(&self.fields.category).is_none() {
            errors.push(FieldError::Category);
        }

        match (amount, date) {
            (Some(amount), Some(date)) if errors.is_empty() => Ok(ExpenseDraft {
                amount,
                date,
                category: self.fields.category.clone(),
                notes: notes.to_string(),
            }),
            _ => Err(errors),
        }
    }

    /// Commits the form: add in Creating, replace-by-id in Editing. Closes
    /// the form on success, leaves it open (errors and all) on failure.
    pub fn submit(
        &mut self,
        repository: &mut ExpenseRepository,
        today: NaiveDate,
    ) -> Result<SubmitOutcome, SubmitError> {
        if !self.is_open() {
            return Err(SubmitError::Closed);
        }
        let draft = self.validate(today).map_err(SubmitError::Invalid)?;
        let outcome = match self.state {
            FormState::Creating => SubmitOutcome::Created(repository.add(draft)),
            FormState::Editing(id) => {
                repository.update(Expense::with_id(id, draft))?;
                SubmitOutcome::Updated(id)
            }
            FormState::Closed => unreachable!("checked above"),
        };
        self.close();
        Ok(outcome)
    }

    /// Applies receipt analysis to the open form. An unparseable date falls
    /// back to today instead of rejecting the whole result. Returns false
    /// when the result was stale and discarded.
    pub fn apply_receipt(
        &mut self,
        generation: u64,
        fields: &ReceiptFields,
        today: NaiveDate,
    ) -> bool {
        if generation != self.generation || !self.is_open() {
            return false;
        }
        self.assist_in_flight = false;

        let date = NaiveDate::parse_from_str(fields.date.trim(), "%Y-%m-%d").unwrap_or(today);
        self.fields.amount = fields.amount.to_string();
        self.fields.date = date.format("%Y-%m-%d").to_string();
        self.fields.notes = fields.notes.clone();
        true
    }

    /// Maps a suggested label back to a registry value, case-insensitively.
    /// An unknown label leaves the category unset rather than being applied
    /// blindly.
    pub fn apply_suggestion(
        &mut self,
        generation: u64,
        suggestion: &CategorySuggestion,
    ) -> SuggestionOutcome {
        if generation != self.generation || !self.is_open() {
            return SuggestionOutcome::Stale;
        }
        self.assist_in_flight = false;

        match category::find_by_label(&suggestion.category) {
            Some(matched) => {
                self.fields.category = matched.value.to_string();
                SuggestionOutcome::Applied(matched)
            }
            None => SuggestionOutcome::NoMatch,
        }
    }

    fn close(&mut self) {
        self.bump();
        self.state = FormState::Closed;
        self.fields = FormFields::default();
    }

    fn bump(&mut self) {
        self.generation += 1;
        self.assist_in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryBackend, Store};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn repo() -> ExpenseRepository {
        ExpenseRepository::open(Store::new(MemoryBackend::new()))
    }

    fn filled_form() -> FormController {
        let mut form = FormController::new();
        form.open_new(today());
        form.fields.amount = "12.50".to_string();
        form.fields.date = "2024-01-05".to_string();
        form.fields.category = "food".to_string();
        form.fields.notes = "Lunch".to_string();
        form
    }

    #[test]
    fn opens_in_creating_with_today_prefilled() {
        let mut form = FormController::new();
        assert_eq!(form.state(), FormState::Closed);

        form.open_new(today());
        assert_eq!(form.state(), FormState::Creating);
        assert_eq!(form.fields.date, "2024-06-01");

        form.cancel();
        assert_eq!(form.state(), FormState::Closed);
        assert_eq!(form.fields, FormFields::default());
    }

    #[test]
    fn open_edit_prepopulates_from_the_record() {
        let mut repo = repo();
        let expense = repo.add(ExpenseDraft {
            amount: Decimal::from_str_exact("9.99").unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 2, 2).unwrap(),
            category: "shopping".to_string(),
            notes: "Socks".to_string(),
        });

        let mut form = FormController::new();
        form.open_edit(&expense);
        assert_eq!(form.state(), FormState::Editing(expense.id));
        assert_eq!(form.fields.amount, "9.99");
        assert_eq!(form.fields.date, "2024-02-02");
        assert_eq!(form.fields.category, "shopping");
        assert_eq!(form.fields.notes, "Socks");
    }

    #[test]
    fn validation_collects_every_failing_field() {
        let mut form = FormController::new();
        form.open_new(today());
        form.fields.amount = "-3".to_string();
        form.fields.date = "not-a-date".to_string();
        form.fields.category = String::new();
        form.fields.notes = "ab".to_string();

        let errors = form.validate(today()).unwrap_err();
        assert_eq!(
            errors,
            vec![FieldError::Amount, FieldError::Date, FieldError::Notes, FieldError::Category]
        );
    }

    #[test]
    fn validation_bounds_are_inclusive() {
        let mut form = filled_form();
        form.fields.notes = "abc".to_string();
        assert!(form.validate(today()).is_ok());

        form.fields.notes = "x".repeat(100);
        assert!(form.validate(today()).is_ok());

        form.fields.notes = "x".repeat(101);
        assert_eq!(form.validate(today()).unwrap_err(), vec![FieldError::Notes]);

        form.fields.notes = "Lunch".to_string();
        form.fields.date = today().format("%Y-%m-%d").to_string();
        assert!(form.validate(today()).is_ok());

        form.fields.date = "1900-01-01".to_string();
        assert!(form.validate(today()).is_ok());

        form.fields.date = "1899-12-31".to_string();
        assert_eq!(form.validate(today()).unwrap_err(), vec![FieldError::Date]);

        form.fields.date = "2024-06-02".to_string(); // tomorrow
        assert_eq!(form.validate(today()).unwrap_err(), vec![FieldError::Date]);
    }

    #[test]
    fn zero_amount_is_rejected() {
        let mut form = filled_form();
        form.fields.amount = "0".to_string();
        assert_eq!(form.validate(today()).unwrap_err(), vec![FieldError::Amount]);
    }

    #[test]
    fn unknown_category_value_is_rejected() {
        let mut form = filled_form();
        form.fields.category = "crypto".to_string();
        assert_eq!(form.validate(today()).unwrap_err(), vec![FieldError::Category]);
    }

    #[test]
    fn submit_in_creating_adds_and_closes() {
        let mut repo = repo();
        let mut form = filled_form();

        let outcome = form.submit(&mut repo, today()).unwrap();
        let SubmitOutcome::Created(created) = outcome else {
            panic!("expected a created record");
        };
        assert_eq!(created.notes, "Lunch");
        assert_eq!(form.state(), FormState::Closed);
        assert_eq!(repo.list(), vec![created]);
    }

    #[test]
    fn submit_in_editing_replaces_under_the_original_id() {
        let mut repo = repo();
        let original = repo.add(ExpenseDraft {
            amount: Decimal::from_str_exact("5.00").unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            category: "transport".to_string(),
            notes: "Bus fare".to_string(),
        });

        let mut form = FormController::new();
        form.open_edit(&original);
        form.fields.amount = "6.50".to_string();
        form.fields.notes = "Bus fare, return trip".to_string();

        let outcome = form.submit(&mut repo, today()).unwrap();
        assert_eq!(outcome, SubmitOutcome::Updated(original.id));

        let rows = repo.list();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, original.id);
        assert_eq!(rows[0].amount, Decimal::from_str_exact("6.50").unwrap());
        assert_eq!(rows[0].notes, "Bus fare, return trip");
    }

    #[test]
    fn invalid_submit_leaves_the_form_open() {
        let mut repo = repo();
        let mut form = filled_form();
        form.fields.amount = "free".to_string();

        let err = form.submit(&mut repo, today());
        assert!(matches!(err, Err(SubmitError::Invalid(_))));
        assert_eq!(form.state(), FormState::Creating);
        assert!(repo.is_empty());
    }

    #[test]
    fn receipt_result_populates_fields() {
        let mut form = filled_form();
        let generation = form.begin_assist().unwrap();
        let applied = form.apply_receipt(
            generation,
            &ReceiptFields {
                amount: Decimal::from_str_exact("23.10").unwrap(),
                date: "2024-03-15".to_string(),
                notes: "Supermarket".to_string(),
            },
            today(),
        );
        assert!(applied);
        assert_eq!(form.fields.amount, "23.10");
        assert_eq!(form.fields.date, "2024-03-15");
        assert_eq!(form.fields.notes, "Supermarket");
        assert!(!form.assist_in_flight());
    }

    #[test]
    fn unparseable_receipt_date_falls_back_to_today() {
        let mut form = filled_form();
        let generation = form.begin_assist().unwrap();
        form.apply_receipt(
            generation,
            &ReceiptFields {
                amount: Decimal::ONE,
                date: "sometime in march".to_string(),
                notes: "Receipt".to_string(),
            },
            today(),
        );
        assert_eq!(form.fields.date, "2024-06-01");
    }

    #[test]
    fn stale_receipt_results_are_discarded() {
        let mut form = filled_form();
        let generation = form.begin_assist().unwrap();
        form.cancel();
        form.open_new(today());
        form.fields.notes = "Untouched".to_string();

        let applied = form.apply_receipt(
            generation,
            &ReceiptFields {
                amount: Decimal::ONE,
                date: "2024-03-15".to_string(),
                notes: "Late arrival".to_string(),
            },
            today(),
        );
        assert!(!applied);
        assert_eq!(form.fields.notes, "Untouched");
    }

    #[test]
    fn only_one_assist_request_at_a_time() {
        let mut form = filled_form();
        let generation = form.begin_assist().unwrap();
        assert!(form.begin_assist().is_none());

        form.finish_assist(generation);
        assert!(form.begin_assist().is_some());
    }

    #[test]
    fn suggestion_labels_map_case_insensitively() {
        let mut form = filled_form();
        form.fields.category = String::new();
        let generation = form.begin_assist().unwrap();

        let outcome = form
            .apply_suggestion(generation, &CategorySuggestion { category: "Food".to_string() });
        assert!(matches!(outcome, SuggestionOutcome::Applied(c) if c.value == "food"));
        assert_eq!(form.fields.category, "food");
    }

    #[test]
    fn unknown_suggestion_labels_leave_the_category_unset() {
        let mut form = filled_form();
        form.fields.category = String::new();
        let generation = form.begin_assist().unwrap();

        let outcome = form.apply_suggestion(
            generation,
            &CategorySuggestion { category: "Groceries".to_string() },
        );
        assert_eq!(outcome, SuggestionOutcome::NoMatch);
        assert_eq!(form.fields.category, "");
    }

    #[test]
    fn stale_suggestions_are_discarded() {
        let mut form = filled_form();
        let generation = form.begin_assist().unwrap();
        form.cancel();

        let outcome = form
            .apply_suggestion(generation, &CategorySuggestion { category: "Food".to_string() });
        assert_eq!(outcome, SuggestionOutcome::Stale);
    }
}
