//! The authoritative in-memory expense collection, synchronized to the
//! store adapter on every mutation.

use thiserror::Error;

use crate::model::{Expense, ExpenseDraft, ExpenseId};
use crate::store::Store;

/// The single logical key the whole collection lives under.
pub const EXPENSES_KEY: &str = "expenses";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("no expense with id {0}")]
    NotFound(ExpenseId),
}

pub struct ExpenseRepository {
    store: Store,
    /// Insertion order. Presentation order is derived in [`list`](Self::list).
    expenses: Vec<Expense>,
}

impl ExpenseRepository {
    /// Loads the persisted collection; malformed or missing data starts an
    /// empty one rather than failing.
    pub fn open(store: Store) -> Self {
        let expenses = store.load(EXPENSES_KEY, Vec::new());
        Self { store, expenses }
    }

    /// Mints a record with a fresh id, appends it and persists.
    pub fn add(&mut self, draft: ExpenseDraft) -> Expense {
        let expense = Expense::new(draft);
        self.expenses.push(expense.clone());
        self.persist();
        expense
    }

    /// Replaces the record with `expense.id` wholesale. The collection is
    /// untouched when the id is unknown.
    pub fn update(&mut self, expense: Expense) -> Result<(), RepositoryError> {
        match self.expenses.iter_mut().find(|e| e.id == expense.id) {
            Some(slot) => {
                *slot = expense;
                self.persist();
                Ok(())
            }
            None => Err(RepositoryError::NotFound(expense.id)),
        }
    }

    /// Removes the record with `id` if present. Idempotent; reports whether
    /// anything was removed.
    pub fn remove(&mut self, id: ExpenseId) -> bool {
        let before = self.expenses.len();
        self.expenses.retain(|e| e.id != id);
        let removed = self.expenses.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    pub fn get(&self, id: ExpenseId) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id == id)
    }

    /// Presentation snapshot: newest date first, ties keep insertion order.
    pub fn list(&self) -> Vec<Expense> {
        let mut snapshot = self.expenses.clone();
        // Vec::sort_by is stable, which is what keeps same-date ties in
        // insertion order.
        snapshot.sort_by(|a, b| b.date.cmp(&a.date));
        snapshot
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    fn persist(&mut self) {
        self.store.save(EXPENSES_KEY, &self.expenses);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn repo() -> ExpenseRepository {
        ExpenseRepository::open(Store::new(MemoryBackend::new()))
    }

    fn draft(amount: &str, date: &str, category: &str, notes: &str) -> ExpenseDraft {
        ExpenseDraft {
            amount: Decimal::from_str_exact(amount).unwrap(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            category: category.to_string(),
            notes: notes.to_string(),
        }
    }

    #[test]
    fn add_then_list_contains_the_record() {
        let mut repo = repo();
        let added = repo.add(draft("12.50", "2024-01-05", "food", "Lunch"));

        let rows = repo.list();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], added);
        assert_eq!(rows[0].amount, Decimal::from_str_exact("12.50").unwrap());
    }

    #[test]
    fn added_ids_are_unique() {
        let mut repo = repo();
        for _ in 0..20 {
            repo.add(draft("1", "2024-01-05", "food", "Lunch"));
        }
        let mut ids: Vec<_> = repo.list().iter().map(|e| e.id).collect();
        ids.sort_by_key(|id| id.to_string());
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn update_replaces_only_the_matching_record() {
        let mut repo = repo();
        let keep = repo.add(draft("5.00", "2024-01-01", "transport", "Bus fare"));
        let edit = repo.add(draft("9.00", "2024-01-02", "food", "Sandwich"));

        let mut replacement = edit.clone();
        replacement.amount = Decimal::from_str_exact("11.00").unwrap();
        replacement.notes = "Sandwich and coffee".to_string();
        repo.update(replacement.clone()).unwrap();

        let rows = repo.list();
        assert_eq!(rows.iter().find(|e| e.id == edit.id), Some(&replacement));
        assert_eq!(rows.iter().find(|e| e.id == keep.id), Some(&keep));
    }

    #[test]
    fn update_of_unknown_id_is_a_not_found_signal() {
        let mut repo = repo();
        let stray = Expense::new(draft("1.00", "2024-01-01", "food", "Ghost"));
        assert_eq!(repo.update(stray.clone()), Err(RepositoryError::NotFound(stray.id)));
        assert!(repo.is_empty());
    }

    #[test]
    fn remove_is_idempotent() {
        let mut repo = repo();
        let added = repo.add(draft("3.00", "2024-01-01", "food", "Snack"));

        assert!(repo.remove(added.id));
        assert!(repo.list().iter().all(|e| e.id != added.id));
        assert!(!repo.remove(added.id));
        assert!(repo.is_empty());
    }

    #[test]
    fn list_sorts_by_descending_date_with_stable_ties() {
        let mut repo = repo();
        let older = repo.add(draft("1.00", "2024-01-01", "food", "First"));
        let tie_a = repo.add(draft("2.00", "2024-02-01", "food", "Tie A"));
        let newer = repo.add(draft("3.00", "2024-03-01", "food", "Newest"));
        let tie_b = repo.add(draft("4.00", "2024-02-01", "food", "Tie B"));

        let ids: Vec<_> = repo.list().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![newer.id, tie_a.id, tie_b.id, older.id]);
    }

    #[test]
    fn mutations_survive_a_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let added = {
            let mut repo = ExpenseRepository::open(Store::open(dir.path()));
            let added = repo.add(draft("12.50", "2024-01-05", "food", "Lunch"));
            repo.add(draft("5.00", "2024-01-06", "transport", "Bus fare"));
            repo.remove(added.id);
            repo.add(draft("7.25", "2024-01-07", "shopping", "Socks"))
        };

        let repo = ExpenseRepository::open(Store::open(dir.path()));
        assert_eq!(repo.len(), 2);
        assert_eq!(repo.get(added.id), Some(&added));
    }

    #[test]
    fn malformed_persisted_payload_loads_as_empty() {
        let store = Store::new(MemoryBackend::with_entry(EXPENSES_KEY, "][ not json"));
        let repo = ExpenseRepository::open(store);
        assert!(repo.is_empty());
        assert!(repo.list().is_empty());
    }

    #[test]
    fn write_failures_leave_memory_state_intact() {
        let mut repo = ExpenseRepository::open(Store::new(MemoryBackend::broken()));
        let added = repo.add(draft("12.50", "2024-01-05", "food", "Lunch"));
        assert_eq!(repo.list(), vec![added]);
    }
}
