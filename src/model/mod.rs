pub mod category;
pub mod expense;

pub use category::{Category, CATEGORIES};
pub use expense::{Expense, ExpenseDraft, ExpenseId};
