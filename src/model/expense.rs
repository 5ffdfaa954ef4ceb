use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque expense identity, generated at creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(Uuid);

impl ExpenseId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single recorded spending event.
///
/// The persisted shape is `{id, amount, date, category, notes}` with the
/// amount as a JSON number and the date as a string. Edits replace the whole
/// record; nothing is mutated field-by-field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "stored_date")]
    pub date: NaiveDate,
    pub category: String,
    pub notes: String,
}

/// An expense without identity, as assembled by the form controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category: String,
    pub notes: String,
}

impl Expense {
    /// Mints a new record from a draft with a fresh id.
    pub fn new(draft: ExpenseDraft) -> Self {
        Self::with_id(ExpenseId::generate(), draft)
    }

    /// Rebuilds a record under an existing id (edit = wholesale replace).
    pub fn with_id(id: ExpenseId, draft: ExpenseDraft) -> Self {
        Self {
            id,
            amount: draft.amount,
            date: draft.date,
            category: draft.category,
            notes: draft.notes,
        }
    }
}

/// Dates are written as calendar dates, but earlier payloads carry full ISO
/// datetimes, so reads accept both.
mod stored_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_stored_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid expense date {raw:?}")))
    }
}

pub(crate) fn parse_stored_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        chrono::DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.date_naive())
    })
}
