//! Derived per-category and total sums. Pure functions of a repository
//! snapshot; nothing here is persisted or cached.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::model::Expense;

/// Sums amounts grouped by category value. Categories with no expenses are
/// omitted, not zero-filled. Decimal accumulation keeps the result exact
/// regardless of summation order.
pub fn aggregate(expenses: &[Expense]) -> BTreeMap<String, Decimal> {
    let mut totals = BTreeMap::new();
    for expense in expenses {
        *totals.entry(expense.category.clone()).or_insert(Decimal::ZERO) += expense.amount;
    }
    totals
}

pub fn grand_total(expenses: &[Expense]) -> Decimal {
    expenses.iter().map(|e| e.amount).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExpenseDraft;
    use chrono::NaiveDate;

    fn expense(amount: &str, category: &str) -> Expense {
        Expense::new(ExpenseDraft {
            amount: Decimal::from_str_exact(amount).unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            category: category.to_string(),
            notes: "Something".to_string(),
        })
    }

    #[test]
    fn empty_set_aggregates_to_nothing() {
        assert!(aggregate(&[]).is_empty());
        assert_eq!(grand_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn groups_by_category_and_omits_absent_ones() {
        let expenses = vec![expense("10", "food"), expense("5", "transport")];
        let totals = aggregate(&expenses);

        assert_eq!(totals.len(), 2);
        assert_eq!(totals["food"], Decimal::from(10));
        assert_eq!(totals["transport"], Decimal::from(5));
        assert!(!totals.contains_key("health"));
        assert_eq!(grand_total(&expenses), Decimal::from(15));
    }

    #[test]
    fn single_expense_scenario() {
        let expenses = vec![expense("12.50", "food")];
        assert_eq!(grand_total(&expenses), Decimal::from_str_exact("12.50").unwrap());
        assert_eq!(aggregate(&expenses)["food"], Decimal::from_str_exact("12.50").unwrap());
    }

    #[test]
    fn category_totals_sum_to_the_grand_total() {
        let expenses = vec![
            expense("0.10", "food"),
            expense("0.20", "food"),
            expense("0.30", "transport"),
            expense("19.99", "shopping"),
            expense("3.45", "other"),
        ];
        let summed: Decimal = aggregate(&expenses).values().copied().sum();
        assert_eq!(summed, grand_total(&expenses));
    }

    #[test]
    fn accumulation_has_no_float_drift() {
        // 0.1 three hundred times is exactly 30 in decimal arithmetic.
        let expenses: Vec<Expense> = (0..300).map(|_| expense("0.1", "food")).collect();
        assert_eq!(grand_total(&expenses), Decimal::from(30));
    }

    #[test]
    fn result_is_order_independent() {
        let mut expenses = vec![
            expense("1.11", "food"),
            expense("2.22", "transport"),
            expense("3.33", "food"),
        ];
        let forward = aggregate(&expenses);
        expenses.reverse();
        assert_eq!(aggregate(&expenses), forward);
    }
}
