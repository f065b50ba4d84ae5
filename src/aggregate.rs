//! Aggregate figures derived from a list of transactions.
//!
//! Everything here is a pure function of its input and is recomputed on every call.

use crate::model::{Category, Transaction};
use serde::Serialize;

/// The number of categories reported by `category_breakdown`.
pub const TOP_CATEGORIES: usize = 4;

/// Sum of all income amounts.
pub fn total_income(transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .filter(|t| t.is_income())
        .map(|t| t.amount().value())
        .sum()
}

/// Sum of all expense amounts.
pub fn total_expense(transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .filter(|t| t.is_expense())
        .map(|t| t.amount().value())
        .sum()
}

/// Income minus expenses. May be negative.
pub fn balance(transactions: &[Transaction]) -> f64 {
    total_income(transactions) - total_expense(transactions)
}

/// One row of the category breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: Category,
    /// Summed expense amount for the category.
    pub value: f64,
    /// Share of total expenses, 0 to 100.
    pub percentage: f64,
}

/// Groups expenses by category, sums them, and returns the `TOP_CATEGORIES` largest groups in
/// descending order with their share of total expenses.
///
/// Groups with equal sums keep the order in which their category first appears in
/// `transactions`.
pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategoryShare> {
    let mut groups: Vec<(Category, f64)> = Vec::new();
    for t in transactions.iter().filter(|t| t.is_expense()) {
        match groups.iter_mut().find(|(c, _)| *c == t.category()) {
            Some((_, sum)) => *sum += t.amount().value(),
            None => groups.push((t.category(), t.amount().value())),
        }
    }

    // sort_by is stable, so ties stay in first-appearance order.
    groups.sort_by(|a, b| b.1.total_cmp(&a.1));

    let total = total_expense(transactions);
    groups
        .into_iter()
        .take(TOP_CATEGORIES)
        .map(|(category, value)| CategoryShare {
            category,
            value,
            percentage: if total > 0.0 {
                value / total * 100.0
            } else {
                0.0
            },
        })
        .collect()
}

/// All derived figures for a set of transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_income: f64,
    pub total_expense: f64,
    pub balance: f64,
    pub breakdown: Vec<CategoryShare>,
}

impl Summary {
    pub fn of(transactions: &[Transaction]) -> Self {
        Self {
            total_income: total_income(transactions),
            total_expense: total_expense(transactions),
            balance: balance(transactions),
            breakdown: category_breakdown(transactions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, TransactionId, TransactionType};
    use crate::store::seed;
    use chrono::NaiveDate;

    fn tx(id: u64, amount: f64, r#type: TransactionType, category: Category) -> Transaction {
        Transaction::new(
            TransactionId::new(id),
            format!("t{id}"),
            Amount::new(amount).unwrap(),
            r#type,
            category,
            NaiveDate::from_ymd_opt(2023, 11, 1).unwrap(),
        )
    }

    fn expense(id: u64, amount: f64, category: Category) -> Transaction {
        tx(id, amount, TransactionType::Expense, category)
    }

    #[test]
    fn test_seed_totals() {
        let seed = seed();
        assert_eq!(total_income(&seed), 15000.0);
        assert_eq!(total_expense(&seed), 20450.0);
        assert_eq!(balance(&seed), -5450.0);
    }

    #[test]
    fn test_seed_breakdown() {
        let breakdown = category_breakdown(&seed());
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].category, Category::Housing);
        assert_eq!(breakdown[0].value, 18000.0);
        assert!((breakdown[0].percentage - 88.0195599).abs() < 1e-6);
        assert_eq!(breakdown[1].category, Category::Food);
        assert_eq!(breakdown[1].value, 2450.0);
    }

    #[test]
    fn test_balance_identity() {
        let sets = vec![
            vec![],
            seed(),
            vec![tx(1, 10.5, TransactionType::Income, Category::Work)],
            vec![
                expense(1, 0.1, Category::Food),
                expense(2, 0.2, Category::Food),
                tx(3, 0.3, TransactionType::Income, Category::Work),
            ],
        ];
        for set in sets {
            assert_eq!(balance(&set), total_income(&set) - total_expense(&set));
        }
    }

    #[test]
    fn test_no_expenses_means_zero_percentages() {
        let incomes = vec![tx(1, 100.0, TransactionType::Income, Category::Work)];
        assert!(category_breakdown(&incomes).is_empty());

        let zeros = vec![
            expense(1, 0.0, Category::Food),
            expense(2, 0.0, Category::Health),
        ];
        let breakdown = category_breakdown(&zeros);
        assert_eq!(breakdown.len(), 2);
        assert!(breakdown.iter().all(|s| s.percentage == 0.0));
    }

    #[test]
    fn test_at_most_four_groups() {
        let set: Vec<Transaction> = Category::ALL
            .iter()
            .enumerate()
            .map(|(i, c)| expense(i as u64, (i + 1) as f64 * 10.0, *c))
            .collect();
        let breakdown = category_breakdown(&set);
        assert_eq!(breakdown.len(), TOP_CATEGORIES);
        assert_eq!(breakdown[0].category, Category::Health);
        assert_eq!(breakdown[3].category, Category::Entertainment);
        let sum: f64 = breakdown.iter().map(|s| s.percentage).sum();
        assert!(sum < 100.0);
    }

    #[test]
    fn test_percentages_total_100_when_all_fit() {
        let set = vec![
            expense(1, 30.0, Category::Food),
            expense(2, 20.0, Category::Shopping),
            expense(3, 25.0, Category::Food),
            expense(4, 25.0, Category::Health),
        ];
        let sum: f64 = category_breakdown(&set).iter().map(|s| s.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert!(sum <= 100.0 + 1e-9);
    }

    #[test]
    fn test_ties_keep_first_appearance_order() {
        let set = vec![
            expense(1, 50.0, Category::Shopping),
            expense(2, 50.0, Category::Food),
            expense(3, 80.0, Category::Health),
            expense(4, 50.0, Category::Entertainment),
        ];
        let order: Vec<Category> = category_breakdown(&set)
            .iter()
            .map(|s| s.category)
            .collect();
        assert_eq!(
            order,
            vec![
                Category::Health,
                Category::Shopping,
                Category::Food,
                Category::Entertainment
            ]
        );
    }

    #[test]
    fn test_summary_of_seed() {
        let summary = Summary::of(&seed());
        assert_eq!(summary.total_income, 15000.0);
        assert_eq!(summary.total_expense, 20450.0);
        assert_eq!(summary.balance, -5450.0);
        assert_eq!(summary.breakdown.len(), 2);
    }

    #[test]
    fn test_largest_amounts_stay_finite() {
        let set = vec![
            expense(1, Amount::MAX, Category::Food),
            expense(2, Amount::MAX, Category::Food),
        ];
        let total = total_expense(&set);
        assert!(total.is_finite());
        assert_eq!(total, 2.0 * Amount::MAX);
        let shares = category_breakdown(&set);
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].percentage, 100.0);
    }
}
