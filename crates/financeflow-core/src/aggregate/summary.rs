//! Summary totals and category breakdown

use std::collections::HashMap;

use serde::Serialize;

use super::buckets::round_currency;
use super::direction::resolve_direction;
use crate::models::{Direction, GroupTotals, Transaction};

/// Label used for transactions without a category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Header totals for the filtered list
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct Summary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net: f64,
    /// Number of itemized transactions; group balances do not count
    pub count: usize,
}

/// Total the filtered list for `viewer_id`.
///
/// Group balances, when supplied, are a separate figure from the itemized
/// personal and contact transactions: what others owe the viewer starts the
/// income total and what the viewer owes starts the expense total.
pub fn summarize(
    transactions: &[Transaction],
    viewer_id: &str,
    group_balances: Option<&GroupTotals>,
) -> Summary {
    let (mut income, mut expenses) = match group_balances {
        Some(totals) => (totals.owed_to_you, totals.you_owe),
        None => (0.0, 0.0),
    };

    for tx in transactions {
        match resolve_direction(tx, viewer_id) {
            Direction::Income => income += tx.amount,
            Direction::Expense => expenses += tx.amount,
        }
    }

    let total_income = round_currency(income);
    let total_expenses = round_currency(expenses);
    Summary {
        total_income,
        total_expenses,
        net: round_currency(total_income - total_expenses),
        count: transactions.len(),
    }
}

/// Spending (or income) for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: f64,
    pub count: usize,
    pub percentage: f64,
}

/// Per-category totals for one direction, largest first
pub fn category_breakdown(
    transactions: &[Transaction],
    viewer_id: &str,
    direction: Direction,
) -> Vec<CategoryTotal> {
    let mut by_category: HashMap<String, (f64, usize)> = HashMap::new();
    let mut total = 0.0;

    for tx in transactions
        .iter()
        .filter(|tx| resolve_direction(tx, viewer_id) == direction)
    {
        let name = tx
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNCATEGORIZED);
        let entry = by_category.entry(name.to_string()).or_insert((0.0, 0));
        entry.0 += tx.amount;
        entry.1 += 1;
        total += tx.amount;
    }

    let mut totals: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, (amount, count))| CategoryTotal {
            category,
            amount: round_currency(amount),
            count,
            percentage: if total > 0.0 {
                (amount / total) * 100.0
            } else {
                0.0
            },
        })
        .collect();

    totals.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContactRef, TransactionType, UserRef};

    fn tx(amount: f64, tx_type: TransactionType, category: Option<&str>) -> Transaction {
        Transaction {
            id: format!("{}-{}", tx_type, amount),
            amount,
            transaction_type: tx_type,
            category: category.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_net_and_count() {
        let txs = vec![
            tx(100.0, TransactionType::Income, None),
            tx(40.0, TransactionType::Expense, None),
        ];
        let summary = summarize(&txs, "me", None);
        assert_eq!(summary.total_income, 100.0);
        assert_eq!(summary.total_expenses, 40.0);
        assert_eq!(summary.net, 60.0);
        assert_eq!(summary.count, 2);
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(summarize(&[], "me", None), Summary::default());
    }

    #[test]
    fn test_group_balances_seed_totals() {
        let txs = vec![tx(50.0, TransactionType::Expense, None)];
        let seed = GroupTotals {
            you_owe: 20.0,
            owed_to_you: 75.5,
        };
        let summary = summarize(&txs, "me", Some(&seed));
        assert_eq!(summary.total_income, 75.5);
        assert_eq!(summary.total_expenses, 70.0);
        assert_eq!(summary.net, 5.5);
        assert_eq!(summary.count, 1);
    }

    #[test]
    fn test_contact_direction_respected() {
        let txs = vec![Transaction {
            id: "c".into(),
            amount: 25.0,
            transaction_type: TransactionType::Expense,
            is_contact_transaction: true,
            user: Some(UserRef::from("them")),
            contact: Some(ContactRef {
                id: "c1".into(),
                name: None,
                user: Some(UserRef::from("me")),
            }),
            ..Default::default()
        }];
        let summary = summarize(&txs, "me", None);
        assert_eq!(summary.total_income, 25.0);
        assert_eq!(summary.total_expenses, 0.0);
    }

    #[test]
    fn test_category_breakdown() {
        let txs = vec![
            tx(30.0, TransactionType::Expense, Some("Food")),
            tx(10.0, TransactionType::Expense, Some("Food")),
            tx(60.0, TransactionType::Expense, Some("Rent")),
            tx(100.0, TransactionType::Expense, None),
            tx(500.0, TransactionType::Income, Some("Salary")),
        ];
        let breakdown = category_breakdown(&txs, "me", Direction::Expense);
        assert_eq!(breakdown.len(), 3);
        assert_eq!(breakdown[0].category, UNCATEGORIZED);
        assert_eq!(breakdown[1].category, "Rent");
        assert_eq!(breakdown[2].category, "Food");
        assert_eq!(breakdown[2].amount, 40.0);
        assert_eq!(breakdown[2].count, 2);
        assert_eq!(breakdown[0].percentage, 50.0);

        let income = category_breakdown(&txs, "me", Direction::Income);
        assert_eq!(income.len(), 1);
        assert_eq!(income[0].percentage, 100.0);
    }
}
