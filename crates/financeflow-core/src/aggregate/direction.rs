//! Direction resolution
//!
//! Whether a transaction counts as income or expense depends on who is
//! looking at it. Every sum, filter and display sign in the crate goes
//! through [`resolve_direction`] so the rule lives in one place.

use crate::models::{Direction, Transaction};

/// Resolve a transaction's direction relative to `viewer_id`.
///
/// For a contact transaction the viewer is either the payer (`user`), which
/// makes it an expense, or the receiver (`contact.user`), which makes it
/// income. Anything else, including a contact transaction the viewer is not
/// party to, uses the recorded `transactionType`.
pub fn resolve_direction(tx: &Transaction, viewer_id: &str) -> Direction {
    if tx.is_contact_transaction {
        if let Some(contact) = &tx.contact {
            if tx.user.as_ref().is_some_and(|u| u.is(viewer_id)) {
                return Direction::Expense;
            }
            if contact.user.as_ref().is_some_and(|u| u.is(viewer_id)) {
                return Direction::Income;
            }
        }
    }
    tx.transaction_type.into()
}

/// Amount with the display sign for `viewer_id`: positive for income,
/// negative for expense.
pub fn signed_amount(tx: &Transaction, viewer_id: &str) -> f64 {
    match resolve_direction(tx, viewer_id) {
        Direction::Income => tx.amount,
        Direction::Expense => -tx.amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContactRef, TransactionType, UserRef};

    fn contact_tx(owner: &str, contact_user: Option<&str>, tx_type: TransactionType) -> Transaction {
        Transaction {
            id: "t1".into(),
            amount: 30.0,
            transaction_type: tx_type,
            is_contact_transaction: true,
            user: Some(UserRef::from(owner)),
            contact: Some(ContactRef {
                id: "c1".into(),
                name: Some("Sam".into()),
                user: contact_user.map(UserRef::from),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_viewer_is_payer_means_expense() {
        // Recorded as income, but the viewer paid
        let tx = contact_tx("me", Some("them"), TransactionType::Income);
        assert_eq!(resolve_direction(&tx, "me"), Direction::Expense);
    }

    #[test]
    fn test_viewer_is_receiver_means_income() {
        let tx = contact_tx("them", Some("me"), TransactionType::Expense);
        assert_eq!(resolve_direction(&tx, "me"), Direction::Income);
    }

    #[test]
    fn test_uninvolved_viewer_falls_through() {
        let tx = contact_tx("a", Some("b"), TransactionType::Income);
        assert_eq!(resolve_direction(&tx, "me"), Direction::Income);

        let tx = contact_tx("a", None, TransactionType::Expense);
        assert_eq!(resolve_direction(&tx, "me"), Direction::Expense);
    }

    #[test]
    fn test_contact_flag_without_contact_uses_type() {
        let mut tx = contact_tx("me", Some("them"), TransactionType::Income);
        tx.contact = None;
        assert_eq!(resolve_direction(&tx, "me"), Direction::Income);
    }

    #[test]
    fn test_non_contact_ignores_ownership() {
        let mut tx = contact_tx("me", Some("them"), TransactionType::Income);
        tx.is_contact_transaction = false;
        assert_eq!(resolve_direction(&tx, "me"), Direction::Income);
    }

    #[test]
    fn test_populated_user_refs_match_by_id() {
        let mut tx = contact_tx("x", None, TransactionType::Expense);
        tx.contact.as_mut().unwrap().user = Some(UserRef::User(crate::models::UserSummary {
            id: "me".into(),
            name: Some("Me".into()),
            email: None,
        }));
        assert_eq!(resolve_direction(&tx, "me"), Direction::Income);
    }

    #[test]
    fn test_signed_amount() {
        let tx = contact_tx("me", Some("them"), TransactionType::Income);
        assert_eq!(signed_amount(&tx, "me"), -30.0);
        assert_eq!(signed_amount(&tx, "them"), 30.0);
    }
}
