//! Transaction command implementations

use anyhow::Result;
use chrono::NaiveDate;
use financeflow_core::aggregate::{apply_filters, resolved_date, signed_amount};
use financeflow_core::models::{Transaction, TransactionKind};
use financeflow_core::TransactionApi;

use super::{build_criteria, format_signed, truncate, Session};
use crate::cli::FilterArgs;

/// Fetch and filter transactions for the logged-in user
pub async fn filtered_transactions(
    session: &Session,
    filters: &FilterArgs,
    group: Option<&str>,
    today: NaiveDate,
) -> Result<Vec<Transaction>> {
    let criteria = build_criteria(filters, today)?;
    let transactions = session.fetch_all(group).await?;
    Ok(apply_filters(
        &transactions,
        &criteria,
        session.viewer_id(),
        &session.config.zone(),
    ))
}

pub async fn cmd_transactions_list(
    session: &Session,
    filters: &FilterArgs,
    group: Option<&str>,
    limit: usize,
    json: bool,
    today: NaiveDate,
) -> Result<()> {
    let transactions = filtered_transactions(session, filters, group, today).await?;

    if json {
        let shown: Vec<&Transaction> = transactions.iter().take(limit).collect();
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    if transactions.is_empty() {
        println!("No transactions match these filters.");
        return Ok(());
    }

    let zone = session.config.zone();
    println!();
    println!(
        "📝 Transactions ({} of {})",
        transactions.len().min(limit),
        transactions.len()
    );
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in transactions.iter().take(limit) {
        let date = resolved_date(tx, &zone)
            .map(|d| d.to_string())
            .unwrap_or_else(|_| "????-??-??".to_string());
        println!(
            "   {} │ {:>20} │ {:8} │ {:15} │ {}",
            date,
            format_signed(signed_amount(tx, session.viewer_id())),
            tx.kind().as_str(),
            truncate(tx.category.as_deref().unwrap_or("-"), 15),
            truncate(tx.label(), 35)
        );
    }

    if transactions.len() > limit {
        println!();
        println!("   Showing {} of {}. Use -n to see more.", limit, transactions.len());
    }

    Ok(())
}

pub async fn cmd_delete(session: &Session, id: &str, group: bool) -> Result<()> {
    let kind = if group {
        TransactionKind::Group
    } else {
        TransactionKind::Personal
    };
    let outcome = session.client.delete_transaction(id, kind).await?;
    println!("✅ {}", outcome.message);
    Ok(())
}
