//! Bank account command implementations

use anyhow::{Context, Result};
use financeflow_core::TransactionApi;

use super::{truncate, Session};

pub async fn cmd_accounts(session: &Session) -> Result<()> {
    let accounts = session
        .client
        .fetch_bank_accounts()
        .await
        .context("Failed to load bank accounts")?;

    if accounts.is_empty() {
        println!("No bank accounts linked.");
        return Ok(());
    }

    println!();
    println!("🏦 Bank Accounts");
    println!("   ─────────────────────────────────────────────────────────────");

    for account in &accounts {
        let balance = account
            .balance
            .map(|b| format!("${:.2}", b))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   {:30} │ {:10} │ {:>12} │ {}",
            truncate(&account.display_name(), 30),
            account.account_type.as_deref().unwrap_or(""),
            balance,
            account.id
        );
    }

    Ok(())
}
