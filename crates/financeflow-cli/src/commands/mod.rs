//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (store, config, session, criteria) and `config`
//! - `auth` - Login/logout commands
//! - `transactions` - Transaction commands (list, delete)
//! - `reports` - Summary, chart and category breakdown commands
//! - `accounts` - Bank account listing
//! - `history` - Calculator history kept in the local store

pub mod accounts;
pub mod auth;
pub mod core;
pub mod history;
pub mod reports;
pub mod transactions;

// Re-export command functions for main.rs
pub use accounts::*;
pub use auth::*;
pub use core::*;
pub use history::*;
pub use reports::*;
pub use transactions::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format an amount signed and colored by direction: red for money out,
/// green for money in
pub fn format_signed(amount: f64) -> String {
    if amount < 0.0 {
        format!("\x1b[31m-${:.2}\x1b[0m", amount.abs())
    } else {
        format!("\x1b[32m+${:.2}\x1b[0m", amount)
    }
}
