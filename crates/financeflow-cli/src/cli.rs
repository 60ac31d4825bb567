//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use financeflow_core::aggregate::{ChartMetric, Granularity, RangePreset};
use financeflow_core::models::{Direction, TransactionKind};

/// FinanceFlow - Track income and expenses from the terminal
#[derive(Parser)]
#[command(name = "financeflow")]
#[command(about = "Command-line client for the FinanceFlow expense tracker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Local store path (session and client state)
    ///
    /// Defaults to ~/.local/share/financeflow/store.json on Linux.
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// API base URL (overrides config file and FINANCEFLOW_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Criteria shared by every command that reads transactions
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Date range preset: today, last-7-days, this-week, last-30-days,
    /// this-month, last-month, last-90-days, this-year
    #[arg(short, long)]
    pub period: Option<RangePreset>,

    /// Start date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "period")]
    pub from: Option<String>,

    /// End date (YYYY-MM-DD, defaults to today)
    #[arg(long, conflicts_with = "period", requires = "from")]
    pub to: Option<String>,

    /// Only these categories (repeatable)
    #[arg(short, long = "category")]
    pub categories: Vec<String>,

    /// Only these bank account ids (repeatable)
    #[arg(long = "account")]
    pub accounts: Vec<String>,

    /// Minimum amount
    #[arg(long)]
    pub min: Option<f64>,

    /// Maximum amount
    #[arg(long)]
    pub max: Option<f64>,

    /// Text search over title and description
    #[arg(short, long)]
    pub search: Option<String>,

    /// income or expense, as seen by the logged-in user
    #[arg(long)]
    pub direction: Option<Direction>,

    /// personal, group or contact
    #[arg(long)]
    pub kind: Option<TransactionKind>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save an API token and the user it belongs to
    Login {
        /// Bearer token issued by the FinanceFlow API
        #[arg(long)]
        token: String,

        /// Id of the logged-in user
        #[arg(long)]
        user_id: String,

        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Email address
        #[arg(long)]
        email: Option<String>,
    },

    /// Forget the saved token and user
    Logout,

    /// List transactions
    Transactions {
        #[command(flatten)]
        filters: FilterArgs,

        /// Only transactions of this group
        #[arg(long)]
        group: Option<String>,

        /// Number of transactions to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show income, expense and net totals
    Summary {
        #[command(flatten)]
        filters: FilterArgs,

        /// Fold group balances (owed to you / you owe) into the totals
        #[arg(long)]
        with_group_balances: bool,

        /// Output JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Draw a bar chart over time (defaults to the last 7 days)
    Chart {
        #[command(flatten)]
        filters: FilterArgs,

        /// Metric to chart: income, expense, net
        #[arg(short, long, default_value = "expense")]
        metric: ChartMetric,

        /// Bucket size: auto, daily, weekly, monthly
        #[arg(short, long, default_value = "auto")]
        granularity: Granularity,
    },

    /// Break totals down by category (expenses unless --direction income)
    Categories {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Delete a transaction
    Delete {
        /// Transaction id
        id: String,

        /// The transaction belongs to a group
        #[arg(long)]
        group: bool,
    },

    /// List linked bank accounts
    Accounts,

    /// Show saved calculator results
    History {
        /// Forget the saved results
        #[arg(long)]
        clear: bool,
    },

    /// Show the resolved configuration
    Config,
}
