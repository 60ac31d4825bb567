//! FinanceFlow CLI - Expense tracker client
//!
//! Usage:
//!   financeflow login --token T --user-id U   Save a session
//!   financeflow transactions --period this-month
//!   financeflow summary --with-group-balances
//!   financeflow chart --metric net --period last-30-days

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = commands::load_config(cli.api_url.as_deref())?;
    let mut store = commands::open_store(cli.store.as_deref())?;
    let today = commands::today(&config);

    match cli.command {
        Commands::Login {
            token,
            user_id,
            name,
            email,
        } => commands::cmd_login(
            &mut store,
            &token,
            &user_id,
            name.as_deref(),
            email.as_deref(),
        ),
        Commands::Logout => commands::cmd_logout(&mut store),
        Commands::History { clear } => commands::cmd_history(&mut store, clear),
        Commands::Config => {
            commands::cmd_config(&config, cli.store.as_deref());
            Ok(())
        }
        Commands::Transactions {
            filters,
            group,
            limit,
            json,
        } => {
            let session = commands::Session::open(&store, config)?;
            commands::cmd_transactions_list(&session, &filters, group.as_deref(), limit, json, today)
                .await
        }
        Commands::Summary {
            filters,
            with_group_balances,
            json,
        } => {
            let session = commands::Session::open(&store, config)?;
            commands::cmd_summary(&session, &filters, with_group_balances, json, today).await
        }
        Commands::Chart {
            filters,
            metric,
            granularity,
        } => {
            let session = commands::Session::open(&store, config)?;
            commands::cmd_chart(&session, &filters, metric, granularity, today).await
        }
        Commands::Categories { filters } => {
            let session = commands::Session::open(&store, config)?;
            commands::cmd_categories(&session, &filters, today).await
        }
        Commands::Delete { id, group } => {
            let session = commands::Session::open(&store, config)?;
            commands::cmd_delete(&session, &id, group).await
        }
        Commands::Accounts => {
            let session = commands::Session::open(&store, config)?;
            commands::cmd_accounts(&session).await
        }
    }
}
