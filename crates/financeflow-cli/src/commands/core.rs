//! Shared command utilities
//!
//! This module contains:
//! - `open_store` / `load_config` - Resolve the store and client config
//! - `Session` - An authenticated API client plus the logged-in user
//! - `build_criteria` - Turn filter flags into `FilterCriteria`
//! - `cmd_config` - Print the resolved configuration

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use financeflow_core::aggregate::{parse_local_date, DateRange};
use financeflow_core::config::default_config_path;
use financeflow_core::models::{GroupTotals, Transaction, UserProfile};
use financeflow_core::storage::default_store_path;
use financeflow_core::{ApiClient, ClientConfig, FilterCriteria, LocalStore, Paginator, TransactionApi};
use tracing::debug;

use crate::cli::FilterArgs;

/// Open the local store at `path`, or the platform default
pub fn open_store(path: Option<&Path>) -> Result<LocalStore> {
    match path {
        Some(path) => LocalStore::open(path)
            .with_context(|| format!("Failed to open store at {}", path.display())),
        None => LocalStore::open_default().context("Failed to open store"),
    }
}

/// Resolve the client config; `--api-url` wins over every other source
pub fn load_config(api_url: Option<&str>) -> Result<ClientConfig> {
    let mut config = ClientConfig::load().context("Failed to load config")?;
    if let Some(url) = api_url {
        config.api_base_url = url.trim_end_matches('/').to_string();
    }
    Ok(config)
}

/// Today's date in the configured zone
pub fn today(config: &ClientConfig) -> NaiveDate {
    config.zone().today()
}

/// An authenticated API client plus the logged-in user
pub struct Session {
    pub client: ApiClient,
    pub user: UserProfile,
    pub config: ClientConfig,
}

impl Session {
    /// Build a session from the saved token and user
    pub fn open(store: &LocalStore, config: ClientConfig) -> Result<Self> {
        let token = store.auth_token()?;
        let user = store.cached_user()?;
        let (token, user) = match (token, user) {
            (Some(token), Some(user)) => (token, user),
            _ => anyhow::bail!(
                "Not logged in. Run 'financeflow login --token <TOKEN> --user-id <ID>' first."
            ),
        };

        let client = ApiClient::from_config(&config)
            .context("Failed to create API client")?
            .with_token(Some(token));
        debug!("Session for {} against {}", user.id, client.base_url());
        Ok(Self {
            client,
            user,
            config,
        })
    }

    pub fn viewer_id(&self) -> &str {
        &self.user.id
    }

    /// Fetch every page of transactions, optionally for one group
    pub async fn fetch_all(&self, group_id: Option<&str>) -> Result<Vec<Transaction>> {
        let paginator =
            Paginator::new(self.client.clone(), self.config.page_size).for_group(group_id);
        let loaded = paginator
            .load_all()
            .await
            .context("Failed to load transactions")?;
        debug!("Loaded {} transactions", loaded);
        Ok(paginator.transactions())
    }

    pub async fn group_totals(&self) -> Result<GroupTotals> {
        self.client
            .fetch_group_totals(None)
            .await
            .context("Failed to load group balances")
    }
}

/// Resolve `--period` / `--from` / `--to` into a range ending no later than
/// `today`. No flags means no date restriction.
pub fn resolve_range(filters: &FilterArgs, today: NaiveDate) -> Result<Option<DateRange>> {
    if let Some(from) = filters.from.as_deref() {
        let start = parse_local_date(from).context("Invalid --from date (use YYYY-MM-DD)")?;
        let end = match filters.to.as_deref() {
            Some(to) => parse_local_date(to).context("Invalid --to date (use YYYY-MM-DD)")?,
            None => today,
        };
        let range = DateRange::new(start, end, today)?;
        return Ok(Some(range));
    }

    Ok(filters
        .period
        .map(|preset| DateRange::preset(preset, today)))
}

/// Build the filter criteria for a command's flags
pub fn build_criteria(filters: &FilterArgs, today: NaiveDate) -> Result<FilterCriteria> {
    Ok(FilterCriteria::new()
        .date_range(resolve_range(filters, today)?)
        .categories(filters.categories.iter().map(String::as_str))
        .bank_accounts(filters.accounts.iter().map(String::as_str))
        .min_amount(filters.min)
        .max_amount(filters.max)
        .search(filters.search.as_deref())
        .direction(filters.direction)
        .kind(filters.kind))
}

pub fn cmd_config(config: &ClientConfig, store_path: Option<&Path>) {
    println!();
    println!("⚙️  FinanceFlow Configuration");
    println!("   ─────────────────────────────");
    println!("   API URL:        {}", config.api_base_url);
    println!("   Page size:      {}", config.page_size);
    println!("   Timeout:        {}s", config.timeout_secs);
    match config.utc_offset_minutes {
        Some(minutes) => println!("   UTC offset:     {} min", minutes),
        None => println!("   UTC offset:     {}", config.zone()),
    }

    let store = store_path
        .map(Path::to_path_buf)
        .or_else(default_store_path);
    if let Some(path) = store {
        println!("   Store:          {}", path.display());
    }
    if let Some(path) = default_config_path() {
        let state = if path.exists() { "" } else { " (not present)" };
        println!("   Config file:    {}{}", path.display(), state);
    }
}
