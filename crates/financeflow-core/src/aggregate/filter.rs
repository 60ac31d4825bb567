//! Transaction filter criteria and the ordered filter pipeline
//!
//! Criteria are an immutable value built with chained setters. The pipeline
//! narrows the list stage by stage, always in the same order, so combined
//! filters give the same answer no matter which control the user touched
//! last.

use chrono::TimeZone;
use tracing::warn;

use super::dates::{resolved_date, DateRange};
use super::direction::resolve_direction;
use crate::models::{Direction, Transaction, TransactionKind};

/// Everything the filter screen can narrow by.
///
/// The default value filters nothing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterCriteria {
    pub date_range: Option<DateRange>,
    /// Exact category names; empty means every category
    pub categories: Vec<String>,
    /// Bank account ids; empty means every account
    pub bank_accounts: Vec<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub search: Option<String>,
    pub direction: Option<Direction>,
    pub kind: Option<TransactionKind>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn date_range(mut self, range: Option<DateRange>) -> Self {
        self.date_range = range;
        self
    }

    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn bank_accounts<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bank_accounts = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn min_amount(mut self, min: Option<f64>) -> Self {
        self.min_amount = min;
        self
    }

    pub fn max_amount(mut self, max: Option<f64>) -> Self {
        self.max_amount = max;
        self
    }

    pub fn search(mut self, query: Option<&str>) -> Self {
        self.search = query.map(str::to_string);
        self
    }

    /// Income/expense tab
    pub fn direction(mut self, direction: Option<Direction>) -> Self {
        self.direction = direction;
        self
    }

    /// Personal/group/contact tab
    pub fn kind(mut self, kind: Option<TransactionKind>) -> Self {
        self.kind = kind;
        self
    }

    /// True when no stage would remove anything
    pub fn is_empty(&self) -> bool {
        self.date_range.is_none()
            && self.categories.is_empty()
            && self.bank_accounts.is_empty()
            && self.min_amount.is_none()
            && self.max_amount.is_none()
            && self.search_needle().is_none()
            && self.direction.is_none()
            && self.kind.is_none()
    }

    fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }
}

/// Run the filter pipeline.
///
/// Stages, in order: date range, category, bank account, amount range,
/// text search, direction, kind. Surviving transactions keep their input
/// order. A transaction whose date cannot be resolved is dropped by the date
/// stage and logged; it never aborts the batch.
pub fn apply_filters<Tz: TimeZone>(
    transactions: &[Transaction],
    criteria: &FilterCriteria,
    viewer_id: &str,
    zone: &Tz,
) -> Vec<Transaction> {
    let needle = criteria.search_needle();

    transactions
        .iter()
        .filter(|tx| match criteria.date_range {
            Some(range) => in_date_range(tx, &range, zone),
            None => true,
        })
        .filter(|tx| matches_category(tx, &criteria.categories))
        .filter(|tx| matches_bank_account(tx, &criteria.bank_accounts))
        .filter(|tx| matches_amount(tx, criteria.min_amount, criteria.max_amount))
        .filter(|tx| match &needle {
            Some(n) => matches_search(tx, n),
            None => true,
        })
        .filter(|tx| match criteria.direction {
            Some(d) => resolve_direction(tx, viewer_id) == d,
            None => true,
        })
        .filter(|tx| match criteria.kind {
            Some(k) => tx.kind() == k,
            None => true,
        })
        .cloned()
        .collect()
}

fn in_date_range<Tz: TimeZone>(tx: &Transaction, range: &DateRange, zone: &Tz) -> bool {
    match resolved_date(tx, zone) {
        Ok(date) => range.contains(date),
        Err(e) => {
            warn!("Excluding transaction {} from date filter: {}", tx.id, e);
            false
        }
    }
}

fn matches_category(tx: &Transaction, categories: &[String]) -> bool {
    if categories.is_empty() {
        return true;
    }
    match tx.category.as_deref() {
        Some(cat) => categories.iter().any(|c| c == cat),
        None => false,
    }
}

fn matches_bank_account(tx: &Transaction, accounts: &[String]) -> bool {
    if accounts.is_empty() {
        return true;
    }
    match tx.bank_account_id() {
        Some(id) => accounts.iter().any(|a| a == id),
        None => false,
    }
}

fn matches_amount(tx: &Transaction, min: Option<f64>, max: Option<f64>) -> bool {
    min.map_or(true, |m| tx.amount >= m) && max.map_or(true, |m| tx.amount <= m)
}

/// `needle` is already trimmed and lowercased
fn matches_search(tx: &Transaction, needle: &str) -> bool {
    [&tx.title, &tx.description]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
}
