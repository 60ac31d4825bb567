//! Memoized aggregate view over a fetched transaction list

use std::sync::Arc;

use chrono::TimeZone;
use serde::Serialize;
use tracing::debug;

use super::buckets::{build_buckets, series, Bucket, ChartMetric, ChartSeries, Granularity};
use super::dates::LocalZone;
use super::filter::{apply_filters, FilterCriteria};
use super::summary::{summarize, Summary};
use crate::models::{GroupTotals, Transaction};

/// Chart presentation choices that affect the computed view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChartOptions {
    pub granularity: Granularity,
    pub metric: ChartMetric,
}

/// Everything a transactions screen renders for one set of criteria
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateView {
    pub filtered: Vec<Transaction>,
    pub summary: Summary,
    /// Empty when the criteria carry no date range
    pub buckets: Vec<Bucket>,
    pub series: ChartSeries,
}

/// Compute a view without caching.
///
/// Pure and synchronous; the same inputs always give the same view.
pub fn compute_view<Tz: TimeZone>(
    transactions: &[Transaction],
    viewer_id: &str,
    zone: &Tz,
    group_balances: Option<&GroupTotals>,
    criteria: &FilterCriteria,
    options: &ChartOptions,
) -> AggregateView {
    let filtered = apply_filters(transactions, criteria, viewer_id, zone);
    let summary = summarize(&filtered, viewer_id, group_balances);
    let buckets = match &criteria.date_range {
        Some(range) => build_buckets(&filtered, range, options.granularity, viewer_id, zone),
        None => Vec::new(),
    };
    let series = series(&buckets, options.metric);

    AggregateView {
        filtered,
        summary,
        buckets,
        series,
    }
}

/// Holds the fetched list and recomputes the view only when the criteria
/// change.
///
/// Replacing the transactions, the viewer or the group balances drops the
/// cached view.
pub struct Aggregator {
    transactions: Vec<Transaction>,
    viewer_id: String,
    zone: LocalZone,
    group_balances: Option<GroupTotals>,
    cached: Option<(FilterCriteria, ChartOptions, Arc<AggregateView>)>,
    computations: usize,
}

impl Aggregator {
    pub fn new(viewer_id: impl Into<String>) -> Self {
        Self::with_zone(viewer_id, LocalZone::System)
    }

    pub fn with_zone(viewer_id: impl Into<String>, zone: impl Into<LocalZone>) -> Self {
        Self {
            transactions: Vec::new(),
            viewer_id: viewer_id.into(),
            zone: zone.into(),
            group_balances: None,
            cached: None,
            computations: 0,
        }
    }

    pub fn viewer_id(&self) -> &str {
        &self.viewer_id
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn set_transactions(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
        self.cached = None;
    }

    /// Append a freshly loaded page
    pub fn extend_transactions(&mut self, page: impl IntoIterator<Item = Transaction>) {
        self.transactions.extend(page);
        self.cached = None;
    }

    pub fn set_viewer(&mut self, viewer_id: impl Into<String>) {
        self.viewer_id = viewer_id.into();
        self.cached = None;
    }

    pub fn set_group_balances(&mut self, totals: Option<GroupTotals>) {
        self.group_balances = totals;
        self.cached = None;
    }

    /// How many times the view has actually been computed
    pub fn computations(&self) -> usize {
        self.computations
    }

    /// The view for `criteria`, reusing the last one when nothing changed
    pub fn view(&mut self, criteria: &FilterCriteria, options: &ChartOptions) -> Arc<AggregateView> {
        if let Some((cached_criteria, cached_options, view)) = &self.cached {
            if cached_criteria == criteria && cached_options == options {
                debug!("Reusing cached transaction view");
                return Arc::clone(view);
            }
        }

        let view = Arc::new(compute_view(
            &self.transactions,
            &self.viewer_id,
            &self.zone,
            self.group_balances.as_ref(),
            criteria,
            options,
        ));
        self.computations += 1;
        debug!(
            filtered = view.filtered.len(),
            buckets = view.buckets.len(),
            "Recomputed transaction view"
        );
        self.cached = Some((criteria.clone(), *options, Arc::clone(&view)));
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DateRange;
    use crate::models::{DateDetails, TransactionType};
    use chrono::{FixedOffset, NaiveDate};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn tx(id: &str, amount: f64, tx_type: TransactionType, date: &str, category: &str) -> Transaction {
        Transaction {
            id: id.into(),
            amount,
            transaction_type: tx_type,
            category: Some(category.into()),
            date_details: Some(DateDetails {
                date: Some(date.into()),
            }),
            ..Default::default()
        }
    }

    fn aggregator() -> Aggregator {
        let mut agg = Aggregator::with_zone("me", utc());
        agg.set_transactions(vec![
            tx("1", 100.0, TransactionType::Income, "2024-03-04", "Salary"),
            tx("2", 40.0, TransactionType::Expense, "2024-03-04", "Food"),
            tx("3", 15.0, TransactionType::Expense, "2024-03-06", "Food"),
        ]);
        agg
    }

    fn week() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_single_day_summary() {
        let mut agg = aggregator();
        let day = DateRange::day(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        let view = agg.view(
            &FilterCriteria::new().date_range(Some(day)),
            &ChartOptions::default(),
        );
        assert_eq!(view.summary.net, 60.0);
        assert_eq!(view.summary.count, 2);
        assert_eq!(view.buckets.len(), 7);
    }

    #[test]
    fn test_view_is_memoized_on_criteria() {
        let mut agg = aggregator();
        let criteria = FilterCriteria::new().date_range(Some(week()));
        let options = ChartOptions::default();

        let first = agg.view(&criteria, &options);
        let second = agg.view(&criteria.clone(), &options);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(agg.computations(), 1);

        let narrowed = criteria.clone().categories(["Food"]);
        let third = agg.view(&narrowed, &options);
        assert_eq!(third.filtered.len(), 2);
        assert_eq!(agg.computations(), 2);
    }

    #[test]
    fn test_metric_change_keeps_bucket_layout() {
        let mut agg = aggregator();
        let criteria = FilterCriteria::new().date_range(Some(week()));

        let expense = agg.view(&criteria, &ChartOptions::default());
        let income = agg.view(
            &criteria,
            &ChartOptions {
                metric: ChartMetric::Income,
                ..Default::default()
            },
        );
        assert_eq!(expense.buckets, income.buckets);
        assert_eq!(expense.series.values[0], 40.0);
        assert_eq!(income.series.values[0], 100.0);
    }

    #[test]
    fn test_new_data_invalidates_cache() {
        let mut agg = aggregator();
        let criteria = FilterCriteria::new();
        let options = ChartOptions::default();

        assert_eq!(agg.view(&criteria, &options).summary.count, 3);
        agg.extend_transactions(vec![tx(
            "4",
            5.0,
            TransactionType::Expense,
            "2024-03-07",
            "Food",
        )]);
        assert_eq!(agg.view(&criteria, &options).summary.count, 4);

        agg.set_group_balances(Some(GroupTotals {
            you_owe: 10.0,
            owed_to_you: 0.0,
        }));
        assert_eq!(agg.view(&criteria, &options).summary.total_expenses, 70.0);
        assert_eq!(agg.computations(), 3);
    }

    #[test]
    fn test_no_range_means_no_chart() {
        let view = compute_view(
            aggregator().transactions(),
            "me",
            &utc(),
            None,
            &FilterCriteria::new(),
            &ChartOptions::default(),
        );
        assert!(view.buckets.is_empty());
        assert!(view.series.values.is_empty());
        assert_eq!(view.filtered.len(), 3);
    }
}
