//! Time buckets for the income/expense chart
//!
//! The bucket layout depends only on the selected range (and an optional
//! explicit granularity), never on which metric the chart shows.

use chrono::{Duration, NaiveDate, TimeZone};
use serde::Serialize;
use tracing::debug;

use super::dates::{first_of_month, last_of_month, resolved_date, DateRange};
use super::direction::resolve_direction;
use crate::models::{Direction, Transaction};

/// Number of daily buckets shown for short ranges
pub const DAILY_BUCKETS: usize = 7;

/// Round to cents. Applied to accumulated sums, never per transaction.
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Bucket width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Pick from the range length: daily up to 7 days, weekly beyond
    #[default]
    Auto,
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            _ => Err(format!(
                "Unknown granularity: {} (valid: auto, daily, weekly, monthly)",
                s
            )),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which value the chart plots per bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartMetric {
    Income,
    #[default]
    Expense,
    Net,
}

impl ChartMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Net => "net",
        }
    }
}

impl std::str::FromStr for ChartMetric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" | "expenses" => Ok(Self::Expense),
            "net" => Ok(Self::Net),
            _ => Err(format!(
                "Unknown chart metric: {} (valid: income, expense, net)",
                s
            )),
        }
    }
}

impl std::fmt::Display for ChartMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Boundaries of one bucket, both ends inclusive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketSpan {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BucketSpan {
    fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// One chart slot with its sums and members
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub income: f64,
    pub expense: f64,
    pub transactions: Vec<Transaction>,
}

impl Bucket {
    fn empty(span: BucketSpan) -> Self {
        Self {
            label: span.label,
            start: span.start,
            end: span.end,
            income: 0.0,
            expense: 0.0,
            transactions: Vec::new(),
        }
    }

    pub fn net(&self) -> f64 {
        round_currency(self.income - self.expense)
    }

    pub fn value(&self, metric: ChartMetric) -> f64 {
        match metric {
            ChartMetric::Income => self.income,
            ChartMetric::Expense => self.expense,
            ChartMetric::Net => self.net(),
        }
    }
}

/// Labels and values ready for a chart component
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub metric: ChartMetric,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}

/// The width actually used for `range`
pub fn effective_granularity(range: &DateRange, granularity: Granularity) -> Granularity {
    match granularity {
        Granularity::Auto if range.days_diff() <= DAILY_BUCKETS as i64 => Granularity::Daily,
        // Ranges of 8–30 days and anything longer both get weekly buckets
        Granularity::Auto => Granularity::Weekly,
        explicit => explicit,
    }
}

/// Lay out the buckets for `range`.
///
/// With [`Granularity::Auto`] a range of up to 7 days always gets exactly 7
/// daily buckets starting at the range start; anything longer gets
/// `ceil(days / 7)` weekly buckets with the last one cut at the range end.
pub fn bucket_plan(range: &DateRange, granularity: Granularity) -> Vec<BucketSpan> {
    let start = range.start();
    let days = range.days_diff();

    match (granularity, effective_granularity(range, granularity)) {
        (Granularity::Auto, Granularity::Daily) => (0..DAILY_BUCKETS as i64)
            .map(|i| daily_span(start + Duration::days(i)))
            .collect(),
        (_, Granularity::Daily) => (0..days)
            .map(|i| daily_span(start + Duration::days(i)))
            .collect(),
        (_, Granularity::Monthly) => monthly_spans(range),
        _ => {
            let weeks = (days + 6) / 7;
            (0..weeks)
                .map(|i| {
                    let week_start = start + Duration::days(i * 7);
                    let week_end = (week_start + Duration::days(6)).min(range.end());
                    BucketSpan {
                        label: week_start.format("%b %-d").to_string(),
                        start: week_start,
                        end: week_end,
                    }
                })
                .collect()
        }
    }
}

fn daily_span(day: NaiveDate) -> BucketSpan {
    BucketSpan {
        label: day.format("%a").to_string(),
        start: day,
        end: day,
    }
}

fn monthly_spans(range: &DateRange) -> Vec<BucketSpan> {
    let mut spans = Vec::new();
    let mut month = first_of_month(range.start());
    while month <= range.end() {
        let month_end = last_of_month(month);
        spans.push(BucketSpan {
            label: month.format("%b %Y").to_string(),
            start: month.max(range.start()),
            end: month_end.min(range.end()),
        });
        month = month_end + Duration::days(1);
    }
    spans
}

/// Assign transactions to buckets and total them per direction.
///
/// A transaction outside the range or without a resolvable date is left out
/// of the chart. It is not an error: the caller's filtered list still shows
/// it.
pub fn build_buckets<Tz: TimeZone>(
    transactions: &[Transaction],
    range: &DateRange,
    granularity: Granularity,
    viewer_id: &str,
    zone: &Tz,
) -> Vec<Bucket> {
    let daily_auto = granularity == Granularity::Auto
        && effective_granularity(range, granularity) == Granularity::Daily;
    let spans = bucket_plan(range, granularity);
    let mut buckets: Vec<Bucket> = spans.iter().cloned().map(Bucket::empty).collect();

    for tx in transactions {
        let date = match resolved_date(tx, zone) {
            Ok(d) => d,
            Err(e) => {
                debug!("Dropping transaction {} from chart: {}", tx.id, e);
                continue;
            }
        };
        if !range.contains(date) {
            debug!("Dropping transaction {} from chart: {} outside {}", tx.id, date, range);
            continue;
        }

        let index = if daily_auto {
            let offset_days = (date - range.start()).num_days();
            Some(offset_days.clamp(0, DAILY_BUCKETS as i64 - 1) as usize)
        } else {
            spans.iter().position(|s| s.contains(date))
        };

        let Some(bucket) = index.and_then(|i| buckets.get_mut(i)) else {
            debug!("Dropping transaction {} from chart: no bucket for {}", tx.id, date);
            continue;
        };

        match resolve_direction(tx, viewer_id) {
            Direction::Income => bucket.income += tx.amount,
            Direction::Expense => bucket.expense += tx.amount,
        }
        bucket.transactions.push(tx.clone());
    }

    for bucket in &mut buckets {
        bucket.income = round_currency(bucket.income);
        bucket.expense = round_currency(bucket.expense);
    }

    buckets
}

/// Project buckets onto a single chart series
pub fn series(buckets: &[Bucket], metric: ChartMetric) -> ChartSeries {
    ChartSeries {
        metric,
        labels: buckets.iter().map(|b| b.label.clone()).collect(),
        values: buckets.iter().map(|b| b.value(metric)).collect(),
    }
}
