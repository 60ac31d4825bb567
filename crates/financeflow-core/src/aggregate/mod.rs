//! Transaction classifier and aggregator
//!
//! Turns a flat list of fetched transactions plus filter criteria into:
//! - a filtered list (`filter`)
//! - summary totals (`summary`)
//! - a time-bucketed chart series (`buckets`)
//!
//! Income vs. expense is always decided by [`resolve_direction`]. All of it is
//! pure and synchronous; [`Aggregator`] adds a memo keyed on the criteria.

mod buckets;
mod dates;
mod direction;
mod filter;
mod summary;
mod view;

pub use buckets::{
    bucket_plan, build_buckets, effective_granularity, round_currency, series, Bucket,
    BucketSpan, ChartMetric, ChartSeries, Granularity, DAILY_BUCKETS,
};
pub use dates::{
    first_of_month, last_of_month, offset_from_minutes, parse_local_date, parse_timestamp,
    resolved_date, DateRange, LocalZone, RangePreset, MAX_RANGE_DAYS,
};
pub use direction::{resolve_direction, signed_amount};
pub use filter::{apply_filters, FilterCriteria};
pub use summary::{category_breakdown, summarize, CategoryTotal, Summary, UNCATEGORIZED};
pub use view::{compute_view, AggregateView, Aggregator, ChartOptions};
