//! FinanceFlow Core Library
//!
//! Shared functionality for the FinanceFlow expense tracker:
//! - Transaction models as served by the FinanceFlow API
//! - Direction classification, filtering, summaries and chart buckets
//! - REST API client and pagination with in-flight suppression
//! - Local key-value store for the session
//! - Client configuration

pub mod aggregate;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod pagination;
pub mod storage;

/// Test utilities including mock FinanceFlow API server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use aggregate::{
    AggregateView, Aggregator, ChartMetric, ChartOptions, DateRange, FilterCriteria, Granularity,
    LocalZone, RangePreset, Summary,
};
pub use client::{ApiClient, DeleteOutcome, PageRequest, TransactionApi};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use pagination::{LoadOutcome, Paginator};
pub use storage::{CalculatorEntry, LocalStore};
