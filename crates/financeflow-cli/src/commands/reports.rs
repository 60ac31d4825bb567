//! Report command implementations

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use financeflow_core::aggregate::{category_breakdown, DateRange, RangePreset};
use financeflow_core::models::Direction;
use financeflow_core::{AggregateView, Aggregator, ChartMetric, ChartOptions, Granularity};

use super::{build_criteria, format_signed, truncate, Session};
use crate::cli::FilterArgs;

/// Width of the longest chart bar
const BAR_WIDTH: usize = 40;

/// A bar of `width * |value| / max` blocks; empty when `max` is zero
pub fn render_bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || value == 0.0 {
        return String::new();
    }
    let len = ((value.abs() / max) * width as f64).round() as usize;
    "█".repeat(len.clamp(1, width))
}

async fn aggregate(
    session: &Session,
    filters: &FilterArgs,
    options: ChartOptions,
    with_group_balances: bool,
    default_range: Option<RangePreset>,
    today: NaiveDate,
) -> Result<Arc<AggregateView>> {
    let mut criteria = build_criteria(filters, today)?;
    if criteria.date_range.is_none() {
        criteria = criteria.date_range(default_range.map(|p| DateRange::preset(p, today)));
    }

    let mut aggregator = Aggregator::with_zone(session.viewer_id(), session.config.zone());
    aggregator.set_transactions(session.fetch_all(None).await?);
    if with_group_balances {
        aggregator.set_group_balances(Some(session.group_totals().await?));
    }
    Ok(aggregator.view(&criteria, &options))
}

fn print_period(filters: &FilterArgs, today: NaiveDate) {
    match build_criteria(filters, today).ok().and_then(|c| c.date_range) {
        Some(range) => println!("   Period: {}", range),
        None => println!("   Period: all time"),
    }
}

pub async fn cmd_summary(
    session: &Session,
    filters: &FilterArgs,
    with_group_balances: bool,
    json: bool,
    today: NaiveDate,
) -> Result<()> {
    let view = aggregate(
        session,
        filters,
        ChartOptions::default(),
        with_group_balances,
        None,
        today,
    )
    .await?;
    let summary = view.summary;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!();
    println!("💰 Summary");
    print_period(filters, today);
    println!("   ─────────────────────────────");
    println!("   Income:       \x1b[32m${:.2}\x1b[0m", summary.total_income);
    println!("   Expenses:     \x1b[31m${:.2}\x1b[0m", summary.total_expenses);
    println!("   Net:          {}", format_signed(summary.net));
    println!("   Transactions: {}", summary.count);
    if with_group_balances {
        println!();
        println!("   Includes group balances (owed to you / you owe).");
    }

    Ok(())
}

pub async fn cmd_chart(
    session: &Session,
    filters: &FilterArgs,
    metric: ChartMetric,
    granularity: Granularity,
    today: NaiveDate,
) -> Result<()> {
    let options = ChartOptions {
        granularity,
        metric,
    };
    let view = aggregate(
        session,
        filters,
        options,
        false,
        Some(RangePreset::Last7Days),
        today,
    )
    .await?;

    println!();
    println!("📊 {} by {}", metric_title(metric), chart_step(&view, granularity));
    if let (Some(first), Some(last)) = (view.buckets.first(), view.buckets.last()) {
        println!("   Period: {} to {}", first.start, last.end);
    }
    println!("   ─────────────────────────────────────────────────────────────");

    // Net can go negative; scale bars by magnitude
    let max = view
        .series
        .values
        .iter()
        .fold(0.0_f64, |max, v| max.max(v.abs()));
    if max == 0.0 {
        println!("   Nothing to chart in this period.");
        return Ok(());
    }

    for (label, value) in view.series.labels.iter().zip(&view.series.values) {
        let sign = if *value < 0.0 { "-" } else { " " };
        println!(
            "   {:10} │ {}{:>10.2} │ {}",
            truncate(label, 10),
            sign,
            value.abs(),
            render_bar(*value, max, BAR_WIDTH)
        );
    }

    Ok(())
}

fn metric_title(metric: ChartMetric) -> &'static str {
    match metric {
        ChartMetric::Income => "Income",
        ChartMetric::Expense => "Expenses",
        ChartMetric::Net => "Net",
    }
}

fn chart_step(view: &AggregateView, granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Daily => "day",
        Granularity::Weekly => "week",
        Granularity::Monthly => "month",
        Granularity::Auto if view.buckets.iter().all(|b| b.start == b.end) => "day",
        Granularity::Auto => "week",
    }
}

pub async fn cmd_categories(
    session: &Session,
    filters: &FilterArgs,
    today: NaiveDate,
) -> Result<()> {
    let direction = filters.direction.unwrap_or(Direction::Expense);
    let view = aggregate(
        session,
        filters,
        ChartOptions::default(),
        false,
        None,
        today,
    )
    .await?;
    let breakdown = category_breakdown(&view.filtered, session.viewer_id(), direction);

    println!();
    println!(
        "🗂️  {} by Category",
        match direction {
            Direction::Income => "Income",
            Direction::Expense => "Spending",
        }
    );
    print_period(filters, today);
    println!("   ─────────────────────────────────────────────────────────────");

    if breakdown.is_empty() {
        println!("   Nothing found in this period.");
        return Ok(());
    }

    let total: f64 = breakdown.iter().map(|c| c.amount).sum();
    println!("   Total: ${:.2}", total);
    println!();
    println!(
        "   {:25} │ {:>10} │ {:>6} │ {:>5}",
        "Category", "Amount", "%", "Count"
    );
    println!("   ──────────────────────────┼────────────┼────────┼───────");

    for category in &breakdown {
        println!(
            "   {:25} │ {:>10.2} │ {:>5.1}% │ {:>5}",
            truncate(&category.category, 25),
            category.amount,
            category.percentage,
            category.count
        );
    }

    Ok(())
}
