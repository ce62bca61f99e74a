//! Plain-text investor report.

use chrono::{DateTime, Month, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::analyzers::aggregate::{AggregateError, aggregate};
use crate::analyzers::growth::{compute_growth, growth_leaders};
use crate::analyzers::seasonality::seasonal_profile;
use crate::analyzers::summary::{average_period_total, data_coverage, market_share, summarize};
use crate::analyzers::types::{
    DataCoverage, Dimension, Granularity, GrowthRecord, InsightSummary, SeasonalProfile,
    ShareEntry,
};
use crate::filter::RecordFilter;
use crate::normalize::rejection_breakdown;
use crate::output::{growth_percent, render_coverage};
use crate::pipeline::{DEFAULT_TOP_N, Dataset};

/// Manufacturers listed in the report.
const TOP_MANUFACTURERS: usize = 10;
/// Growth leaders listed in the report.
const GROWTH_LEADERS: usize = 5;

/// Everything shown in the text report, computed from one filtered dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightReport {
    pub generated_at: DateTime<Utc>,
    pub record_count: usize,
    pub coverage: DataCoverage,
    pub rejected: BTreeMap<&'static str, usize>,
    pub average_monthly_registrations: Option<f64>,
    pub category_share: Vec<ShareEntry>,
    pub top_manufacturers: Vec<ShareEntry>,
    pub growth_leaders: Vec<GrowthRecord>,
    pub summary: InsightSummary,
    pub seasonality: SeasonalProfile,
}

impl InsightReport {
    /// Builds the report for `dataset` restricted by `filter`.
    ///
    /// `generated_at` is only stamped into the output; nothing else depends
    /// on the clock.
    pub fn build(
        dataset: &Dataset,
        filter: &RecordFilter,
        generated_at: DateTime<Utc>,
    ) -> Result<Self, AggregateError> {
        let records = filter.apply(&dataset.records);

        let by_category = aggregate(&records, Granularity::Year, &[Dimension::Category])?;
        let by_manufacturer =
            aggregate(&records, Granularity::Quarter, &[Dimension::Manufacturer])?;
        let monthly = aggregate(&records, Granularity::Month, &[Dimension::Category])?;

        let growth = compute_growth(&by_manufacturer);
        let mut top_manufacturers = market_share(&by_manufacturer, Dimension::Manufacturer);
        top_manufacturers.truncate(TOP_MANUFACTURERS);

        Ok(InsightReport {
            generated_at,
            record_count: records.len(),
            coverage: data_coverage(&records),
            rejected: rejection_breakdown(&dataset.rejected),
            average_monthly_registrations: average_period_total(&monthly),
            category_share: market_share(&by_category, Dimension::Category),
            top_manufacturers,
            growth_leaders: growth_leaders(&growth, GROWTH_LEADERS),
            summary: summarize(&by_manufacturer, DEFAULT_TOP_N),
            seasonality: seasonal_profile(&records),
        })
    }

    /// Renders the report as plain text.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("VEHICLE REGISTRATION ANALYTICS REPORT\n");
        out.push_str(&format!("{}\n\n", "=".repeat(50)));

        out.push_str("KEY METRICS:\n");
        out.push_str(&format!(
            "Total Registrations: {}\n",
            thousands(self.summary.total_registrations)
        ));
        out.push_str(&format!(
            "YoY Growth (latest year): {}\n",
            growth_percent(self.summary.yoy_growth)
        ));
        out.push_str(&format!(
            "Avg Monthly Registrations: {}\n",
            self.average_monthly_registrations
                .map_or_else(|| "N/A".to_string(), |v| thousands(v.round() as u64))
        ));
        out.push_str(&format!("Records Analyzed: {}\n", self.record_count));
        if !self.rejected.is_empty() {
            let reasons: Vec<_> = self
                .rejected
                .iter()
                .map(|(code, n)| format!("{} {}", code, n))
                .collect();
            out.push_str(&format!("Rows Rejected: {}\n", reasons.join(", ")));
        }

        out.push_str("\nMarket Share by Category:\n");
        for entry in &self.category_share {
            out.push_str(&format!("  {}: {}\n", entry.value, percent(entry.share)));
        }

        out.push_str("\nTop Manufacturers:\n");
        for entry in &self.top_manufacturers {
            out.push_str(&format!(
                "  {}: {}\n",
                entry.value,
                thousands(entry.total_registrations)
            ));
        }

        out.push_str("\nKEY TRENDS:\n");
        if let Some(leader) = self.category_share.first() {
            out.push_str(&format!(
                "• Market Leadership: {} vehicles dominate with {} market share\n",
                leader.value,
                percent(leader.share)
            ));
        }
        if let Some(g) = self.growth_leaders.first() {
            out.push_str(&format!(
                "• Growth Leader: {} showing strongest YoY growth at {}% in {}\n",
                g.dimension_key, g.yoy_growth, g.period
            ));
        }
        out.push_str(&format!(
            "• Market Concentration: Top {} manufacturers control {} of the market\n",
            self.summary.top_n,
            percent(self.summary.market_concentration_top_n)
        ));
        if let Some(month) = self.seasonality.peak_month {
            out.push_str(&format!("• Peak registration month: {}\n", month_name(month)));
        }
        if let Some(month) = self.seasonality.low_month {
            out.push_str(&format!("• Lowest registration month: {}\n", month_name(month)));
        }
        if let Some(period) = self.summary.peak_period {
            out.push_str(&format!("• Strongest quarter: {}\n", period));
        }

        out.push_str("\nDATA SUMMARY:\n");
        out.push_str(&render_coverage(&self.coverage));

        out.push_str(&format!(
            "\nReport generated on: {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        ));
        out
    }
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |p| format!("{:.1}%", p))
}

fn month_name(month: u32) -> String {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map_or_else(|| month.to_string(), |m| m.name().to_string())
}

/// Formats `n` with comma thousands separators.
fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
