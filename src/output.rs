//! Output formatting and persistence for analysis results.
//!
//! Supports pretty-printing, JSON serialization, a fixed-width growth table
//! and CSV export (optionally gzip-compressed).

use anyhow::Result;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use tracing::{debug, info};

use crate::analyzers::types::{DataCoverage, Growth, GrowthRecord, InsightSummary};
use crate::pipeline::Analysis;

/// Flat CSV shape of a [`GrowthRecord`].
#[derive(Debug, Serialize)]
struct GrowthRow {
    period: String,
    dimension_key: String,
    total_registrations: u64,
    yoy_growth: String,
    qoq_growth: String,
}

impl From<&GrowthRecord> for GrowthRow {
    fn from(g: &GrowthRecord) -> Self {
        GrowthRow {
            period: g.period.to_string(),
            dimension_key: g.dimension_key.to_string(),
            total_registrations: g.total_registrations,
            yoy_growth: g.yoy_growth.to_string(),
            qoq_growth: g.qoq_growth.to_string(),
        }
    }
}

/// Logs an analysis using Rust's debug pretty-print format.
pub fn print_pretty(analysis: &Analysis) {
    debug!("{:#?}", analysis);
}

/// Pretty-printed JSON of any result value.
pub fn to_json(value: &impl Serialize) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Writes growth records as CSV rows (with header) to `writer`.
pub fn write_growth_csv<W: Write>(writer: W, growth: &[GrowthRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for g in growth {
        writer.serialize(GrowthRow::from(g))?;
    }
    writer.flush()?;
    Ok(())
}

/// Exports growth records to `path`, or to `path.gz` when `gzip` is set.
///
/// Returns the path actually written.
pub fn export_growth(path: &str, growth: &[GrowthRecord], gzip: bool) -> Result<String> {
    let target = if gzip {
        format!("{}.gz", path)
    } else {
        path.to_string()
    };
    let file = File::create(&target)?;

    if gzip {
        let mut encoder = GzEncoder::new(file, Compression::default());
        write_growth_csv(&mut encoder, growth)?;
        encoder.finish()?;
    } else {
        write_growth_csv(file, growth)?;
    }

    info!(path = %target, rows = growth.len(), gzip, "Growth table exported");
    Ok(target)
}

/// Fixed-width text table of growth records.
pub fn render_growth_table(growth: &[GrowthRecord]) -> String {
    let key_width = growth
        .iter()
        .map(|g| g.dimension_key.to_string().len())
        .max()
        .unwrap_or(0)
        .max("Key".len());

    let mut out = format!(
        "{:<8}  {:<kw$}  {:>14}  {:>10}  {:>10}\n",
        "Period",
        "Key",
        "Registrations",
        "YoY %",
        "QoQ %",
        kw = key_width
    );
    for g in growth {
        out.push_str(&format!(
            "{:<8}  {:<kw$}  {:>14}  {:>10}  {:>10}\n",
            g.period.to_string(),
            g.dimension_key.to_string(),
            g.total_registrations,
            g.yoy_growth.to_string(),
            g.qoq_growth.to_string(),
            kw = key_width
        ));
    }
    out
}

/// Human-readable KPI block. Undefined figures render as `N/A`.
pub fn render_summary(summary: &InsightSummary) -> String {
    let pct = |v: Option<f64>| v.map_or_else(|| "N/A".to_string(), |p| format!("{:.1}%", p));
    let text = |v: Option<String>| v.unwrap_or_else(|| "N/A".to_string());

    format!(
        "Total registrations:        {}\n\
         Top manufacturer:           {}\n\
         Top manufacturer share:     {}\n\
         Top {} concentration:        {}\n\
         Peak period:                {}\n\
         Trough period:              {}\n\
         YoY growth (latest year):   {}\n",
        summary.total_registrations,
        text(summary.top_manufacturer.clone()),
        pct(summary.top_manufacturer_share),
        summary.top_n,
        pct(summary.market_concentration_top_n),
        text(summary.peak_period.map(|p| p.to_string())),
        text(summary.trough_period.map(|p| p.to_string())),
        growth_percent(summary.yoy_growth),
    )
}

/// Data summary block: point count, month range and manufacturer count.
pub fn render_coverage(coverage: &DataCoverage) -> String {
    let range = match (coverage.first_month, coverage.last_month) {
        (Some(first), Some(last)) => format!("{} to {}", first, last),
        _ => "N/A".to_string(),
    };

    format!(
        "Data points:                {}\n\
         Date range:                 {}\n\
         Manufacturers covered:      {}\n",
        coverage.data_points, range, coverage.manufacturers,
    )
}

/// Growth as `12.5%`, `new` or `N/A`.
pub fn growth_percent(growth: Growth) -> String {
    match growth {
        Growth::Percent(p) => format!("{:.1}%", p),
        other => other.to_string(),
    }
}
