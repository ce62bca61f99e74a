//! Year-over-year and period-over-period growth.

use crate::analyzers::types::{
    AggregatedBucket, DimensionKey, Granularity, Growth, GrowthRecord, Period,
};
use crate::analyzers::utility::mean;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Computes growth for every bucket, one record per bucket in input order.
///
/// QoQ compares against the previous bucket at the same granularity step
/// (the previous month for monthly buckets); yearly buckets have no QoQ.
/// YoY compares against the same period one year earlier.
pub fn compute_growth(buckets: &[AggregatedBucket]) -> Vec<GrowthRecord> {
    let totals: HashMap<(Period, &DimensionKey), u64> = buckets
        .iter()
        .map(|b| ((b.period, &b.dimension_key), b.total_registrations))
        .collect();

    let lookup = |period: Period, key: &DimensionKey| totals.get(&(period, key)).copied();

    buckets
        .iter()
        .map(|b| {
            let key = &b.dimension_key;
            let current = b.total_registrations;

            let qoq_growth = match b.period.granularity() {
                Granularity::Year => Growth::NoPriorPeriod,
                _ => Growth::compare(lookup(b.period.previous(), key), current),
            };
            let yoy_growth = Growth::compare(lookup(b.period.year_ago(), key), current);

            GrowthRecord {
                period: b.period,
                dimension_key: key.clone(),
                total_registrations: current,
                yoy_growth,
                qoq_growth,
            }
        })
        .collect()
}

/// Mean numeric YoY growth per key, sorted by key.
///
/// New entrants and undefined values are skipped; a key with no numeric
/// YoY value at all maps to `None`.
pub fn average_yoy_growth(growth: &[GrowthRecord]) -> Vec<(DimensionKey, Option<f64>)> {
    let mut series: HashMap<&DimensionKey, Vec<f64>> = HashMap::new();

    for g in growth {
        let entry = series.entry(&g.dimension_key).or_default();
        if let Some(p) = g.yoy_growth.as_percent() {
            entry.push(p);
        }
    }

    let mut averages: Vec<_> = series
        .into_iter()
        .map(|(key, values)| {
            let avg = if values.is_empty() {
                None
            } else {
                Some(mean(&values))
            };
            (key.clone(), avg)
        })
        .collect();
    averages.sort_by(|a, b| a.0.cmp(&b.0));
    averages
}

/// Keys with the highest numeric YoY growth in the latest period present.
///
/// Ties are broken by key. At most `n` records are returned.
pub fn growth_leaders(growth: &[GrowthRecord], n: usize) -> Vec<GrowthRecord> {
    let Some(latest) = growth.iter().map(|g| g.period).max() else {
        return Vec::new();
    };

    let mut leaders: Vec<_> = growth
        .iter()
        .filter(|g| g.period == latest && g.yoy_growth.as_percent().is_some())
        .cloned()
        .collect();

    leaders.sort_by(|a, b| {
        let (pa, pb) = (
            a.yoy_growth.as_percent().unwrap_or(f64::NEG_INFINITY),
            b.yoy_growth.as_percent().unwrap_or(f64::NEG_INFINITY),
        );
        pb.partial_cmp(&pa)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.dimension_key.cmp(&b.dimension_key))
    });
    leaders.truncate(n);
    leaders
}
