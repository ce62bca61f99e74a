//! Headline KPIs over aggregated buckets.
//!
//! Sums here saturate instead of panicking. Buckets produced by
//! [`crate::aggregate`] never reach the limit since their grand total is
//! checked there.

use crate::analyzers::types::{
    AggregatedBucket, DataCoverage, Dimension, Granularity, Growth, InsightSummary, Period,
    ShareEntry,
};
use crate::analyzers::utility::{mean, pct};
use crate::record::RegistrationRecord;
use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroUsize;

/// Derives the headline KPIs from a bucket collection.
///
/// Manufacturer figures need buckets grouped by [`Dimension::Manufacturer`]
/// (alone or in a composite key); without it they stay undefined. An empty
/// bucket collection yields [`InsightSummary::empty`].
pub fn summarize(buckets: &[AggregatedBucket], top_n: NonZeroUsize) -> InsightSummary {
    let top_n = top_n.get();
    if buckets.is_empty() {
        return InsightSummary::empty(top_n);
    }

    let total = sum(buckets.iter().map(|b| b.total_registrations));
    let ranking = ranked_totals(buckets, Dimension::Manufacturer);

    let top_manufacturer = ranking.first().map(|(name, _)| name.to_string());
    let top_manufacturer_share = ranking.first().and_then(|(_, t)| pct(*t, total));
    let market_concentration_top_n = if ranking.is_empty() {
        None
    } else {
        let top_total = sum(ranking.iter().take(top_n).map(|(_, t)| *t));
        pct(top_total, total)
    };

    let (peak_period, trough_period) = peak_and_trough(buckets);

    InsightSummary {
        total_registrations: total,
        top_n,
        top_manufacturer,
        top_manufacturer_share,
        market_concentration_top_n,
        peak_period,
        trough_period,
        yoy_growth: headline_yoy_growth(buckets),
    }
}

/// Growth of the latest calendar year's total over the year before it.
///
/// Works for buckets of any granularity. `NoPriorPeriod` when no bucket
/// falls in the preceding year, including for an empty collection.
pub fn headline_yoy_growth(buckets: &[AggregatedBucket]) -> Growth {
    let mut per_year: BTreeMap<i32, u64> = BTreeMap::new();
    for b in buckets {
        let total = per_year.entry(b.period.year()).or_default();
        *total = total.saturating_add(b.total_registrations);
    }

    let Some((&latest, &current)) = per_year.last_key_value() else {
        return Growth::NoPriorPeriod;
    };
    Growth::compare(per_year.get(&(latest - 1)).copied(), current)
}

/// Data points, month range and distinct manufacturers of `records`.
pub fn data_coverage(records: &[RegistrationRecord]) -> DataCoverage {
    let months: BTreeSet<Period> = records
        .iter()
        .map(|r| Period::of(r, Granularity::Month))
        .collect();
    let manufacturers: BTreeSet<&str> = records.iter().map(|r| r.manufacturer.as_str()).collect();

    DataCoverage {
        data_points: records.len(),
        first_month: months.first().copied(),
        last_month: months.last().copied(),
        manufacturers: manufacturers.len(),
    }
}

/// Share of total registrations per value of `dimension`.
///
/// Sorted by total descending, then value. Empty when the buckets are not
/// grouped by `dimension`.
pub fn market_share(buckets: &[AggregatedBucket], dimension: Dimension) -> Vec<ShareEntry> {
    let total = sum(buckets.iter().map(|b| b.total_registrations));

    ranked_totals(buckets, dimension)
        .into_iter()
        .map(|(value, t)| ShareEntry {
            value: value.to_string(),
            total_registrations: t,
            share: pct(t, total),
        })
        .collect()
}

/// Mean combined total per materialized period.
pub fn average_period_total(buckets: &[AggregatedBucket]) -> Option<f64> {
    let per_period = period_totals(buckets);
    if per_period.is_empty() {
        return None;
    }
    let values: Vec<f64> = per_period.values().map(|t| *t as f64).collect();
    Some(mean(&values))
}

/// Totals per value of `dimension`, largest first, ties by value.
fn ranked_totals(buckets: &[AggregatedBucket], dimension: Dimension) -> Vec<(&str, u64)> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for b in buckets {
        if let Some(value) = b.dimension_key.get(dimension) {
            let total = totals.entry(value).or_default();
            *total = total.saturating_add(b.total_registrations);
        }
    }

    let mut ranking: Vec<_> = totals.into_iter().collect();
    // Stable sort keeps the BTreeMap's lexical order among equal totals.
    ranking.sort_by(|a, b| b.1.cmp(&a.1));
    ranking
}

fn period_totals(buckets: &[AggregatedBucket]) -> BTreeMap<Period, u64> {
    let mut totals: BTreeMap<Period, u64> = BTreeMap::new();
    for b in buckets {
        let total = totals.entry(b.period).or_default();
        *total = total.saturating_add(b.total_registrations);
    }
    totals
}

fn sum(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

/// Periods with the largest and smallest combined total, earliest on ties.
fn peak_and_trough(buckets: &[AggregatedBucket]) -> (Option<Period>, Option<Period>) {
    let mut peak: Option<(Period, u64)> = None;
    let mut trough: Option<(Period, u64)> = None;

    for (period, total) in period_totals(buckets) {
        if peak.is_none_or(|(_, best)| total > best) {
            peak = Some((period, total));
        }
        if trough.is_none_or(|(_, best)| total < best) {
            trough = Some((period, total));
        }
    }

    (peak.map(|(p, _)| p), trough.map(|(p, _)| p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::DimensionKey;
    use crate::record::{Category, Quarter};

    fn q(year: i32, quarter: Quarter) -> Period {
        Period::Quarter { year, quarter }
    }

    fn mfr_bucket(period: Period, name: &str, total: u64) -> AggregatedBucket {
        AggregatedBucket {
            period,
            dimension_key: DimensionKey::new(vec![(Dimension::Manufacturer, name.to_string())]),
            total_registrations: total,
        }
    }

    fn top(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn market() -> Vec<AggregatedBucket> {
        vec![
            mfr_bucket(q(2024, Quarter::Q1), "A", 400),
            mfr_bucket(q(2024, Quarter::Q1), "B", 100),
            mfr_bucket(q(2024, Quarter::Q2), "A", 200),
            mfr_bucket(q(2024, Quarter::Q2), "B", 200),
            mfr_bucket(q(2024, Quarter::Q2), "C", 100),
        ]
    }

    #[test]
    fn test_market_concentration_top_two() {
        let summary = summarize(&market(), top(2));

        assert_eq!(summary.total_registrations, 1000);
        assert_eq!(summary.top_manufacturer.as_deref(), Some("A"));
        assert_eq!(summary.top_manufacturer_share, Some(60.0));
        assert_eq!(summary.market_concentration_top_n, Some(90.0));
    }

    #[test]
    fn test_concentration_bounded_and_monotone() {
        let buckets = market();
        let mut previous = 0.0;
        for n in 1..=5 {
            let c = summarize(&buckets, top(n))
                .market_concentration_top_n
                .unwrap();
            assert!((0.0..=100.0).contains(&c));
            assert!(c >= previous);
            previous = c;
        }
        assert_eq!(previous, 100.0);
    }

    #[test]
    fn test_top_manufacturer_tie_is_lexical() {
        let buckets = vec![
            mfr_bucket(q(2024, Quarter::Q1), "ZETA", 50),
            mfr_bucket(q(2024, Quarter::Q1), "ALPHA", 50),
        ];
        let summary = summarize(&buckets, top(1));
        assert_eq!(summary.top_manufacturer.as_deref(), Some("ALPHA"));
    }

    #[test]
    fn test_peak_and_trough_periods() {
        let summary = summarize(&market(), top(3));
        assert_eq!(summary.peak_period, Some(q(2024, Quarter::Q2)));
        assert_eq!(summary.trough_period, Some(q(2024, Quarter::Q1)));
    }

    #[test]
    fn test_peak_tie_prefers_earliest() {
        let buckets = vec![
            mfr_bucket(q(2024, Quarter::Q2), "A", 10),
            mfr_bucket(q(2024, Quarter::Q1), "A", 10),
        ];
        let summary = summarize(&buckets, top(1));
        assert_eq!(summary.peak_period, Some(q(2024, Quarter::Q1)));
        assert_eq!(summary.trough_period, Some(q(2024, Quarter::Q1)));
    }

    #[test]
    fn test_empty_dataset_summary_is_undefined() {
        let summary = summarize(&[], top(5));
        assert!(summary.is_empty());
        assert_eq!(summary.total_registrations, 0);
        assert_eq!(summary.top_manufacturer, None);
        assert_eq!(summary.market_concentration_top_n, None);
        assert_eq!(summary.peak_period, None);
    }

    #[test]
    fn test_all_zero_totals_leave_shares_undefined() {
        let buckets = vec![mfr_bucket(q(2024, Quarter::Q1), "A", 0)];
        let summary = summarize(&buckets, top(1));

        assert!(!summary.is_empty());
        assert_eq!(summary.top_manufacturer.as_deref(), Some("A"));
        assert_eq!(summary.top_manufacturer_share, None);
        assert_eq!(summary.market_concentration_top_n, None);
    }

    #[test]
    fn test_without_manufacturer_dimension() {
        let buckets = vec![AggregatedBucket {
            period: q(2024, Quarter::Q1),
            dimension_key: DimensionKey::new(vec![(Dimension::Category, "2W".into())]),
            total_registrations: 10,
        }];
        let summary = summarize(&buckets, top(3));

        assert_eq!(summary.total_registrations, 10);
        assert_eq!(summary.top_manufacturer, None);
        assert_eq!(summary.market_concentration_top_n, None);
        assert_eq!(summary.peak_period, Some(q(2024, Quarter::Q1)));
    }

    #[test]
    fn test_market_share() {
        let shares = market_share(&market(), Dimension::Manufacturer);
        let rows: Vec<_> = shares
            .iter()
            .map(|s| (s.value.as_str(), s.total_registrations, s.share))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("A", 600, Some(60.0)),
                ("B", 300, Some(30.0)),
                ("C", 100, Some(10.0)),
            ]
        );
        assert!(market_share(&market(), Dimension::Region).is_empty());
    }

    #[test]
    fn test_average_period_total() {
        assert_eq!(average_period_total(&market()), Some(500.0));
        assert_eq!(average_period_total(&[]), None);
    }

    #[test]
    fn test_headline_yoy_growth() {
        let mut buckets = market();
        assert_eq!(headline_yoy_growth(&buckets), Growth::NoPriorPeriod);

        buckets.push(mfr_bucket(q(2023, Quarter::Q3), "A", 500));
        buckets.push(mfr_bucket(q(2023, Quarter::Q4), "B", 300));
        assert_eq!(headline_yoy_growth(&buckets), Growth::Percent(25.0));
        assert_eq!(summarize(&buckets, top(2)).yoy_growth, Growth::Percent(25.0));
    }

    #[test]
    fn test_headline_yoy_growth_edge_cases() {
        assert_eq!(headline_yoy_growth(&[]), Growth::NoPriorPeriod);

        // 2023 missing entirely: 2022 is not a valid comparison year.
        let gap = vec![
            mfr_bucket(q(2022, Quarter::Q1), "A", 100),
            mfr_bucket(q(2024, Quarter::Q1), "A", 100),
        ];
        assert_eq!(headline_yoy_growth(&gap), Growth::NoPriorPeriod);

        let from_zero = vec![
            mfr_bucket(q(2023, Quarter::Q1), "A", 0),
            mfr_bucket(q(2024, Quarter::Q1), "A", 40),
        ];
        assert_eq!(headline_yoy_growth(&from_zero), Growth::NewEntrant);

        let yearly = vec![
            mfr_bucket(Period::Year { year: 2023 }, "A", 200),
            mfr_bucket(Period::Year { year: 2024 }, "A", 150),
        ];
        assert_eq!(headline_yoy_growth(&yearly), Growth::Percent(-25.0));
    }

    #[test]
    fn test_data_coverage() {
        let record = |date: &str, mfr: &str| {
            RegistrationRecord::new(
                chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
                Category::TwoWheeler,
                mfr,
                10,
                None,
            )
        };
        let records = vec![
            record("2024-03-05", "HONDA"),
            record("2023-11-20", "HERO"),
            record("2024-01-02", "HONDA"),
        ];
        let coverage = data_coverage(&records);

        assert_eq!(coverage.data_points, 3);
        assert_eq!(
            coverage.first_month,
            Some(Period::Month {
                year: 2023,
                month: 11
            })
        );
        assert_eq!(coverage.last_month.map(|p| p.to_string()).as_deref(), Some("2024-03"));
        assert_eq!(coverage.manufacturers, 2);

        let empty = data_coverage(&[]);
        assert_eq!(empty.data_points, 0);
        assert_eq!(empty.first_month, None);
        assert_eq!(empty.manufacturers, 0);
    }

    #[test]
    fn test_hand_built_buckets_saturate() {
        let buckets = vec![
            mfr_bucket(q(2024, Quarter::Q1), "A", u64::MAX),
            mfr_bucket(q(2024, Quarter::Q1), "B", 1),
        ];
        let summary = summarize(&buckets, top(2));

        assert_eq!(summary.total_registrations, u64::MAX);
        assert_eq!(summary.top_manufacturer.as_deref(), Some("A"));
    }
}
