use crate::analyzers::types::{MonthAverage, SeasonalProfile};
use crate::analyzers::utility::mean;
use crate::record::RegistrationRecord;
use std::collections::BTreeMap;

/// Average registrations per record for each calendar month, across all years.
///
/// Only months that occur in `records` are listed. Peak and low months break
/// ties towards the earlier month.
pub fn seasonal_profile(records: &[RegistrationRecord]) -> SeasonalProfile {
    let mut by_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for r in records {
        by_month
            .entry(r.month())
            .or_default()
            .push(r.registrations as f64);
    }

    let months: Vec<MonthAverage> = by_month
        .into_iter()
        .map(|(month, values)| MonthAverage {
            month,
            average: mean(&values),
        })
        .collect();

    let mut peak: Option<&MonthAverage> = None;
    let mut low: Option<&MonthAverage> = None;
    for m in &months {
        if peak.is_none_or(|p| m.average > p.average) {
            peak = Some(m);
        }
        if low.is_none_or(|l| m.average < l.average) {
            low = Some(m);
        }
    }

    SeasonalProfile {
        peak_month: peak.map(|m| m.month),
        low_month: low.map(|m| m.month),
        months,
    }
}
