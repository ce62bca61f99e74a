use crate::analyzers::types::{AggregatedBucket, Dimension, DimensionKey, Granularity, Period};
use crate::record::RegistrationRecord;
use std::collections::BTreeMap;
use tracing::debug;

/// Invalid grouping requested from [`aggregate`].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    #[error("at least one grouping dimension is required")]
    NoDimensions,
    #[error("dimension `{0}` requested more than once")]
    RepeatedDimension(Dimension),
    #[error("registration total does not fit in 64 bits")]
    Overflow,
}

/// Sums registrations per (period, dimension key).
///
/// Buckets come back sorted by period, then by key values in the order the
/// dimensions were given. Periods without any matching record are not
/// materialized, so an absent bucket means "no data" while a present bucket
/// may still total zero.
///
/// Fails with [`AggregateError::Overflow`] when the combined registrations
/// of `records` exceed `u64::MAX`, so no bucket or sum of buckets can.
pub fn aggregate(
    records: &[RegistrationRecord],
    granularity: Granularity,
    dimensions: &[Dimension],
) -> Result<Vec<AggregatedBucket>, AggregateError> {
    validate_dimensions(dimensions)?;

    let mut totals: BTreeMap<(Period, DimensionKey), u64> = BTreeMap::new();
    let mut grand_total: u64 = 0;

    for record in records {
        grand_total = grand_total
            .checked_add(record.registrations)
            .ok_or(AggregateError::Overflow)?;

        let key = (
            Period::of(record, granularity),
            DimensionKey::of(record, dimensions),
        );
        // Bounded by grand_total.
        *totals.entry(key).or_default() += record.registrations;
    }

    debug!(
        records = records.len(),
        total = grand_total,
        buckets = totals.len(),
        ?granularity,
        "Aggregated records"
    );

    Ok(totals
        .into_iter()
        .map(|((period, dimension_key), total_registrations)| AggregatedBucket {
            period,
            dimension_key,
            total_registrations,
        })
        .collect())
}

fn validate_dimensions(dimensions: &[Dimension]) -> Result<(), AggregateError> {
    if dimensions.is_empty() {
        return Err(AggregateError::NoDimensions);
    }

    for (i, d) in dimensions.iter().enumerate() {
        if dimensions[..i].contains(d) {
            return Err(AggregateError::RepeatedDimension(*d));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::record::{Category, Quarter, RawRow};
    use chrono::NaiveDate;

    fn record(date: &str, category: Category, mfr: &str, n: u64) -> RegistrationRecord {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        RegistrationRecord::new(date, category, mfr, n, None)
    }

    fn sample() -> Vec<RegistrationRecord> {
        vec![
            record("2024-04-03", Category::TwoWheeler, "HONDA", 50),
            record("2024-01-15", Category::TwoWheeler, "HONDA", 100),
            record("2024-02-20", Category::TwoWheeler, "HERO", 70),
            record("2024-03-01", Category::FourWheeler, "KIA", 30),
            record("2024-05-09", Category::TwoWheeler, "HONDA", 25),
        ]
    }

    #[test]
    fn test_groups_by_quarter_and_category() {
        let buckets = aggregate(&sample(), Granularity::Quarter, &[Dimension::Category]).unwrap();

        let summary: Vec<_> = buckets
            .iter()
            .map(|b| {
                (
                    b.period.to_string(),
                    b.dimension_key.to_string(),
                    b.total_registrations,
                )
            })
            .collect();

        assert_eq!(
            summary,
            vec![
                ("2024-Q1".to_string(), "2W".to_string(), 170),
                ("2024-Q1".to_string(), "4W".to_string(), 30),
                ("2024-Q2".to_string(), "2W".to_string(), 75),
            ]
        );
    }

    #[test]
    fn test_composite_key_follows_requested_order() {
        let buckets = aggregate(
            &sample(),
            Granularity::Year,
            &[Dimension::Manufacturer, Dimension::Category],
        )
        .unwrap();

        let keys: Vec<_> = buckets.iter().map(|b| b.dimension_key.to_string()).collect();
        assert_eq!(keys, vec!["HERO / 2W", "HONDA / 2W", "KIA / 4W"]);
        assert_eq!(buckets[1].total_registrations, 175);
    }

    #[test]
    fn test_month_buckets_are_sparse() {
        let records = vec![
            record("2024-01-15", Category::TwoWheeler, "HONDA", 10),
            record("2024-04-15", Category::TwoWheeler, "HONDA", 20),
        ];
        let buckets = aggregate(&records, Granularity::Month, &[Dimension::Manufacturer]).unwrap();

        assert_eq!(buckets.len(), 2);
        assert_eq!(
            buckets[1].period,
            Period::Month {
                year: 2024,
                month: 4
            }
        );
    }

    #[test]
    fn test_zero_count_bucket_is_materialized() {
        let records = vec![record("2024-01-15", Category::ThreeWheeler, "PIAGGIO", 0)];
        let buckets = aggregate(&records, Granularity::Quarter, &[Dimension::Manufacturer]).unwrap();

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].total_registrations, 0);
        assert_eq!(
            buckets[0].period,
            Period::Quarter {
                year: 2024,
                quarter: Quarter::Q1
            }
        );
    }

    #[test]
    fn test_region_dimension_defaults_missing_region() {
        let mut with_region = record("2024-01-15", Category::TwoWheeler, "TVS", 5);
        with_region.region = Some("KA".into());
        let records = vec![
            with_region,
            record("2024-01-16", Category::TwoWheeler, "TVS", 7),
        ];

        let buckets = aggregate(&records, Granularity::Year, &[Dimension::Region]).unwrap();
        let keys: Vec<_> = buckets.iter().map(|b| b.dimension_key.to_string()).collect();
        assert_eq!(keys, vec!["KA", "UNSPECIFIED"]);
    }

    #[test]
    fn test_total_is_preserved() {
        let records = sample();
        let expected: u64 = records.iter().map(|r| r.registrations).sum();

        for granularity in [Granularity::Month, Granularity::Quarter, Granularity::Year] {
            let buckets = aggregate(
                &records,
                granularity,
                &[Dimension::Category, Dimension::Manufacturer],
            )
            .unwrap();
            let total: u64 = buckets.iter().map(|b| b.total_registrations).sum();
            assert_eq!(total, expected);
        }
    }

    #[test]
    fn test_empty_input_yields_no_buckets() {
        let buckets = aggregate(&[], Granularity::Quarter, &[Dimension::Category]).unwrap();
        assert!(buckets.is_empty());
    }

    #[test]
    fn test_invalid_dimensions() {
        assert_eq!(
            aggregate(&sample(), Granularity::Quarter, &[]),
            Err(AggregateError::NoDimensions)
        );
        assert_eq!(
            aggregate(
                &sample(),
                Granularity::Quarter,
                &[Dimension::Category, Dimension::Category]
            ),
            Err(AggregateError::RepeatedDimension(Dimension::Category))
        );
    }

    #[test]
    fn test_total_overflow_is_an_error() {
        let rows = vec![
            RawRow::new("2024-01-10", "2W", "A", i64::MAX),
            RawRow::new("2024-02-10", "2W", "A", i64::MAX),
            RawRow::new("2024-03-10", "2W", "A", 2),
        ];
        let (records, rejected) = normalize(&rows);
        assert!(rejected.is_empty());

        assert_eq!(
            aggregate(&records, Granularity::Quarter, &[Dimension::Manufacturer]),
            Err(AggregateError::Overflow)
        );
    }

    #[test]
    fn test_largest_representable_total_is_kept() {
        let records = vec![
            record("2024-01-10", Category::TwoWheeler, "A", u64::MAX - 1),
            record("2024-04-10", Category::TwoWheeler, "B", 1),
        ];
        let buckets = aggregate(&records, Granularity::Quarter, &[Dimension::Manufacturer]).unwrap();

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].total_registrations, u64::MAX - 1);
    }
}
