use registration_insights::analyzers::types::{Dimension, Granularity, Growth};
use registration_insights::loader::read_rows;
use registration_insights::normalize::RejectReason;
use registration_insights::record::RawRow;
use registration_insights::{aggregate, compute_growth, normalize, summarize};
use std::num::NonZeroUsize;

fn top(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

#[test]
fn test_full_pipeline_from_csv() {
    let data = "\
Date,Category,Manufacturer,Registrations,Region
2023-01-31,2W,Hero MotoCorp,1000,MH
2023-04-30,2W,Hero MotoCorp,1100,MH
2024-01-31,2W,Hero MotoCorp,1200,MH
2024-04-30,2W,Hero MotoCorp,1320,MH
2024-01-31,Four Wheeler,Maruti Suzuki,800,DL
2024-04-30,Car,Maruti Suzuki,400,DL
2024-04-30,Scooter,TVS,-10,KA
2024-04-31,2W,TVS,50,KA
";
    let rows = read_rows(data.as_bytes()).expect("Failed to read rows");
    let (records, rejected) = normalize(&rows);

    assert_eq!(records.len(), 6);
    assert_eq!(rejected.len(), 2);
    assert_eq!(rejected[0].reason, RejectReason::NegativeCount(-10));
    assert_eq!(rejected[1].reason.code(), "InvalidDate");

    let buckets = aggregate(&records, Granularity::Quarter, &[Dimension::Manufacturer]).unwrap();
    let growth = compute_growth(&buckets);
    assert_eq!(growth.len(), buckets.len());

    let hero_q2 = growth
        .iter()
        .find(|g| g.period.to_string() == "2024-Q2" && g.dimension_key.to_string() == "HERO MOTOCORP")
        .unwrap();
    assert_eq!(hero_q2.qoq_growth, Growth::Percent(10.0));
    assert_eq!(hero_q2.yoy_growth, Growth::Percent(20.0));

    let maruti_q1 = growth
        .iter()
        .find(|g| g.period.to_string() == "2024-Q1" && g.dimension_key.to_string() == "MARUTI SUZUKI")
        .unwrap();
    assert_eq!(maruti_q1.qoq_growth, Growth::NoPriorPeriod);
    assert_eq!(maruti_q1.yoy_growth, Growth::NoPriorPeriod);

    let summary = summarize(&buckets, top(1));
    assert_eq!(summary.total_registrations, 5820);
    assert_eq!(summary.top_manufacturer.as_deref(), Some("HERO MOTOCORP"));
}

#[test]
fn test_qoq_scenario() {
    let rows = vec![
        RawRow::new("2024-02-01", "2W", "X", 100),
        RawRow::new("2024-05-01", "2W", "X", 150),
    ];
    let (records, _) = normalize(&rows);
    let buckets = aggregate(&records, Granularity::Quarter, &[Dimension::Category]).unwrap();
    let growth = compute_growth(&buckets);

    assert_eq!(growth[1].period.to_string(), "2024-Q2");
    assert_eq!(growth[1].qoq_growth, Growth::Percent(50.0));
}

#[test]
fn test_yoy_scenario() {
    let rows = vec![
        RawRow::new("2023-03-01", "4W", "X", 200),
        RawRow::new("2024-03-01", "4W", "X", 300),
    ];
    let (records, _) = normalize(&rows);
    let buckets = aggregate(&records, Granularity::Quarter, &[Dimension::Manufacturer]).unwrap();
    let growth = compute_growth(&buckets);

    assert_eq!(growth[1].period.to_string(), "2024-Q1");
    assert_eq!(growth[1].yoy_growth, Growth::Percent(50.0));
}

#[test]
fn test_concentration_scenario() {
    let rows = vec![
        RawRow::new("2024-01-01", "2W", "A", 600),
        RawRow::new("2024-01-01", "2W", "B", 300),
        RawRow::new("2024-01-01", "2W", "C", 100),
    ];
    let (records, _) = normalize(&rows);
    let buckets = aggregate(&records, Granularity::Quarter, &[Dimension::Manufacturer]).unwrap();

    assert_eq!(
        summarize(&buckets, top(2)).market_concentration_top_n,
        Some(90.0)
    );
}

#[test]
fn test_aggregate_and_growth_are_idempotent() {
    let rows: Vec<RawRow> = (1..=12)
        .flat_map(|m| {
            let date = format!("2024-{:02}-15", m);
            vec![
                RawRow::new(&date, "2W", "Honda", 100 + m),
                RawRow::new(&date, "3W", "Bajaj", 10 * m),
            ]
        })
        .collect();
    let (records, _) = normalize(&rows);

    let first = compute_growth(
        &aggregate(&records, Granularity::Month, &[Dimension::Category, Dimension::Manufacturer])
            .unwrap(),
    );
    let second = compute_growth(
        &aggregate(&records, Granularity::Month, &[Dimension::Category, Dimension::Manufacturer])
            .unwrap(),
    );

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_empty_dataset() {
    let (records, rejected) = normalize(&[]);
    assert!(records.is_empty() && rejected.is_empty());

    let buckets = aggregate(&records, Granularity::Quarter, &[Dimension::Manufacturer]).unwrap();
    assert!(compute_growth(&buckets).is_empty());

    let summary = summarize(&buckets, top(5));
    assert!(summary.is_empty());
    assert_eq!(summary.market_concentration_top_n, None);
}
