//! Data types used by the aggregation pipeline.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::record::{Quarter, RegistrationRecord};

/// Region value used for records that carry none.
pub const UNSPECIFIED_REGION: &str = "UNSPECIFIED";

/// Width of a time bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Month,
    Quarter,
    Year,
}

/// A record attribute that buckets can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Category,
    Manufacturer,
    Region,
}

impl Dimension {
    /// The record's value for this dimension.
    pub fn value_of(&self, record: &RegistrationRecord) -> String {
        match self {
            Dimension::Category => record.category.code().to_string(),
            Dimension::Manufacturer => record.manufacturer.clone(),
            Dimension::Region => record
                .region
                .clone()
                .unwrap_or_else(|| UNSPECIFIED_REGION.to_string()),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Category => f.write_str("category"),
            Dimension::Manufacturer => f.write_str("manufacturer"),
            Dimension::Region => f.write_str("region"),
        }
    }
}

/// A time bucket identifier.
///
/// Ordering is chronological within one granularity. Buckets of different
/// granularities are never mixed in a single aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Period {
    Month { year: i32, month: u32 },
    Quarter { year: i32, quarter: Quarter },
    Year { year: i32 },
}

impl Period {
    /// The bucket `record` falls into at `granularity`.
    pub fn of(record: &RegistrationRecord, granularity: Granularity) -> Self {
        match granularity {
            Granularity::Month => Period::Month {
                year: record.year,
                month: record.month(),
            },
            Granularity::Quarter => Period::Quarter {
                year: record.year,
                quarter: record.quarter,
            },
            Granularity::Year => Period::Year { year: record.year },
        }
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            Period::Month { .. } => Granularity::Month,
            Period::Quarter { .. } => Granularity::Quarter,
            Period::Year { .. } => Granularity::Year,
        }
    }

    pub fn year(&self) -> i32 {
        match *self {
            Period::Month { year, .. } | Period::Quarter { year, .. } | Period::Year { year } => {
                year
            }
        }
    }

    /// The bucket one granularity step earlier.
    pub fn previous(&self) -> Period {
        match *self {
            Period::Month { year, month: 1 } => Period::Month {
                year: year - 1,
                month: 12,
            },
            Period::Month { year, month } => Period::Month {
                year,
                month: month - 1,
            },
            Period::Quarter { year, quarter } => match quarter {
                Quarter::Q1 => Period::Quarter {
                    year: year - 1,
                    quarter: Quarter::Q4,
                },
                Quarter::Q2 => Period::Quarter {
                    year,
                    quarter: Quarter::Q1,
                },
                Quarter::Q3 => Period::Quarter {
                    year,
                    quarter: Quarter::Q2,
                },
                Quarter::Q4 => Period::Quarter {
                    year,
                    quarter: Quarter::Q3,
                },
            },
            Period::Year { year } => Period::Year { year: year - 1 },
        }
    }

    /// The same bucket one calendar year earlier.
    pub fn year_ago(&self) -> Period {
        match *self {
            Period::Month { year, month } => Period::Month {
                year: year - 1,
                month,
            },
            Period::Quarter { year, quarter } => Period::Quarter {
                year: year - 1,
                quarter,
            },
            Period::Year { year } => Period::Year { year: year - 1 },
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Month { year, month } => write!(f, "{}-{:02}", year, month),
            Period::Quarter { year, quarter } => write!(f, "{}-{}", year, quarter),
            Period::Year { year } => write!(f, "{}", year),
        }
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The grouping values of a bucket, in the order the dimensions were requested.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DimensionKey(Vec<(Dimension, String)>);

impl DimensionKey {
    pub fn new(parts: Vec<(Dimension, String)>) -> Self {
        Self(parts)
    }

    /// Builds the key of `record` for `dimensions`.
    pub fn of(record: &RegistrationRecord, dimensions: &[Dimension]) -> Self {
        Self(
            dimensions
                .iter()
                .map(|d| (*d, d.value_of(record)))
                .collect(),
        )
    }

    /// Value for `dimension`, if the key includes it.
    pub fn get(&self, dimension: Dimension) -> Option<&str> {
        self.0
            .iter()
            .find(|(d, _)| *d == dimension)
            .map(|(_, v)| v.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(_, v)| v.as_str())
    }

    pub fn dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.0.iter().map(|(d, _)| *d)
    }
}

impl fmt::Display for DimensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self.values().collect::<Vec<_>>().join(" / ");
        f.write_str(&joined)
    }
}

impl Serialize for DimensionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Summed registrations for one (period, dimension key) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedBucket {
    pub period: Period,
    pub dimension_key: DimensionKey,
    pub total_registrations: u64,
}

/// Period-over-period change of a bucket total.
///
/// A missing comparison bucket and a comparison against zero are kept
/// apart from numeric growth so they can never be read as `0%`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", content = "percent", rename_all = "snake_case")]
pub enum Growth {
    /// Percentage change against a non-zero prior total.
    Percent(f64),
    /// Prior total was zero and the current one is positive.
    NewEntrant,
    /// No bucket exists for the comparison period.
    NoPriorPeriod,
}

impl Growth {
    /// Growth from `prior` (if a prior bucket exists) to `current`.
    pub fn compare(prior: Option<u64>, current: u64) -> Self {
        match prior {
            None => Growth::NoPriorPeriod,
            Some(0) if current > 0 => Growth::NewEntrant,
            Some(0) => Growth::Percent(0.0),
            Some(prev) => {
                Growth::Percent((current as f64 - prev as f64) * 100.0 / prev as f64)
            }
        }
    }

    pub fn as_percent(&self) -> Option<f64> {
        match self {
            Growth::Percent(p) => Some(*p),
            _ => None,
        }
    }
}

impl fmt::Display for Growth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Growth::Percent(p) => write!(f, "{:.2}", p),
            Growth::NewEntrant => f.write_str("new"),
            Growth::NoPriorPeriod => f.write_str("N/A"),
        }
    }
}

/// Growth figures attached to a bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthRecord {
    pub period: Period,
    pub dimension_key: DimensionKey,
    pub total_registrations: u64,
    pub yoy_growth: Growth,
    pub qoq_growth: Growth,
}

/// Headline KPIs for a filtered dataset. `None` means undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightSummary {
    pub total_registrations: u64,
    pub top_n: usize,
    pub top_manufacturer: Option<String>,
    pub top_manufacturer_share: Option<f64>,
    pub market_concentration_top_n: Option<f64>,
    pub peak_period: Option<Period>,
    pub trough_period: Option<Period>,
    /// Latest calendar year's total against the year before it.
    pub yoy_growth: Growth,
}

impl InsightSummary {
    /// Summary of a dataset with no buckets at all.
    pub fn empty(top_n: usize) -> Self {
        InsightSummary {
            total_registrations: 0,
            top_n,
            top_manufacturer: None,
            top_manufacturer_share: None,
            market_concentration_top_n: None,
            peak_period: None,
            trough_period: None,
            yoy_growth: Growth::NoPriorPeriod,
        }
    }

    /// True when the summary was computed from no buckets.
    pub fn is_empty(&self) -> bool {
        self.peak_period.is_none()
    }
}

/// Share of total registrations held by one dimension value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareEntry {
    pub value: String,
    pub total_registrations: u64,
    /// `None` when the dataset total is zero.
    pub share: Option<f64>,
}

/// How much data a filtered record set covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataCoverage {
    pub data_points: usize,
    /// Earliest and latest months with a record; `None` when empty.
    pub first_month: Option<Period>,
    pub last_month: Option<Period>,
    pub manufacturers: usize,
}

/// Mean registrations for one calendar month across all years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthAverage {
    pub month: u32,
    pub average: f64,
}

/// Calendar-month seasonality of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalProfile {
    pub months: Vec<MonthAverage>,
    pub peak_month: Option<u32>,
    pub low_month: Option<u32>,
}
