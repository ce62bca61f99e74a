//! Raw and validated registration rows.
//!
//! [`RawRow`] is what a loader hands us: every field is an optional string,
//! exactly as it appeared in the source. [`RegistrationRecord`] is the strict
//! shape produced by [`crate::normalize`]; nothing downstream of the
//! normalizer ever sees a `RawRow`.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Vehicle class of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "2W")]
    TwoWheeler,
    #[serde(rename = "3W")]
    ThreeWheeler,
    #[serde(rename = "4W")]
    FourWheeler,
}

impl Category {
    /// Short code used in reports and dimension keys.
    pub fn code(&self) -> &'static str {
        match self {
            Category::TwoWheeler => "2W",
            Category::ThreeWheeler => "3W",
            Category::FourWheeler => "4W",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Calendar quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    /// Maps a calendar month (1-12) to its quarter.
    ///
    /// The zero-based month index is integer-divided by 3, so months
    /// outside 1..=12 are clamped into Q4 rather than panicking.
    pub fn from_month(month: u32) -> Self {
        match month.saturating_sub(1) / 3 {
            0 => Quarter::Q1,
            1 => Quarter::Q2,
            2 => Quarter::Q3,
            _ => Quarter::Q4,
        }
    }

    /// 1-based quarter number.
    pub fn number(&self) -> u32 {
        match self {
            Quarter::Q1 => 1,
            Quarter::Q2 => 2,
            Quarter::Q3 => 3,
            Quarter::Q4 => 4,
        }
    }

    /// Quarter from its 1-based number, `None` outside 1..=4.
    pub fn from_number(n: u32) -> Option<Self> {
        match n {
            1 => Some(Quarter::Q1),
            2 => Some(Quarter::Q2),
            3 => Some(Quarter::Q3),
            4 => Some(Quarter::Q4),
            _ => None,
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.number())
    }
}

/// A loosely-typed source row.
///
/// Header aliases cover the column names used by the dashboard export
/// (`Date`, `Category`, ...) and the upstream collector (`vehicle_class`,
/// `state_code`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(default, alias = "Date")]
    pub date: Option<String>,
    #[serde(default, alias = "Category", alias = "vehicle_class")]
    pub category: Option<String>,
    #[serde(default, alias = "Manufacturer")]
    pub manufacturer: Option<String>,
    #[serde(default, alias = "Registrations")]
    pub registrations: Option<String>,
    #[serde(default, alias = "Region", alias = "state_code")]
    pub region: Option<String>,
}

impl RawRow {
    /// Convenience constructor for rows whose fields are all present.
    pub fn new(date: &str, category: &str, manufacturer: &str, registrations: i64) -> Self {
        RawRow {
            date: Some(date.to_string()),
            category: Some(category.to_string()),
            manufacturer: Some(manufacturer.to_string()),
            registrations: Some(registrations.to_string()),
            region: None,
        }
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }
}

/// A validated registration row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RegistrationRecord {
    pub date: NaiveDate,
    pub category: Category,
    pub manufacturer: String,
    pub registrations: u64,
    pub region: Option<String>,
    pub year: i32,
    pub quarter: Quarter,
}

impl RegistrationRecord {
    /// Builds a record, deriving `year` and `quarter` from `date`.
    ///
    /// `manufacturer` and `region` are stored as given; canonicalization is
    /// the normalizer's job.
    pub fn new(
        date: NaiveDate,
        category: Category,
        manufacturer: impl Into<String>,
        registrations: u64,
        region: Option<String>,
    ) -> Self {
        RegistrationRecord {
            date,
            category,
            manufacturer: manufacturer.into(),
            registrations,
            region,
            year: date.year(),
            quarter: Quarter::from_month(date.month()),
        }
    }

    /// Calendar month, 1-12.
    pub fn month(&self) -> u32 {
        self.date.month()
    }
}
