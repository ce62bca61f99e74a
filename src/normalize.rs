//! Validation of raw rows into [`RegistrationRecord`]s.
//!
//! Every input row produces exactly one outcome: an accepted record or a
//! [`RejectedRow`] carrying its index and a [`RejectReason`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::config::CategoryAliases;
use crate::record::{RawRow, RegistrationRecord};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Why a raw row was excluded from the valid set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, thiserror::Error)]
pub enum RejectReason {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("unparseable date `{0}`")]
    InvalidDate(String),
    #[error("unknown vehicle category `{0}`")]
    UnknownCategory(String),
    #[error("registration count `{0}` is not an integer")]
    InvalidCount(String),
    #[error("negative registration count {0}")]
    NegativeCount(i64),
    #[error("duplicate of an earlier row")]
    Duplicate,
}

impl RejectReason {
    /// Stable reason code, used for rejection breakdowns.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::MissingField(_) => "MissingField",
            RejectReason::InvalidDate(_) => "InvalidDate",
            RejectReason::UnknownCategory(_) => "UnknownCategory",
            RejectReason::InvalidCount(_) => "InvalidCount",
            RejectReason::NegativeCount(_) => "NegativeCount",
            RejectReason::Duplicate => "Duplicate",
        }
    }
}

/// A raw row that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    /// Position of the row in the input sequence.
    pub index: usize,
    pub row: RawRow,
    pub reason: RejectReason,
}

/// Row validator. Holds the category alias table used for matching.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    aliases: CategoryAliases,
}

impl Normalizer {
    pub fn new(aliases: CategoryAliases) -> Self {
        Self { aliases }
    }

    /// Splits `rows` into valid records and rejected rows.
    ///
    /// Both outputs preserve input order. The input is not modified.
    pub fn normalize(&self, rows: &[RawRow]) -> (Vec<RegistrationRecord>, Vec<RejectedRow>) {
        let mut records = Vec::with_capacity(rows.len());
        let mut rejected = Vec::new();
        let mut seen = HashSet::new();

        for (index, row) in rows.iter().enumerate() {
            let outcome = self.normalize_row(row).and_then(|record| {
                if seen.insert(record.clone()) {
                    Ok(record)
                } else {
                    Err(RejectReason::Duplicate)
                }
            });

            match outcome {
                Ok(record) => records.push(record),
                Err(reason) => {
                    debug!(index, reason = %reason, "Row rejected");
                    rejected.push(RejectedRow {
                        index,
                        row: row.clone(),
                        reason,
                    });
                }
            }
        }

        debug!(
            accepted = records.len(),
            rejected = rejected.len(),
            "Normalization complete"
        );
        (records, rejected)
    }

    /// Validates a single row. Duplicate detection needs the whole input and
    /// is handled by [`Normalizer::normalize`].
    pub fn normalize_row(&self, row: &RawRow) -> Result<RegistrationRecord, RejectReason> {
        let date = required(&row.date, "date")?;
        let category = required(&row.category, "category")?;
        let manufacturer = required(&row.manufacturer, "manufacturer")?;
        let registrations = required(&row.registrations, "registrations")?;

        let date = parse_date(date).ok_or_else(|| RejectReason::InvalidDate(date.to_string()))?;
        let category = self
            .aliases
            .resolve(category)
            .ok_or_else(|| RejectReason::UnknownCategory(category.to_string()))?;
        let registrations = parse_count(registrations)?;

        let region = row
            .region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        Ok(RegistrationRecord::new(
            date,
            category,
            canonical_manufacturer(manufacturer),
            registrations,
            region,
        ))
    }
}

/// Normalizes `rows` with the built-in category aliases.
pub fn normalize(rows: &[RawRow]) -> (Vec<RegistrationRecord>, Vec<RejectedRow>) {
    Normalizer::default().normalize(rows)
}

/// Counts rejected rows per reason code.
pub fn rejection_breakdown(rejected: &[RejectedRow]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for r in rejected {
        *counts.entry(r.reason.code()).or_insert(0) += 1;
    }
    counts
}

/// Canonical manufacturer spelling: trimmed, single-spaced, upper-cased.
pub fn canonical_manufacturer(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

fn required<'a>(field: &'a Option<String>, name: &'static str) -> Result<&'a str, RejectReason> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(RejectReason::MissingField(name))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

fn parse_count(raw: &str) -> Result<u64, RejectReason> {
    let value = match raw.parse::<i64>() {
        Ok(v) => v,
        // Counts exported through a float column arrive as "1200.0".
        Err(_) => match raw.parse::<f64>() {
            Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
            _ => return Err(RejectReason::InvalidCount(raw.to_string())),
        },
    };

    u64::try_from(value).map_err(|_| RejectReason::NegativeCount(value))
}
