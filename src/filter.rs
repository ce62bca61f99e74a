//! Record selection applied between normalization and aggregation.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::normalize::canonical_manufacturer;
use crate::record::{Category, RegistrationRecord};

/// Active filter parameters. Unset bounds and empty sets do not restrict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct RecordFilter {
    /// Inclusive lower date bound.
    pub from: Option<NaiveDate>,
    /// Inclusive upper date bound.
    pub to: Option<NaiveDate>,
    pub categories: BTreeSet<Category>,
    /// Canonical manufacturer names.
    pub manufacturers: BTreeSet<String>,
}

impl RecordFilter {
    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories.extend(categories);
        self
    }

    /// Adds manufacturers, canonicalized the same way records are.
    pub fn with_manufacturers<S: AsRef<str>>(
        mut self,
        manufacturers: impl IntoIterator<Item = S>,
    ) -> Self {
        self.manufacturers.extend(
            manufacturers
                .into_iter()
                .map(|m| canonical_manufacturer(m.as_ref())),
        );
        self
    }

    pub fn matches(&self, record: &RegistrationRecord) -> bool {
        self.from.is_none_or(|from| record.date >= from)
            && self.to.is_none_or(|to| record.date <= to)
            && (self.categories.is_empty() || self.categories.contains(&record.category))
            && (self.manufacturers.is_empty() || self.manufacturers.contains(&record.manufacturer))
    }

    /// Records passing the filter, in input order.
    pub fn apply(&self, records: &[RegistrationRecord]) -> Vec<RegistrationRecord> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }
}
