//! End-to-end query execution and its memoization layer.
//!
//! A [`Dataset`] is normalized once; each [`Query`] then runs
//! filter → aggregate → growth → summary over it. [`AnalysisCache`] keeps the
//! results per (dataset version, query) so repeated queries with unchanged
//! parameters are not recomputed.

use serde::Serialize;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::rc::Rc;
use tracing::{debug, info};

use crate::analyzers::aggregate::{AggregateError, aggregate};
use crate::analyzers::growth::compute_growth;
use crate::analyzers::summary::{data_coverage, summarize};
use crate::analyzers::types::{
    AggregatedBucket, DataCoverage, Dimension, Granularity, GrowthRecord, InsightSummary,
};
use crate::filter::RecordFilter;
use crate::normalize::{Normalizer, RejectedRow};
use crate::record::{RawRow, RegistrationRecord};

/// Number of manufacturers counted towards market concentration by default.
pub const DEFAULT_TOP_N: NonZeroUsize = NonZeroUsize::new(5).unwrap();

/// Parameters of one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Query {
    pub filter: RecordFilter,
    pub granularity: Granularity,
    pub dimensions: Vec<Dimension>,
    pub top_n: NonZeroUsize,
}

impl Query {
    pub fn new(granularity: Granularity, dimensions: Vec<Dimension>) -> Self {
        Query {
            filter: RecordFilter::default(),
            granularity,
            dimensions,
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn with_filter(mut self, filter: RecordFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_top_n(mut self, top_n: NonZeroUsize) -> Self {
        self.top_n = top_n;
        self
    }
}

/// A normalized record set tagged with a caller-assigned version.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub version: u64,
    pub records: Vec<RegistrationRecord>,
    pub rejected: Vec<RejectedRow>,
}

impl Dataset {
    pub fn from_rows(version: u64, rows: &[RawRow], normalizer: &Normalizer) -> Self {
        let (records, rejected) = normalizer.normalize(rows);
        Dataset {
            version,
            records,
            rejected,
        }
    }
}

/// Result tables of one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    /// Records left after filtering.
    pub record_count: usize,
    pub coverage: DataCoverage,
    pub buckets: Vec<AggregatedBucket>,
    pub growth: Vec<GrowthRecord>,
    pub summary: InsightSummary,
}

/// Runs `query` against `dataset`.
#[tracing::instrument(
    skip_all,
    fields(version = dataset.version, granularity = ?query.granularity, dimensions = ?query.dimensions)
)]
pub fn run(dataset: &Dataset, query: &Query) -> Result<Analysis, AggregateError> {
    let records = query.filter.apply(&dataset.records);
    let buckets = aggregate(&records, query.granularity, &query.dimensions)?;
    let growth = compute_growth(&buckets);
    let summary = summarize(&buckets, query.top_n);

    info!(
        records = records.len(),
        buckets = buckets.len(),
        total = summary.total_registrations,
        "Analysis complete"
    );

    Ok(Analysis {
        record_count: records.len(),
        coverage: data_coverage(&records),
        buckets,
        growth,
        summary,
    })
}

/// Memoized [`run`] results for the current dataset version.
///
/// Entries are keyed by query; a lookup with a different dataset version
/// drops everything cached for the previous one.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    version: Option<u64>,
    entries: HashMap<Query, Rc<Analysis>>,
    hits: u64,
    misses: u64,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached analysis for `(dataset.version, query)`, running it on a miss.
    pub fn get_or_run(
        &mut self,
        dataset: &Dataset,
        query: &Query,
    ) -> Result<Rc<Analysis>, AggregateError> {
        if self.version != Some(dataset.version) {
            if !self.entries.is_empty() {
                debug!(
                    old = ?self.version,
                    new = dataset.version,
                    dropped = self.entries.len(),
                    "Dataset version changed, dropping cached analyses"
                );
            }
            self.entries.clear();
            self.version = Some(dataset.version);
        }

        if let Some(hit) = self.entries.get(query) {
            self.hits += 1;
            return Ok(Rc::clone(hit));
        }

        self.misses += 1;
        let analysis = Rc::new(run(dataset, query)?);
        self.entries.insert(query.clone(), Rc::clone(&analysis));
        Ok(analysis)
    }

    /// Drops every cached entry.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.version = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
