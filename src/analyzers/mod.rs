//! Registration aggregation, growth and market insights.
//!
//! This module turns validated records into period buckets, computes YoY and
//! QoQ growth per bucket, and derives the investor-facing KPIs (market
//! leader, concentration, shares, seasonality) from them.

pub mod aggregate;
pub mod growth;
pub mod seasonality;
pub mod summary;
pub mod types;
pub mod utility;
