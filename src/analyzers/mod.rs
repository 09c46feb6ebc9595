//! Statistical aggregation of occupancy observations.
//!
//! This module groups filtered records by weekday and hour, rolls the
//! buckets up into an overall summary, and derives textual insights.

pub mod aggregate;
pub mod insights;
pub mod summary;
pub mod types;
pub mod utility;
