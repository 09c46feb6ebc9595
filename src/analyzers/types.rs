//! Data types produced by the aggregation pipeline.

use serde::{Deserialize, Serialize};

/// Aggregate of all observations sharing a weekday and an hour of day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourBucket {
    pub hour: u8,
    pub sample_count: usize,
    pub average: f64,
    pub min: u32,
    pub max: u32,
    pub standard_deviation: f64,
}

impl HourBucket {
    /// Zero-valued bucket for an hour with no samples.
    pub fn empty(hour: u8) -> Self {
        Self {
            hour,
            sample_count: 0,
            average: 0.0,
            min: 0,
            max: 0,
            standard_deviation: 0.0,
        }
    }

    pub fn has_data(&self) -> bool {
        self.sample_count > 0
    }
}

/// One weekday's full-day profile: 24 hour buckets plus day-level stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekdaySummary {
    /// Display form of the day name. Same as `english_day` until a
    /// localized front end supplies its own labels.
    pub weekday: String,
    /// Canonical key used for grouping and weekend detection.
    pub english_day: String,
    pub total_entries: usize,
    pub avg_crowd_level: f64,
    pub peak_hour: u8,
    pub peak_count: f64,
    pub quiet_hour: u8,
    pub quiet_count: f64,
    /// Always 24 entries, index == hour. Hours without samples are
    /// zero-valued buckets, never omitted.
    pub hourly: Vec<HourBucket>,
}

/// Share of observations per crowd tier, as whole percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrowdDistribution {
    pub empty: u32,
    pub moderate: u32,
    pub busy: u32,
}

/// Cross-weekday rollup of the filtered record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallSummary {
    pub total_entries: usize,
    pub average_crowd_level: f64,
    pub peak_weekday: String,
    pub quiet_weekday: String,
    pub peak_hour: u8,
    pub quiet_hour: u8,
    pub crowd_distribution: CrowdDistribution,
}
