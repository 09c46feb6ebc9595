//! Core data types shared across the pipeline.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical weekday keys in display order (Sunday first).
pub const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// One validated row of the source CSV. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub datetime: String,
    pub date: String,
    pub time: String,
    pub hour: u8,
    pub weekday: String,
    pub count: u32,
    pub status_label: String,
    pub status_code: u32,
    pub status_min: u32,
    pub status_max: u32,
    pub raw_text: String,
}

impl Observation {
    /// Parses the record's `datetime` field, trying the timestamp formats
    /// the source data has been observed to carry. Returns `None` when the
    /// field is empty or in none of the known formats.
    pub fn parsed_datetime(&self) -> Option<NaiveDateTime> {
        const FORMATS: [&str; 4] = [
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M",
            "%Y-%m-%dT%H:%M",
        ];

        let raw = self.datetime.trim();
        if raw.is_empty() {
            return None;
        }

        FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    }
}

/// Reporting window selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterPeriod {
    All,
    Week,
    TwoWeeks,
    Month,
    Custom,
}

impl FilterPeriod {
    /// Window width in days for the preset periods.
    pub fn preset_days(self) -> Option<i64> {
        match self {
            FilterPeriod::Week => Some(7),
            FilterPeriod::TwoWeeks => Some(14),
            FilterPeriod::Month => Some(30),
            FilterPeriod::All | FilterPeriod::Custom => None,
        }
    }
}

/// A user-selected reporting window. Custom bounds are only meaningful when
/// `period` is [`FilterPeriod::Custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub period: FilterPeriod,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl FilterSpec {
    pub fn all() -> Self {
        Self {
            period: FilterPeriod::All,
            start_date: None,
            end_date: None,
        }
    }

    pub fn preset(period: FilterPeriod) -> Self {
        Self {
            period,
            start_date: None,
            end_date: None,
        }
    }

    pub fn custom(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            period: FilterPeriod::Custom,
            start_date: Some(start_date),
            end_date: Some(end_date),
        }
    }

    /// Boundary validation for custom ranges. The filter itself stays
    /// permissive; callers reject invalid ranges here before applying it.
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.period != FilterPeriod::Custom {
            return Ok(());
        }

        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if start > end => {
                Err(FilterError::InvertedRange { start, end })
            }
            (Some(_), Some(_)) => Ok(()),
            _ => Err(FilterError::MissingBound),
        }
    }
}

/// Invalid custom date range, rejected at the caller boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("custom period requires both a start and an end date")]
    MissingBound,
    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

/// Full English weekday name for a calendar date, Sunday-indexed to match
/// [`WEEKDAYS`].
pub fn weekday_name(date: NaiveDate) -> &'static str {
    use chrono::Datelike;
    WEEKDAYS[date.weekday().num_days_from_sunday() as usize]
}

/// End-of-day timestamp used for inclusive custom range upper bounds.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).expect("valid time of day");
    date.and_time(last)
}

/// Start-of-day timestamp for range lower bounds.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}
