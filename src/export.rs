//! Export and presentation adapters.
//!
//! Converts aggregated structures into what the collaborator layers expect:
//! a JSON bundle for download, a flat CSV re-serialization, and per-weekday
//! chart series for a rendering sink.

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::analyzers::types::{OverallSummary, WeekdaySummary};
use crate::model::Observation;

const EXPORT_FORMAT_VERSION: &str = "2.0";

/// First/last observed timestamp and the inclusive day span between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
    pub days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub export_date: String,
    pub total_records: usize,
    pub version: String,
    pub date_range: DateRange,
}

/// Complete export payload: everything needed to reproduce the dashboard
/// state offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub metadata: ExportMetadata,
    pub overall_stats: OverallSummary,
    pub weekly_stats: Vec<WeekdaySummary>,
    pub raw_data: Vec<Observation>,
}

pub fn build_bundle(
    records: &[Observation],
    overall: &OverallSummary,
    weekly: &[WeekdaySummary],
) -> ExportBundle {
    ExportBundle {
        metadata: ExportMetadata {
            export_date: Utc::now().to_rfc3339(),
            total_records: records.len(),
            version: EXPORT_FORMAT_VERSION.to_string(),
            date_range: date_range(records),
        },
        overall_stats: overall.clone(),
        weekly_stats: weekly.to_vec(),
        raw_data: records.to_vec(),
    }
}

pub fn to_json(bundle: &ExportBundle) -> Result<String> {
    Ok(serde_json::to_string_pretty(bundle)?)
}

/// Re-serializes records as CSV with every field quoted, the shape the
/// download collaborator expects.
pub fn to_csv(records: &[Observation]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(["date", "time", "count", "weekday", "status_label"])?;
    for r in records {
        let count = r.count.to_string();
        writer.write_record([
            r.date.as_str(),
            r.time.as_str(),
            count.as_str(),
            r.weekday.as_str(),
            r.status_label.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing csv writer: {e}"))?;
    Ok(String::from_utf8(bytes)?)
}

/// Span of parseable `datetime` values in the record set.
pub fn date_range(records: &[Observation]) -> DateRange {
    let mut stamps: Vec<_> = records.iter().filter_map(|r| r.parsed_datetime()).collect();

    if stamps.is_empty() {
        return DateRange {
            start: None,
            end: None,
            days: 0,
        };
    }

    stamps.sort();
    let start = stamps[0];
    let end = stamps[stamps.len() - 1];

    DateRange {
        start: Some(start.date().to_string()),
        end: Some(end.date().to_string()),
        days: (end.date() - start.date()).num_days() + 1,
    }
}

/// One plotted point for the rendering sink. The sink only maps values to
/// visuals; everything here is already computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub hour_label: String,
    pub average: f64,
    pub has_data: bool,
}

/// A weekday's bar series plus its reference average line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub weekday: String,
    pub points: Vec<ChartPoint>,
    pub reference_average: f64,
}

/// Chart-ready series for each weekday, 24 ordered points per day.
pub fn chart_series(weekly: &[WeekdaySummary]) -> Vec<ChartSeries> {
    weekly
        .iter()
        .map(|day| ChartSeries {
            weekday: day.weekday.clone(),
            points: day
                .hourly
                .iter()
                .map(|bucket| ChartPoint {
                    hour_label: format!("{:02}:00", bucket.hour),
                    average: bucket.average,
                    has_data: bucket.has_data(),
                })
                .collect(),
            reference_average: day.avg_crowd_level,
        })
        .collect()
}
