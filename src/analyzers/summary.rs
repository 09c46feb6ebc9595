use crate::analyzers::types::{CrowdDistribution, OverallSummary, WeekdaySummary};
use crate::analyzers::utility::{mean, percentage};
use crate::model::Observation;

/// Hours need at least this many samples across all weekdays before they can
/// be named overall peak or quiet. Per-weekday buckets have no such floor;
/// they are presentation-level, this is analysis-level.
const MIN_HOUR_SAMPLES: usize = 2;

/// Rolls per-weekday summaries and the filtered record set up into an
/// [`OverallSummary`]. Total over its domain: empty input yields zero-valued
/// output, never an error.
pub fn summarize(weekly: &[WeekdaySummary], records: &[Observation]) -> OverallSummary {
    let (peak_weekday, quiet_weekday) = find_weekday_extremes(weekly);
    let (peak_hour, quiet_hour) = find_hour_extremes(records);

    let counts: Vec<f64> = records.iter().map(|r| r.count as f64).collect();

    OverallSummary {
        total_entries: records.len(),
        average_crowd_level: mean(&counts),
        peak_weekday,
        quiet_weekday,
        peak_hour,
        quiet_hour,
        crowd_distribution: crowd_distribution(records),
    }
}

/// Busiest and quietest day by `avg_crowd_level`. Strict comparisons over
/// the Sunday→Saturday scan make ties first-wins.
fn find_weekday_extremes(weekly: &[WeekdaySummary]) -> (String, String) {
    let Some(first) = weekly.first() else {
        return (String::new(), String::new());
    };

    let mut peak = first;
    let mut quiet = first;

    for day in &weekly[1..] {
        if day.avg_crowd_level > peak.avg_crowd_level {
            peak = day;
        }
        if day.avg_crowd_level < quiet.avg_crowd_level {
            quiet = day;
        }
    }

    (peak.weekday.clone(), quiet.weekday.clone())
}

/// Overall peak/quiet hour, recomputed from the raw records across all
/// weekdays rather than from the per-weekday buckets. Hours under the
/// [`MIN_HOUR_SAMPLES`] floor are ignored; the ascending scan makes ties
/// first-wins. Falls back to `(0, 0)` when no hour qualifies.
fn find_hour_extremes(records: &[Observation]) -> (u8, u8) {
    let mut sums = [0u64; 24];
    let mut counts = [0usize; 24];

    for r in records {
        let hour = r.hour as usize;
        if hour < 24 {
            sums[hour] += u64::from(r.count);
            counts[hour] += 1;
        }
    }

    let mut peak_hour = 0u8;
    let mut peak_avg = 0.0f64;
    let mut quiet_hour = 0u8;
    let mut quiet_avg = f64::INFINITY;

    for hour in 0..24 {
        if counts[hour] < MIN_HOUR_SAMPLES {
            continue;
        }

        let avg = sums[hour] as f64 / counts[hour] as f64;
        if avg > peak_avg {
            peak_avg = avg;
            peak_hour = hour as u8;
        }
        if avg < quiet_avg {
            quiet_avg = avg;
            quiet_hour = hour as u8;
        }
    }

    (peak_hour, quiet_hour)
}

/// Classifies every record's `status_code` into empty (1), moderate (2), or
/// busy (≥3) and reports each tier as a rounded percentage of the classified
/// total. Codes outside the tiers (including the zero-fill for unparsable
/// ones) are not classified.
pub fn crowd_distribution(records: &[Observation]) -> CrowdDistribution {
    let mut empty = 0usize;
    let mut moderate = 0usize;
    let mut busy = 0usize;

    for r in records {
        match r.status_code {
            1 => empty += 1,
            2 => moderate += 1,
            code if code >= 3 => busy += 1,
            _ => {}
        }
    }

    let total = empty + moderate + busy;

    CrowdDistribution {
        empty: percentage(empty, total),
        moderate: percentage(moderate, total),
        busy: percentage(busy, total),
    }
}
