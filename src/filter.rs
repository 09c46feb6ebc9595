//! Date-window filtering. Pure: never mutates its input.

use chrono::{Duration, Local, NaiveDateTime};
use tracing::debug;

use crate::model::{FilterPeriod, FilterSpec, Observation, end_of_day, start_of_day};

/// Applies `spec` against the current wall clock.
pub fn apply(records: &[Observation], spec: &FilterSpec) -> Vec<Observation> {
    apply_at(records, spec, Local::now().naive_local())
}

/// Applies `spec` with an explicit "now", which preset windows hang off.
///
/// Records whose `datetime` cannot be parsed are always kept; older data
/// predates the timestamp column. A custom spec missing either bound is a
/// passthrough, not an error — callers validate bounds via
/// [`FilterSpec::validate`] before getting here.
pub fn apply_at(
    records: &[Observation],
    spec: &FilterSpec,
    now: NaiveDateTime,
) -> Vec<Observation> {
    let window = match spec.period {
        FilterPeriod::All => None,
        FilterPeriod::Custom => match (spec.start_date, spec.end_date) {
            (Some(start), Some(end)) => Some((start_of_day(start), end_of_day(end))),
            _ => None,
        },
        FilterPeriod::Week => Some(preset_window(now, 7)),
        FilterPeriod::TwoWeeks => Some(preset_window(now, 14)),
        FilterPeriod::Month => Some(preset_window(now, 30)),
    };

    let Some((start, end)) = window else {
        return records.to_vec();
    };

    let kept: Vec<Observation> = records
        .iter()
        .filter(|r| match r.parsed_datetime() {
            Some(dt) => start <= dt && dt <= end,
            None => true,
        })
        .cloned()
        .collect();

    debug!(
        total = records.len(),
        kept = kept.len(),
        %start,
        %end,
        "Filter applied"
    );

    kept
}

/// `[start of day (now − days), now]`, inclusive on both ends.
fn preset_window(now: NaiveDateTime, days: i64) -> (NaiveDateTime, NaiveDateTime) {
    (start_of_day(now.date() - Duration::days(days)), now)
}
