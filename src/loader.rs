//! CSV record loading: fetch, parse, validate, coerce, cache.
//!
//! The loader owns the only mutable state in the pipeline: a TTL-bounded
//! cache of the last successful parse. Everything downstream is pure.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::fetch::DataSource;
use crate::model::{Observation, weekday_name};

/// Columns that must be present in the header row. Rows may still leave
/// individual values blank; that is handled per row.
const REQUIRED_COLUMNS: [&str; 6] = ["datetime", "date", "time", "hour", "weekday", "count"];

/// Counts above this are treated as sensor glitches and dropped.
const MAX_PLAUSIBLE_COUNT: u32 = 1000;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid source URL: {0}")]
    InvalidUrl(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("response body was empty")]
    EmptyBody,
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("no data found")]
    NoData,
}

/// Loader configuration, injected at construction.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub cache_ttl: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(5 * 60),
        }
    }
}

struct CacheEntry {
    records: Arc<Vec<Observation>>,
    loaded_at: Instant,
}

/// Fetches and caches occupancy observations from a [`DataSource`].
///
/// A `load` with `force_reload = false` inside the freshness window returns
/// the cached records without touching the source. The cache lock is held
/// across the fetch, so concurrent `load` calls coalesce onto a single
/// request instead of racing it.
pub struct RecordLoader {
    source: Box<dyn DataSource>,
    config: LoaderConfig,
    cache: Mutex<Option<CacheEntry>>,
}

impl RecordLoader {
    pub fn new(source: Box<dyn DataSource>, config: LoaderConfig) -> Self {
        Self {
            source,
            config,
            cache: Mutex::new(None),
        }
    }

    pub async fn load(&self, force_reload: bool) -> Result<Arc<Vec<Observation>>, LoadError> {
        let mut cache = self.cache.lock().await;

        if !force_reload {
            if let Some(entry) = cache.as_ref() {
                if entry.loaded_at.elapsed() < self.config.cache_ttl {
                    debug!(records = entry.records.len(), "Using cached records");
                    return Ok(Arc::clone(&entry.records));
                }
            }
        }

        let text = self.source.fetch().await?;
        let records = Arc::new(parse_records(&text)?);

        info!(
            origin = self.source.origin(),
            records = records.len(),
            "CSV load complete"
        );

        *cache = Some(CacheEntry {
            records: Arc::clone(&records),
            loaded_at: Instant::now(),
        });

        Ok(records)
    }

    /// Records from the last successful load, if any, regardless of age.
    pub async fn cached(&self) -> Option<Arc<Vec<Observation>>> {
        let cache = self.cache.lock().await;
        cache.as_ref().map(|entry| Arc::clone(&entry.records))
    }

    pub async fn clear_cache(&self) {
        let mut cache = self.cache.lock().await;
        *cache = None;
        debug!("Cache cleared");
    }
}

/// One raw CSV row before validation. Every field arrives as text.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    datetime: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    hour: Option<String>,
    #[serde(default)]
    weekday: Option<String>,
    #[serde(default)]
    count: Option<String>,
    #[serde(default)]
    status_label: Option<String>,
    #[serde(default)]
    status_code: Option<String>,
    #[serde(default)]
    status_min: Option<String>,
    #[serde(default)]
    status_max: Option<String>,
    #[serde(default)]
    raw_text: Option<String>,
}

/// Parses CSV text into validated observations.
///
/// Individual malformed rows are dropped; the parse as a whole fails only on
/// an empty body, missing required columns, or zero surviving rows.
pub fn parse_records(text: &str) -> Result<Vec<Observation>, LoadError> {
    if text.trim().is_empty() {
        return Err(LoadError::EmptyBody);
    }

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = rdr.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns(missing));
    }

    let mut records = Vec::new();
    let mut total = 0usize;

    for row in rdr.deserialize::<RawRecord>() {
        total += 1;
        match row {
            Ok(raw) => {
                if let Some(obs) = coerce_row(raw) {
                    records.push(obs);
                }
            }
            Err(e) => debug!(row = total, error = %e, "Unreadable CSV row skipped"),
        }
    }

    let dropped = total - records.len();
    if dropped > 0 {
        warn!(dropped, total, "Rows failed validation");
    }

    if records.is_empty() {
        return Err(LoadError::NoData);
    }

    Ok(records)
}

/// Validates one raw row and coerces its fields into an [`Observation`].
///
/// Dropping rules: `date` must be a real `YYYY-MM-DD` calendar date, `time`
/// a real `H:MM`/`HH:MM` time, and `count` a plausible non-negative integer.
/// `hour` falls back to the hour of `time` when the column is unusable;
/// `weekday` falls back to the weekday of `date`; the `status_*` numerics
/// zero-fill when unparsable.
fn coerce_row(raw: RawRecord) -> Option<Observation> {
    let date = raw.date.filter(|d| !d.is_empty())?;
    let calendar_date = parse_date(&date)?;

    let time = raw.time.filter(|t| !t.is_empty())?;
    let time_of_day = parse_time(&time)?;

    let count: u32 = raw.count.as_deref()?.parse().ok()?;
    if count > MAX_PLAUSIBLE_COUNT {
        return None;
    }

    let hour = raw
        .hour
        .as_deref()
        .and_then(|h| h.parse::<u8>().ok())
        .filter(|h| *h < 24)
        .unwrap_or_else(|| time_of_day.hour() as u8);

    let weekday = raw
        .weekday
        .filter(|w| !w.is_empty())
        .unwrap_or_else(|| weekday_name(calendar_date).to_string());

    Some(Observation {
        datetime: raw.datetime.unwrap_or_default(),
        date,
        time,
        hour,
        weekday,
        count,
        status_label: raw.status_label.unwrap_or_default(),
        status_code: parse_or_zero(raw.status_code),
        status_min: parse_or_zero(raw.status_min),
        status_max: parse_or_zero(raw.status_max),
        raw_text: raw.raw_text.unwrap_or_default(),
    })
}

fn parse_or_zero(value: Option<String>) -> u32 {
    value.as_deref().and_then(|v| v.parse().ok()).unwrap_or(0)
}

/// Strict `YYYY-MM-DD`: correct shape and a real calendar date, so
/// `2024-13-40` is rejected even though it matches the digit pattern.
fn parse_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// `H:MM` or `HH:MM`, and a real time of day.
fn parse_time(s: &str) -> Option<NaiveTime> {
    if !(4..=5).contains(&s.len()) {
        return None;
    }
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::DataSource;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const HEADER: &str =
        "datetime,date,time,hour,weekday,count,status_label,status_code,status_min,status_max,raw_text";

    fn csv_with_rows(rows: &[&str]) -> String {
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    /// Serves a fixed payload, counting fetches through a shared counter so
    /// tests can observe cache behavior after the source moves into the
    /// loader. `fail_after` turns later fetches into errors; `delay` makes
    /// concurrent loads overlap.
    struct StubSource {
        text: String,
        hits: Arc<AtomicUsize>,
        fail_after: Option<usize>,
        delay: Option<Duration>,
    }

    impl StubSource {
        fn new(text: impl Into<String>) -> (Self, Arc<AtomicUsize>) {
            let hits = Arc::new(AtomicUsize::new(0));
            let source = Self {
                text: text.into(),
                hits: Arc::clone(&hits),
                fail_after: None,
                delay: None,
            };
            (source, hits)
        }

        fn failing_after(mut self, fetches: usize) -> Self {
            self.fail_after = Some(fetches);
            self
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    #[async_trait]
    impl DataSource for StubSource {
        async fn fetch(&self) -> Result<String, LoadError> {
            let n = self.hits.fetch_add(1, Ordering::SeqCst);
            if let Some(limit) = self.fail_after {
                if n >= limit {
                    return Err(LoadError::EmptyBody);
                }
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.text.clone())
        }

        fn origin(&self) -> &str {
            "stub"
        }
    }

    fn valid_row() -> &'static str {
        "2024-06-03 18:00:00,2024-06-03,18:00,18,Monday,42,busy,3,31,45,Crowded: 31-45 people"
    }

    #[test]
    fn test_parse_valid_row() {
        let records = parse_records(&csv_with_rows(&[valid_row()])).unwrap();
        assert_eq!(records.len(), 1);

        let obs = &records[0];
        assert_eq!(obs.date, "2024-06-03");
        assert_eq!(obs.hour, 18);
        assert_eq!(obs.weekday, "Monday");
        assert_eq!(obs.count, 42);
        assert_eq!(obs.status_code, 3);
    }

    #[test]
    fn test_parse_quoted_fields_with_commas_and_escapes() {
        let row = r#"2024-06-03 18:00:00,2024-06-03,18:00,18,Monday,42,"busy, very",3,31,45,"she said ""full"" today""#;
        let records = parse_records(&csv_with_rows(&[row])).unwrap();

        assert_eq!(records[0].status_label, "busy, very");
        assert_eq!(records[0].raw_text, r#"she said "full" today"#);
    }

    #[test]
    fn test_invalid_calendar_date_dropped() {
        // Shape matches \d{4}-\d{2}-\d{2} but the date does not exist.
        let bad = "2024-13-40 09:00:00,2024-13-40,09:00,9,Monday,5,quiet,1,0,10,";
        let records = parse_records(&csv_with_rows(&[valid_row(), bad])).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_only_invalid_rows_is_no_data() {
        let bad = "2024-13-40 09:00:00,2024-13-40,09:00,9,Monday,5,quiet,1,0,10,";
        let err = parse_records(&csv_with_rows(&[bad])).unwrap_err();
        assert!(matches!(err, LoadError::NoData));
    }

    #[test]
    fn test_bad_time_and_missing_count_dropped() {
        let bad_time = "2024-06-03 09:00:00,2024-06-03,9am,9,Monday,5,quiet,1,0,10,";
        let no_count = "2024-06-03 09:00:00,2024-06-03,09:00,9,Monday,,quiet,1,0,10,";
        let records =
            parse_records(&csv_with_rows(&[valid_row(), bad_time, no_count])).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_hour_derived_from_time_when_unparsable() {
        let row = "2024-06-03 07:30:00,2024-06-03,7:30,not-a-number,Monday,12,quiet,1,0,10,";
        let records = parse_records(&csv_with_rows(&[row])).unwrap();
        assert_eq!(records[0].hour, 7);
    }

    #[test]
    fn test_weekday_derived_from_date_when_blank() {
        // 2024-06-03 is a Monday.
        let row = "2024-06-03 18:00:00,2024-06-03,18:00,18,,42,busy,3,31,45,";
        let records = parse_records(&csv_with_rows(&[row])).unwrap();
        assert_eq!(records[0].weekday, "Monday");
    }

    #[test]
    fn test_status_fields_zero_fill() {
        let row = "2024-06-03 18:00:00,2024-06-03,18:00,18,Monday,42,busy,n/a,,x,";
        let records = parse_records(&csv_with_rows(&[row])).unwrap();
        assert_eq!(records[0].status_code, 0);
        assert_eq!(records[0].status_min, 0);
        assert_eq!(records[0].status_max, 0);
    }

    #[test]
    fn test_implausible_count_dropped() {
        let row = "2024-06-03 18:00:00,2024-06-03,18:00,18,Monday,5000,busy,3,31,45,";
        let err = parse_records(&csv_with_rows(&[row])).unwrap_err();
        assert!(matches!(err, LoadError::NoData));
    }

    #[test]
    fn test_empty_body() {
        assert!(matches!(parse_records("  \n "), Err(LoadError::EmptyBody)));
    }

    #[test]
    fn test_missing_required_columns() {
        let err = parse_records("date,time\n2024-06-03,18:00").unwrap_err();
        match err {
            LoadError::MissingColumns(cols) => {
                assert!(cols.contains(&"count".to_string()));
                assert!(cols.contains(&"weekday".to_string()));
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_uses_cache_within_ttl() {
        let (source, hits) = StubSource::new(csv_with_rows(&[valid_row()]));
        let loader = RecordLoader::new(Box::new(source), LoaderConfig::default());

        let first = loader.load(false).await.unwrap();
        let second = loader.load(false).await.unwrap();

        assert_eq!(first.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_force_reload_refetches() {
        let (source, hits) = StubSource::new(csv_with_rows(&[valid_row()]));
        let loader = RecordLoader::new(Box::new(source), LoaderConfig::default());

        loader.load(false).await.unwrap();
        loader.load(true).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_ttl_refetches() {
        let (source, hits) = StubSource::new(csv_with_rows(&[valid_row()]));
        let loader = RecordLoader::new(
            Box::new(source),
            LoaderConfig {
                cache_ttl: Duration::ZERO,
            },
        );

        let first = loader.load(false).await.unwrap();
        let second = loader.load(false).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clear_cache_resets() {
        let (source, hits) = StubSource::new(csv_with_rows(&[valid_row()]));
        let loader = RecordLoader::new(Box::new(source), LoaderConfig::default());

        loader.load(false).await.unwrap();
        assert!(loader.cached().await.is_some());

        loader.clear_cache().await;
        assert!(loader.cached().await.is_none());

        loader.load(false).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_cache() {
        let (source, _hits) = StubSource::new(csv_with_rows(&[valid_row()]));
        let loader = RecordLoader::new(Box::new(source.failing_after(1)), LoaderConfig::default());

        let first = loader.load(false).await.unwrap();
        let err = loader.load(true).await;

        assert!(err.is_err());
        let cached = loader.cached().await.unwrap();
        assert!(Arc::ptr_eq(&first, &cached));
    }

    #[tokio::test]
    async fn test_concurrent_loads_coalesce() {
        let (source, hits) = StubSource::new(csv_with_rows(&[valid_row()]));
        let loader = RecordLoader::new(
            Box::new(source.delayed(Duration::from_millis(50))),
            LoaderConfig::default(),
        );

        let (a, b) = tokio::join!(loader.load(false), loader.load(false));
        let a = a.unwrap();
        let b = b.unwrap();

        // The second call waited on the first and reused its result.
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
