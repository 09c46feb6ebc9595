use crate::analyzers::types::{HourBucket, WeekdaySummary};
use crate::analyzers::utility::{mean, stddev};
use crate::model::{Observation, WEEKDAYS};

/// Groups records into per-weekday, per-hour aggregates.
///
/// Always returns exactly 7 summaries in Sunday→Saturday order, each with a
/// full 24-bucket hourly profile. Records whose `weekday` is not one of the
/// canonical English names fall into no group.
pub fn aggregate(records: &[Observation]) -> Vec<WeekdaySummary> {
    WEEKDAYS.iter().map(|day| summarize_day(day, records)).collect()
}

fn summarize_day(day: &str, records: &[Observation]) -> WeekdaySummary {
    let day_records: Vec<&Observation> =
        records.iter().filter(|r| r.weekday == day).collect();

    let mut per_hour: [Vec<u32>; 24] = std::array::from_fn(|_| Vec::new());
    for r in &day_records {
        if let Some(bucket) = per_hour.get_mut(r.hour as usize) {
            bucket.push(r.count);
        }
    }

    let hourly: Vec<HourBucket> = per_hour
        .iter()
        .enumerate()
        .map(|(hour, counts)| build_bucket(hour as u8, counts))
        .collect();

    // Day average over raw per-record counts, not over hourly means, so
    // unevenly populated hours carry their true weight.
    let day_counts: Vec<f64> = day_records.iter().map(|r| r.count as f64).collect();
    let avg_crowd_level = mean(&day_counts);

    let (peak_hour, peak_count) = find_peak(&hourly);
    let (quiet_hour, quiet_count) = find_quiet(&hourly);

    WeekdaySummary {
        weekday: day.to_string(),
        english_day: day.to_string(),
        total_entries: day_records.len(),
        avg_crowd_level,
        peak_hour,
        peak_count,
        quiet_hour,
        quiet_count,
        hourly,
    }
}

fn build_bucket(hour: u8, counts: &[u32]) -> HourBucket {
    if counts.is_empty() {
        return HourBucket::empty(hour);
    }

    let values: Vec<f64> = counts.iter().map(|c| *c as f64).collect();
    let average = mean(&values);

    HourBucket {
        hour,
        sample_count: counts.len(),
        average,
        min: counts.iter().copied().min().unwrap_or(0),
        max: counts.iter().copied().max().unwrap_or(0),
        standard_deviation: stddev(&values, average),
    }
}

/// Highest-average populated bucket; strict `>` makes ties first-wins.
/// `(0, 0.0)` when no bucket has samples.
fn find_peak(hourly: &[HourBucket]) -> (u8, f64) {
    let mut peak_hour = 0u8;
    let mut peak_count = 0.0f64;

    for bucket in hourly {
        if bucket.has_data() && bucket.average > peak_count {
            peak_count = bucket.average;
            peak_hour = bucket.hour;
        }
    }

    (peak_hour, peak_count)
}

fn find_quiet(hourly: &[HourBucket]) -> (u8, f64) {
    let mut quiet_hour = 0u8;
    let mut quiet_count = f64::INFINITY;

    for bucket in hourly {
        if bucket.has_data() && bucket.average < quiet_count {
            quiet_count = bucket.average;
            quiet_hour = bucket.hour;
        }
    }

    if quiet_count.is_infinite() {
        quiet_count = 0.0;
    }

    (quiet_hour, quiet_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(weekday: &str, hour: u8, count: u32) -> Observation {
        Observation {
            datetime: String::new(),
            date: "2024-06-04".to_string(),
            time: format!("{hour:02}:00"),
            hour,
            weekday: weekday.to_string(),
            count,
            status_label: String::new(),
            status_code: 2,
            status_min: 11,
            status_max: 30,
            raw_text: String::new(),
        }
    }

    #[test]
    fn test_always_seven_days_sunday_first() {
        let summaries = aggregate(&[]);
        let days: Vec<&str> = summaries.iter().map(|s| s.english_day.as_str()).collect();
        assert_eq!(
            days,
            vec![
                "Sunday",
                "Monday",
                "Tuesday",
                "Wednesday",
                "Thursday",
                "Friday",
                "Saturday"
            ]
        );
    }

    #[test]
    fn test_bucket_statistics() {
        let records = vec![
            obs("Tuesday", 18, 40),
            obs("Tuesday", 18, 44),
            obs("Wednesday", 9, 5),
        ];
        let summaries = aggregate(&records);

        let tuesday = &summaries[2];
        let bucket = &tuesday.hourly[18];
        assert_eq!(bucket.sample_count, 2);
        assert_eq!(bucket.average, 42.0);
        assert_eq!(bucket.min, 40);
        assert_eq!(bucket.max, 44);
        assert_eq!(bucket.standard_deviation, 2.0);

        // Wednesday has a single sample at hour 9, so its own quiet hour is 9.
        let wednesday = &summaries[3];
        assert_eq!(wednesday.quiet_hour, 9);
        assert_eq!(wednesday.quiet_count, 5.0);
    }

    #[test]
    fn test_empty_hours_are_zero_buckets() {
        let summaries = aggregate(&[obs("Monday", 12, 10)]);
        let monday = &summaries[1];

        assert_eq!(monday.hourly.len(), 24);
        let untouched = &monday.hourly[3];
        assert_eq!(untouched.sample_count, 0);
        assert_eq!(untouched.average, 0.0);
        assert_eq!(untouched.min, 0);
        assert_eq!(untouched.max, 0);
        assert_eq!(untouched.standard_deviation, 0.0);
    }

    #[test]
    fn test_day_average_is_over_raw_counts() {
        // Hour 8 has two samples, hour 20 has one. A mean of hourly means
        // would be (15 + 30) / 2 = 22.5; the raw mean is (10+20+30)/3 = 20.
        let records = vec![
            obs("Friday", 8, 10),
            obs("Friday", 8, 20),
            obs("Friday", 20, 30),
        ];
        let friday = &aggregate(&records)[5];
        assert_eq!(friday.avg_crowd_level, 20.0);
    }

    #[test]
    fn test_peak_tie_resolves_to_earliest_hour() {
        let records = vec![obs("Monday", 9, 25), obs("Monday", 17, 25)];
        let monday = &aggregate(&records)[1];
        assert_eq!(monday.peak_hour, 9);
        assert_eq!(monday.peak_count, 25.0);
    }

    #[test]
    fn test_no_samples_peak_and_quiet_fall_back_to_zero() {
        let sunday = &aggregate(&[])[0];
        assert_eq!((sunday.peak_hour, sunday.peak_count), (0, 0.0));
        assert_eq!((sunday.quiet_hour, sunday.quiet_count), (0, 0.0));
    }

    #[test]
    fn test_sample_counts_conserved_for_recognized_weekdays() {
        let records = vec![
            obs("Monday", 8, 1),
            obs("Monday", 9, 2),
            obs("Saturday", 22, 3),
            obs("Holiday", 10, 4), // unrecognized key, grouped nowhere
        ];
        let summaries = aggregate(&records);

        let total: usize = summaries.iter().map(|s| s.total_entries).sum();
        let recognized = records
            .iter()
            .filter(|r| WEEKDAYS.contains(&r.weekday.as_str()))
            .count();
        assert_eq!(total, recognized);
    }

    #[test]
    fn test_deterministic() {
        let records = vec![
            obs("Tuesday", 18, 40),
            obs("Tuesday", 18, 44),
            obs("Wednesday", 9, 5),
        ];
        assert_eq!(aggregate(&records), aggregate(&records));
    }
}
