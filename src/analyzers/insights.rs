use crate::analyzers::types::{OverallSummary, WeekdaySummary};
use crate::analyzers::utility::mean;

/// Hard cap on the number of insight lines, even if future rules add more
/// candidates.
const MAX_INSIGHTS: usize = 5;

/// Turns the overall summary into a short, ordered list of plain-language
/// observations: peak hour, quiet hour, peak weekday, quiet weekday, then
/// either an "often uncrowded" note or a weekend/weekday comparison.
pub fn generate(overall: &OverallSummary, weekly: &[WeekdaySummary]) -> Vec<String> {
    let mut insights = Vec::with_capacity(MAX_INSIGHTS);

    insights.push(format!(
        "The busiest time of day is around {}",
        format_hour(overall.peak_hour)
    ));
    insights.push(format!(
        "The quietest time of day is around {}",
        format_hour(overall.quiet_hour)
    ));
    insights.push(format!(
        "{} is the busiest day of the week",
        overall.peak_weekday
    ));
    insights.push(format!(
        "{} is the quietest day of the week",
        overall.quiet_weekday
    ));

    if overall.crowd_distribution.empty > 50 {
        insights.push("The facility is uncrowded most of the time".to_string());
    } else {
        insights.push(weekend_comparison(weekly));
    }

    insights.truncate(MAX_INSIGHTS);
    insights
}

/// Saturday+Sunday average vs the other five days. Fixed convention; a tie
/// reads as weekdays busier.
fn weekend_comparison(weekly: &[WeekdaySummary]) -> String {
    let (weekend, workdays): (Vec<&WeekdaySummary>, Vec<&WeekdaySummary>) = weekly
        .iter()
        .partition(|day| day.english_day == "Saturday" || day.english_day == "Sunday");

    let weekend_avg = mean(&weekend.iter().map(|d| d.avg_crowd_level).collect::<Vec<_>>());
    let workday_avg = mean(&workdays.iter().map(|d| d.avg_crowd_level).collect::<Vec<_>>());

    if weekend_avg > workday_avg {
        "Weekends tend to be busier than weekdays".to_string()
    } else {
        "Weekdays tend to be busier than weekends".to_string()
    }
}

fn format_hour(hour: u8) -> String {
    format!("{hour:02}:00")
}
