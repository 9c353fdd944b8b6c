use super::{AnalysisInput, FieldAnalyzer};
use crate::extraction::parse_date;
use crate::results::{DateAnalytics, DateCount, FieldAnalyticsResult, NamedCount};
use crate::stats::{bump, day_key, percentage};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use indexmap::IndexMap;

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const SEASONS: [&str; 4] = ["Spring", "Summer", "Fall", "Winter"];

/// Season index into [`SEASONS`] for a zero-based month.
fn season_of(month0: u32) -> usize {
    match month0 {
        2..=4 => 0,
        5..=7 => 1,
        8..=10 => 2,
        _ => 3,
    }
}

/// Date fields. All calendar math is done in UTC.
pub struct DateAnalyzer;

impl DateAnalyzer {
    pub fn analyze_dates(&self, input: &AnalysisInput<'_>) -> DateAnalytics {
        let mut dates: Vec<DateTime<Utc>> = input
            .responses
            .iter()
            .filter_map(|r| parse_date(&r.value))
            .collect();
        dates.sort();

        let base = input.base(input.responses.len());
        let (Some(&earliest_date), Some(&latest_date)) = (dates.first(), dates.last()) else {
            let now = Utc::now();
            return DateAnalytics {
                base,
                earliest_date: now,
                latest_date: now,
                most_common_date: now,
                date_distribution: Vec::new(),
                weekday_distribution: Vec::new(),
                monthly_distribution: Vec::new(),
                seasonal_patterns: Vec::new(),
            };
        };

        let total = dates.len();
        let mut per_day: IndexMap<String, usize> = IndexMap::new();
        let mut weekdays = [0usize; 7];
        let mut months = [0usize; 12];
        let mut seasons = [0usize; 4];
        for date in &dates {
            bump(&mut per_day, day_key(date));
            weekdays[date.weekday().num_days_from_sunday() as usize] += 1;
            months[date.month0() as usize] += 1;
            seasons[season_of(date.month0())] += 1;
        }

        // `per_day` was filled from sorted dates, so a strict `>` keeps the
        // earliest day among equally common ones.
        let mut most_common: Option<(&str, usize)> = None;
        for (day, &count) in &per_day {
            if most_common.map_or(true, |(_, best)| count > best) {
                most_common = Some((day.as_str(), count));
            }
        }
        let most_common_date = most_common
            .and_then(|(day, _)| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
            .and_then(|day| day.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .unwrap_or(earliest_date);

        let mut date_distribution: Vec<DateCount> = per_day
            .into_iter()
            .map(|(date, count)| DateCount { date, count })
            .collect();
        date_distribution.sort_by(|a, b| a.date.cmp(&b.date));

        DateAnalytics {
            base,
            earliest_date,
            latest_date,
            most_common_date,
            date_distribution,
            weekday_distribution: named_counts(&WEEKDAYS, &weekdays, total),
            monthly_distribution: named_counts(&MONTHS, &months, total),
            seasonal_patterns: named_counts(&SEASONS, &seasons, total),
        }
    }
}

impl FieldAnalyzer for DateAnalyzer {
    fn analyze(&self, input: &AnalysisInput<'_>) -> FieldAnalyticsResult {
        FieldAnalyticsResult::Date(self.analyze_dates(input))
    }
}

fn named_counts(names: &[&str], counts: &[usize], total: usize) -> Vec<NamedCount> {
    names
        .iter()
        .zip(counts)
        .map(|(name, &count)| NamedCount {
            name: name.to_string(),
            count,
            percentage: percentage(count, total),
        })
        .collect()
}
