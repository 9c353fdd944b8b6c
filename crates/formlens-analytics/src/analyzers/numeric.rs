use super::{AnalysisInput, FieldAnalyzer};
use crate::extraction::parse_number;
use crate::results::{
    FieldAnalyticsResult, NumericAnalytics, NumericBucket, NumericTrendPoint, Percentiles,
};
use crate::stats::{day_key, round2};
use indexmap::IndexMap;

const MAX_BUCKETS: usize = 10;

/// Number fields: summary statistics, nearest-rank percentiles, an
/// equal-width histogram and a per-day trend.
pub struct NumericAnalyzer;

impl NumericAnalyzer {
    pub fn analyze_numbers(&self, input: &AnalysisInput<'_>) -> NumericAnalytics {
        let parsed: Vec<(f64, String)> = input
            .responses
            .iter()
            .filter_map(|r| parse_number(&r.value).map(|v| (v, day_key(&r.submitted_at))))
            .collect();

        let base = input.base(input.responses.len());
        if parsed.is_empty() {
            return NumericAnalytics {
                base,
                min: 0.0,
                max: 0.0,
                average: 0.0,
                median: 0.0,
                standard_deviation: 0.0,
                percentiles: Percentiles::default(),
                distribution: Vec::new(),
                trend: Vec::new(),
            };
        }

        let mut sorted: Vec<f64> = parsed.iter().map(|(v, _)| *v).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len() as f64;
        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        let mean = sorted.iter().sum::<f64>() / n;
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        NumericAnalytics {
            base,
            min: round2(min),
            max: round2(max),
            average: round2(mean),
            median: round2(median(&sorted)),
            standard_deviation: round2(variance.sqrt()),
            percentiles: Percentiles {
                p25: round2(percentile(&sorted, 25.0)),
                p50: round2(percentile(&sorted, 50.0)),
                p75: round2(percentile(&sorted, 75.0)),
                p90: round2(percentile(&sorted, 90.0)),
                p95: round2(percentile(&sorted, 95.0)),
            },
            distribution: distribution(&sorted),
            trend: trend(&parsed),
        }
    }
}

impl FieldAnalyzer for NumericAnalyzer {
    fn analyze(&self, input: &AnalysisInput<'_>) -> FieldAnalyticsResult {
        FieldAnalyticsResult::Numeric(self.analyze_numbers(input))
    }
}

/// Middle element; even lengths take the lower middle, no interpolation.
pub fn median(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    sorted[(sorted.len() - 1) / 2]
}

/// Nearest-rank percentile: index `ceil(p / 100 * n) - 1`, clamped.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (p / 100.0 * sorted.len() as f64).ceil() as i64 - 1;
    let index = rank.clamp(0, sorted.len() as i64 - 1) as usize;
    sorted[index]
}

/// Up to ten equal-width buckets over `[min, max]`. Buckets are half-open
/// except the last, which also includes `max`.
fn distribution(sorted: &[f64]) -> Vec<NumericBucket> {
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let bucket_count = sorted.len().min(MAX_BUCKETS);
    let width = (max - min) / bucket_count as f64;

    if width <= 0.0 {
        return vec![NumericBucket {
            range: format!("{}-{}", round2(min), round2(max)),
            min: round2(min),
            max: round2(max),
            count: sorted.len(),
        }];
    }

    (0..bucket_count)
        .map(|i| {
            let start = min + width * i as f64;
            let last = i == bucket_count - 1;
            let end = if last { max } else { min + width * (i + 1) as f64 };
            let count = sorted
                .iter()
                .filter(|&&v| v >= start && (v < end || (last && v <= end)))
                .count();
            NumericBucket {
                range: format!("{}-{}", round2(start), round2(end)),
                min: round2(start),
                max: round2(end),
                count,
            }
        })
        .collect()
}

fn trend(parsed: &[(f64, String)]) -> Vec<NumericTrendPoint> {
    let mut by_day: IndexMap<&str, (f64, usize)> = IndexMap::new();
    for (value, day) in parsed {
        let slot = by_day.entry(day.as_str()).or_insert((0.0, 0));
        slot.0 += value;
        slot.1 += 1;
    }

    let mut points: Vec<NumericTrendPoint> = by_day
        .into_iter()
        .map(|(day, (sum, count))| NumericTrendPoint {
            date: day.to_string(),
            average: round2(sum / count as f64),
            count,
        })
        .collect();
    points.sort_by(|a, b| a.date.cmp(&b.date));
    points
}
