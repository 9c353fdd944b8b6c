use super::{AnalysisInput, FieldAnalyzer, CONCENTRATED_SHARE_PCT, EVEN_SHARE_FACTOR};
use crate::extraction::value_to_text;
use crate::results::{
    DistributionShape, FieldAnalyticsResult, OptionCount, SelectionAnalytics, SelectionTrendPoint,
};
use crate::stats::{bump, day_key, percentage, rank_desc};
use indexmap::IndexMap;

/// Single-choice fields (select, radio).
pub struct SelectionAnalyzer;

impl SelectionAnalyzer {
    pub fn analyze_selection(&self, input: &AnalysisInput<'_>) -> SelectionAnalytics {
        let mut counts: IndexMap<String, usize> = IndexMap::new();
        let mut by_day: IndexMap<String, IndexMap<String, usize>> = IndexMap::new();

        for response in input.responses {
            let option = value_to_text(&response.value).trim().to_string();
            if option.is_empty() {
                continue;
            }
            bump(
                by_day.entry(day_key(&response.submitted_at)).or_default(),
                option.clone(),
            );
            bump(&mut counts, option);
        }

        let distinct = counts.len();
        // option shares are over the answers that named an option
        let total: usize = counts.values().sum();
        let options: Vec<OptionCount> = rank_desc(counts)
            .into_iter()
            .map(|(option, count)| OptionCount {
                percentage: percentage(count, total),
                option,
                count,
            })
            .collect();

        let (top_option, top_count) = options
            .first()
            .map(|o| (o.option.clone(), o.count))
            .unwrap_or_default();
        let top_share = if total == 0 {
            0.0
        } else {
            top_count as f64 / total as f64 * 100.0
        };

        let mut trend: Vec<SelectionTrendPoint> = by_day
            .into_iter()
            .map(|(date, options)| SelectionTrendPoint { date, options })
            .collect();
        trend.sort_by(|a, b| a.date.cmp(&b.date));

        SelectionAnalytics {
            base: input.base(input.responses.len()),
            options,
            top_option,
            response_distribution: classify_distribution(top_share, distinct),
            trend,
        }
    }
}

impl FieldAnalyzer for SelectionAnalyzer {
    fn analyze(&self, input: &AnalysisInput<'_>) -> FieldAnalyticsResult {
        FieldAnalyticsResult::Selection(self.analyze_selection(input))
    }
}

/// Heuristic spread classifier.
///
/// Concentrated when one option is all there is or takes more than 70 %;
/// even when the top share is under 1.5x the uniform share; polarized otherwise.
pub fn classify_distribution(top_share_pct: f64, distinct_options: usize) -> DistributionShape {
    if distinct_options == 0 {
        return DistributionShape::Even;
    }
    if distinct_options == 1 || top_share_pct > CONCENTRATED_SHARE_PCT {
        return DistributionShape::Concentrated;
    }
    let uniform_share = 100.0 / distinct_options as f64;
    if top_share_pct < EVEN_SHARE_FACTOR * uniform_share {
        DistributionShape::Even
    } else {
        DistributionShape::Polarized
    }
}
