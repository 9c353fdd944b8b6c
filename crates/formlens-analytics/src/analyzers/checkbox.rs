use super::{AnalysisInput, FieldAnalyzer, CORRELATION_LIFT_THRESHOLD};
use crate::extraction::value_to_text;
use crate::results::{
    CheckboxAnalytics, CombinationCount, FieldAnalyticsResult, OptionCorrelation, OptionCount,
    SelectionCountBucket,
};
use crate::stats::{bump, percentage, rank_desc, round2};
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use std::collections::BTreeMap;

const TOP_COMBINATIONS: usize = 20;
const TOP_CORRELATIONS: usize = 10;

/// Multi-select fields.
pub struct CheckboxAnalyzer;

impl CheckboxAnalyzer {
    pub fn analyze_checkbox(&self, input: &AnalysisInput<'_>) -> CheckboxAnalytics {
        let selections: Vec<IndexSet<String>> = input
            .responses
            .iter()
            .map(|r| parse_selections(&r.value))
            .filter(|s| !s.is_empty())
            .collect();
        let total = selections.len();

        let mut option_counts: IndexMap<String, usize> = IndexMap::new();
        let mut combination_counts: IndexMap<Vec<String>, usize> = IndexMap::new();
        let mut size_counts: BTreeMap<usize, usize> = BTreeMap::new();
        for selected in &selections {
            for option in selected {
                bump(&mut option_counts, option.clone());
            }
            let mut combination: Vec<String> = selected.iter().cloned().collect();
            combination.sort();
            bump(&mut combination_counts, combination);
            *size_counts.entry(selected.len()).or_insert(0) += 1;
        }

        let ranked_options = rank_desc(option_counts);
        let correlations = correlations(&ranked_options, &selections);

        let individual_options = ranked_options
            .into_iter()
            .map(|(option, count)| OptionCount {
                percentage: percentage(count, total),
                option,
                count,
            })
            .collect();

        let combinations = rank_desc(combination_counts)
            .into_iter()
            .take(TOP_COMBINATIONS)
            .map(|(combination, count)| CombinationCount {
                combination,
                count,
                percentage: percentage(count, total),
            })
            .collect();

        let total_selected: usize = selections.iter().map(|s| s.len()).sum();
        let average_selections = if total == 0 {
            0.0
        } else {
            round2(total_selected as f64 / total as f64)
        };

        let selection_distribution = size_counts
            .into_iter()
            .map(|(selection_count, response_count)| SelectionCountBucket {
                selection_count,
                response_count,
                percentage: percentage(response_count, total),
            })
            .collect();

        CheckboxAnalytics {
            base: input.base(total),
            individual_options,
            combinations,
            average_selections,
            selection_distribution,
            correlations,
        }
    }
}

impl FieldAnalyzer for CheckboxAnalyzer {
    fn analyze(&self, input: &AnalysisInput<'_>) -> FieldAnalyticsResult {
        FieldAnalyticsResult::Checkbox(self.analyze_checkbox(input))
    }
}

/// The options picked in one response, trimmed, blanks dropped, duplicates
/// collapsed in first-seen order.
///
/// Arrays are taken element-wise. Strings holding a JSON array are decoded,
/// any other string is split on commas.
pub fn parse_selections(value: &Value) -> IndexSet<String> {
    let raw: Vec<String> = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().map(value_to_text).collect(),
        Value::String(s) => match serde_json::from_str::<Vec<Value>>(s.trim()) {
            Ok(items) => items.iter().map(value_to_text).collect(),
            Err(_) => s.split(',').map(str::to_string).collect(),
        },
        other => vec![value_to_text(other)],
    };

    raw.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Option pairs whose co-occurrence beats independence by more than the lift
/// threshold. `expected = count(a) * count(b) / responses`.
fn correlations(
    ranked_options: &[(String, usize)],
    selections: &[IndexSet<String>],
) -> Vec<OptionCorrelation> {
    let total = selections.len();
    let mut found = Vec::new();

    for (i, (option_a, count_a)) in ranked_options.iter().enumerate() {
        for (option_b, count_b) in &ranked_options[i + 1..] {
            let co_occurrences = selections
                .iter()
                .filter(|s| s.contains(option_a) && s.contains(option_b))
                .count();
            let expected = (*count_a * *count_b) as f64 / total as f64;
            let lift = if expected > 0.0 {
                co_occurrences as f64 / expected
            } else {
                0.0
            };

            if lift > CORRELATION_LIFT_THRESHOLD {
                found.push((
                    lift,
                    OptionCorrelation {
                        option_a: option_a.clone(),
                        option_b: option_b.clone(),
                        co_occurrences,
                        correlation: round2(lift),
                    },
                ));
            }
        }
    }

    found.sort_by(|a, b| b.0.total_cmp(&a.0));
    found
        .into_iter()
        .take(TOP_CORRELATIONS)
        .map(|(_, correlation)| correlation)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::responses;
    use formlens_core::FieldType;
    use serde_json::json;

    fn run(values: Vec<Value>) -> CheckboxAnalytics {
        let responses = responses(values);
        let field_type = FieldType::Checkbox;
        CheckboxAnalyzer.analyze_checkbox(&AnalysisInput {
            responses: &responses,
            field_id: "toppings",
            field_type: &field_type,
            field_label: "Toppings",
            total_form_responses: responses.len(),
        })
    }

    #[test]
    fn test_options_and_combinations() {
        let result = run(vec![json!(["X", "Y"]), json!(["Y", "X"]), json!(["X"])]);

        let options: Vec<(&str, usize)> = result
            .individual_options
            .iter()
            .map(|o| (o.option.as_str(), o.count))
            .collect();
        assert_eq!(options, vec![("X", 3), ("Y", 2)]);
        assert_eq!(result.individual_options[0].percentage, 100.0);

        assert_eq!(result.combinations.len(), 2);
        assert_eq!(result.combinations[0].combination, vec!["X", "Y"]);
        assert_eq!(result.combinations[0].count, 2);
        assert_eq!(result.combinations[1].combination, vec!["X"]);
        assert_eq!(result.combinations[1].count, 1);

        assert_eq!(result.average_selections, 1.67);
        // X appears everywhere, so the pair's lift is exactly 1
        assert!(result.correlations.is_empty());
    }

    #[test]
    fn test_selection_distribution_sums_to_total() {
        let result = run(vec![
            json!("a, b, c"),
            json!("a"),
            json!(["b", "c"]),
            json!("c,"),
            json!(""),
        ]);

        assert_eq!(result.base.total_responses, 4);
        let buckets: Vec<(usize, usize)> = result
            .selection_distribution
            .iter()
            .map(|b| (b.selection_count, b.response_count))
            .collect();
        assert_eq!(buckets, vec![(1, 2), (2, 1), (3, 1)]);
        assert_eq!(
            result
                .selection_distribution
                .iter()
                .map(|b| b.response_count)
                .sum::<usize>(),
            result.base.total_responses
        );
    }

    #[test]
    fn test_parse_selections() {
        let parsed = parse_selections(&json!(" red , blue,,red "));
        assert_eq!(parsed.into_iter().collect::<Vec<_>>(), vec!["red", "blue"]);

        let encoded = parse_selections(&json!(r#"["one, two", "three"]"#));
        assert_eq!(
            encoded.into_iter().collect::<Vec<_>>(),
            vec!["one, two", "three"]
        );

        assert!(parse_selections(&json!([" ", ""])).is_empty());
        assert_eq!(parse_selections(&json!(5)).len(), 1);
    }

    #[test]
    fn test_correlations_use_lift_threshold() {
        // A and B always together, C and D always together
        let result = run(vec![
            json!(["A", "B"]),
            json!(["A", "B"]),
            json!(["C", "D"]),
            json!(["C", "D"]),
        ]);

        assert_eq!(result.correlations.len(), 2);
        let first = &result.correlations[0];
        assert_eq!((first.option_a.as_str(), first.option_b.as_str()), ("A", "B"));
        assert_eq!(first.co_occurrences, 2);
        // expected = 2 * 2 / 4 = 1, observed = 2
        assert_eq!(first.correlation, 2.0);
    }

    #[test]
    fn test_empty_input() {
        let result = run(vec![]);
        assert_eq!(result.base.total_responses, 0);
        assert_eq!(result.average_selections, 0.0);
        assert!(result.individual_options.is_empty());
        assert!(result.combinations.is_empty());
        assert!(result.selection_distribution.is_empty());
        assert!(result.correlations.is_empty());
    }
}
