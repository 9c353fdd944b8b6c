use super::{AnalysisInput, FieldAnalyzer};
use crate::extraction::value_to_text;
use crate::results::{
    FieldAnalyticsResult, LengthBucket, PhraseFrequency, RecentResponse, TextAnalytics,
    WordFrequency,
};
use crate::stats::{bump, rank_desc, round2};
use formlens_core::AnalyticsConfig;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));

/// Inclusive character-length ranges; `None` is open-ended.
const LENGTH_BUCKETS: [(&str, usize, Option<usize>); 6] = [
    ("0-10", 0, Some(10)),
    ("11-25", 11, Some(25)),
    ("26-50", 26, Some(50)),
    ("51-100", 51, Some(100)),
    ("101-200", 101, Some(200)),
    ("200+", 201, None),
];

const MIN_WORD_CHARS: usize = 3;
const MIN_PHRASE_CHARS: usize = 6;

#[derive(Debug, Clone)]
pub struct TextOptions {
    pub top_words: usize,
    pub top_phrases: usize,
    pub recent_responses: usize,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            top_words: 50,
            top_phrases: 20,
            recent_responses: 10,
        }
    }
}

impl From<&AnalyticsConfig> for TextOptions {
    fn from(config: &AnalyticsConfig) -> Self {
        Self {
            top_words: config.text_top_words,
            top_phrases: config.text_top_phrases,
            recent_responses: config.text_recent_responses,
        }
    }
}

/// Short and long free-text answers.
pub struct TextAnalyzer {
    options: TextOptions,
}

impl TextAnalyzer {
    pub fn new(options: TextOptions) -> Self {
        Self { options }
    }

    pub fn analyze_text(&self, input: &AnalysisInput<'_>) -> TextAnalytics {
        let texts: Vec<String> = input
            .responses
            .iter()
            .map(|r| value_to_text(&r.value))
            .collect();
        let lengths: Vec<usize> = texts.iter().map(|t| t.chars().count()).collect();

        let average_length = if lengths.is_empty() {
            0.0
        } else {
            round2(lengths.iter().sum::<usize>() as f64 / lengths.len() as f64)
        };

        let mut words: IndexMap<String, usize> = IndexMap::new();
        let mut phrases: IndexMap<String, usize> = IndexMap::new();
        for text in &texts {
            let lowered = text.to_lowercase();
            let cleaned = NON_WORD.replace_all(&lowered, "");
            let kept: Vec<&str> = cleaned
                .split_whitespace()
                .filter(|w| w.chars().count() >= MIN_WORD_CHARS)
                .collect();

            for word in &kept {
                bump(&mut words, word.to_string());
            }
            for pair in kept.windows(2) {
                let phrase = format!("{} {}", pair[0], pair[1]);
                if phrase.chars().count() >= MIN_PHRASE_CHARS {
                    bump(&mut phrases, phrase);
                }
            }
        }

        let mut ranked_words = rank_desc(words);
        ranked_words.truncate(self.options.top_words);
        let max_count = ranked_words.first().map(|(_, c)| *c).unwrap_or(0);
        let word_frequency = ranked_words
            .into_iter()
            .map(|(word, count)| WordFrequency {
                word,
                count,
                weight: count as f64 / max_count as f64,
            })
            .collect();

        let mut ranked_phrases = rank_desc(phrases);
        ranked_phrases.truncate(self.options.top_phrases);
        let common_phrases = ranked_phrases
            .into_iter()
            .map(|(phrase, count)| PhraseFrequency { phrase, count })
            .collect();

        let length_distribution = if lengths.is_empty() {
            Vec::new()
        } else {
            LENGTH_BUCKETS
                .iter()
                .map(|(range, low, high)| LengthBucket {
                    range: range.to_string(),
                    count: lengths
                        .iter()
                        .filter(|&&len| len >= *low && high.map_or(true, |h| len <= h))
                        .count(),
                })
                .collect()
        };

        let recent_responses = input
            .responses
            .iter()
            .zip(texts.iter())
            .take(self.options.recent_responses)
            .map(|(response, text)| RecentResponse {
                value: text.clone(),
                submitted_at: response.submitted_at,
                response_id: response.response_id.clone(),
            })
            .collect();

        TextAnalytics {
            base: input.base(input.responses.len()),
            average_length,
            min_length: lengths.iter().copied().min().unwrap_or(0),
            max_length: lengths.iter().copied().max().unwrap_or(0),
            word_frequency,
            common_phrases,
            length_distribution,
            recent_responses,
        }
    }
}

impl Default for TextAnalyzer {
    fn default() -> Self {
        Self::new(TextOptions::default())
    }
}

impl FieldAnalyzer for TextAnalyzer {
    fn analyze(&self, input: &AnalysisInput<'_>) -> FieldAnalyticsResult {
        FieldAnalyticsResult::Text(self.analyze_text(input))
    }
}
