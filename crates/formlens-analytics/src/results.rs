use chrono::{DateTime, Utc};
use formlens_core::{FieldType, FormId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Fields shared by every analytics variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAnalyticsBase {
    pub field_id: String,
    pub field_type: FieldType,
    pub field_label: String,
    /// Non-empty answers to this field
    pub total_responses: usize,
    /// Share of all form responses that answered this field, in percent
    pub response_rate: f64,
    /// When this result was computed
    pub last_updated: DateTime<Utc>,
}

/// Aggregate for one field, one variant per analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "analyzer", rename_all = "camelCase")]
pub enum FieldAnalyticsResult {
    Text(TextAnalytics),
    Numeric(NumericAnalytics),
    Selection(SelectionAnalytics),
    Checkbox(CheckboxAnalytics),
    Date(DateAnalytics),
    Email(EmailAnalytics),
}

impl FieldAnalyticsResult {
    pub fn base(&self) -> &FieldAnalyticsBase {
        match self {
            FieldAnalyticsResult::Text(r) => &r.base,
            FieldAnalyticsResult::Numeric(r) => &r.base,
            FieldAnalyticsResult::Selection(r) => &r.base,
            FieldAnalyticsResult::Checkbox(r) => &r.base,
            FieldAnalyticsResult::Date(r) => &r.base,
            FieldAnalyticsResult::Email(r) => &r.base,
        }
    }

    pub fn field_id(&self) -> &str {
        &self.base().field_id
    }

    pub fn total_responses(&self) -> usize {
        self.base().total_responses
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.base().last_updated
    }
}

/// Whole-form report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormAnalyticsReport {
    pub form_id: FormId,
    pub total_responses: usize,
    pub fields: Vec<FieldAnalyticsResult>,
}

impl FormAnalyticsReport {
    pub fn empty(form_id: impl Into<FormId>) -> Self {
        Self {
            form_id: form_id.into(),
            total_responses: 0,
            fields: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------- text

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnalytics {
    #[serde(flatten)]
    pub base: FieldAnalyticsBase,
    pub average_length: f64,
    pub min_length: usize,
    pub max_length: usize,
    pub word_frequency: Vec<WordFrequency>,
    pub common_phrases: Vec<PhraseFrequency>,
    pub length_distribution: Vec<LengthBucket>,
    pub recent_responses: Vec<RecentResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordFrequency {
    pub word: String,
    pub count: usize,
    /// `count / highest count`
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseFrequency {
    pub phrase: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LengthBucket {
    pub range: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentResponse {
    pub value: String,
    pub submitted_at: DateTime<Utc>,
    pub response_id: String,
}

// ---------------------------------------------------------------- numeric

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericAnalytics {
    #[serde(flatten)]
    pub base: FieldAnalyticsBase,
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub median: f64,
    pub standard_deviation: f64,
    pub percentiles: Percentiles,
    pub distribution: Vec<NumericBucket>,
    pub trend: Vec<NumericTrendPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericBucket {
    pub range: String,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericTrendPoint {
    pub date: String,
    pub average: f64,
    pub count: usize,
}

// ---------------------------------------------------------------- selection

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionAnalytics {
    #[serde(flatten)]
    pub base: FieldAnalyticsBase,
    pub options: Vec<OptionCount>,
    pub top_option: String,
    pub response_distribution: DistributionShape,
    pub trend: Vec<SelectionTrendPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionCount {
    pub option: String,
    pub count: usize,
    pub percentage: f64,
}

/// How answers spread across the available options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionShape {
    Even,
    Concentrated,
    Polarized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionTrendPoint {
    pub date: String,
    pub options: IndexMap<String, usize>,
}

// ---------------------------------------------------------------- checkbox

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckboxAnalytics {
    #[serde(flatten)]
    pub base: FieldAnalyticsBase,
    pub individual_options: Vec<OptionCount>,
    pub combinations: Vec<CombinationCount>,
    pub average_selections: f64,
    pub selection_distribution: Vec<SelectionCountBucket>,
    pub correlations: Vec<OptionCorrelation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinationCount {
    /// Options of the combination, sorted
    pub combination: Vec<String>,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionCountBucket {
    pub selection_count: usize,
    pub response_count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionCorrelation {
    pub option_a: String,
    pub option_b: String,
    pub co_occurrences: usize,
    /// Observed over expected co-occurrence (lift)
    pub correlation: f64,
}

// ---------------------------------------------------------------- date

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateAnalytics {
    #[serde(flatten)]
    pub base: FieldAnalyticsBase,
    pub earliest_date: DateTime<Utc>,
    pub latest_date: DateTime<Utc>,
    pub most_common_date: DateTime<Utc>,
    pub date_distribution: Vec<DateCount>,
    pub weekday_distribution: Vec<NamedCount>,
    pub monthly_distribution: Vec<NamedCount>,
    pub seasonal_patterns: Vec<NamedCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateCount {
    pub date: String,
    pub count: usize,
}

/// Count for a weekday, month or season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedCount {
    pub name: String,
    pub count: usize,
    pub percentage: f64,
}

// ---------------------------------------------------------------- email

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAnalytics {
    #[serde(flatten)]
    pub base: FieldAnalyticsBase,
    pub valid_emails: usize,
    pub invalid_emails: usize,
    pub validation_rate: f64,
    pub domains: Vec<DomainCount>,
    pub top_level_domains: Vec<DomainCount>,
    pub popular_providers: Vec<ProviderCount>,
    pub corporate_vs_personal: EmailOrigins,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainCount {
    pub domain: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCount {
    pub provider: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailOrigins {
    pub corporate: usize,
    pub personal: usize,
    pub unknown: usize,
}
