//! Per-field-type statistical pipelines.
//!
//! Every analyzer is a pure function of its input plus the wall clock (for
//! `last_updated`). Empty or all-invalid input yields a zeroed result, never an error.

pub mod checkbox;
pub mod date;
pub mod email;
pub mod numeric;
pub mod selection;
pub mod text;

pub use checkbox::CheckboxAnalyzer;
pub use date::DateAnalyzer;
pub use email::EmailAnalyzer;
pub use numeric::NumericAnalyzer;
pub use selection::SelectionAnalyzer;
pub use text::{TextAnalyzer, TextOptions};

use crate::results::{FieldAnalyticsBase, FieldAnalyticsResult};
use crate::stats::percentage;
use chrono::Utc;
use formlens_core::{FieldResponse, FieldType, FormLensError, Result};

/// Top option share above which a selection counts as concentrated.
pub const CONCENTRATED_SHARE_PCT: f64 = 70.0;
/// A top share below this multiple of the uniform share counts as even.
pub const EVEN_SHARE_FACTOR: f64 = 1.5;
/// Minimum lift for a checkbox option pair to be reported.
pub const CORRELATION_LIFT_THRESHOLD: f64 = 1.2;
/// Occurrences after which an unlisted email domain counts as corporate.
pub const CORPORATE_DOMAIN_MIN_OCCURRENCES: usize = 3;

/// Everything an analyzer needs to know about one field.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisInput<'a> {
    pub responses: &'a [FieldResponse],
    pub field_id: &'a str,
    pub field_type: &'a FieldType,
    pub field_label: &'a str,
    /// Responses to the whole form, the denominator of `response_rate`
    pub total_form_responses: usize,
}

impl<'a> AnalysisInput<'a> {
    pub fn base(&self, total_responses: usize) -> FieldAnalyticsBase {
        FieldAnalyticsBase {
            field_id: self.field_id.to_string(),
            field_type: self.field_type.clone(),
            field_label: self.field_label.to_string(),
            total_responses,
            response_rate: percentage(total_responses, self.total_form_responses),
            last_updated: Utc::now(),
        }
    }
}

pub trait FieldAnalyzer: Send + Sync {
    fn analyze(&self, input: &AnalysisInput<'_>) -> FieldAnalyticsResult;
}

/// Route a field type to its analyzer.
///
/// Layout types and unknown tags are a contract violation by the caller and
/// are rejected.
pub fn analyzer_for(
    field_type: &FieldType,
    text_options: &TextOptions,
) -> Result<Box<dyn FieldAnalyzer>> {
    let analyzer: Box<dyn FieldAnalyzer> = match field_type {
        FieldType::ShortText | FieldType::LongText => {
            Box::new(TextAnalyzer::new(text_options.clone()))
        }
        FieldType::Number => Box::new(NumericAnalyzer),
        FieldType::Select | FieldType::Radio => Box::new(SelectionAnalyzer),
        FieldType::Checkbox => Box::new(CheckboxAnalyzer),
        FieldType::Date => Box::new(DateAnalyzer),
        FieldType::Email => Box::new(EmailAnalyzer),
        FieldType::RichText | FieldType::Divider | FieldType::PageBreak | FieldType::Other(_) => {
            return Err(FormLensError::UnsupportedFieldType(field_type.to_string()))
        }
    };
    Ok(analyzer)
}
