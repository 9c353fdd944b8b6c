use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

pub type FormId = String;
pub type FieldId = String;
pub type ResponseId = String;

/// Field types a form schema can declare.
///
/// Unknown tags survive deserialization as [`FieldType::Other`] so that a schema
/// written by a newer editor still loads; the analytics dispatch rejects them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    ShortText,
    LongText,
    Email,
    Number,
    Select,
    Radio,
    Checkbox,
    Date,
    RichText,
    Divider,
    PageBreak,
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::ShortText => "SHORT_TEXT",
            FieldType::LongText => "LONG_TEXT",
            FieldType::Email => "EMAIL",
            FieldType::Number => "NUMBER",
            FieldType::Select => "SELECT",
            FieldType::Radio => "RADIO",
            FieldType::Checkbox => "CHECKBOX",
            FieldType::Date => "DATE",
            FieldType::RichText => "RICH_TEXT",
            FieldType::Divider => "DIVIDER",
            FieldType::PageBreak => "PAGE_BREAK",
            FieldType::Other(s) => s.as_str(),
        }
    }

    /// Layout-only types that can never hold an answer.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            FieldType::RichText | FieldType::Divider | FieldType::PageBreak
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for FieldType {
    fn from(s: &str) -> Self {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "SHORT_TEXT" => FieldType::ShortText,
            "LONG_TEXT" => FieldType::LongText,
            "EMAIL" => FieldType::Email,
            "NUMBER" => FieldType::Number,
            "SELECT" => FieldType::Select,
            "RADIO" => FieldType::Radio,
            "CHECKBOX" => FieldType::Checkbox,
            "DATE" => FieldType::Date,
            "RICH_TEXT" => FieldType::RichText,
            "DIVIDER" => FieldType::Divider,
            "PAGE_BREAK" => FieldType::PageBreak,
            _ => FieldType::Other(s.to_string()),
        }
    }
}

impl From<String> for FieldType {
    fn from(s: String) -> Self {
        FieldType::from(s.as_str())
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub id: FieldId,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormPage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// Page/field layout of a form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    #[serde(default)]
    pub pages: Vec<FormPage>,
}

impl FormSchema {
    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.pages.iter().flat_map(|page| page.fields.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.fields().next().is_none()
    }

    pub fn find_field(&self, field_id: &str) -> Option<&FieldDefinition> {
        self.fields().find(|field| field.id == field_id)
    }
}

/// One stored submission of a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResponse {
    #[serde(alias = "id")]
    pub response_id: ResponseId,
    #[serde(default)]
    pub data: HashMap<FieldId, Value>,
    pub submitted_at: DateTime<Utc>,
}

/// One non-empty answer to one field, stamped with its owning submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldResponse {
    pub value: Value,
    pub submitted_at: DateTime<Utc>,
    pub response_id: ResponseId,
}
