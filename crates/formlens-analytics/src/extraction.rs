use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use formlens_core::{FieldResponse, FormResponse};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid float regex")
});

/// Pull every non-empty answer to `field_id` out of `responses`, keeping input order.
///
/// A value is skipped when the key is absent, when it is `null`, or when its
/// string form is empty.
pub fn extract_field_values(responses: &[FormResponse], field_id: &str) -> Vec<FieldResponse> {
    responses
        .iter()
        .filter_map(|response| {
            let value = response.data.get(field_id)?;
            if value.is_null() || value_to_text(value).is_empty() {
                return None;
            }
            Some(FieldResponse {
                value: value.clone(),
                submitted_at: response.submitted_at,
                response_id: response.response_id.clone(),
            })
        })
        .collect()
}

/// String form of a submitted value.
///
/// Integral numbers print without a fraction and arrays are joined with commas.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{}", f as i64)
                } else {
                    f.to_string()
                }
            }
        }
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Leading-float parse: whitespace is skipped and the longest decimal prefix
/// is read, so `"12kg"` yields 12. Non-finite results are rejected.
pub fn parse_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim_start();
            FLOAT_PREFIX
                .find(trimmed)
                .and_then(|m| m.as_str().parse::<f64>().ok())
        }
        Value::Array(items) if items.len() == 1 => parse_number(&items[0]),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Lenient date parse. All results are UTC.
///
/// Accepts RFC 3339, zone-less date-times, bare `YYYY-MM-DD` (midnight) and
/// epoch milliseconds given as a number or a numeric string.
pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        Value::String(s) => parse_date_str(s.trim()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    s.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};
    use serde_json::json;
    use std::collections::HashMap;

    fn response(id: &str, data: Value) -> FormResponse {
        let data: HashMap<String, Value> = serde_json::from_value(data).unwrap();
        FormResponse {
            response_id: id.to_string(),
            data,
            submitted_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_extract_skips_missing_null_and_empty() {
        let responses = vec![
            response("r1", json!({"f1": "hello"})),
            response("r2", json!({"f1": null})),
            response("r3", json!({"f1": ""})),
            response("r4", json!({"other": "x"})),
            response("r5", json!({"f1": 0})),
            response("r6", json!({"f1": []})),
            response("r7", json!({"f1": ["a", "b"]})),
        ];

        let values = extract_field_values(&responses, "f1");
        let ids: Vec<_> = values.iter().map(|v| v.response_id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r5", "r7"]);
        assert_eq!(values[1].value, json!(0));
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&json!("abc")), "abc");
        assert_eq!(value_to_text(&json!(42)), "42");
        assert_eq!(value_to_text(&json!(2.0)), "2");
        assert_eq!(value_to_text(&json!(2.5)), "2.5");
        assert_eq!(value_to_text(&json!(true)), "true");
        assert_eq!(value_to_text(&json!(["x", 1])), "x,1");
        assert_eq!(value_to_text(&Value::Null), "");
    }

    #[test]
    fn test_parse_number_reads_leading_float() {
        assert_eq!(parse_number(&json!(12.5)), Some(12.5));
        assert_eq!(parse_number(&json!("  42")), Some(42.0));
        assert_eq!(parse_number(&json!("12kg")), Some(12.0));
        assert_eq!(parse_number(&json!("-.5")), Some(-0.5));
        assert_eq!(parse_number(&json!("1e3")), Some(1000.0));
        assert_eq!(parse_number(&json!("abc")), None);
        assert_eq!(parse_number(&json!(true)), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let date_only = parse_date(&json!("2024-01-15")).unwrap();
        assert_eq!((date_only.year(), date_only.month(), date_only.day()), (2024, 1, 15));
        assert_eq!(date_only.hour(), 0);

        let rfc = parse_date(&json!("2024-01-15T10:30:00+02:00")).unwrap();
        assert_eq!(rfc.hour(), 8);

        let naive = parse_date(&json!("2024-01-15T10:30")).unwrap();
        assert_eq!(naive.minute(), 30);

        let millis = parse_date(&json!(1_705_276_800_000i64)).unwrap();
        assert_eq!(millis, date_only);
        assert_eq!(parse_date(&json!("1705276800000")), Some(date_only));

        assert_eq!(parse_date(&json!("not a date")), None);
        assert_eq!(parse_date(&json!(["2024-01-15"])), None);
    }
}
