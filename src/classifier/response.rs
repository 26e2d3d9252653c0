//! Lenient decoding of model output into classification records.

use crate::classification::{ClassificationResult, Priority};
use serde_json::{Map, Value};

/// Decode the model's answer into classifications.
///
/// Accepts a bare JSON array, an array wrapped in Markdown code fences, or a single object.
/// Output that is not JSON yields no classifications.
pub fn parse_model_output(raw: &str) -> Vec<ClassificationResult> {
    let body = strip_code_fence(raw.trim());
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(error) => match extract_array(body).and_then(|slice| serde_json::from_str(slice).ok())
        {
            Some(value) => value,
            None => {
                tracing::warn!(error = %error, "Model output is not valid JSON; returning no classifications");
                return Vec::new();
            }
        },
    };

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(_) => vec![value],
        other => {
            tracing::warn!(kind = %json_kind(&other), "Model output is not an array of classifications");
            return Vec::new();
        }
    };

    let total = entries.len();
    let results: Vec<ClassificationResult> = entries.into_iter().filter_map(to_result).collect();
    if results.len() < total {
        tracing::warn!(
            dropped = total - results.len(),
            kept = results.len(),
            "Dropped malformed classification entries"
        );
    }
    results
}

fn strip_code_fence(raw: &str) -> &str {
    let Some(rest) = raw.strip_prefix("```") else {
        return raw;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Locate the outermost `[...]` span when the model wraps JSON in prose.
fn extract_array(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    (start < end).then(|| &raw[start..=end])
}

fn to_result(entry: Value) -> Option<ClassificationResult> {
    let Value::Object(mut fields) = entry else {
        return None;
    };

    let request_type = take_string(&mut fields, "Request Type")?;
    let sub_request_type = take_string(&mut fields, "Sub Request Type").unwrap_or_default();
    let confidence_score = fields
        .remove("Confidence Score")
        .and_then(|value| match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        })
        .filter(|score: &f64| score.is_finite())
        .map(|score| score.clamp(0.0, 1.0))
        .unwrap_or(0.0);
    let decision_words = match fields.remove("Decision Words") {
        Some(Value::String(words)) => words.trim().to_string(),
        Some(Value::Array(words)) => words
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    };
    let required_info = match fields.remove("Required Info") {
        Some(Value::Object(info)) => info,
        _ => Map::new(),
    };
    let duplicate_flag = match fields.remove("Duplicate Flag") {
        Some(Value::Bool(flag)) => flag,
        Some(Value::String(flag)) => flag.trim().eq_ignore_ascii_case("true"),
        _ => false,
    };
    let priority_flag = take_string(&mut fields, "Priority Flag")
        .and_then(|value| value.parse::<Priority>().ok())
        .unwrap_or_default();

    Some(ClassificationResult {
        request_type,
        sub_request_type,
        confidence_score,
        decision_words,
        required_info,
        duplicate_flag,
        priority_flag,
    })
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(value)) => {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_array() {
        let raw = r#"[{"Request Type": "Money Movement – Outbound", "Sub Request Type": "Timebound",
            "Confidence Score": 0.95, "Decision Words": "process payment, Account #12345",
            "Required Info": {"account_number": "Account #12345"}, "Duplicate Flag": false,
            "Priority Flag": "High"}]"#;

        let results = parse_model_output(raw);

        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.request_type, "Money Movement – Outbound");
        assert_eq!(result.sub_request_type, "Timebound");
        assert!((result.confidence_score - 0.95).abs() < f64::EPSILON);
        assert_eq!(result.decision_words, "process payment, Account #12345");
        assert_eq!(result.required_info["account_number"], "Account #12345");
        assert!(!result.duplicate_flag);
        assert_eq!(result.priority_flag, Priority::High);
    }

    #[test]
    fn tolerates_code_fences_prose_and_loose_fields() {
        let fenced = "```json\n[{\"Request Type\": \"Loan\", \"Confidence Score\": \"1.7\", \"Decision Words\": [\"payoff\", \" quote \"], \"Priority Flag\": \"medium\", \"Duplicate Flag\": \"TRUE\"}]\n```";
        let results = parse_model_output(fenced);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].sub_request_type, "");
        assert!((results[0].confidence_score - 1.0).abs() < f64::EPSILON);
        assert_eq!(results[0].decision_words, "payoff, quote");
        assert_eq!(results[0].priority_flag, Priority::Medium);
        assert!(results[0].duplicate_flag);

        let prose = "Here you go: [{\"Request Type\": \"Loan\"}] Hope this helps.";
        assert_eq!(parse_model_output(prose).len(), 1);
    }

    #[test]
    fn single_object_is_wrapped() {
        let results = parse_model_output(r#"{"Request Type": "Fee Payment"}"#);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].priority_flag, Priority::Low);
        assert!(results[0].required_info.is_empty());
    }

    #[test]
    fn drops_entries_without_request_type() {
        let results = parse_model_output(r#"[{"Sub Request Type": "x"}, 3, {"Request Type": "A"}]"#);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].request_type, "A");
    }

    #[test]
    fn unparsable_output_yields_nothing() {
        assert!(parse_model_output("I could not classify this email.").is_empty());
        assert!(parse_model_output("42").is_empty());
        assert!(parse_model_output("").is_empty());
    }
}
