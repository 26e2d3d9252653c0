//! Classification records returned to API consumers.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Urgency assigned to a classified request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub enum Priority {
    /// Routine request.
    #[default]
    Low,
    /// Request that should be handled soon.
    Medium,
    /// Request that must be handled first (money movement is always `High`).
    High,
}

impl std::str::FromStr for Priority {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        };
        f.write_str(label)
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|()| serde::de::Error::custom(format!("unknown priority '{raw}'")))
    }
}

/// A single request identified inside a document.
///
/// Field names follow the public JSON contract (`"Request Type"`, `"Priority Flag"`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Taxonomy category assigned to the request.
    #[serde(rename = "Request Type")]
    pub request_type: String,
    /// Sub-category under [`Self::request_type`].
    #[serde(rename = "Sub Request Type")]
    pub sub_request_type: String,
    /// Model confidence in the range `0.0..=1.0`.
    #[serde(rename = "Confidence Score")]
    pub confidence_score: f64,
    /// Comma-separated phrases that drove the decision.
    #[serde(rename = "Decision Words")]
    pub decision_words: String,
    /// Key facts extracted from the request.
    #[serde(rename = "Required Info")]
    pub required_info: Map<String, Value>,
    /// Whether the request duplicates previously seen content.
    #[serde(rename = "Duplicate Flag")]
    pub duplicate_flag: bool,
    /// Urgency of the request.
    #[serde(rename = "Priority Flag")]
    pub priority_flag: Priority,
}

impl ClassificationResult {
    /// Result returned for content whose fingerprint is already in the duplicate store.
    pub fn duplicate() -> Self {
        Self {
            request_type: "Duplicate".into(),
            sub_request_type: "Duplicate".into(),
            confidence_score: 1.0,
            decision_words: String::new(),
            required_info: Map::new(),
            duplicate_flag: true,
            priority_flag: Priority::Low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_public_field_names() {
        let value = serde_json::to_value(ClassificationResult::duplicate()).expect("json");
        assert_eq!(
            value,
            json!({
                "Request Type": "Duplicate",
                "Sub Request Type": "Duplicate",
                "Confidence Score": 1.0,
                "Decision Words": "",
                "Required Info": {},
                "Duplicate Flag": true,
                "Priority Flag": "Low"
            })
        );
    }

    #[test]
    fn priority_orders_and_parses_loosely() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::High));
        assert!("urgent".parse::<Priority>().is_err());
        let parsed: Priority = serde_json::from_value(json!("medium")).expect("priority");
        assert_eq!(parsed, Priority::Medium);
    }
}
