//! Post-processing applied to the candidate classifications of a single document.

use super::types::{ClassificationResult, Priority};
use std::collections::HashMap;

/// Request types that always carry [`Priority::High`] unless the taxonomy overrides the list.
pub const DEFAULT_HIGH_PRIORITY_REQUEST_TYPES: [&str; 2] =
    ["Money Movement – Inbound", "Money Movement – Outbound"];

const DECISION_WORD_SEPARATOR: &str = ", ";

/// Force `High` priority on every result whose request type is listed in `high_priority_types`.
pub fn enforce_priority<S>(
    mut results: Vec<ClassificationResult>,
    high_priority_types: &[S],
) -> Vec<ClassificationResult>
where
    S: AsRef<str>,
{
    for result in &mut results {
        if high_priority_types
            .iter()
            .any(|request_type| request_type.as_ref() == result.request_type)
        {
            result.priority_flag = Priority::High;
        }
    }
    results
}

/// Collapse results that share `(Request Type, Sub Request Type)` into one entry.
///
/// Groups keep the position of their first member. Merged entries union decision words and
/// required info, take the highest confidence and priority, and are duplicates if any member was.
pub fn merge_duplicate_requests(results: Vec<ClassificationResult>) -> Vec<ClassificationResult> {
    let mut positions: HashMap<(String, String), usize> = HashMap::new();
    let mut merged: Vec<ClassificationResult> = Vec::with_capacity(results.len());

    for result in results {
        let key = (result.request_type.clone(), result.sub_request_type.clone());
        match positions.get(&key) {
            Some(&index) => absorb(&mut merged[index], result),
            None => {
                positions.insert(key, merged.len());
                merged.push(result);
            }
        }
    }

    merged
}

fn absorb(existing: &mut ClassificationResult, incoming: ClassificationResult) {
    existing.required_info.extend(incoming.required_info);
    existing.decision_words = union_decision_words(&existing.decision_words, &incoming.decision_words);
    if incoming.confidence_score > existing.confidence_score {
        existing.confidence_score = incoming.confidence_score;
    }
    existing.duplicate_flag |= incoming.duplicate_flag;
    existing.priority_flag = existing.priority_flag.max(incoming.priority_flag);
}

fn union_decision_words(existing: &str, incoming: &str) -> String {
    let mut words: Vec<&str> = Vec::new();
    for word in existing
        .split(DECISION_WORD_SEPARATOR)
        .chain(incoming.split(DECISION_WORD_SEPARATOR))
    {
        let word = word.trim();
        if !word.is_empty() && !words.contains(&word) {
            words.push(word);
        }
    }
    words.join(DECISION_WORD_SEPARATOR)
}
