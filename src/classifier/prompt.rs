//! Prompt construction: the request-type taxonomy rendered into completion instructions.

use crate::taxonomy::RequestTypes;

/// Render the taxonomy as a bullet list, one request type per line.
pub(crate) fn format_request_types(request_types: &RequestTypes) -> String {
    request_types
        .iter()
        .map(|(request_type, sub_types)| {
            if sub_types.is_empty() {
                format!("- {request_type}")
            } else {
                format!("- {request_type}: {}", sub_types.join(", "))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the classification prompt for `text` against the taxonomy.
pub fn build_prompt(text: &str, request_types: &RequestTypes) -> String {
    let request_types = format_request_types(request_types);
    format!(
        "Analyze the following email content and identify all individual requests within it:
Email Content: {text}

For each request, provide the following details:
1. Request Type: Choose from:
{request_types}
2. Sub Request Type: Choose from sub-types under selected Request Type.
3. Confidence Score: 0-1 confidence score.
4. Decision Words: Key phrases that influenced decision, separated by \", \".
5. Required Info: Important info as key-value pairs.
6. Duplicate Flag: true/false.
7. Priority Flag: Low/Medium/High. Money Movement requests always High.

Return only a JSON array of request classifications. Each element must be an object with the keys \
\"Request Type\", \"Sub Request Type\", \"Confidence Score\", \"Decision Words\", \"Required Info\", \
\"Duplicate Flag\" and \"Priority Flag\"."
    )
}
