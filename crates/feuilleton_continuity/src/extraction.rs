//! Utilities for extracting structured data from generation responses.
//!
//! Classification and pacing calls ask the service for JSON, but the
//! reply often arrives wrapped in markdown fences or mixed with prose.
//! These helpers pull the JSON payload out before parsing.

use feuilleton_error::{FeuilletonResult, GenerationError, GenerationErrorKind};

/// Extract JSON from a response that may contain markdown or extra text.
///
/// Tries markdown ```json fences first, then the first balanced
/// `{...}` object, then a balanced `[...]` array.
///
/// # Errors
///
/// Returns an error if no JSON payload is found.
///
/// # Examples
///
/// ```
/// use feuilleton_continuity::extract_json;
///
/// let response = "Scores below:\n```json\n{\"intensity\": 7}\n```\n";
/// let json = extract_json(response).unwrap();
/// assert!(json.contains("intensity"));
/// ```
pub fn extract_json(response: &str) -> FeuilletonResult<String> {
    if let Some(json) = extract_from_code_block(response) {
        return Ok(json);
    }
    if let Some(json) = extract_balanced(response, '{', '}') {
        return Ok(json);
    }
    if let Some(json) = extract_balanced(response, '[', ']') {
        return Ok(json);
    }

    tracing::error!(
        response_length = response.len(),
        "No JSON found in generation response"
    );
    Err(GenerationError::new(GenerationErrorKind::Malformed(format!(
        "No JSON found in response (length: {})",
        response.len()
    )))
    .into())
}

/// Parse extracted JSON into a typed value.
///
/// # Errors
///
/// Returns an error if the JSON cannot be deserialized into `T`.
pub fn parse_json<T>(json_str: &str) -> FeuilletonResult<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(json_str).map_err(|e| {
        let preview: String = json_str.chars().take(100).collect();
        tracing::error!(error = %e, json_preview = %preview, "JSON parsing failed");
        GenerationError::new(GenerationErrorKind::Malformed(format!(
            "Failed to parse JSON: {} (JSON: {}...)",
            e, preview
        )))
        .into()
    })
}

/// Content of the first ```json (or bare ```) fence, if any.
fn extract_from_code_block(response: &str) -> Option<String> {
    let start = response.find("```")?;
    let content_start = start + 3;
    // Skip the language specifier line
    let skip_to = response[content_start..]
        .find('\n')
        .map(|n| content_start + n + 1)
        .unwrap_or(content_start);

    match response[skip_to..].find("```") {
        Some(end) => Some(response[skip_to..skip_to + end].trim().to_string()),
        // No closing fence: likely a truncated response, take the rest
        None => Some(response[skip_to..].trim().to_string()),
    }
}

/// Content between the first `open` and its matching `close`, handling
/// nesting and string literals.
fn extract_balanced(response: &str, open: char, close: char) -> Option<String> {
    let start = response.find(open)?;
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(response[start..start + i + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_fenced_block() {
        let response = "Here you go:\n```json\n{\"death\": true}\n```\nDone.";
        assert_eq!(extract_json(response).unwrap(), "{\"death\": true}");
    }

    #[test]
    fn extracts_bare_object_from_prose() {
        let response = "判定结果：{\"plot_turn\": true, \"note\": \"主角突破\"} 请查收";
        let json = extract_json(response).unwrap();
        assert!(json.starts_with('{') && json.ends_with('}'));
        assert!(json.contains("plot_turn"));
    }

    #[test]
    fn handles_nested_and_escaped_braces() {
        let response = r#"{"outer": {"inner": "a \"quoted\" }"}} trailing"#;
        let json = extract_json(response).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["outer"]["inner"].as_str().unwrap().contains("quoted"));
    }

    #[test]
    fn no_json_is_an_error() {
        assert!(extract_json("没有任何结构化内容。").is_err());
    }

    #[test]
    fn parse_json_reports_malformed() {
        #[derive(serde::Deserialize)]
        struct Point {
            #[allow(dead_code)]
            intensity: u8,
        }
        assert!(parse_json::<Point>("{\"intensity\": \"high\"}").is_err());
        assert!(parse_json::<Point>("{\"intensity\": 7}").is_ok());
    }
}
