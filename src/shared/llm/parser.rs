use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;

lazy_static! {
    /// Regex for trailing commas before } or ]
    static ref TRAILING_COMMA_RE: Regex = Regex::new(r",(\s*[}\]])").unwrap();

    /// Regex for JavaScript string concatenation ("str1" + "str2")
    static ref JS_STRING_CONCAT_RE: Regex = Regex::new(r#""\s*\+\s*""#).unwrap();
}

/// Extract the first balanced `{...}` object from free-form model output.
///
/// Markdown code fences are stripped first; the remaining text is scanned
/// with a depth counter that is string- and escape-aware, so braces inside
/// JSON string values do not terminate the object early.
pub fn extract_json_object(text: &str) -> Result<String, String> {
    let body = strip_code_fences(text);

    let start = body
        .find('{')
        .ok_or_else(|| "No JSON object found in response".to_string())?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in body[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Ok(body[start..end].to_string());
                }
            }
            _ => {}
        }
    }

    Err("Incomplete JSON object in response".to_string())
}

/// Strip a surrounding markdown code fence (```json ... ``` or ``` ... ```)
fn strip_code_fences(text: &str) -> &str {
    if let Some(after) = text.split("```json").nth(1) {
        return after.split("```").next().unwrap_or(after).trim();
    }
    if let Some(start) = text.find("```") {
        let block_start = start + 3;
        // Skip the optional language identifier on the fence line
        if let Some(newline_offset) = text[block_start..].find('\n') {
            let body_start = block_start + newline_offset + 1;
            if let Some(end_offset) = text[body_start..].find("```") {
                return text[body_start..body_start + end_offset].trim();
            }
        }
    }
    text.trim()
}

/// Fix trailing commas in JSON (common LLM mistake)
fn fix_trailing_commas(json_str: &str) -> String {
    TRAILING_COMMA_RE.replace_all(json_str, "$1").to_string()
}

/// Merge JavaScript-style string concatenation, which is invalid JSON
fn fix_js_string_concatenation(json_str: &str) -> String {
    JS_STRING_CONCAT_RE.replace_all(json_str, "").to_string()
}

fn apply_quick_fixes(json_str: &str) -> String {
    let fixed = fix_js_string_concatenation(json_str);
    fix_trailing_commas(&fixed)
}

/// Attempt to repair JSON using the llm_json crate
fn repair_json(json_str: &str) -> Option<String> {
    let options = llm_json::RepairOptions::default();
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        llm_json::repair_json(json_str, &options)
    })) {
        Ok(Ok(repaired)) => Some(repaired),
        Ok(Err(e)) => {
            tracing::debug!("JSON repair failed: {:?}", e);
            None
        }
        Err(_) => {
            tracing::warn!("JSON repair panicked");
            None
        }
    }
}

/// Parse model output into the target type.
///
/// Pipeline: extract the first balanced object, try a direct parse, apply
/// quick fixes (trailing commas, string concatenation), then fall back to a
/// full llm_json repair. The error carries a prefix of the offending JSON so
/// callers can log something useful.
pub fn parse_llm_json<T>(text: &str) -> Result<T, String>
where
    T: DeserializeOwned,
{
    let json_str = extract_json_object(text)?;

    if let Ok(parsed) = serde_json::from_str::<T>(&json_str) {
        return Ok(parsed);
    }

    let fixed = apply_quick_fixes(&json_str);
    if let Ok(parsed) = serde_json::from_str::<T>(&fixed) {
        tracing::debug!("LLM JSON parsed after quick fixes");
        return Ok(parsed);
    }

    if let Some(repaired) = repair_json(&json_str) {
        if let Ok(parsed) = serde_json::from_str::<T>(&repaired) {
            tracing::debug!("LLM JSON parsed after llm_json repair");
            return Ok(parsed);
        }
    }

    Err(format!(
        "Failed to parse JSON after all repair attempts. Original: {}",
        json_str.chars().take(200).collect::<String>()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestShape {
        title: String,
        count: Option<i32>,
    }

    #[test]
    fn extracts_from_json_code_block() {
        let response = "Her er resultatet:\n\n```json\n{\"title\": \"Test\", \"count\": 2}\n```\n";
        let json = extract_json_object(response).unwrap();
        assert_eq!(json, "{\"title\": \"Test\", \"count\": 2}");
    }

    #[test]
    fn extracts_first_balanced_object() {
        let response = "prefix {\"title\": \"A\", \"count\": 1} suffix {\"title\": \"B\"}";
        let json = extract_json_object(response).unwrap();
        assert_eq!(json, "{\"title\": \"A\", \"count\": 1}");
    }

    #[test]
    fn braces_inside_strings_do_not_close_object() {
        let response = r#"{"title": "curly } brace", "count": 3}"#;
        let json = extract_json_object(response).unwrap();
        assert_eq!(json, response);
    }

    #[test]
    fn nested_objects_stay_balanced() {
        let response = r#"noise {"title": "x", "inner": {"a": 1}} tail"#;
        let json = extract_json_object(response).unwrap();
        assert_eq!(json, r#"{"title": "x", "inner": {"a": 1}}"#);
    }

    #[test]
    fn missing_object_is_an_error() {
        assert!(extract_json_object("no json here").is_err());
        assert!(extract_json_object("{\"unterminated\": ").is_err());
    }

    #[test]
    fn parses_plain_json() {
        let parsed: TestShape = parse_llm_json(r#"{"title": "Pass", "count": 42}"#).unwrap();
        assert_eq!(
            parsed,
            TestShape {
                title: "Pass".to_string(),
                count: Some(42),
            }
        );
    }

    #[test]
    fn quick_fixes_handle_trailing_commas_and_concat() {
        let parsed: TestShape =
            parse_llm_json(r#"{"title": "Del1" + "Del2", "count": 1,}"#).unwrap();
        assert_eq!(parsed.title, "Del1Del2");
    }

    #[test]
    fn unparseable_input_returns_error() {
        let result: Result<TestShape, _> = parse_llm_json("Beklager, jeg kan ikke svare.");
        assert!(result.is_err());
    }
}
