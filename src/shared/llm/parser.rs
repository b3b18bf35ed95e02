use lazy_static::lazy_static;
use regex::Regex;
use std::time::{Duration, Instant};

use super::LlmResponse;

lazy_static! {
    /// Trailing commas before } or ]
    static ref TRAILING_COMMA_RE: Regex = Regex::new(r",(\s*[}\]])").unwrap();

    /// JavaScript string concatenation ("a" + "b")
    static ref JS_STRING_CONCAT_RE: Regex = Regex::new(r#""\s*\+\s*""#).unwrap();
}

/// Repairs slower than this are discarded
const JSON_REPAIR_BUDGET: Duration = Duration::from_secs(5);

/// Outcome of parsing a language-model reply into `T`
#[derive(Debug, Clone, PartialEq)]
pub enum LlmParse<T> {
    Parsed(T),
    Malformed { reason: String },
}

impl<T> LlmParse<T> {
    pub fn is_parsed(&self) -> bool {
        matches!(self, LlmParse::Parsed(_))
    }
}

/// Locate the JSON object inside a model reply
///
/// Accepts, in order: a ```json fenced block, any fenced block, a bare object,
/// or the outermost `{ ... }` span embedded in prose.
pub fn extract_json_string(text: &str) -> Result<String, String> {
    if let Some(after) = text.split("```json").nth(1) {
        return after
            .split("```")
            .next()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| "Failed to extract JSON from markdown code block".to_string());
    }

    if let Some(start) = text.find("```") {
        let block_start = start + 3;
        if let Some(newline_offset) = text[block_start..].find('\n') {
            let body_start = block_start + newline_offset + 1;
            if let Some(end_offset) = text[body_start..].find("```") {
                return Ok(text[body_start..body_start + end_offset].trim().to_string());
            }
        }
    }

    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return Ok(trimmed.to_string());
    }

    let start = text
        .find('{')
        .ok_or_else(|| "No JSON object found in response".to_string())?;
    let end = text
        .rfind('}')
        .ok_or_else(|| "Incomplete JSON object in response".to_string())?;

    if start < end {
        Ok(text[start..=end].to_string())
    } else {
        Err("Invalid JSON boundaries in response".to_string())
    }
}

/// `{"a": 1,}` -> `{"a": 1}`
pub fn fix_trailing_commas(json_str: &str) -> String {
    TRAILING_COMMA_RE.replace_all(json_str, "$1").to_string()
}

/// `"a" + "b"` -> `"ab"`
pub fn fix_js_string_concatenation(json_str: &str) -> String {
    JS_STRING_CONCAT_RE.replace_all(json_str, "").to_string()
}

fn apply_quick_fixes(json_str: &str) -> String {
    fix_trailing_commas(&fix_js_string_concatenation(json_str))
}

fn repair_json(json_str: &str) -> Option<String> {
    let started = Instant::now();
    let options = llm_json::RepairOptions::default();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        llm_json::repair_json(json_str, &options)
    }));

    if started.elapsed() > JSON_REPAIR_BUDGET {
        tracing::warn!("JSON repair exceeded its time budget, discarding result");
        return None;
    }

    match result {
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

fn try_parse<T: LlmResponse>(text: &str) -> Result<T, String> {
    let json_str = extract_json_string(text)?;

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

/// Parse a model reply into `T`, reporting malformed output instead of failing
pub fn parse_llm_response<T: LlmResponse>(text: &str) -> LlmParse<T> {
    match try_parse::<T>(text) {
        Ok(parsed) => LlmParse::Parsed(parsed),
        Err(reason) => {
            tracing::warn!("LLM response could not be parsed: {}", reason);
            LlmParse::Malformed { reason }
        }
    }
}
