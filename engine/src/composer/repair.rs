//! Best-effort recovery of a JSON object from generative text.
//!
//! The model is asked for a single JSON object but routinely wraps it in
//! prose, drops commas between array elements, or leaves a trailing comma
//! before a closing bracket. Recovery is an ordered chain: structural
//! extraction (balanced braces, string-aware), a crude first-`{` to
//! last-`}` slice, then a fixed set of regex normalization passes, and
//! finally strict parsing. Any failure along the chain is equivalent:
//! the caller falls back to the deterministic composer.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// Parse the first JSON object found in `text`, repairing common
/// model-output defects first. `None` means nothing usable was found.
pub fn parse_with_repair(text: &str) -> Option<Value> {
    if let Some(extracted) = extract_balanced_object(text) {
        if let Ok(value) = serde_json::from_str::<Value>(&repair_json(extracted)) {
            return Some(value);
        }
    }

    let crude = crude_slice(text)?;
    serde_json::from_str(&repair_json(crude)).ok()
}

/// Extract the first balanced `{...}` from `text`, counting brace depth
/// while respecting string literals and escapes.
pub fn extract_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let s = &text[start..];

    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Fallback extraction: everything from the first `{` to the last `}`.
fn crude_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

fn missing_comma_between_strings() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#""\s*\n\s*""#).expect("valid regex"))
}

fn missing_comma_between_objects() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"\}\s*\{"#).expect("valid regex"))
}

fn trailing_comma_object() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r",\s*\}").expect("valid regex"))
}

fn trailing_comma_array() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r",\s*\]").expect("valid regex"))
}

/// Apply the deterministic textual repairs for malformed-JSON patterns
/// the model is known to produce. Passes are ordered: missing commas
/// first, trailing commas last.
pub fn repair_json(json_str: &str) -> String {
    let repaired = missing_comma_between_strings().replace_all(json_str, "\",\n\"");
    let repaired = missing_comma_between_objects().replace_all(&repaired, "}, {");
    let repaired = trailing_comma_object().replace_all(&repaired, "}");
    let repaired = trailing_comma_array().replace_all(&repaired, "]");
    repaired.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_prose() {
        let text = "Вот ваш маршрут:\n{\"route_name\": \"Тест\", \"places\": []}\nПриятной прогулки!";
        let extracted = extract_balanced_object(text).expect("object found");
        assert_eq!(extracted, "{\"route_name\": \"Тест\", \"places\": []}");
    }

    #[test]
    fn test_extract_nested_objects() {
        let text = "prefix {\"a\": {\"b\": 1}, \"c\": [{\"d\": 2}]} suffix";
        let extracted = extract_balanced_object(text).expect("object found");
        assert_eq!(extracted, "{\"a\": {\"b\": 1}, \"c\": [{\"d\": 2}]}");
    }

    #[test]
    fn test_extract_respects_braces_in_strings() {
        let text = r#"{"name": "скобки } внутри", "n": 1}"#;
        let extracted = extract_balanced_object(text).expect("object found");
        assert_eq!(extracted, text);
    }

    #[test]
    fn test_repair_trailing_commas() {
        let broken = r#"{"places": [{"name": "Кремль", "order": 1,}, ], }"#;
        let value = parse_with_repair(broken).expect("repairable");
        assert_eq!(value["places"][0]["name"], "Кремль");
    }

    #[test]
    fn test_repair_missing_comma_between_objects() {
        let broken = r#"{"places": [{"name": "А"} {"name": "Б"}]}"#;
        let value = parse_with_repair(broken).expect("repairable");
        assert_eq!(value["places"].as_array().map(|a| a.len()), Some(2));
    }

    #[test]
    fn test_unbalanced_object_is_rejected() {
        // The unterminated string hides the closing brace from the
        // balanced scan, and the crude slice cannot save it either.
        assert!(parse_with_repair("{\"name\": \"не закрыто}").is_none());
    }

    #[test]
    fn test_unusable_text_yields_none() {
        assert!(parse_with_repair("никакого джсона здесь нет").is_none());
        assert!(parse_with_repair("{completely broken").is_none());
        assert!(parse_with_repair("").is_none());
    }
}
