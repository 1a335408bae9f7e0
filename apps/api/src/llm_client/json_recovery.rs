//! Best-effort recovery of JSON from free-form model output.
//!
//! Models asked for "JSON only" still wrap answers in code fences, prepend
//! prose, leave trailing commas, or stop mid-array when they hit the token
//! limit. These helpers try progressively looser readings and give up with
//! `None` rather than an error; callers decide on the fallback.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

/// Keys under which models tend to nest a plan array.
const WRAPPER_KEYS: [&str; 3] = ["plan", "days", "schedule"];

fn fenced_object_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)```(?:json)?\s*(\{.*?\})\s*```").expect("valid regex"))
}

fn trailing_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",\s*([\]}])").expect("valid regex"))
}

fn language_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:json|JSON)\s+").expect("valid regex"))
}

/// Removes every backtick at either end and a leading `json` language tag.
fn strip_backticks_and_tag(text: &str) -> &str {
    let inner = text.trim().trim_matches('`').trim();
    match inner.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => inner[4..].trim(),
        _ => inner,
    }
}

/// Recovers a JSON object from model output. Tries a fenced block, then a
/// fully backticked answer, then the span from the first `{` to the last `}`.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let t = text.trim();
    if t.is_empty() {
        return None;
    }

    if let Some(caps) = fenced_object_re().captures(t) {
        if let Some(obj) = parse_object(caps[1].trim()) {
            return Some(obj);
        }
    }

    if t.starts_with("```") && t.ends_with("```") {
        let inner = t.trim_matches('`').trim();
        let inner = language_tag_re().replace(inner, "");
        if let Some(obj) = parse_object(&inner) {
            return Some(obj);
        }
    }

    let start = t.find('{')?;
    let end = t.rfind('}')?;
    if end > start {
        return parse_object(&t[start..=end]);
    }
    None
}

/// Lenient single-object parse used for short structured answers: strips a
/// fence and parses, falling back to `extract_json_object`.
pub fn parse_lenient_object(text: &str) -> Option<Map<String, Value>> {
    parse_object(strip_backticks_and_tag(text)).or_else(|| extract_json_object(text))
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Returns the first balanced top-level `[...]`, ignoring brackets inside
/// string literals.
pub fn find_balanced_array(s: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_str = false;
    let mut esc = false;
    let mut start_idx: Option<usize> = None;

    for (i, ch) in s.char_indices() {
        if in_str {
            if esc {
                esc = false;
            } else if ch == '\\' {
                esc = true;
            } else if ch == '"' {
                in_str = false;
            }
            continue;
        }
        match ch {
            '"' => in_str = true,
            '[' => {
                if depth == 0 {
                    start_idx = Some(i);
                }
                depth += 1;
            }
            ']' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(start) = start_idx {
                        return Some(&s[start..=i]);
                    }
                }
            }
            _ => {}
        }
    }
    None
}

/// Drops commas that directly precede a closing `]` or `}`.
pub fn remove_trailing_commas(s: &str) -> Cow<'_, str> {
    trailing_comma_re().replace_all(s, "$1")
}

/// Collects every complete object after the first `[`, for output that was
/// cut off mid-array. Objects that do not parse on their own are skipped.
pub fn parse_partial_array(s: &str) -> Option<Vec<Value>> {
    let start = s.find('[')?;
    let mut in_str = false;
    let mut esc = false;
    let mut depth = 0usize;
    let mut obj_start: Option<usize> = None;
    let mut items = Vec::new();

    for (offset, ch) in s[start..].char_indices() {
        let i = start + offset;
        if in_str {
            if esc {
                esc = false;
            } else if ch == '\\' {
                esc = true;
            } else if ch == '"' {
                in_str = false;
            }
            continue;
        }
        match ch {
            '"' => in_str = true,
            '{' => {
                if depth == 0 {
                    obj_start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(begin) = obj_start.take() {
                        if let Ok(obj) = serde_json::from_str::<Value>(&s[begin..=i]) {
                            items.push(obj);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Interprets an already-parsed value as a list of plan items: a bare array,
/// an object nesting one under `plan`/`days`/`schedule`, or a `days` mapping
/// such as `{"days": {"day1": {...}, "day2": {...}}}`.
pub fn plan_items_from_value(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut obj) => {
            for key in WRAPPER_KEYS {
                if matches!(obj.get(key), Some(Value::Array(_))) {
                    if let Some(Value::Array(items)) = obj.remove(key) {
                        return Some(items);
                    }
                }
            }
            match obj.remove("days") {
                Some(Value::Object(days)) => {
                    let mut entries: Vec<(u64, Value)> = days
                        .into_iter()
                        .map(|(k, v)| (digits_of(&k), v))
                        .collect();
                    entries.sort_by_key(|(n, _)| *n);
                    Some(entries.into_iter().map(|(_, v)| v).collect())
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// All ASCII digits in a key read as one number; keys without digits sort first.
fn digits_of(key: &str) -> u64 {
    let digits: String = key.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Recovers a plan array from text that did not parse directly.
pub fn extract_json_array(text: &str) -> Option<Vec<Value>> {
    let t = text.trim();
    if t.is_empty() {
        return None;
    }

    if t.starts_with("```") {
        if let Ok(value) = serde_json::from_str::<Value>(strip_backticks_and_tag(t)) {
            if let Some(items) = plan_items_from_value(value) {
                return Some(items);
            }
        }
    }

    if let Some(candidate) = find_balanced_array(t) {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(candidate) {
            return Some(items);
        }
        if let Ok(Value::Array(items)) =
            serde_json::from_str::<Value>(&remove_trailing_commas(candidate))
        {
            return Some(items);
        }
    }

    if let Some(items) = parse_partial_array(t) {
        return Some(items);
    }

    serde_json::from_str::<Value>(t)
        .ok()
        .and_then(plan_items_from_value)
}

/// Full recovery pipeline for plan output: direct parse first, then the
/// looser strategies. An empty list counts as failure.
pub fn recover_plan_items(raw: &str) -> Option<Vec<Value>> {
    let direct = serde_json::from_str::<Value>(raw.trim())
        .ok()
        .and_then(plan_items_from_value);
    direct
        .or_else(|| extract_json_array(raw))
        .filter(|items| !items.is_empty())
}
