//! Best-effort lookups into loosely shaped JSON (linked-data properties).
//!
//! Every accessor returns `Option`; a sequence where an object is expected is
//! read through its first element, which is how publishers commonly wrap
//! single `offers`, `author` or `address` values.

use regex::Regex;
use serde_json::{Map, Value};

/// Descend `path` from `value`, reading through arrays by their first element.
pub fn value_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = first_element(current);
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

/// Same as [`value_at`] starting from a property map.
pub fn lookup<'a>(map: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (head, rest) = path.split_first()?;
    value_at(map.get(*head)?, rest)
}

fn first_element(value: &Value) -> &Value {
    match value {
        Value::Array(items) => items.first().unwrap_or(value),
        other => other,
    }
}

/// Scalar rendered as a trimmed, non-empty string.
pub fn as_text(value: &Value) -> Option<String> {
    match first_element(value) {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Number, or a string that reads as a price/amount.
pub fn as_number(value: &Value) -> Option<f64> {
    match first_element(value) {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_price(s),
        _ => None,
    }
}

/// Name of a person/organization given as a string, an object with `name`,
/// or a sequence of either (first wins).
pub fn name_of(value: &Value) -> Option<String> {
    match value {
        Value::String(_) => as_text(value),
        Value::Object(map) => map.get("name").and_then(as_text),
        Value::Array(items) => items.first().and_then(name_of),
        _ => None,
    }
}

/// Names of every entry in a person/organization list.
pub fn names_of(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(name_of).collect(),
        other => name_of(other).into_iter().collect(),
    }
}

/// URL of an image given as a string, an `ImageObject`, or a sequence.
pub fn url_of(value: &Value) -> Option<String> {
    match first_element(value) {
        Value::Object(map) => map.get("url").and_then(as_text),
        other => as_text(other),
    }
}

/// Keep digits and dots, then parse: `"$1,299.00"` reads as `1299.0`.
pub fn parse_price(text: &str) -> Option<f64> {
    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse().ok()
}

/// Salary text, where a `k` anywhere multiplies by 1000 (`"$120k"`).
pub fn parse_salary(text: &str) -> Option<f64> {
    let amount = parse_price(text)?;
    if text.to_lowercase().contains('k') {
        Some(amount * 1000.0)
    } else {
        Some(amount)
    }
}

/// Listing price with `M`/`K` suffixes (`"$1.2M"`, `"$750K"`).
pub fn parse_listing_price(text: &str) -> Option<f64> {
    let amount = parse_price(text)?;
    if text.contains('M') {
        Some(amount * 1_000_000.0)
    } else if text.contains('K') {
        Some(amount * 1000.0)
    } else {
        Some(amount)
    }
}

/// First capture group of `pattern` in `text`, as a number. Thousands
/// separators are dropped first, so `"1,500 sq ft"` reads as `1500`.
pub fn capture_number(pattern: &Regex, text: &str) -> Option<f64> {
    let text = text.replace(',', "");
    pattern.captures(&text)?.get(1)?.as_str().parse().ok()
}

/// Turn an optional string into a JSON value (`null` when absent).
pub fn opt(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null)
}

/// Turn an optional number into a JSON value (`null` when absent or not finite).
pub fn opt_num(value: Option<f64>) -> Value {
    value
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
