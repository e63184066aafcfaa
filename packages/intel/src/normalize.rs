//! Normalization of untrusted model output.
//!
//! Model replies are freeform text that is *expected* to contain JSON but
//! may be wrapped in markdown fences, preceded by prose, truncated, or
//! simply wrong. [`normalize`] turns such text into a typed value and falls
//! back to a caller-supplied default on every failure path.
//!
//! Record types are decoded as partial "patch" structs whose fields are all
//! optional and individually lenient (see [`lenient`]), so one badly typed
//! field costs only that field, never the whole record.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Maximum length of the raw-text preview included in error logs.
const PREVIEW_LEN: usize = 200;

/// Parses `raw` into a `T`, returning `fallback` unchanged whenever the text
/// is absent, empty, not JSON-shaped, unparsable, not a JSON object/array,
/// or does not fit `T`.
///
/// Never panics. Parse failures are logged and otherwise invisible.
#[must_use]
pub fn normalize<T: DeserializeOwned>(raw: Option<&str>, fallback: T) -> T {
    let Some(raw) = raw else {
        return fallback;
    };
    if raw.is_empty() {
        return fallback;
    }

    let cleaned = strip_code_fences(raw);
    if !(cleaned.starts_with('{') || cleaned.starts_with('[')) {
        log::debug!("Rejecting non-JSON model output: {}", preview(raw));
        return fallback;
    }

    let value: serde_json::Value = match serde_json::from_str(cleaned) {
        Ok(value) => value,
        Err(e) => {
            log::error!("JSON parse error: {e}; input: {}", preview(raw));
            return fallback;
        }
    };

    if !(value.is_object() || value.is_array()) {
        return fallback;
    }

    match serde_json::from_value(value) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::error!("Model output has unexpected shape: {e}; input: {}", preview(raw));
            fallback
        }
    }
}

/// Decodes a record patch from model output.
///
/// The output must be a JSON object; anything else (including a top-level
/// array) yields `P::default()`, i.e. a patch with no fields set.
#[must_use]
pub fn normalize_record<P: DeserializeOwned + Default>(raw: Option<&str>) -> P {
    let fields = normalize(raw, serde_json::Map::new());
    serde_json::from_value(serde_json::Value::Object(fields)).unwrap_or_else(|e| {
        log::error!("Model output does not fit record: {e}");
        P::default()
    })
}

/// Removes markdown code-fence markers (```` ```json ```` and ```` ``` ````)
/// and surrounding whitespace.
fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop an optional language tag on the opening fence line.
        let tag_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        text = rest[tag_len..].trim_start();
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim_end();
    }

    text
}

fn preview(raw: &str) -> String {
    if raw.len() <= PREVIEW_LEN {
        return raw.to_string();
    }
    let mut end = PREVIEW_LEN;
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &raw[..end])
}

/// Field deserializer that yields `None` instead of failing when the value
/// has the wrong type.
///
/// Use with `#[serde(default, deserialize_with = "lenient")]` on
/// `Option<T>` fields.
///
/// # Errors
///
/// Only fails if the underlying input is not valid JSON at all.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Like [`lenient`] for numbers, additionally accepting numeric strings
/// such as `"12"` or `"12.5"`.
///
/// # Errors
///
/// Only fails if the underlying input is not valid JSON at all.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(number_from_value(&value))
}

/// Reads a score that may be a bare number, a numeric string, or an object
/// carrying a `score` field.
///
/// # Errors
///
/// Only fails if the underlying input is not valid JSON at all.
pub fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match &value {
        serde_json::Value::Object(obj) => obj.get("score").and_then(number_from_value),
        other => number_from_value(other),
    })
}

fn number_from_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}
