// ── Common building blocks shared by every resource type ──

use std::fmt::Write as _;

use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CoreError;

/// One raw resource record as returned by the gateway.
///
/// Key order follows the server response.
pub type Record = serde_json::Map<String, Value>;

/// Turn a gateway value into a record, rejecting non-objects.
pub(crate) fn into_record(
    value: Value,
    entity_type: &'static str,
    identifier: &str,
) -> Result<Record, CoreError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CoreError::InvalidRecord {
            entity_type,
            identifier: identifier.to_owned(),
            reason: format!("expected an object, got {}", json_type(&other)),
        }),
    }
}

/// Decode the documented fields of a record into a typed view.
pub(crate) fn decode<T: DeserializeOwned>(
    record: &Record,
    entity_type: &'static str,
    identifier: &str,
) -> Result<T, CoreError> {
    serde_json::from_value(Value::Object(record.clone())).map_err(|e| CoreError::InvalidRecord {
        entity_type,
        identifier: identifier.to_owned(),
        reason: e.to_string(),
    })
}

/// Render a JSON scalar as a map key: strings verbatim, everything else
/// in its JSON form.
pub(crate) fn key_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `true` when every pair of `predicate` is present in `record` with an
/// equal value.
pub(crate) fn matches_all(record: &Record, predicate: &Record) -> bool {
    predicate
        .iter()
        .all(|(key, expected)| record.get(key) == Some(expected))
}

/// Format epoch seconds (UTC) with a strftime pattern.
///
/// Returns `None` for out-of-range timestamps. An invalid pattern falls
/// back to RFC 3339 rather than panicking inside `Display`.
pub(crate) fn format_epoch(secs: f64, pattern: &str) -> Option<String> {
    if !secs.is_finite() {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    let dt = DateTime::from_timestamp(secs.trunc() as i64, 0)?;

    let mut out = String::new();
    if write!(out, "{}", dt.format(pattern)).is_err() {
        return Some(dt.to_rfc3339());
    }
    Some(out)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
