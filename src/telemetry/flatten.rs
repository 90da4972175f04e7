// Turns a nested telemetry payload into dotted-path columns

use crate::error::{BotdError, Result};
use crate::table::Record;
use crate::telemetry::fields::{BOT_FIELDS, DETECTION_TIME};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Same layout as the access log's time field
const ACCESS_LOG_TIME_FORMAT: &str = "[%d/%b/%Y:%H:%M:%S +0000]";

/// Flatten nested objects into `parent.child` keys
///
/// Arrays are leaves, not descended into. A top-level key that already
/// contains dots is kept as given.
pub fn flatten(payload: &Value) -> Result<BTreeMap<String, String>> {
    let Value::Object(map) = payload else {
        return Err(BotdError::InvalidPayload(format!(
            "expected a JSON object, got {}",
            kind(payload)
        )));
    };

    let mut flat = BTreeMap::new();
    walk(None, map, &mut flat);
    Ok(flat)
}

fn walk(prefix: Option<&str>, map: &Map<String, Value>, flat: &mut BTreeMap<String, String>) {
    for (key, value) in map {
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key.clone(),
        };
        match value {
            Value::Object(child) => walk(Some(path.as_str()), child, flat),
            leaf => {
                flat.insert(path, render(leaf));
            }
        }
    }
}

/// Cell text for a leaf value
pub fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        // numbers, booleans and arrays keep their JSON spelling
        other => other.to_string(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Rewrite a detection timestamp as `[dd/Mon/yyyy:HH:MM:SS +0000]`
///
/// Accepts RFC 3339, RFC 2822 and epoch milliseconds. Anything else is
/// returned unchanged.
pub fn normalize_detection_time(raw: &str) -> String {
    let trimmed = raw.trim();

    let parsed: Option<DateTime<Utc>> = DateTime::parse_from_rfc3339(trimmed)
        .or_else(|_| DateTime::parse_from_rfc2822(trimmed))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            trimmed
                .parse::<i64>()
                .ok()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
        });

    match parsed {
        Some(dt) => dt.format(ACCESS_LOG_TIME_FORMAT).to_string(),
        None => raw.to_string(),
    }
}

/// One value per schema column; missing columns are empty
pub fn project(flat: &BTreeMap<String, String>) -> Record {
    BOT_FIELDS
        .iter()
        .map(|field| {
            let value = flat.get(*field).map(String::as_str).unwrap_or_default();
            if *field == DETECTION_TIME && !value.is_empty() {
                normalize_detection_time(value)
            } else {
                value.to_string()
            }
        })
        .collect()
}
