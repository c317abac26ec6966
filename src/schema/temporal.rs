//! Temporal normalization
//!
//! Values declared `format: date-time` may arrive as a bare date or as a
//! timestamp without an offset. Before validation they are rewritten to a
//! canonical UTC form (`2000-01-01T00:00:00.000Z`). Strings that match no
//! accepted form are left untouched so the validator reports them.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value;

const DATE_TIME_FORMAT: &str = "date-time";

/// Rewrites every string the schema declares as `date-time` in place.
pub fn normalize_temporal(schema: &Value, value: &mut Value) {
    let Value::Object(node) = schema else {
        return;
    };

    if node.get("format").and_then(Value::as_str) == Some(DATE_TIME_FORMAT) {
        if let Value::String(text) = value {
            if let Some(canonical) = canonical_date_time(text) {
                *text = canonical;
            }
        }
    }

    for combinator in ["allOf", "anyOf", "oneOf"] {
        if let Some(Value::Array(branches)) = node.get(combinator) {
            for branch in branches {
                normalize_temporal(branch, value);
            }
        }
    }

    match value {
        Value::Object(fields) => {
            let properties = node.get("properties").and_then(Value::as_object);
            let additional = node.get("additionalProperties").filter(|s| s.is_object());
            for (key, child) in fields.iter_mut() {
                match properties.and_then(|p| p.get(key)) {
                    Some(child_schema) => normalize_temporal(child_schema, child),
                    None => {
                        if let Some(child_schema) = additional {
                            normalize_temporal(child_schema, child);
                        }
                    }
                }
            }
        }
        Value::Array(items) => match node.get("items") {
            Some(Value::Array(tuple)) => {
                for (child_schema, child) in tuple.iter().zip(items.iter_mut()) {
                    normalize_temporal(child_schema, child);
                }
            }
            Some(item_schema @ Value::Object(_)) => {
                for child in items.iter_mut() {
                    normalize_temporal(item_schema, child);
                }
            }
            _ => {}
        },
        _ => {}
    }
}

/// Parses an RFC 3339 timestamp, a naive timestamp (taken as UTC) or a
/// calendar date (midnight UTC) and renders it with millisecond precision.
pub fn canonical_date_time(input: &str) -> Option<String> {
    let input = input.trim();

    let instant = if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        parsed.with_timezone(&Utc)
    } else if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        Utc.from_utc_datetime(&naive)
    } else if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?)
    } else {
        return None;
    };

    Some(instant.to_rfc3339_opts(SecondsFormat::Millis, true))
}
