//! Result sorting for search
//!
//! Multi-key, stable and deterministic.

use std::borrow::Cow;
use std::cmp::Ordering;

use serde_json::Value;

use super::query::{SortDirection, SortKey};
use crate::storage::{format_timestamp, EntityRecord};

/// Sorts search results
pub struct RecordSorter;

impl RecordSorter {
    /// Sorts records by each key in turn. Records equal on every key keep
    /// their incoming order.
    pub fn sort(records: &mut [EntityRecord], keys: &[SortKey]) {
        if keys.is_empty() {
            return;
        }
        records.sort_by(|a, b| {
            keys.iter()
                .map(|key| {
                    let ordering = Self::compare_values(
                        sort_value(a, &key.field).as_deref(),
                        sort_value(b, &key.field).as_deref(),
                    );
                    match key.direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                })
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }

    /// Compares two JSON values for sorting.
    ///
    /// Ordering rules:
    /// - missing < null < bool < number < string < array < object
    /// - For same types, natural ordering
    pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a_val), Some(b_val)) => {
                let type_order = |v: &Value| -> u8 {
                    match v {
                        Value::Null => 0,
                        Value::Bool(_) => 1,
                        Value::Number(_) => 2,
                        Value::String(_) => 3,
                        Value::Array(_) => 4,
                        Value::Object(_) => 5,
                    }
                };

                let a_type = type_order(a_val);
                let b_type = type_order(b_val);
                if a_type != b_type {
                    return a_type.cmp(&b_type);
                }

                match (a_val, b_val) {
                    (Value::Bool(a_b), Value::Bool(b_b)) => a_b.cmp(b_b),
                    (Value::Number(a_n), Value::Number(b_n)) => {
                        let a_f = a_n.as_f64().unwrap_or(0.0);
                        let b_f = b_n.as_f64().unwrap_or(0.0);
                        a_f.partial_cmp(&b_f).unwrap_or(Ordering::Equal)
                    }
                    (Value::String(a_s), Value::String(b_s)) => a_s.cmp(b_s),
                    _ => Ordering::Equal,
                }
            }
        }
    }
}

/// Value a record sorts by; bookkeeping keys map to identity and timestamps.
fn sort_value<'r>(record: &'r EntityRecord, field: &str) -> Option<Cow<'r, Value>> {
    match field {
        "_id" | "id" => Some(Cow::Owned(Value::String(record.id.to_string()))),
        "_created" => Some(Cow::Owned(Value::String(format_timestamp(&record.created_at)))),
        "_updated" => Some(Cow::Owned(Value::String(format_timestamp(&record.updated_at)))),
        _ => record.fields.get(field).map(Cow::Borrowed),
    }
}
