//! Usage: Deep merge / subset / remove over untyped config trees (`serde_json::Value`).
//!
//! Objects are merged key-wise; arrays and scalars always replace wholesale.
//! Removal only drops values that still match the snippet, so user edits survive.

use serde_json::{Map, Value};

pub fn is_plain_object(value: &Value) -> bool {
    matches!(value, Value::Object(_))
}

/// Merge `source` into `target` in place.
///
/// Prefer [`merged`] unless `target` is already an isolated copy.
pub fn merge_into(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target_obj), Value::Object(source_obj)) => {
            merge_maps(target_obj, source_obj);
        }
        (target, source) => *target = source.clone(),
    }
}

fn merge_maps(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, source_value) in source {
        match (target.get_mut(key), source_value) {
            (Some(Value::Object(target_child)), Value::Object(source_child)) => {
                merge_maps(target_child, source_child);
            }
            (Some(slot), _) => *slot = source_value.clone(),
            (None, _) => {
                target.insert(key.clone(), source_value.clone());
            }
        }
    }
}

/// Clone `target`, then merge `source` into the copy.
pub fn merged(target: &Value, source: &Value) -> Value {
    let mut out = target.clone();
    merge_into(&mut out, source);
    out
}

/// True when every path in `source` exists in `target` with an equal value.
///
/// Arrays must have equal length and match index-wise.
pub fn is_subset(target: &Value, source: &Value) -> bool {
    match (target, source) {
        (Value::Object(target_obj), Value::Object(source_obj)) => {
            source_obj.iter().all(|(key, source_value)| {
                target_obj
                    .get(key)
                    .is_some_and(|target_value| is_subset(target_value, source_value))
            })
        }
        (Value::Array(target_items), Value::Array(source_items)) => {
            target_items.len() == source_items.len()
                && target_items
                    .iter()
                    .zip(source_items)
                    .all(|(t, s)| is_subset(t, s))
        }
        (Value::Object(_), _) | (_, Value::Object(_)) => false,
        (Value::Array(_), _) | (_, Value::Array(_)) => false,
        (t, s) => t == s,
    }
}

/// Remove the parts of `target` that match `source`, in place.
pub fn remove_into(target: &mut Value, source: &Value) {
    if let (Value::Object(target_obj), Value::Object(source_obj)) = (target, source) {
        remove_from_map(target_obj, source_obj);
    }
}

fn remove_from_map(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, source_value) in source {
        let should_remove = match (target.get_mut(key), source_value) {
            (None, _) => false,
            (Some(Value::Object(target_child)), Value::Object(source_child)) => {
                remove_from_map(target_child, source_child);
                target_child.is_empty()
            }
            (Some(target_value), _) => is_subset(target_value, source_value),
        };
        if should_remove {
            target.shift_remove(key);
        }
    }
}

/// Clone `target`, then remove `source` from the copy.
pub fn removed(target: &Value, source: &Value) -> Value {
    let mut out = target.clone();
    remove_into(&mut out, source);
    out
}
