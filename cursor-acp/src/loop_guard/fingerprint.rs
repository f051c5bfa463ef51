//! Fingerprints for loop-guard counters.
//!
//! Strict fingerprints key on `name|argShape|class` where the arg shape is a
//! recursive, key-sorted skeleton with scalar types; coarse fingerprints key
//! on `name|class` only. Success counting keys on the exact value signature.

use super::classify::ErrorClass;
use crate::schema_compat::TypeError;
use serde_json::{Map, Value};

/// Recursive key-sorted skeleton of a value: objects keep keys (sorted) with
/// each value replaced by its shape, arrays keep element shapes, scalars
/// collapse to their type name.
pub fn arg_shape(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(items) => {
            let shapes: Vec<String> = items.iter().map(arg_shape).collect();
            format!("[{}]", shapes.join(","))
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let fields: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}:{}", k, arg_shape(&map[k])))
                .collect();
            format!("{{{}}}", fields.join(","))
        }
    }
}

/// Canonical key-sorted JSON of the arguments; equal values produce equal
/// signatures regardless of key order.
pub fn value_signature(name: &str, args: &Map<String, Value>) -> String {
    format!("{}|{}", name, canonical(&Value::Object(args.clone())))
}

fn canonical(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(canonical).collect();
            format!("[{}]", parts.join(","))
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let parts: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}:{}", Value::String(k.clone()), canonical(&map[k])))
                .collect();
            format!("{{{}}}", parts.join(","))
        }
        other => other.to_string(),
    }
}

pub fn strict_fingerprint(name: &str, args: &Map<String, Value>, class: ErrorClass) -> String {
    format!(
        "{}|{}|{}",
        name,
        arg_shape(&Value::Object(args.clone())),
        class.as_str()
    )
}

pub fn coarse_fingerprint(name: &str, class: ErrorClass) -> String {
    format!("{}|{}", name, class.as_str())
}

/// Signature of a schema-validation failure: sorted missing fields and sorted
/// type-error keys.
pub fn validation_signature(name: &str, missing: &[String], type_errors: &[TypeError]) -> String {
    let mut missing: Vec<&str> = missing.iter().map(String::as_str).collect();
    missing.sort_unstable();
    let mut typed: Vec<String> = type_errors
        .iter()
        .map(|e| format!("{}:{}", e.key, e.expected))
        .collect();
    typed.sort();
    format!(
        "{}|missing={}|types={}",
        name,
        missing.join(","),
        typed.join(",")
    )
}
