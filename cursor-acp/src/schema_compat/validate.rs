//! Runtime validation of normalized arguments against a declared JSON Schema.
//!
//! Supports the subset tool schemas actually use: `type` (scalar or union),
//! `enum`, `required`, `properties`, and `additionalProperties: false`.

use super::SchemaValidation;
use serde_json::{Map, Value};

/// One value whose runtime type does not match the declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeError {
    pub key: String,
    pub expected: String,
    pub actual: String,
}

/// Validates `args` against `schema`, stripping disallowed keys first when
/// the schema sets `additionalProperties: false`. Result lists are sorted so
/// signatures derived from them are stable.
pub fn validate(name: &str, args: &mut Map<String, Value>, schema: &Value) -> SchemaValidation {
    let properties = schema.get("properties").and_then(Value::as_object);
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let additional_allowed = schema
        .get("additionalProperties")
        .and_then(Value::as_bool)
        .unwrap_or(true);

    let mut unexpected = Vec::new();
    if let Some(props) = properties {
        unexpected = args
            .keys()
            .filter(|k| !props.contains_key(*k))
            .cloned()
            .collect();
        unexpected.sort();
        if !additional_allowed {
            for key in &unexpected {
                args.remove(key);
            }
        }
    }

    let mut type_errors = Vec::new();
    if let Some(props) = properties {
        for (key, decl) in props {
            let Some(value) = args.get(key) else {
                continue;
            };
            if let Some(expected) = declared_type_mismatch(value, decl) {
                type_errors.push(TypeError {
                    key: key.clone(),
                    expected,
                    actual: runtime_type(value).to_string(),
                });
            }
        }
    }
    type_errors.sort_by(|a, b| a.key.cmp(&b.key));

    let mut missing: Vec<String> = required
        .iter()
        .filter(|k| !args.contains_key(**k))
        .map(|k| k.to_string())
        .collect();
    missing.sort();

    let ok = missing.is_empty() && type_errors.is_empty();
    let repair_hint = (!ok).then(|| repair_hint(name, &missing, &unexpected, &type_errors));

    SchemaValidation {
        has_schema: true,
        ok,
        missing,
        unexpected,
        type_errors,
        repair_hint,
    }
}

/// Returns the expected-type description when `value` does not satisfy the
/// declaration (`type` scalar or union, then `enum`).
fn declared_type_mismatch(value: &Value, decl: &Value) -> Option<String> {
    if let Some(ty) = decl.get("type") {
        let allowed: Vec<&str> = match ty {
            Value::String(s) => vec![s.as_str()],
            Value::Array(list) => list.iter().filter_map(Value::as_str).collect(),
            _ => vec![],
        };
        if !allowed.is_empty() && !allowed.iter().any(|t| type_matches(value, t)) {
            return Some(allowed.join("|"));
        }
    }
    if let Some(Value::Array(options)) = decl.get("enum") {
        if !options.contains(value) {
            let rendered: Vec<String> = options.iter().map(Value::to_string).collect();
            return Some(format!("one of {}", rendered.join(", ")));
        }
    }
    None
}

fn type_matches(value: &Value, ty: &str) -> bool {
    match ty {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn runtime_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Human-readable repair instruction for an invalid call.
fn repair_hint(
    name: &str,
    missing: &[String],
    unexpected: &[String],
    type_errors: &[TypeError],
) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing required: {}", missing.join(", ")));
    }
    if !unexpected.is_empty() {
        parts.push(format!("unsupported: {}", unexpected.join(", ")));
    }
    if !type_errors.is_empty() {
        let rendered: Vec<String> = type_errors
            .iter()
            .map(|e| format!("{} should be {} (got {})", e.key, e.expected, e.actual))
            .collect();
        parts.push(format!("type errors: {}", rendered.join("; ")));
    }
    let mut hint = format!("Invalid arguments for tool \"{}\": {}.", name, parts.join("; "));
    if name == "edit" {
        hint.push_str(
            " Provide path, old_string (the exact text to replace; empty string replaces the \
             whole file), and new_string.",
        );
    }
    hint
}
