//! Tool-specific argument shapes.
//!
//! Applied after alias canonicalization, before validation. Each rule folds a
//! shape some model emits into the shape the caller's schema declares.

use serde_json::{Map, Value};

/// Applies the per-tool rules in place. `edit_compat` gates the edit content
/// repair (env toggle, default on).
pub fn apply_tool_rules(name: &str, args: &mut Map<String, Value>, edit_compat: bool) {
    match name {
        "bash" => normalize_bash(args),
        "rm" => normalize_rm(args),
        "todowrite" => normalize_todowrite(args),
        "edit" if edit_compat => normalize_edit(args),
        _ => {}
    }
}

/// `command` may arrive as an array (joined with spaces) or as
/// `{command, args[]}`. A stray `path` becomes `cwd` when `cwd` is absent.
fn normalize_bash(args: &mut Map<String, Value>) {
    match args.get("command") {
        Some(Value::Array(parts)) => {
            let joined = parts
                .iter()
                .map(string_projection)
                .collect::<Vec<_>>()
                .join(" ");
            args.insert("command".to_string(), Value::String(joined));
        }
        Some(Value::Object(obj)) => {
            let mut pieces = Vec::new();
            if let Some(cmd) = obj.get("command") {
                pieces.push(string_projection(cmd));
            }
            if let Some(Value::Array(rest)) = obj.get("args") {
                pieces.extend(rest.iter().map(string_projection));
            }
            args.insert("command".to_string(), Value::String(pieces.join(" ")));
        }
        _ => {}
    }
    if !args.contains_key("cwd") {
        if let Some(path) = args.remove("path") {
            args.insert("cwd".to_string(), path);
        }
    }
}

/// String `force` flags become booleans.
fn normalize_rm(args: &mut Map<String, Value>) {
    let Some(Value::String(s)) = args.get("force") else {
        return;
    };
    let parsed = match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    };
    if let Some(b) = parsed {
        args.insert("force".to_string(), Value::Bool(b));
    }
}

/// Canonicalizes each todo's `status` and defaults `priority` to "medium".
fn normalize_todowrite(args: &mut Map<String, Value>) {
    let Some(Value::Array(todos)) = args.get_mut("todos") else {
        return;
    };
    for todo in todos.iter_mut() {
        let Some(obj) = todo.as_object_mut() else {
            continue;
        };
        if let Some(Value::String(status)) = obj.get("status") {
            if let Some(canon) = canonical_status(status) {
                obj.insert("status".to_string(), Value::String(canon.to_string()));
            }
        }
        obj.entry("priority")
            .or_insert_with(|| Value::String("medium".to_string()));
    }
}

/// Maps status spellings like "todo", "in-progress", "TODO_STATUS_COMPLETED"
/// onto {pending, in_progress, completed}. Unrecognized values are kept.
fn canonical_status(status: &str) -> Option<&'static str> {
    let squashed: String = status
        .trim()
        .trim_start_matches("TODO_STATUS_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    match squashed.as_str() {
        "pending" | "todo" | "open" | "notstarted" => Some("pending"),
        "inprogress" | "doing" | "active" | "started" => Some("in_progress"),
        "completed" | "complete" | "done" | "finished" => Some("completed"),
        _ => None,
    }
}

/// Edit compat repair:
/// 1. coerce non-string `content` to a string,
/// 2. default `new_string` from `content`,
/// 3. default `old_string` to "" (full-file replace) once `new_string` is a string.
fn normalize_edit(args: &mut Map<String, Value>) {
    if let Some(content) = args.get("content") {
        if !content.is_string() {
            let coerced = string_projection(content);
            args.insert("content".to_string(), Value::String(coerced));
        }
    }
    if !args.contains_key("new_string") {
        if let Some(Value::String(content)) = args.get("content") {
            args.insert("new_string".to_string(), Value::String(content.clone()));
        }
    }
    if matches!(args.get("new_string"), Some(Value::String(_))) && !args.contains_key("old_string")
    {
        args.insert("old_string".to_string(), Value::String(String::new()));
    }
}

/// String projection used when folding structured content into text: strings
/// as-is; arrays join their items' projections; objects yield `.text`,
/// `.content`, or `.value`; everything else serializes as JSON.
fn string_projection(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(string_projection).collect(),
        Value::Object(obj) => obj
            .get("text")
            .or_else(|| obj.get("content"))
            .or_else(|| obj.get("value"))
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}
