//! Schema-compat: tool-argument normalization, validation, and repair.
//!
//! Every intercepted call passes through here before it leaves the daemon:
//! alias keys are canonicalized, tool-specific shapes are repaired, keys the
//! schema disallows are stripped, and the result is validated against the
//! caller-declared JSON Schema. Normalization is idempotent.

mod alias;
mod normalize;
mod validate;

pub use alias::canonical_key;
pub use validate::TypeError;

use crate::openai::ToolSchemas;
use serde_json::{Map, Value};

/// Validation outcome for one call. `ok` holds exactly when there are no
/// missing required fields and no type errors; `unexpected` is informational.
#[derive(Debug, Clone, Default)]
pub struct SchemaValidation {
    pub has_schema: bool,
    pub ok: bool,
    pub missing: Vec<String>,
    pub unexpected: Vec<String>,
    pub type_errors: Vec<TypeError>,
    pub repair_hint: Option<String>,
}

impl SchemaValidation {
    /// Trivial pass for tools without a declared schema.
    fn no_schema() -> Self {
        Self {
            has_schema: false,
            ok: true,
            ..Default::default()
        }
    }
}

/// A tool call after schema-compat: canonical name, canonical args, what was
/// folded away, and how it validated.
#[derive(Debug, Clone)]
pub struct NormalizedCall {
    pub name: String,
    pub args: Map<String, Value>,
    /// Alias keys dropped because the canonical key was present with a
    /// different value.
    pub collisions: Vec<String>,
    pub validation: SchemaValidation,
    /// The pre-repair arguments had no usable `old_string` (absent or empty).
    /// Drives the edit→write reroute.
    pub old_string_was_missing: bool,
}

impl NormalizedCall {
    /// Canonical JSON string of the normalized arguments (key-sorted).
    pub fn arguments_json(&self) -> String {
        Value::Object(sorted(self.args.clone())).to_string()
    }

    /// `path` argument as a string, when present.
    pub fn path(&self) -> Option<&str> {
        self.args.get("path").and_then(Value::as_str)
    }

    /// True when the arguments describe a full-file replacement
    /// (`old_string` empty or absent with a `new_string`/`content` payload).
    pub fn is_full_file_replace(&self) -> bool {
        let old_empty = match self.args.get("old_string") {
            None => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        };
        old_empty
            && (self.args.contains_key("new_string") || self.args.contains_key("content"))
    }
}

fn sorted(map: Map<String, Value>) -> Map<String, Value> {
    let mut entries: Vec<_> = map.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries.into_iter().collect()
}

/// Runs the full schema-compat pipeline for one extracted call.
///
/// `edit_compat` gates the edit content repair (feature toggle, default on).
pub fn normalize_tool_call(
    name: &str,
    args: Value,
    schemas: &ToolSchemas,
    edit_compat: bool,
) -> NormalizedCall {
    let name = name.to_lowercase();
    let raw = match args {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let (mut args, collisions) = alias::normalize_keys(raw);
    let old_string_was_missing = match args.get("old_string") {
        None => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    };

    normalize::apply_tool_rules(&name, &mut args, edit_compat);

    let validation = match schemas.get(&name) {
        Some(schema) => validate::validate(&name, &mut args, schema),
        None => SchemaValidation::no_schema(),
    };

    NormalizedCall {
        name,
        args,
        collisions,
        validation,
        old_string_was_missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::{FunctionDef, ToolDef};
    use serde_json::json;

    fn schemas_for(name: &str, params: Value) -> ToolSchemas {
        ToolSchemas::from_tools(Some(&[ToolDef {
            tool_type: "function".into(),
            function: FunctionDef {
                name: name.into(),
                description: None,
                parameters: Some(params),
            },
        }]))
    }

    fn edit_schema() -> ToolSchemas {
        schemas_for(
            "edit",
            json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "old_string": {"type": "string"},
                    "new_string": {"type": "string"}
                },
                "required": ["path", "old_string", "new_string"]
            }),
        )
    }

    #[test]
    fn alias_keys_are_canonicalized() {
        let call = normalize_tool_call(
            "read",
            json!({"filePath": "a.txt"}),
            &ToolSchemas::default(),
            true,
        );
        assert_eq!(call.args.get("path"), Some(&json!("a.txt")));
        assert!(call.collisions.is_empty());
    }

    #[test]
    fn stream_content_array_becomes_full_file_edit() {
        let call = normalize_tool_call(
            "edit",
            json!({
                "path": "PLAN.md",
                "streamContent": ["# Plan\n", {"text": "- Step 1\n"}, {"text": "- Step 2\n"}]
            }),
            &edit_schema(),
            true,
        );
        assert_eq!(
            call.args.get("new_string"),
            Some(&json!("# Plan\n- Step 1\n- Step 2\n"))
        );
        assert_eq!(call.args.get("old_string"), Some(&json!("")));
        assert!(call.validation.ok);
        assert!(call.old_string_was_missing);
        assert!(call.is_full_file_replace());
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = [
            ("edit", json!({"path": "f", "content": "x"})),
            ("bash", json!({"command": ["ls", "-la"], "path": "/tmp"})),
            ("rm", json!({"path": "f", "force": "true"})),
            (
                "todowrite",
                json!({"todos": [{"content": "t", "status": "TODO"}]}),
            ),
        ];
        for (name, args) in inputs {
            let once = normalize_tool_call(name, args, &ToolSchemas::default(), true);
            let twice = normalize_tool_call(
                name,
                Value::Object(once.args.clone()),
                &ToolSchemas::default(),
                true,
            );
            assert_eq!(once.args, twice.args, "tool {name} not idempotent");
        }
    }

    #[test]
    fn missing_required_fails_validation() {
        let call = normalize_tool_call("edit", json!({"path": "f"}), &edit_schema(), false);
        assert!(!call.validation.ok);
        assert_eq!(call.validation.missing, vec!["new_string", "old_string"]);
        assert!(call.validation.repair_hint.is_some());
    }

    #[test]
    fn additional_properties_false_strips_unexpected() {
        let schemas = schemas_for(
            "read",
            json!({
                "type": "object",
                "properties": {"path": {"type": "string"}},
                "required": ["path"],
                "additionalProperties": false
            }),
        );
        let call = normalize_tool_call("read", json!({"path": "f", "limit": 5}), &schemas, true);
        assert!(call.validation.ok);
        assert_eq!(call.validation.unexpected, vec!["limit"]);
        assert!(!call.args.contains_key("limit"));
    }

    #[test]
    fn arguments_json_is_key_sorted() {
        let call = normalize_tool_call(
            "write",
            json!({"content": "c", "path": "p"}),
            &ToolSchemas::default(),
            true,
        );
        assert_eq!(call.arguments_json(), "{\"content\":\"c\",\"path\":\"p\"}");
    }
}
