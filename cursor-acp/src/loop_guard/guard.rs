//! Per-request loop-guard state and decisions.

use super::classify::{classify_result_text, promote_for_tool, ErrorClass};
use super::fingerprint::{
    coarse_fingerprint, strict_fingerprint, validation_signature, value_signature,
};
use crate::openai::ChatMessage;
use crate::schema_compat::TypeError;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Outcome of evaluating one call against the guard.
#[derive(Debug, Clone)]
pub struct ToolLoopDecision {
    /// The counter that was (or would be) reported: strict when it triggered,
    /// otherwise the coarse one when only the coarse counter triggered.
    pub fingerprint: String,
    pub repeat_count: u32,
    pub max_repeat: u32,
    pub error_class: ErrorClass,
    pub triggered: bool,
    pub tracked: bool,
}

/// Counters over the request's tool-call history plus the calls seen live.
#[derive(Debug, Default)]
pub struct ToolLoopGuard {
    max_repeat: u32,
    strict_failure: HashMap<String, u32>,
    coarse_failure: HashMap<String, u32>,
    strict_validation: HashMap<String, u32>,
    coarse_validation: HashMap<String, u32>,
    success: HashMap<String, u32>,
    coarse_success: HashMap<String, u32>,
    prior_by_call_id: HashMap<String, ErrorClass>,
    latest_by_tool: HashMap<String, ErrorClass>,
    latest_global: Option<ErrorClass>,
}

impl ToolLoopGuard {
    pub fn new(max_repeat: u32) -> Self {
        Self {
            max_repeat,
            ..Default::default()
        }
    }

    /// Builds a guard pre-populated from the request's prior assistant/tool
    /// messages.
    pub fn seeded(max_repeat: u32, messages: &[ChatMessage]) -> Self {
        let mut guard = Self::new(max_repeat);
        guard.seed_from_messages(messages);
        guard
    }

    /// Walks prior `role: "assistant"` tool calls, matches each to its
    /// `role: "tool"` reply by `tool_call_id`, classifies the reply, and
    /// increments the counters the live decision path uses.
    pub fn seed_from_messages(&mut self, messages: &[ChatMessage]) {
        let mut results: HashMap<&str, String> = HashMap::new();
        for msg in messages {
            if msg.role.eq_ignore_ascii_case("tool") {
                if let Some(id) = msg.tool_call_id.as_deref() {
                    results.insert(id, msg.content_text());
                }
            }
        }

        for msg in messages {
            if !msg.role.eq_ignore_ascii_case("assistant") {
                continue;
            }
            let Some(calls) = msg.tool_calls.as_ref() else {
                continue;
            };
            for call in calls {
                let name = call.function.name.to_lowercase();
                let args: Map<String, Value> = serde_json::from_str(&call.function.arguments)
                    .ok()
                    .and_then(|v: Value| v.as_object().cloned())
                    .unwrap_or_default();
                let class = results
                    .get(call.id.as_str())
                    .map(|text| classify_result_text(text))
                    .unwrap_or(ErrorClass::Unknown);
                let class = promote_for_tool(&name, class);

                self.prior_by_call_id.insert(call.id.clone(), class);
                self.latest_by_tool.insert(name.clone(), class);
                self.latest_global = Some(class);

                if class == ErrorClass::Success {
                    self.bump(Self::success_key(&name, &args), CounterKind::Success);
                    if let Some(path) = full_file_path(&name, &args) {
                        self.bump(format!("{name}|{path}"), CounterKind::CoarseSuccess);
                    }
                } else {
                    self.bump(strict_fingerprint(&name, &args, class), CounterKind::Strict);
                    self.bump(coarse_fingerprint(&name, class), CounterKind::Coarse);
                    if class == ErrorClass::Validation {
                        self.bump(
                            coarse_fingerprint(&name, class),
                            CounterKind::CoarseValidation,
                        );
                    }
                }
            }
        }
    }

    /// Evaluates a new call against the failure/success counters. The error
    /// class is resolved from the prior-result index: call-id match, then
    /// per-tool latest, then global latest, then `unknown` (promoted to
    /// `success` for read-only tools).
    pub fn check_call(
        &mut self,
        name: &str,
        args: &Map<String, Value>,
        call_id: Option<&str>,
        full_file: bool,
    ) -> ToolLoopDecision {
        let name = name.to_lowercase();
        let class = call_id
            .and_then(|id| self.prior_by_call_id.get(id).copied())
            .or_else(|| self.latest_by_tool.get(&name).copied())
            .or(self.latest_global)
            .unwrap_or(ErrorClass::Unknown);
        let class = promote_for_tool(&name, class);

        if class == ErrorClass::Success {
            let sig = Self::success_key(&name, args);
            let count = self.bump(sig.clone(), CounterKind::Success);
            let coarse = full_file
                .then(|| args.get("path").and_then(Value::as_str))
                .flatten()
                .map(|path| {
                    let key = format!("{name}|{path}");
                    (key.clone(), self.bump(key, CounterKind::CoarseSuccess))
                });
            return self.decide(sig, count, coarse, class);
        }

        let strict = strict_fingerprint(&name, args, class);
        let coarse = coarse_fingerprint(&name, class);
        let strict_count = self.bump(strict.clone(), CounterKind::Strict);
        let coarse_count = self.bump(coarse.clone(), CounterKind::Coarse);
        self.decide(strict, strict_count, Some((coarse, coarse_count)), class)
    }

    /// Evaluates a schema-invalid call against the validation counters, keyed
    /// by the sorted missing/type-error signature.
    pub fn check_validation(
        &mut self,
        name: &str,
        missing: &[String],
        type_errors: &[TypeError],
    ) -> ToolLoopDecision {
        let name = name.to_lowercase();
        let strict = validation_signature(&name, missing, type_errors);
        let coarse = coarse_fingerprint(&name, ErrorClass::Validation);
        let strict_count = self.bump(strict.clone(), CounterKind::StrictValidation);
        let coarse_count = self.bump(coarse.clone(), CounterKind::CoarseValidation);
        self.decide(
            strict,
            strict_count,
            Some((coarse, coarse_count)),
            ErrorClass::Validation,
        )
    }

    /// Clears a coarse counter so the legacy path gets a fresh budget after
    /// an auto-fallback switch.
    pub fn reset_fingerprint(&mut self, fingerprint: &str) {
        self.coarse_failure.remove(fingerprint);
        self.coarse_validation.remove(fingerprint);
    }

    pub fn max_repeat(&self) -> u32 {
        self.max_repeat
    }

    /// Prefers the strict fingerprint; reports the coarse one only when it
    /// alone triggered, so telemetry stays legible.
    fn decide(
        &self,
        strict: String,
        strict_count: u32,
        coarse: Option<(String, u32)>,
        class: ErrorClass,
    ) -> ToolLoopDecision {
        let strict_triggered = strict_count > self.max_repeat;
        let coarse_triggered = coarse
            .as_ref()
            .is_some_and(|(_, count)| *count > self.max_repeat);
        let (fingerprint, repeat_count) = if !strict_triggered && coarse_triggered {
            let (key, count) = coarse.unwrap();
            (key, count)
        } else {
            (strict, strict_count)
        };
        ToolLoopDecision {
            fingerprint,
            repeat_count,
            max_repeat: self.max_repeat,
            error_class: class,
            triggered: strict_triggered || coarse_triggered,
            tracked: true,
        }
    }

    fn success_key(name: &str, args: &Map<String, Value>) -> String {
        value_signature(name, args)
    }

    fn bump(&mut self, key: String, kind: CounterKind) -> u32 {
        let counters = match kind {
            CounterKind::Strict => &mut self.strict_failure,
            CounterKind::Coarse => &mut self.coarse_failure,
            CounterKind::StrictValidation => &mut self.strict_validation,
            CounterKind::CoarseValidation => &mut self.coarse_validation,
            CounterKind::Success => &mut self.success,
            CounterKind::CoarseSuccess => &mut self.coarse_success,
        };
        let entry = counters.entry(key).or_insert(0);
        *entry += 1;
        *entry
    }
}

enum CounterKind {
    Strict,
    Coarse,
    StrictValidation,
    CoarseValidation,
    Success,
    CoarseSuccess,
}

/// Path of a full-file replacement for the coarse success counter: only
/// `edit` (with an empty/absent `old_string`) and `write` qualify.
fn full_file_path<'a>(name: &str, args: &'a Map<String, Value>) -> Option<&'a str> {
    let path = args.get("path").and_then(Value::as_str)?;
    match name {
        "write" => Some(path),
        "edit" => {
            let old_empty = match args.get("old_string") {
                None => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(_) => false,
            };
            old_empty.then_some(path)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::{InterceptedToolCall, MessageContent};
    use serde_json::json;

    fn assistant_with_call(id: &str, name: &str, arguments: &str) -> ChatMessage {
        ChatMessage {
            role: "assistant".into(),
            content: None,
            tool_calls: Some(vec![InterceptedToolCall::function(
                id,
                name,
                arguments.to_string(),
            )]),
            tool_call_id: None,
            name: None,
        }
    }

    fn tool_reply(id: &str, text: &str) -> ChatMessage {
        ChatMessage {
            role: "tool".into(),
            content: Some(MessageContent::String(text.into())),
            tool_calls: None,
            tool_call_id: Some(id.into()),
            name: None,
        }
    }

    fn args(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    /// **Scenario**: k identical failing calls in history; the next identical
    /// call triggers iff k + 1 > max_repeat.
    #[test]
    fn seeded_failures_trigger_at_threshold() {
        for (k, should_trigger) in [(1usize, false), (2, true), (3, true)] {
            let mut messages = Vec::new();
            for i in 0..k {
                let id = format!("c{i}");
                messages.push(assistant_with_call(&id, "edit", "{\"path\":\"F.md\"}"));
                messages.push(tool_reply(&id, "ENOENT: no such file"));
            }
            let mut guard = ToolLoopGuard::seeded(2, &messages);
            let dec = guard.check_call("edit", &args(json!({"path": "F.md"})), None, false);
            assert_eq!(dec.triggered, should_trigger, "k = {k}");
            assert_eq!(dec.error_class, ErrorClass::NotFound);
        }
    }

    #[test]
    fn validation_history_counts_toward_validation_evaluator() {
        let mut messages = Vec::new();
        for i in 0..3 {
            let id = format!("c{i}");
            messages.push(assistant_with_call(
                &id,
                "edit",
                "{\"path\":\"F.md\",\"content\":\"x\"}",
            ));
            messages.push(tool_reply(
                &id,
                "Invalid arguments: missing required field path",
            ));
        }
        let mut guard = ToolLoopGuard::seeded(2, &messages);
        let dec = guard.check_validation("edit", &["path".to_string()], &[]);
        assert!(dec.triggered);
        assert_eq!(dec.error_class, ErrorClass::Validation);
    }

    #[test]
    fn repeated_identical_success_triggers_silently_countable() {
        let mut guard = ToolLoopGuard::new(2);
        let mut messages = Vec::new();
        for i in 0..3 {
            let id = format!("b{i}");
            messages.push(assistant_with_call(&id, "bash", "{\"command\":\"ls\"}"));
            messages.push(tool_reply(&id, "src\nCargo.toml"));
        }
        guard.seed_from_messages(&messages);
        // Read-only promotion: unknown replies count as success.
        let dec = guard.check_call("bash", &args(json!({"command": "ls"})), None, false);
        assert!(dec.triggered);
        assert_eq!(dec.error_class, ErrorClass::Success);
    }

    #[test]
    fn different_args_do_not_share_success_counts() {
        let mut guard = ToolLoopGuard::new(2);
        for cmd in ["ls", "pwd", "whoami", "date"] {
            let dec = guard.check_call(
                "bash",
                &args(json!({"command": cmd})),
                None,
                false,
            );
            assert!(!dec.triggered, "cmd {cmd}");
        }
    }

    #[test]
    fn full_file_writes_to_same_path_share_coarse_success() {
        let mut guard = ToolLoopGuard::new(2);
        guard.latest_by_tool.insert("write".into(), ErrorClass::Success);
        for (i, body) in ["a", "b", "c"].iter().enumerate() {
            let dec = guard.check_call(
                "write",
                &args(json!({"path": "TODO.md", "content": body})),
                None,
                true,
            );
            assert_eq!(dec.triggered, i == 2, "iteration {i}");
        }
    }

    #[test]
    fn per_tool_latest_class_wins_over_global() {
        let messages = vec![
            assistant_with_call("c1", "edit", "{\"path\":\"a\"}"),
            tool_reply("c1", "EACCES: permission denied"),
            assistant_with_call("c2", "bash", "{\"command\":\"ls\"}"),
            tool_reply("c2", "ok output"),
        ];
        let mut guard = ToolLoopGuard::seeded(2, &messages);
        let dec = guard.check_call("edit", &args(json!({"path": "a"})), None, false);
        assert_eq!(dec.error_class, ErrorClass::Permission);
    }

    #[test]
    fn call_id_match_is_most_specific() {
        let messages = vec![
            assistant_with_call("c1", "edit", "{\"path\":\"a\"}"),
            tool_reply("c1", "timed out"),
            assistant_with_call("c2", "edit", "{\"path\":\"a\"}"),
            tool_reply("c2", "EACCES: permission denied"),
        ];
        let mut guard = ToolLoopGuard::seeded(3, &messages);
        let dec = guard.check_call("edit", &args(json!({"path": "a"})), Some("c1"), false);
        assert_eq!(dec.error_class, ErrorClass::Timeout);
    }

    #[test]
    fn coarse_fingerprint_reported_when_only_coarse_triggers() {
        let mut guard = ToolLoopGuard::new(2);
        guard.latest_by_tool.insert("edit".into(), ErrorClass::ToolError);
        for path in ["a", "b", "c"] {
            guard.check_call("edit", &args(json!({"path": path, "n": path.len()})), None, false);
        }
        // Shapes are equal here, so strict also accumulates; force coarse-only
        // by varying the shape.
        let dec = guard.check_call(
            "edit",
            &args(json!({"path": "d", "other": true})),
            None,
            false,
        );
        assert!(dec.triggered);
        assert_eq!(dec.fingerprint, "edit|tool_error");
    }

    #[test]
    fn reset_fingerprint_clears_coarse_budget() {
        let mut guard = ToolLoopGuard::new(1);
        guard.latest_by_tool.insert("read".into(), ErrorClass::NotFound);
        guard.check_call("read", &args(json!({"path": "a"})), None, false);
        let dec = guard.check_call("read", &args(json!({"path": "b", "x": 1})), None, false);
        assert!(dec.triggered, "coarse budget exhausted before reset");
        guard.reset_fingerprint("read|not_found");
        let dec = guard.check_call("read", &args(json!({"q": true})), None, false);
        assert!(!dec.triggered);
    }
}
