//! Tool-call interception: the per-event decision machine.
//!
//! Runs inside the pipeline for every `tool_call` event. Composes the
//! boundary's extraction, schema-compat, and the loop guard into one action
//! the pipeline executes: forward, skip, hint, intercept, or terminate.

use crate::boundary::{self, BoundaryContext, BoundaryError, ToolLoopFlags};
use crate::events::ToolEventSink;
use crate::loop_guard::{coarse_fingerprint, ErrorClass, ToolLoopDecision, ToolLoopGuard};
use crate::openai::{ChatCompletionRequest, InterceptedToolCall, ToolSchemas};
use crate::schema_compat::{normalize_tool_call, NormalizedCall};
use env_config::{Settings, ToolLoopMode};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Why a termination outcome ended the turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminateReason {
    LoopGuard,
    SchemaValidation,
}

/// Terminal outcome: the pipeline stops the upstream and ends the turn.
#[derive(Debug)]
pub struct Termination {
    pub reason: TerminateReason,
    pub error_class: Option<ErrorClass>,
    /// User-visible diagnostic; empty when `silent`.
    pub message: String,
    /// Success loops end the turn without an error banner.
    pub silent: bool,
    pub decision: Option<ToolLoopDecision>,
}

/// What the pipeline should do with one tool_call event.
#[derive(Debug)]
pub enum InterceptOutcome {
    /// Pass the event to the SSE converter.
    Forward,
    /// Drop the event; the upstream keeps running.
    SkipConverter,
    /// Emit a non-fatal repair hint chunk; the upstream keeps running.
    Hint(String),
    /// Hand the call back to the caller and end the turn.
    Intercepted(InterceptedToolCall),
    Terminate(Termination),
}

/// Per-request interceptor state.
pub struct ToolCallInterceptor {
    mode: ToolLoopMode,
    flags: ToolLoopFlags,
    schemas: ToolSchemas,
    allowed: HashSet<String>,
    guard: ToolLoopGuard,
    boundary: BoundaryContext,
    edit_compat: bool,
    auto_fallback: bool,
    sink: Arc<dyn ToolEventSink>,
}

impl ToolCallInterceptor {
    /// Builds the interceptor for one request: allowed names and schemas from
    /// the declared tools, loop guard seeded from the prior messages.
    pub fn from_request(
        settings: &Settings,
        request: &ChatCompletionRequest,
        sink: Arc<dyn ToolEventSink>,
    ) -> Self {
        let allowed: HashSet<String> = request
            .tools
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|t| t.function.name.to_lowercase())
            .collect();
        let schemas = ToolSchemas::from_tools(request.tools.as_deref());
        let guard = ToolLoopGuard::seeded(settings.tool_loop_max_repeat, &request.messages);
        let boundary = BoundaryContext::new(
            settings.provider_boundary,
            settings.auto_fallback_to_legacy,
        );
        let mode = if settings.force_tool_mode {
            ToolLoopMode::Opencode
        } else {
            settings.tool_loop_mode
        };
        let mut flags = boundary.boundary().compute_tool_loop_flags(
            mode,
            settings.forward_tool_calls,
            settings.emit_tool_updates,
        );
        // In opencode mode the side-channel updates are an explicit opt-in
        // (default off to avoid double reporting).
        if mode == ToolLoopMode::Opencode && settings.emit_tool_updates {
            flags.should_emit_tool_updates = true;
        }
        Self {
            mode,
            flags,
            schemas,
            allowed,
            guard,
            boundary,
            edit_compat: settings.edit_compat_repair,
            auto_fallback: settings.auto_fallback_to_legacy,
            sink,
        }
    }

    pub fn flags(&self) -> ToolLoopFlags {
        self.flags
    }

    pub fn boundary(&self) -> &dyn crate::boundary::ProviderBoundary {
        self.boundary.boundary()
    }

    /// Decides what to do with one tool_call event.
    ///
    /// An unrecoverable boundary error (fallback disabled or exhausted)
    /// propagates; everything else resolves to an [`InterceptOutcome`].
    pub fn handle(
        &mut self,
        event: &agent_stream::ToolCallEvent,
    ) -> Result<InterceptOutcome, BoundaryError> {
        if self.flags.should_emit_tool_updates {
            self.sink.on_tool_update(event);
            if let (Some(id), Some(result)) = (event.call_id.as_deref(), event.result()) {
                self.sink.on_tool_result(id, result);
            }
        }

        let was_fallen_back = self.boundary.fell_back();
        let sink = Arc::clone(&self.sink);
        let (mode, allowed) = (self.mode, &self.allowed);
        let extracted = self
            .boundary
            .run(sink.as_ref(), |b| b.maybe_extract_tool_call(event, allowed, mode))?;
        if !was_fallen_back && self.boundary.fell_back() {
            // Fresh coarse budget for the legacy path.
            if let Some(name) = boundary::event_tool_name(event) {
                self.guard
                    .reset_fingerprint(&coarse_fingerprint(&name, ErrorClass::Validation));
            }
        }

        let Some(call) = extracted else {
            return Ok(if self.flags.suppress_converter_tool_events {
                InterceptOutcome::SkipConverter
            } else {
                InterceptOutcome::Forward
            });
        };

        let args: Value = serde_json::from_str(&call.function.arguments)
            .unwrap_or_else(|_| json!({}));
        let norm = normalize_tool_call(&call.function.name, args, &self.schemas, self.edit_compat);
        debug!(tool = %norm.name, ok = norm.validation.ok, "tool call extracted");

        if let Some(write_call) = self.try_edit_reroute(&call, &norm) {
            self.sink.on_intercepted_tool_call(&write_call);
            return Ok(InterceptOutcome::Intercepted(write_call));
        }

        if norm.validation.has_schema && !norm.validation.ok {
            if let Some(outcome) = self.handle_invalid(&norm) {
                return Ok(outcome);
            }
        }

        let full_file_candidate = matches!(norm.name.as_str(), "edit" | "write");
        let decision = self.guard.check_call(
            &norm.name,
            &norm.args,
            event.call_id.as_deref(),
            full_file_candidate,
        );
        if decision.triggered {
            return Ok(InterceptOutcome::Terminate(loop_guard_termination(
                &norm.name, decision,
            )));
        }

        let intercepted =
            InterceptedToolCall::function(call.id.clone(), norm.name.clone(), norm.arguments_json());
        self.sink.on_intercepted_tool_call(&intercepted);
        Ok(InterceptOutcome::Intercepted(intercepted))
    }

    /// Rewrites a full-file `edit` as a `write` call when the caller declared
    /// a `write` schema: path present, no usable `old_string` in the original
    /// arguments, and a non-empty replacement body.
    fn try_edit_reroute(
        &self,
        call: &InterceptedToolCall,
        norm: &NormalizedCall,
    ) -> Option<InterceptedToolCall> {
        if norm.name != "edit" || !norm.old_string_was_missing {
            return None;
        }
        if !self.schemas.contains("write") {
            return None;
        }
        let path = norm.path()?;
        let body = norm
            .args
            .get("new_string")
            .or_else(|| norm.args.get("content"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())?;
        let rerouted = normalize_tool_call(
            "write",
            json!({"path": path, "content": body}),
            &self.schemas,
            self.edit_compat,
        );
        debug!(path, "rerouting full-file edit to write");
        Some(InterceptedToolCall::function(
            call.id.clone(),
            "write",
            rerouted.arguments_json(),
        ))
    }

    /// Validation branch for a schema-invalid call. `None` means "intercept
    /// anyway and let the caller see the malformed arguments".
    fn handle_invalid(&mut self, norm: &NormalizedCall) -> Option<InterceptOutcome> {
        let decision = self.guard.check_validation(
            &norm.name,
            &norm.validation.missing,
            &norm.validation.type_errors,
        );
        if decision.triggered {
            return Some(InterceptOutcome::Terminate(loop_guard_termination(
                &norm.name, decision,
            )));
        }

        // Auto-fallback treats non-edit schema failures as terminal; edit
        // stays pass-through so the hint (and reroute) get their chance.
        let terminate_mode = self.auto_fallback && norm.name != "edit";
        if terminate_mode {
            let hint = norm.validation.repair_hint.clone().unwrap_or_default();
            return Some(InterceptOutcome::Terminate(Termination {
                reason: TerminateReason::SchemaValidation,
                error_class: Some(ErrorClass::Validation),
                message: format!(
                    "Tool call to \"{}\" failed schema validation. {}",
                    norm.name, hint
                ),
                silent: false,
                decision: None,
            }));
        }

        let repairable_fields = ["old_string", "new_string", "path"];
        let edit_repairable = norm.name == "edit"
            && norm.validation.type_errors.is_empty()
            && norm
                .validation
                .missing
                .iter()
                .all(|m| repairable_fields.contains(&m.as_str()));
        if edit_repairable {
            let hint = norm
                .validation
                .repair_hint
                .clone()
                .unwrap_or_else(|| "Invalid edit arguments.".to_string());
            return Some(InterceptOutcome::Hint(hint));
        }

        None
    }
}

/// Builds the terminal outcome for a triggered loop-guard decision.
fn loop_guard_termination(name: &str, decision: ToolLoopDecision) -> Termination {
    let class = decision.error_class;
    let (message, silent) = match class {
        ErrorClass::Success => (String::new(), true),
        ErrorClass::Validation => (
            format!(
                "Tool loop guard stopped repeated schema-invalid calls to \"{}\" \
                 ({} attempts, limit {}). Fix the arguments before retrying.",
                name, decision.repeat_count, decision.max_repeat
            ),
            false,
        ),
        other => (
            format!(
                "Tool loop guard stopped repeated failing calls to \"{}\" \
                 ({}, {} attempts, limit {}). Try a different approach.",
                name,
                other.as_str(),
                decision.repeat_count,
                decision.max_repeat
            ),
            false,
        ),
    };
    Termination {
        reason: TerminateReason::LoopGuard,
        error_class: Some(class),
        message,
        silent,
        decision: Some(decision),
    }
}
