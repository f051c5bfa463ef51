//! Provider boundary: the seam for policies that may be revised.
//!
//! Every decision whose rule could change between the legacy and v1 paths
//! goes through [`ProviderBoundary`]. The two impls agree on everything the
//! parity invariant covers; v1 is stricter about malformed tool_call payloads
//! and raises [`BoundaryError`] where legacy shrugs, which is what the
//! per-request auto-fallback in [`BoundaryContext`] exists for.

mod legacy;
mod runtime;
mod v1;

pub use legacy::LegacyBoundary;
pub use runtime::BoundaryContext;
pub use v1::V1Boundary;

use crate::convert::strip_tool_call_suffix;
use crate::models::PROVIDER_ID;
use crate::openai::{
    ChatCompletion, ChatCompletionChunk, Delta, DeltaToolCall, DeltaToolCallFunction,
    InterceptedToolCall, ResponseMeta,
};
use agent_stream::ToolCallEvent;
use env_config::{BoundaryMode, ToolLoopMode};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Error raised by a boundary method; triggers the single-shot legacy fallback.
#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("tool boundary extraction: {0}")]
    Extraction(String),
}

/// How caller-supplied tool definitions relate to internally refreshed ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolParamAction {
    /// Keep the caller's definitions.
    Preserve,
    /// No caller definitions; fall back to the refreshed set.
    Fallback,
    /// Replace the caller's definitions with the refreshed set.
    Override,
    /// Pass nothing.
    None,
}

/// Result of [`ProviderBoundary::resolve_chat_param_tools`].
#[derive(Clone, Debug, PartialEq)]
pub struct ToolParamResolution {
    pub action: ToolParamAction,
    pub tools: Option<Value>,
}

/// Per-request interception flags derived from the tool-loop mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ToolLoopFlags {
    pub proxy_execute_tool_calls: bool,
    pub suppress_converter_tool_events: bool,
    pub should_emit_tool_updates: bool,
}

/// Policy carrier with modes legacy and v1.
///
/// Methods are pure; the process-wide boundary value is read concurrently.
/// Most rules are shared (and must stay in parity); only extraction differs.
pub trait ProviderBoundary: Send + Sync {
    fn mode(&self) -> BoundaryMode;

    /// Decides whether caller-supplied tool definitions pass through or are
    /// replaced by the internally refreshed set.
    fn resolve_chat_param_tools(
        &self,
        mode: ToolLoopMode,
        existing: Option<&Value>,
        refreshed: Option<&Value>,
    ) -> ToolParamResolution {
        resolve_chat_param_tools_rule(mode, existing, refreshed)
    }

    /// Flags for the interception pipeline by tool-loop mode.
    fn compute_tool_loop_flags(&self, mode: ToolLoopMode, forward: bool, emit: bool) -> ToolLoopFlags {
        compute_tool_loop_flags_rule(mode, forward, emit)
    }

    /// True when the input names this provider under any of the accepted keys.
    fn matches_provider(&self, input: &Value) -> bool {
        matches_provider_rule(input)
    }

    /// Strips the provider prefix from a model id; empty becomes "auto".
    fn normalize_runtime_model(&self, model: &str) -> String {
        normalize_runtime_model_rule(model)
    }

    /// Points `baseURL` at the daemon and defaults `apiKey` when unset.
    fn apply_chat_param_defaults(
        &self,
        output: &mut Value,
        proxy_base: &str,
        fallback_base: &str,
        default_api_key: &str,
    ) {
        apply_chat_param_defaults_rule(output, proxy_base, fallback_base, default_api_key)
    }

    /// Extracts an interceptable call from a tool_call event: only in
    /// `opencode` mode, and only when the singleton tool name (after
    /// `*ToolCall` suffix stripping, case-insensitive) is allowed.
    fn maybe_extract_tool_call(
        &self,
        event: &ToolCallEvent,
        allowed: &HashSet<String>,
        mode: ToolLoopMode,
    ) -> Result<Option<InterceptedToolCall>, BoundaryError>;

    /// Final non-streaming payload for an intercepted call.
    fn create_non_stream_tool_call_response(
        &self,
        meta: &ResponseMeta,
        call: &InterceptedToolCall,
    ) -> ChatCompletion {
        ChatCompletion::tool_call(meta, call.clone())
    }

    /// Final streaming payload for an intercepted call: the tool_calls delta,
    /// then an empty delta with `finish_reason: "tool_calls"`.
    fn create_stream_tool_call_chunks(
        &self,
        meta: &ResponseMeta,
        call: &InterceptedToolCall,
    ) -> Vec<ChatCompletionChunk> {
        create_stream_tool_call_chunks_rule(meta, call)
    }
}

pub(crate) fn resolve_chat_param_tools_rule(
    mode: ToolLoopMode,
    existing: Option<&Value>,
    refreshed: Option<&Value>,
) -> ToolParamResolution {
    let existing = existing.filter(|v| !v.is_null());
    let refreshed = refreshed.filter(|v| !v.is_null());
    let (action, tools) = match mode {
        ToolLoopMode::ProxyExec => match refreshed {
            Some(r) => (ToolParamAction::Override, Some(r.clone())),
            None => (ToolParamAction::None, None),
        },
        ToolLoopMode::Opencode => match (existing, refreshed) {
            (Some(e), _) => (ToolParamAction::Preserve, Some(e.clone())),
            (None, Some(r)) => (ToolParamAction::Fallback, Some(r.clone())),
            (None, None) => (ToolParamAction::None, None),
        },
        ToolLoopMode::Off => (ToolParamAction::None, None),
    };
    ToolParamResolution { action, tools }
}

pub(crate) fn compute_tool_loop_flags_rule(
    mode: ToolLoopMode,
    forward: bool,
    emit: bool,
) -> ToolLoopFlags {
    if mode != ToolLoopMode::ProxyExec {
        return ToolLoopFlags::default();
    }
    ToolLoopFlags {
        proxy_execute_tool_calls: forward,
        suppress_converter_tool_events: !forward,
        should_emit_tool_updates: emit,
    }
}

pub(crate) fn matches_provider_rule(input: &Value) -> bool {
    ["providerID", "providerId", "provider"].iter().any(|key| {
        input
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|v| v.eq_ignore_ascii_case(PROVIDER_ID))
    })
}

pub(crate) fn normalize_runtime_model_rule(model: &str) -> String {
    let prefix = format!("{PROVIDER_ID}/");
    let stripped = model.strip_prefix(prefix.as_str()).unwrap_or(model).trim();
    if stripped.is_empty() {
        "auto".to_string()
    } else {
        stripped.to_string()
    }
}

pub(crate) fn apply_chat_param_defaults_rule(
    output: &mut Value,
    proxy_base: &str,
    fallback_base: &str,
    default_api_key: &str,
) {
    let Some(obj) = output.as_object_mut() else {
        return;
    };
    let base = if proxy_base.is_empty() {
        fallback_base
    } else {
        proxy_base
    };
    obj.insert("baseURL".to_string(), Value::String(base.to_string()));
    let key_missing = matches!(obj.get("apiKey"), None | Some(Value::Null))
        || obj.get("apiKey").and_then(Value::as_str) == Some("");
    if key_missing {
        obj.insert(
            "apiKey".to_string(),
            Value::String(default_api_key.to_string()),
        );
    }
}

pub(crate) fn create_stream_tool_call_chunks_rule(
    meta: &ResponseMeta,
    call: &InterceptedToolCall,
) -> Vec<ChatCompletionChunk> {
    let delta = Delta {
        role: Some("assistant".to_string()),
        tool_calls: Some(vec![DeltaToolCall {
            index: 0,
            id: Some(call.id.clone()),
            call_type: Some("function".to_string()),
            function: Some(DeltaToolCallFunction {
                name: Some(call.function.name.clone()),
                arguments: Some(call.function.arguments.clone()),
            }),
        }]),
        ..Default::default()
    };
    vec![
        ChatCompletionChunk::single(meta, delta, None),
        ChatCompletionChunk::single(meta, Delta::default(), Some("tool_calls".to_string())),
    ]
}

/// Resolves the event's singleton tool name: `readToolCall` → `read`.
pub(crate) fn event_tool_name(event: &ToolCallEvent) -> Option<String> {
    event.name_token().map(strip_tool_call_suffix)
}
