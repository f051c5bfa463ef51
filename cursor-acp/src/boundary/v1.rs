//! V1 boundary: strict extraction.
//!
//! Malformed tool_call payloads raise [`BoundaryError`] instead of being
//! skipped, so the per-request context can fall back to legacy and the bad
//! shape shows up in telemetry instead of disappearing.

use super::{event_tool_name, BoundaryError, ProviderBoundary};
use crate::openai::InterceptedToolCall;
use agent_stream::ToolCallEvent;
use env_config::{BoundaryMode, ToolLoopMode};
use serde_json::Value;
use std::collections::HashSet;

pub struct V1Boundary;

impl ProviderBoundary for V1Boundary {
    fn mode(&self) -> BoundaryMode {
        BoundaryMode::V1
    }

    fn maybe_extract_tool_call(
        &self,
        event: &ToolCallEvent,
        allowed: &HashSet<String>,
        mode: ToolLoopMode,
    ) -> Result<Option<InterceptedToolCall>, BoundaryError> {
        if mode != ToolLoopMode::Opencode {
            return Ok(None);
        }
        if event.payload.is_empty() {
            return Err(BoundaryError::Extraction(
                "tool_call payload is empty".to_string(),
            ));
        }
        if event.payload.len() > 1 {
            return Err(BoundaryError::Extraction(format!(
                "tool_call payload is not a singleton map ({} entries)",
                event.payload.len()
            )));
        }
        let Some(name) = event_tool_name(event) else {
            return Ok(None);
        };
        let body = event.body().cloned().unwrap_or(Value::Null);
        if !body.is_object() {
            return Err(BoundaryError::Extraction(format!(
                "tool_call body for \"{name}\" is not an object"
            )));
        }
        let args = match body.get("args") {
            None => Value::Object(Default::default()),
            Some(v @ Value::Object(_)) => v.clone(),
            Some(other) => {
                return Err(BoundaryError::Extraction(format!(
                    "tool_call args for \"{name}\" is {}, expected object",
                    match other {
                        Value::Array(_) => "an array",
                        Value::String(_) => "a string",
                        _ => "not an object",
                    }
                )))
            }
        };
        if !allowed.contains(&name) {
            return Ok(None);
        }
        let id = event.call_id.clone().unwrap_or_else(|| "unknown".to_string());
        Ok(Some(InterceptedToolCall::function(id, name, args.to_string())))
    }
}
