//! Legacy boundary: permissive extraction.

use super::{event_tool_name, BoundaryError, ProviderBoundary};
use crate::openai::InterceptedToolCall;
use agent_stream::ToolCallEvent;
use env_config::{BoundaryMode, ToolLoopMode};
use serde_json::Value;
use std::collections::HashSet;

/// The long-standing extraction behavior: malformed payloads are skipped, a
/// multi-entry payload uses its first entry.
pub struct LegacyBoundary;

impl ProviderBoundary for LegacyBoundary {
    fn mode(&self) -> BoundaryMode {
        BoundaryMode::Legacy
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
        let Some(name) = event_tool_name(event) else {
            return Ok(None);
        };
        if !allowed.contains(&name) {
            return Ok(None);
        }
        let args = event
            .args()
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()));
        let id = event.call_id.clone().unwrap_or_else(|| "unknown".to_string());
        Ok(Some(InterceptedToolCall::function(id, name, args.to_string())))
    }
}
