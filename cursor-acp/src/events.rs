//! Callback seam for out-of-band tool reporting.
//!
//! The ACP transport and any other side channel implement [`ToolEventSink`];
//! the pipeline calls it at fixed points. Sink calls never affect intercept
//! decisions or stream ordering.

use crate::boundary::BoundaryError;
use crate::openai::InterceptedToolCall;
use agent_stream::ToolCallEvent;
use serde_json::Value;

/// Receiver for tool-lifecycle notifications emitted by the pipeline.
pub trait ToolEventSink: Send + Sync {
    /// A tool_call event passed through the pipeline (only when tool updates
    /// are enabled for the request).
    fn on_tool_update(&self, _event: &ToolCallEvent) {}

    /// A completed tool_call carried a result payload.
    fn on_tool_result(&self, _call_id: &str, _result: &Value) {}

    /// A call was intercepted and is about to be handed back to the caller.
    fn on_intercepted_tool_call(&self, _call: &InterceptedToolCall) {}

    /// The provider boundary fell back to legacy for the rest of the request.
    fn on_fallback_to_legacy(&self, _error: &BoundaryError) {}
}

/// Default sink: ignores everything.
pub struct NoopToolEventSink;

impl ToolEventSink for NoopToolEventSink {}
