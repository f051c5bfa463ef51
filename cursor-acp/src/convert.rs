//! Upstream events to OpenAI streaming deltas.
//!
//! The converter owns one [`DeltaTracker`] per channel (text, reasoning) so
//! cumulative re-emissions from the upstream ("Hello", then "Hello world")
//! become incremental deltas (" world"). It is purely functional given its
//! tracker state: it never kills the upstream or changes pipeline flow.

use crate::openai::{
    ChatCompletionChunk, Delta, DeltaToolCall, DeltaToolCallFunction, ResponseMeta,
};
use agent_stream::{AgentEvent, ToolCallEvent};

/// Turns a sequence of text emissions into incremental deltas.
///
/// Cumulative emissions go through [`next`](DeltaTracker::next); fragment
/// emissions (the upstream's `timestamp_ms`-flagged partials) through
/// [`append`](DeltaTracker::append). Either way [`total`](DeltaTracker::total)
/// is the full text seen so far.
#[derive(Debug, Default)]
pub struct DeltaTracker {
    seen: String,
}

impl DeltaTracker {
    /// Feeds a cumulative emission; returns the unseen suffix, or `None` when
    /// there is nothing new. Empty input is a no-op (events often carry only
    /// one of text/thinking). Text that does not extend the seen prefix
    /// resets the tracker and is emitted whole.
    pub fn next(&mut self, text: &str) -> Option<String> {
        if text.is_empty() || text == self.seen {
            return None;
        }
        if let Some(delta) = text.strip_prefix(self.seen.as_str()) {
            let delta = delta.to_string();
            self.seen = text.to_string();
            return (!delta.is_empty()).then_some(delta);
        }
        self.seen = text.to_string();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Feeds a fragment emission; appends and echoes it.
    pub fn append(&mut self, text: &str) -> Option<String> {
        if text.is_empty() {
            return None;
        }
        self.seen.push_str(text);
        Some(text.to_string())
    }

    /// Full text accumulated so far.
    pub fn total(&self) -> &str {
        &self.seen
    }
}

/// Stream-to-SSE converter for one request.
pub struct EventConverter {
    meta: ResponseMeta,
    text: DeltaTracker,
    reasoning: DeltaTracker,
    sent_role: bool,
}

impl EventConverter {
    pub fn new(meta: ResponseMeta) -> Self {
        Self {
            meta,
            text: DeltaTracker::default(),
            reasoning: DeltaTracker::default(),
            sent_role: false,
        }
    }

    pub fn meta(&self) -> &ResponseMeta {
        &self.meta
    }

    /// Concatenated assistant text seen so far.
    pub fn text_total(&self) -> &str {
        self.text.total()
    }

    /// Concatenated reasoning text seen so far.
    pub fn reasoning_total(&self) -> &str {
        self.reasoning.total()
    }

    /// Feeds one event; returns zero or more chunks to emit.
    ///
    /// Tool-call events produce a forwarded tool-call chunk here only when the
    /// pipeline decides to forward them; `result` events produce nothing (the
    /// pipeline emits the finish chunk itself).
    pub fn feed(&mut self, event: &AgentEvent) -> Vec<ChatCompletionChunk> {
        let mut chunks = Vec::new();
        match event {
            AgentEvent::Assistant(ev) => {
                let text_delta = if ev.partial {
                    self.text.append(&ev.text)
                } else {
                    self.text.next(&ev.text)
                };
                let thinking_delta = if ev.partial {
                    self.reasoning.append(&ev.thinking)
                } else {
                    self.reasoning.next(&ev.thinking)
                };
                if let Some(delta) = thinking_delta {
                    chunks.push(self.delta_chunk(Delta {
                        reasoning_content: Some(delta),
                        ..Default::default()
                    }));
                }
                if let Some(delta) = text_delta {
                    chunks.push(self.delta_chunk(Delta {
                        content: Some(delta),
                        ..Default::default()
                    }));
                }
            }
            AgentEvent::Thinking(ev) => {
                if let Some(delta) = self.reasoning.append(&ev.text) {
                    chunks.push(self.delta_chunk(Delta {
                        reasoning_content: Some(delta),
                        ..Default::default()
                    }));
                }
            }
            AgentEvent::ToolCall(ev) => {
                chunks.push(self.tool_call_chunk(ev));
            }
            AgentEvent::TurnResult(_) => {}
        }
        chunks
    }

    /// Forwarded (non-intercepted) tool-call chunk: index 0, id from the
    /// event (or "unknown"), name from the singleton key with a trailing
    /// `ToolCall` stripped, full arguments as one JSON string.
    pub fn tool_call_chunk(&mut self, ev: &ToolCallEvent) -> ChatCompletionChunk {
        let name = ev
            .name_token()
            .map(strip_tool_call_suffix)
            .unwrap_or_default();
        let arguments = ev
            .args()
            .map(|a| a.to_string())
            .unwrap_or_else(|| "{}".to_string());
        let delta = Delta {
            tool_calls: Some(vec![DeltaToolCall {
                index: 0,
                id: Some(ev.call_id.clone().unwrap_or_else(|| "unknown".to_string())),
                call_type: Some("function".to_string()),
                function: Some(DeltaToolCallFunction {
                    name: Some(name),
                    arguments: Some(arguments),
                }),
            }]),
            ..Default::default()
        };
        self.delta_chunk(delta)
    }

    /// Plain content chunk (schema hints, rendered errors).
    pub fn content_chunk(&mut self, text: &str) -> ChatCompletionChunk {
        self.delta_chunk(Delta {
            content: Some(text.to_string()),
            ..Default::default()
        })
    }

    /// Terminal chunk: empty delta with the given finish_reason.
    pub fn finish_chunk(&self, finish_reason: &str) -> ChatCompletionChunk {
        ChatCompletionChunk::single(&self.meta, Delta::default(), Some(finish_reason.to_string()))
    }

    fn delta_chunk(&mut self, mut delta: Delta) -> ChatCompletionChunk {
        if !self.sent_role {
            self.sent_role = true;
            delta.role = Some("assistant".to_string());
        }
        ChatCompletionChunk::single(&self.meta, delta, None)
    }
}

/// Strips a trailing `ToolCall` token (case-insensitive) and lowercases:
/// `readToolCall` → `read`.
pub fn strip_tool_call_suffix(token: &str) -> String {
    let lower = token.to_lowercase();
    lower
        .strip_suffix("toolcall")
        .filter(|s| !s.is_empty())
        .unwrap_or(&lower)
        .to_string()
}
