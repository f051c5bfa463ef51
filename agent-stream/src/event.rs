//! Upstream event types: one parsed line of the agent's stream-JSON output.
//!
//! Recognized `type` values: `assistant`, `thinking`, `tool_call`, `result`.
//! Anything else (including malformed JSON) is ignored by [`parse_event`].

use serde_json::{Map, Value};

/// One upstream event. Fields the daemon does not recognize are dropped at parse time.
#[derive(Clone, Debug, PartialEq)]
pub enum AgentEvent {
    Assistant(AssistantEvent),
    Thinking(ThinkingEvent),
    ToolCall(ToolCallEvent),
    TurnResult(TurnResultEvent),
}

/// `assistant` event: text and thinking parts flattened out of `message.content`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssistantEvent {
    pub text: String,
    pub thinking: String,
    /// Set when the event carried `timestamp_ms`, marking a partial emission.
    pub partial: bool,
}

/// `thinking` event with `subtype: "delta"`.
#[derive(Clone, Debug, PartialEq)]
pub struct ThinkingEvent {
    pub text: String,
}

/// Lifecycle phase of a `tool_call` event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolCallPhase {
    Started,
    Completed,
}

/// `tool_call` event. The payload is a singleton map
/// `{ <toolNameToken>: { args, result? } }`; extraction of the name and
/// arguments is the provider boundary's job, so the map is kept raw here.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolCallEvent {
    pub phase: ToolCallPhase,
    pub call_id: Option<String>,
    pub payload: Map<String, Value>,
}

impl ToolCallEvent {
    /// First key of the payload map (the tool name token, e.g. `readToolCall`).
    pub fn name_token(&self) -> Option<&str> {
        self.payload.keys().next().map(String::as_str)
    }

    /// Body under the first key.
    pub fn body(&self) -> Option<&Value> {
        self.payload.values().next()
    }

    /// `args` object under the first key, when present.
    pub fn args(&self) -> Option<&Value> {
        self.body().and_then(|b| b.get("args"))
    }

    /// `result` under the first key, when present (completed calls).
    pub fn result(&self) -> Option<&Value> {
        self.body().and_then(|b| b.get("result"))
    }
}

/// Turn terminator subtype of a `result` event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultKind {
    Success,
    Cancelled,
    Error,
    Failure,
    Refused,
}

/// `result` event: ends the turn.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnResultEvent {
    pub kind: ResultKind,
    /// Final text or error message when the upstream includes one.
    pub text: Option<String>,
}

/// Parses one line of upstream output. Returns `None` for malformed JSON,
/// unknown `type` values, and unrecognized subtypes.
pub fn parse_event(line: &str) -> Option<AgentEvent> {
    let value: Value = serde_json::from_str(line.trim()).ok()?;
    let ty = value.get("type")?.as_str()?;
    match ty {
        "assistant" => parse_assistant(&value).map(AgentEvent::Assistant),
        "thinking" => parse_thinking(&value).map(AgentEvent::Thinking),
        "tool_call" => parse_tool_call(&value).map(AgentEvent::ToolCall),
        "result" => parse_result(&value).map(AgentEvent::TurnResult),
        _ => None,
    }
}

fn parse_assistant(value: &Value) -> Option<AssistantEvent> {
    let mut ev = AssistantEvent {
        partial: value.get("timestamp_ms").is_some(),
        ..Default::default()
    };
    let parts = value.get("message")?.get("content")?.as_array()?;
    for part in parts {
        match part.get("type").and_then(Value::as_str) {
            Some("text") => {
                if let Some(t) = part.get("text").and_then(Value::as_str) {
                    ev.text.push_str(t);
                }
            }
            Some("thinking") => {
                let t = part
                    .get("thinking")
                    .or_else(|| part.get("text"))
                    .and_then(Value::as_str);
                if let Some(t) = t {
                    ev.thinking.push_str(t);
                }
            }
            _ => {}
        }
    }
    Some(ev)
}

fn parse_thinking(value: &Value) -> Option<ThinkingEvent> {
    match value.get("subtype").and_then(Value::as_str) {
        Some("delta") | None => {}
        Some(_) => return None,
    }
    let text = value.get("text")?.as_str()?.to_string();
    Some(ThinkingEvent { text })
}

fn parse_tool_call(value: &Value) -> Option<ToolCallEvent> {
    let phase = match value.get("subtype").and_then(Value::as_str) {
        Some("started") => ToolCallPhase::Started,
        Some("completed") => ToolCallPhase::Completed,
        _ => return None,
    };
    let call_id = value
        .get("call_id")
        .or_else(|| value.get("tool_call_id"))
        .and_then(Value::as_str)
        .map(String::from);
    let payload = value
        .get("tool_call")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    Some(ToolCallEvent {
        phase,
        call_id,
        payload,
    })
}

fn parse_result(value: &Value) -> Option<TurnResultEvent> {
    let kind = match value.get("subtype").and_then(Value::as_str) {
        Some("success") => ResultKind::Success,
        Some("cancelled") => ResultKind::Cancelled,
        Some("error") => ResultKind::Error,
        Some("failure") => ResultKind::Failure,
        Some("refused") => ResultKind::Refused,
        _ => return None,
    };
    let text = value
        .get("result")
        .or_else(|| value.get("error"))
        .and_then(Value::as_str)
        .map(String::from);
    Some(TurnResultEvent { kind, text })
}
