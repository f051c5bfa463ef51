//! Non-streaming chat completion and model list DTOs.

use super::{InterceptedToolCall, ResponseMeta};
use serde::Serialize;

/// A complete (non-streaming) chat completion (object: "chat.completion").
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletion {
    pub id: String,
    pub object: &'static str,
    pub created: u64,
    pub model: String,
    pub choices: Vec<Choice>,
}

impl ChatCompletion {
    pub const OBJECT: &'static str = "chat.completion";

    /// Text completion with optional reasoning, `finish_reason: "stop"`.
    pub fn text(meta: &ResponseMeta, content: String, reasoning: Option<String>) -> Self {
        Self::single(
            meta,
            ResponseMessage {
                role: "assistant",
                content: Some(content),
                reasoning_content: reasoning,
                tool_calls: None,
            },
            "stop",
        )
    }

    /// Tool-call completion: `content` null, one call, `finish_reason: "tool_calls"`.
    pub fn tool_call(meta: &ResponseMeta, call: InterceptedToolCall) -> Self {
        Self::single(
            meta,
            ResponseMessage {
                role: "assistant",
                content: None,
                reasoning_content: None,
                tool_calls: Some(vec![call]),
            },
            "tool_calls",
        )
    }

    fn single(meta: &ResponseMeta, message: ResponseMessage, finish_reason: &str) -> Self {
        Self {
            id: meta.id.clone(),
            object: Self::OBJECT,
            created: meta.created,
            model: meta.model.clone(),
            choices: vec![Choice {
                index: 0,
                message,
                finish_reason: Some(finish_reason.to_string()),
            }],
        }
    }
}

/// One choice of a chat completion.
#[derive(Debug, Clone, Serialize)]
pub struct Choice {
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

/// The assistant message of a completion. `content` is serialized even when
/// null so tool-call responses carry an explicit `"content": null`.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseMessage {
    pub role: &'static str,
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<InterceptedToolCall>>,
}

/// One entry of the `/v1/models` list.
#[derive(Debug, Clone, Serialize)]
pub struct ModelEntry {
    pub id: &'static str,
    pub object: &'static str,
    pub created: u64,
    pub owned_by: &'static str,
}
