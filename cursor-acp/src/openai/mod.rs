//! OpenAI-compatible wire DTOs.
//!
//! Field names match the [OpenAI Chat Completions API](https://platform.openai.com/docs/api-reference/chat).
//! Requests are what editor hosts (e.g. opencode) send; responses and chunks
//! are what the daemon emits. No HTTP dependency here.

mod chunk;
mod request;
mod response;

pub use chunk::{ChatCompletionChunk, ChunkChoice, Delta, DeltaToolCall, DeltaToolCallFunction};
pub use request::{
    ChatCompletionRequest, ChatMessage, FunctionDef, MessageContent, ToolDef, ToolSchemas,
};
pub use response::{ChatCompletion, Choice, ModelEntry, ResponseMessage};

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Canonical OpenAI tool-call structure, used both on assistant request
/// messages and in intercepted-call responses.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct InterceptedToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

impl InterceptedToolCall {
    /// Builds a `type: "function"` call with the given name and serialized arguments.
    pub fn function(id: impl Into<String>, name: impl Into<String>, arguments: String) -> Self {
        Self {
            id: id.into(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: name.into(),
                arguments,
            },
        }
    }
}

/// Nested function payload of a tool call: name + arguments as a JSON string.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// Metadata shared by every chunk and the final response of one completion.
#[derive(Clone, Debug)]
pub struct ResponseMeta {
    pub id: String,
    pub created: u64,
    pub model: String,
}

impl ResponseMeta {
    /// Builds metadata with the current time and a fresh `chatcmpl-` id.
    pub fn new(model: impl Into<String>) -> Self {
        let created = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            id: format!("chatcmpl-{}", uuid::Uuid::new_v4()),
            created,
            model: model.into(),
        }
    }
}
