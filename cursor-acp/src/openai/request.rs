//! Chat completion request DTOs.
//!
//! Message `content` can be a string or an array of parts (multimodal); both
//! are accepted. `worktree`, `directory`, and `session_id` are extension
//! fields the editor host sends for workspace resolution.

use super::InterceptedToolCall;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Chat completion request body (OpenAI-compatible).
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionRequest {
    /// Model id, optionally provider-prefixed ("cursor/gpt-5").
    #[serde(default)]
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub stream: bool,
    /// Caller-declared tool definitions; drives interception and validation.
    #[serde(default)]
    pub tools: Option<Vec<ToolDef>>,
    /// Workspace hint: the caller's git worktree (extension).
    #[serde(default)]
    pub worktree: Option<String>,
    /// Workspace hint: the caller's project directory (extension).
    #[serde(default)]
    pub directory: Option<String>,
    /// Session id for workspace pinning across requests (extension).
    #[serde(default)]
    pub session_id: Option<String>,
}

/// A single message in the chat request.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    /// "system", "user", "assistant", or "tool".
    pub role: String,
    pub content: Option<MessageContent>,
    /// Tool calls on assistant messages.
    #[serde(default)]
    pub tool_calls: Option<Vec<InterceptedToolCall>>,
    /// Id linking a `role: "tool"` message to the call it answers.
    #[serde(default)]
    pub tool_call_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl ChatMessage {
    pub fn content_text(&self) -> String {
        self.content.as_ref().map(MessageContent::as_text).unwrap_or_default()
    }
}

/// Message content: plain string or array of parts (OpenAI multimodal).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    String(String),
    Array(Vec<ContentPart>),
}

impl MessageContent {
    /// The string variant as-is, or the concatenation of all `text` fields
    /// from array parts. Non-text parts are skipped.
    pub fn as_text(&self) -> String {
        match self {
            MessageContent::String(s) => s.clone(),
            MessageContent::Array(parts) => parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

/// One part of a multimodal content array.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub part_type: Option<String>,
    pub text: Option<String>,
}

/// One caller-declared tool.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolDef {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDef,
}

/// Function payload of a tool definition; `parameters` is a JSON Schema.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Option<Value>,
}

/// Declared tool schemas for one request, keyed by lowercased tool name.
#[derive(Debug, Clone, Default)]
pub struct ToolSchemas {
    schemas: HashMap<String, Value>,
}

impl ToolSchemas {
    pub fn from_tools(tools: Option<&[ToolDef]>) -> Self {
        let mut schemas = HashMap::new();
        for tool in tools.unwrap_or_default() {
            if let Some(params) = tool.function.parameters.clone() {
                schemas.insert(tool.function.name.to_lowercase(), params);
            }
        }
        Self { schemas }
    }

    /// The declared parameter schema for a tool, if any.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schemas.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(&name.to_lowercase())
    }
}
