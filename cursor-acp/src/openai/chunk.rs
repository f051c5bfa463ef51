//! Chat completion chunk (streaming response) DTOs.
//!
//! Each SSE frame is `data: <JSON>\n\n` where JSON is a [`ChatCompletionChunk`].
//! Matches [OpenAI streaming](https://platform.openai.com/docs/api-reference/chat-streaming).

use super::ResponseMeta;
use serde::Serialize;

/// A single streamed chunk of a chat completion (object: "chat.completion.chunk").
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionChunk {
    /// Same for all chunks in one stream.
    pub id: String,
    /// Always "chat.completion.chunk".
    pub object: &'static str,
    /// Unix timestamp (seconds) when the completion was created.
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

impl ChatCompletionChunk {
    pub const OBJECT: &'static str = "chat.completion.chunk";

    /// One-choice chunk from shared metadata.
    pub fn single(meta: &ResponseMeta, delta: Delta, finish_reason: Option<String>) -> Self {
        Self {
            id: meta.id.clone(),
            object: Self::OBJECT,
            created: meta.created,
            model: meta.model.clone(),
            choices: vec![ChunkChoice {
                index: 0,
                delta,
                finish_reason,
            }],
        }
    }
}

/// One choice in a streamed chunk.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: Delta,
    /// Null until the final chunk; then "stop" or "tool_calls".
    pub finish_reason: Option<String>,
}

/// Delta content for a streamed chunk.
///
/// First chunk carries the role; content chunks carry content or
/// reasoning_content; the tool-call chunk carries tool_calls; the final chunk
/// is empty with a finish_reason.
#[derive(Debug, Clone, Serialize, Default)]
pub struct Delta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Reasoning (thinking) delta; extension field many OpenAI clients accept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<DeltaToolCall>>,
}

/// One tool call in a streamed delta. Some clients require `type: "function"`.
#[derive(Debug, Clone, Serialize)]
pub struct DeltaToolCall {
    pub index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub call_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<DeltaToolCallFunction>,
}

/// Nested function payload for a streamed tool call.
#[derive(Debug, Clone, Serialize)]
pub struct DeltaToolCallFunction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Full arguments JSON string; the daemon never splits arguments across chunks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> ResponseMeta {
        ResponseMeta {
            id: "chatcmpl-1".into(),
            created: 1700000000,
            model: "auto".into(),
        }
    }

    #[test]
    fn empty_delta_serializes_without_optional_fields() {
        let chunk = ChatCompletionChunk::single(&meta(), Delta::default(), Some("stop".into()));
        let v = serde_json::to_value(&chunk).unwrap();
        assert_eq!(v["object"], "chat.completion.chunk");
        assert_eq!(v["choices"][0]["finish_reason"], "stop");
        assert_eq!(v["choices"][0]["delta"], serde_json::json!({}));
    }

    #[test]
    fn tool_call_delta_shape() {
        let delta = Delta {
            tool_calls: Some(vec![DeltaToolCall {
                index: 0,
                id: Some("c1".into()),
                call_type: Some("function".into()),
                function: Some(DeltaToolCallFunction {
                    name: Some("read".into()),
                    arguments: Some("{\"path\":\"f\"}".into()),
                }),
            }]),
            ..Default::default()
        };
        let chunk = ChatCompletionChunk::single(&meta(), delta, None);
        let v = serde_json::to_value(&chunk).unwrap();
        let tc = &v["choices"][0]["delta"]["tool_calls"][0];
        assert_eq!(tc["type"], "function");
        assert_eq!(tc["function"]["name"], "read");
        assert!(v["choices"][0]["finish_reason"].is_null());
    }
}
