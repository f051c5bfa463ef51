//! Prompt builder: chat transcript to one upstream prompt.
//!
//! The agent CLI takes a single prompt, so the message list is rendered as
//! system sections first, then a turn-by-turn transcript. Prior tool activity
//! is kept visible as bracketed markers so the upstream does not redo work
//! the caller already executed.

use crate::openai::ChatMessage;

/// Renders the request messages into the prompt sent over stdin.
pub fn build_prompt(messages: &[ChatMessage]) -> String {
    let mut sections: Vec<String> = Vec::new();

    let system: Vec<String> = messages
        .iter()
        .filter(|m| m.role.eq_ignore_ascii_case("system"))
        .map(ChatMessage::content_text)
        .filter(|s| !s.is_empty())
        .collect();
    if !system.is_empty() {
        sections.push(system.join("\n\n"));
    }

    for msg in messages {
        match msg.role.to_lowercase().as_str() {
            "system" => {}
            "user" => {
                let text = msg.content_text();
                if !text.is_empty() {
                    sections.push(format!("User: {text}"));
                }
            }
            "assistant" => {
                let mut lines = Vec::new();
                let text = msg.content_text();
                if !text.is_empty() {
                    lines.push(format!("Assistant: {text}"));
                }
                for call in msg.tool_calls.as_deref().unwrap_or_default() {
                    lines.push(format!(
                        "[tool_call {} {}]",
                        call.function.name, call.function.arguments
                    ));
                }
                if !lines.is_empty() {
                    sections.push(lines.join("\n"));
                }
            }
            "tool" => {
                let id = msg.tool_call_id.as_deref().unwrap_or("unknown");
                sections.push(format!("[tool_result {id}] {}", msg.content_text()));
            }
            _ => {}
        }
    }

    sections.join("\n\n")
}
