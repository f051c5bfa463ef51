//! Non-streaming mode: run the upstream to completion, then answer once.
//!
//! The first allowed tool call wins and text is ignored; otherwise the
//! collected assistant text and reasoning become one chat completion. Event
//! semantics match the streaming path.

use crate::app::AppState;
use crate::run::RequestContext;
use agent_stream::{parse_event, AgentEvent};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use cursor_acp::{
    parse_upstream_error, render_error_content, AgentCommand, ChatCompletion, EventConverter,
    InterceptOutcome, ToolCallInterceptor,
};
use serde_json::json;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::warn;

pub(crate) async fn run_collected(
    state: Arc<AppState>,
    ctx: RequestContext,
    mut interceptor: ToolCallInterceptor,
) -> Response {
    let command = match AgentCommand::for_model(
        &ctx.model,
        &ctx.workspace,
        state.settings.agent_command.as_deref(),
    ) {
        Ok(command) => command,
        Err(err) => return failure_completion(&ctx, &err.to_string()),
    };
    let mut process = match command.spawn(&ctx.prompt).await {
        Ok(process) => process,
        Err(err) => return failure_completion(&ctx, &err.to_string()),
    };

    let stdout_task = process.take_stdout().map(|mut out| {
        tokio::spawn(async move {
            let mut text = String::new();
            let _ = out.read_to_string(&mut text).await;
            text
        })
    });
    let stderr_task = process.take_stderr().map(|mut err| {
        tokio::spawn(async move {
            let mut text = String::new();
            let _ = err.read_to_string(&mut text).await;
            text
        })
    });
    let exited_ok = process.wait().await.map(|s| s.success()).unwrap_or(false);
    let stdout = match stdout_task {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    };
    let stderr = match stderr_task {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    };

    let mut converter = EventConverter::new(ctx.meta.clone());
    for line in stdout.lines() {
        let Some(event) = parse_event(line) else {
            continue;
        };
        let AgentEvent::ToolCall(tool_event) = &event else {
            let _ = converter.feed(&event);
            continue;
        };
        match interceptor.handle(tool_event) {
            Ok(InterceptOutcome::Intercepted(call)) => {
                let response = interceptor
                    .boundary()
                    .create_non_stream_tool_call_response(&ctx.meta, &call);
                return Json(response).into_response();
            }
            Ok(InterceptOutcome::Terminate(t)) => {
                return Json(ChatCompletion::text(&ctx.meta, t.message, None)).into_response();
            }
            // Forwarded tool chunks have no non-streaming shape; hints are
            // moot once the upstream has already finished.
            Ok(InterceptOutcome::Forward)
            | Ok(InterceptOutcome::SkipConverter)
            | Ok(InterceptOutcome::Hint(_)) => {}
            Err(err) => {
                warn!("boundary error without fallback: {err}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": err.to_string()})),
                )
                    .into_response();
            }
        }
    }

    let text = converter.text_total().to_string();
    let reasoning = converter.reasoning_total().to_string();
    if !exited_ok && text.is_empty() && reasoning.is_empty() {
        let raw = if stderr.trim().is_empty() { &stdout } else { &stderr };
        return failure_completion(&ctx, raw);
    }
    let reasoning = (!reasoning.is_empty()).then_some(reasoning);
    Json(ChatCompletion::text(&ctx.meta, text, reasoning)).into_response()
}

/// Upstream failures are HTTP 200 completions whose content is the parsed
/// error, so UI clients render them.
fn failure_completion(ctx: &RequestContext, raw: &str) -> Response {
    let err = parse_upstream_error(raw);
    warn!(raw = %err.raw, "upstream failed");
    Json(ChatCompletion::text(
        &ctx.meta,
        render_error_content(&err),
        None,
    ))
    .into_response()
}
