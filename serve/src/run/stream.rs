//! Streaming control flow: upstream stdout → SSE frames.
//!
//! The pipeline task owns the subprocess and the send side of the frame
//! channel; the HTTP response owns the receive side. A failed send means the
//! client disconnected, which cancels the request: the upstream is killed and
//! the task returns. On interception the upstream is killed before `[DONE]`
//! goes out.

use crate::app::AppState;
use crate::run::RequestContext;
use agent_stream::{parse_event, AgentEvent, LineFramer};
use axum::response::sse::{Event, Sse};
use cursor_acp::{
    parse_upstream_error, render_error_content, AgentCommand, AgentProcess, ChatCompletionChunk,
    EventConverter, InterceptOutcome, ToolCallInterceptor,
};
use futures_util::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tracing::{debug, warn};

const FRAME_QUEUE_CAPACITY: usize = 64;
const STDERR_CAPTURE_LIMIT: u64 = 64 * 1024;

/// Starts the pipeline task and returns the SSE response.
pub(crate) fn run_streaming(
    state: Arc<AppState>,
    ctx: RequestContext,
    interceptor: ToolCallInterceptor,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Event>(FRAME_QUEUE_CAPACITY);
    tokio::spawn(pipeline(state, ctx, interceptor, tx));
    Sse::new(ReceiverStream::new(rx).map(Ok::<Event, Infallible>))
}

/// What one upstream line did to the stream.
enum LineFlow {
    Continue,
    /// Terminal frames (sans DONE) are out; kill the upstream, then DONE.
    Terminated,
    /// The client went away; kill the upstream and stop silently.
    Disconnect,
}

async fn pipeline(
    state: Arc<AppState>,
    ctx: RequestContext,
    mut interceptor: ToolCallInterceptor,
    tx: mpsc::Sender<Event>,
) {
    let mut converter = EventConverter::new(ctx.meta.clone());

    let command = match AgentCommand::for_model(
        &ctx.model,
        &ctx.workspace,
        state.settings.agent_command.as_deref(),
    ) {
        Ok(command) => command,
        Err(err) => {
            emit_failure(&tx, &mut converter, &err.to_string()).await;
            return;
        }
    };
    let mut process = match command.spawn(&ctx.prompt).await {
        Ok(process) => process,
        Err(err) => {
            emit_failure(&tx, &mut converter, &err.to_string()).await;
            return;
        }
    };
    let Some(mut stdout) = process.take_stdout() else {
        process.kill().await;
        emit_failure(&tx, &mut converter, "agent stdout unavailable").await;
        return;
    };
    let stderr_task = process.take_stderr().map(|stderr| {
        tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.take(STDERR_CAPTURE_LIMIT).read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).into_owned()
        })
    });

    let mut framer = LineFramer::new();
    let mut buf = vec![0u8; 8192];
    'read: loop {
        let n = match stdout.read(&mut buf).await {
            Ok(0) => break 'read,
            Ok(n) => n,
            Err(err) => {
                warn!("agent stdout read: {err}");
                break 'read;
            }
        };
        for line in framer.push(&buf[..n]) {
            match handle_line(&line, &mut interceptor, &mut converter, &tx).await {
                LineFlow::Continue => {}
                LineFlow::Disconnect => {
                    debug!("client disconnected, killing upstream");
                    process.kill().await;
                    return;
                }
                LineFlow::Terminated => {
                    finish_terminated(&tx, process).await;
                    return;
                }
            }
        }
    }

    // Trailing bytes without a newline still go through the pipeline.
    if let Some(line) = framer.finish() {
        match handle_line(&line, &mut interceptor, &mut converter, &tx).await {
            LineFlow::Continue => {}
            LineFlow::Disconnect => {
                process.kill().await;
                return;
            }
            LineFlow::Terminated => {
                finish_terminated(&tx, process).await;
                return;
            }
        }
    }

    let exited_ok = process.wait().await.map(|s| s.success()).unwrap_or(false);
    let stderr_text = match stderr_task {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    };
    let produced_output =
        !converter.text_total().is_empty() || !converter.reasoning_total().is_empty();
    if !exited_ok && !produced_output {
        let err = parse_upstream_error(&stderr_text);
        warn!(raw = %err.raw, "upstream failed without output");
        if !send_chunk(&tx, &converter.content_chunk(&render_error_content(&err))).await {
            return;
        }
    }
    if send_chunk(&tx, &converter.finish_chunk("stop")).await {
        send_done(&tx).await;
    }
}

/// Kill first, then DONE: the subprocess must be gone before the stream closes.
async fn finish_terminated(tx: &mpsc::Sender<Event>, mut process: AgentProcess) {
    process.kill().await;
    send_done(tx).await;
}

async fn handle_line(
    line: &str,
    interceptor: &mut ToolCallInterceptor,
    converter: &mut EventConverter,
    tx: &mpsc::Sender<Event>,
) -> LineFlow {
    let Some(event) = parse_event(line) else {
        return LineFlow::Continue;
    };

    let AgentEvent::ToolCall(tool_event) = &event else {
        for chunk in converter.feed(&event) {
            if !send_chunk(tx, &chunk).await {
                return LineFlow::Disconnect;
            }
        }
        return LineFlow::Continue;
    };

    match interceptor.handle(tool_event) {
        Ok(InterceptOutcome::Forward) => {
            let chunk = converter.tool_call_chunk(tool_event);
            if !send_chunk(tx, &chunk).await {
                return LineFlow::Disconnect;
            }
            LineFlow::Continue
        }
        Ok(InterceptOutcome::SkipConverter) => LineFlow::Continue,
        Ok(InterceptOutcome::Hint(message)) => {
            if !send_chunk(tx, &converter.content_chunk(&message)).await {
                return LineFlow::Disconnect;
            }
            LineFlow::Continue
        }
        Ok(InterceptOutcome::Intercepted(call)) => {
            let chunks = interceptor
                .boundary()
                .create_stream_tool_call_chunks(converter.meta(), &call);
            for chunk in &chunks {
                if !send_chunk(tx, chunk).await {
                    return LineFlow::Disconnect;
                }
            }
            LineFlow::Terminated
        }
        Ok(InterceptOutcome::Terminate(t)) => {
            if !t.silent && !t.message.is_empty() {
                if !send_chunk(tx, &converter.content_chunk(&t.message)).await {
                    return LineFlow::Disconnect;
                }
            }
            if !send_chunk(tx, &converter.finish_chunk("stop")).await {
                return LineFlow::Disconnect;
            }
            LineFlow::Terminated
        }
        Err(err) => {
            // Headers are already on the wire; degrade the boundary error to
            // a terminal assistant chunk instead of an HTTP error.
            warn!("boundary error without fallback: {err}");
            let message = format!("cursor-acp error: {err}");
            if !send_chunk(tx, &converter.content_chunk(&message)).await {
                return LineFlow::Disconnect;
            }
            if !send_chunk(tx, &converter.finish_chunk("stop")).await {
                return LineFlow::Disconnect;
            }
            LineFlow::Terminated
        }
    }
}

/// Spawn-phase failure: parse it the way exit errors are parsed, then end
/// the stream as a normal turn.
async fn emit_failure(tx: &mpsc::Sender<Event>, converter: &mut EventConverter, raw: &str) {
    let err = parse_upstream_error(raw);
    warn!(raw = %err.raw, "failed to start upstream agent");
    if !send_chunk(tx, &converter.content_chunk(&render_error_content(&err))).await {
        return;
    }
    if send_chunk(tx, &converter.finish_chunk("stop")).await {
        send_done(tx).await;
    }
}

/// False when the client disconnected.
async fn send_chunk(tx: &mpsc::Sender<Event>, chunk: &ChatCompletionChunk) -> bool {
    let data = match serde_json::to_string(chunk) {
        Ok(data) => data,
        Err(err) => {
            warn!("chunk serialization failed: {err}");
            return true;
        }
    };
    tx.send(Event::default().data(data)).await.is_ok()
}

async fn send_done(tx: &mpsc::Sender<Event>) {
    let _ = tx.send(Event::default().data("[DONE]")).await;
}
