//! HTTP server for cursor-acp (axum).
//!
//! Routes: `/health`, `/models`, `/v1/models`, `/chat/completions`,
//! `/v1/chat/completions`. Each chat request runs its own pipeline: spawn the
//! Cursor agent, stream its events, intercept tool calls, answer as OpenAI
//! chat completions (SSE or JSON).
//!
//! **Public API**: [`run_serve`], [`run_serve_on_listener`].

mod app;
mod run;

use cursor_acp::NoopToolEventSink;
use cursor_workspace::{config_prefix, WorkspaceResolver};
use env_config::Settings;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use app::{router, AppState};

/// Fixed loopback address the daemon prefers; the cli falls back to an
/// ephemeral port when it is taken by an incompatible process.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8790";

/// Runs the server on an existing listener. Tests bind `127.0.0.1:0` and pass
/// the listener in.
pub async fn run_serve_on_listener(
    listener: TcpListener,
    settings: Settings,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = listener.local_addr()?;
    info!("cursor-acp listening on http://{addr}");

    let state = Arc::new(AppState {
        resolver: WorkspaceResolver::new(config_prefix()),
        sink: Arc::new(NoopToolEventSink),
        settings,
    });
    let app = router(state);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Binds `addr` (default [`DEFAULT_ADDR`]) and serves until the process exits.
pub async fn run_serve(
    addr: Option<&str>,
    settings: Settings,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = addr.unwrap_or(DEFAULT_ADDR);
    let listener = TcpListener::bind(addr).await?;
    run_serve_on_listener(listener, settings).await
}
