//! Axum app: state, router, and route handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use cursor_acp::{model_catalog, ChatCompletionRequest, ToolCallInterceptor, ToolEventSink};
use cursor_workspace::WorkspaceResolver;
use env_config::Settings;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::run;

/// Process-wide server state. Per-request state lives in the pipeline.
pub(crate) struct AppState {
    pub(crate) settings: Settings,
    pub(crate) resolver: WorkspaceResolver,
    pub(crate) sink: Arc<dyn ToolEventSink>,
}

pub(crate) fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/models", get(models))
        .route("/v1/models", get(models))
        .route("/chat/completions", post(chat_completions))
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"ok": true, "version": env!("CARGO_PKG_VERSION")}))
}

async fn models() -> Json<serde_json::Value> {
    Json(json!({"object": "list", "data": model_catalog()}))
}

/// Chat completions, streaming or not. Malformed bodies are a 500 with a
/// JSON `error` field; upstream failures stay 200 and are rendered as
/// assistant content so UI clients display them.
async fn chat_completions(State(state): State<Arc<AppState>>, body: String) -> Response {
    let request: ChatCompletionRequest = match serde_json::from_str(&body) {
        Ok(req) => req,
        Err(err) => {
            warn!("malformed chat request: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("invalid request body: {err}")})),
            )
                .into_response();
        }
    };

    let interceptor =
        ToolCallInterceptor::from_request(&state.settings, &request, Arc::clone(&state.sink));
    let ctx = run::build_context(&state, &request, &interceptor);

    if request.stream {
        run::run_streaming(state, ctx, interceptor).into_response()
    } else {
        run::run_collected(state, ctx, interceptor).await
    }
}
