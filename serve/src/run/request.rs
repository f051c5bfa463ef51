//! Builds the immutable per-request context.

use crate::app::AppState;
use cursor_acp::{build_prompt, ChatCompletionRequest, ResponseMeta, ToolCallInterceptor};
use cursor_workspace::WorkspaceHints;
use std::path::PathBuf;

/// Immutable inputs of one pipeline run.
pub(crate) struct RequestContext {
    pub(crate) meta: ResponseMeta,
    pub(crate) prompt: String,
    /// Runtime model with the provider prefix stripped; "auto" when absent.
    pub(crate) model: String,
    pub(crate) workspace: PathBuf,
}

pub(crate) fn build_context(
    state: &AppState,
    request: &ChatCompletionRequest,
    interceptor: &ToolCallInterceptor,
) -> RequestContext {
    let requested_model = request.model.as_deref().unwrap_or_default();
    let model = interceptor
        .boundary()
        .normalize_runtime_model(requested_model);
    let meta = ResponseMeta::new(if requested_model.is_empty() {
        model.clone()
    } else {
        requested_model.to_string()
    });

    let hints = WorkspaceHints {
        worktree: request.worktree.as_deref(),
        directory: request.directory.as_deref(),
        session_id: request.session_id.as_deref(),
    };
    let workspace = state
        .resolver
        .resolve(state.settings.workspace_override.as_deref(), &hints);

    RequestContext {
        meta,
        prompt: build_prompt(&request.messages),
        model,
        workspace,
    }
}
