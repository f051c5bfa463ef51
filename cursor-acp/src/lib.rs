//! # cursor-acp
//!
//! Core engine of the cursor-acp bridge daemon: translates OpenAI-style
//! chat-completions traffic into runs of the Cursor agent CLI and adapts the
//! CLI's stream-JSON output back into OpenAI streaming deltas, intercepting
//! tool calls on the way.
//!
//! ## Main modules
//!
//! - [`openai`]: request/response/chunk DTOs for the OpenAI wire format.
//! - [`convert`]: [`EventConverter`] — upstream events to streaming deltas.
//! - [`schema_compat`]: argument alias normalization, schema validation, repair.
//! - [`loop_guard`]: [`ToolLoopGuard`] — repeated-call detection and termination.
//! - [`boundary`]: [`ProviderBoundary`] policy seam with legacy/v1 modes and
//!   per-request auto-fallback ([`BoundaryContext`]).
//! - [`intercept`]: [`ToolCallInterceptor`] — the per-event decision machine.
//! - [`upstream`]: spawning the agent CLI and parsing its failure output.
//! - [`prompt`]: renders the chat transcript into one upstream prompt.
//! - [`events`]: [`ToolEventSink`] callback seam for out-of-process reporting.
//!
//! The HTTP surface lives in the `serve` crate; configuration in `config`.

pub mod boundary;
pub mod convert;
pub mod events;
pub mod intercept;
pub mod loop_guard;
pub mod models;
pub mod openai;
pub mod prompt;
pub mod schema_compat;
pub mod upstream;

pub use boundary::{
    BoundaryContext, BoundaryError, LegacyBoundary, ProviderBoundary, ToolLoopFlags,
    ToolParamAction, ToolParamResolution, V1Boundary,
};
pub use convert::EventConverter;
pub use events::{NoopToolEventSink, ToolEventSink};
pub use intercept::{InterceptOutcome, TerminateReason, Termination, ToolCallInterceptor};
pub use loop_guard::{ErrorClass, ToolLoopDecision, ToolLoopGuard};
pub use models::{model_catalog, PROVIDER_ID};
pub use openai::{
    ChatCompletion, ChatCompletionChunk, ChatCompletionRequest, ChatMessage, FunctionCall,
    InterceptedToolCall, ResponseMeta, ToolSchemas,
};
pub use prompt::build_prompt;
pub use schema_compat::{normalize_tool_call, NormalizedCall, SchemaValidation};
pub use upstream::{
    parse_upstream_error, render_error_content, AgentCommand, AgentProcess, SpawnError,
    UpstreamError, UpstreamErrorKind,
};
