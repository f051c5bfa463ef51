//! Upstream agent process: locating, spawning, and failure parsing.

mod error_parse;
mod spawn;

pub use error_parse::{parse_upstream_error, render_error_content, UpstreamError, UpstreamErrorKind};
pub use spawn::{AgentCommand, AgentProcess, SpawnError};
