//! Tool-loop guard: detects pathological repeated tool calls.
//!
//! Three kinds of loops terminate the turn: repeated failing calls, repeated
//! schema-invalid calls, and repeated equivalent "successful" calls (value
//! signature, plus a coarse per-path counter for full-file edit/write).
//! The guard is per-request state, seeded from the request's prior messages.

mod classify;
mod fingerprint;
mod guard;

pub use classify::{classify_result_text, promote_for_tool, ErrorClass, READ_ONLY_TOOLS};
pub use fingerprint::{
    arg_shape, coarse_fingerprint, strict_fingerprint, validation_signature, value_signature,
};
pub use guard::{ToolLoopDecision, ToolLoopGuard};
