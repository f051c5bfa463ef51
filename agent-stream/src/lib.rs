//! Cursor agent stream dialect: line-delimited JSON events.
//!
//! This crate defines the wire shape of the upstream agent's stdout stream and
//! the framing needed to read it incrementally. It does not depend on cursor-acp;
//! the core parses lines into [`AgentEvent`] and decides what to do with them.

pub mod event;
pub mod lines;

pub use event::{
    parse_event, AgentEvent, AssistantEvent, ResultKind, ThinkingEvent, ToolCallEvent,
    ToolCallPhase, TurnResultEvent,
};
pub use lines::LineFramer;
