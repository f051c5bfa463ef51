//! End-to-end tests: real HTTP server, fake upstream agent.
//!
//! The upstream CLI is replaced by a generated shell script that drains stdin
//! and prints a canned stream-JSON transcript, wired in through the agent
//! command override.

mod common;

mod chat_nonstream;
mod chat_stream;
mod health;
mod invalid_body;
mod loop_guard;
mod models;
mod reroute;
mod upstream_error;
