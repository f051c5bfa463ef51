//! Static model catalog served by `/v1/models`.
//!
//! The upstream CLI resolves `auto` itself; the rest are the model ids Cursor
//! currently exposes. Model discovery from the CLI's text output is handled by
//! the installer, not the daemon.

use crate::openai::ModelEntry;

/// Provider id used in prefixed model names ("cursor/gpt-5") and provider matching.
pub const PROVIDER_ID: &str = "cursor";

/// Fixed `created` timestamp for catalog entries.
const CATALOG_CREATED: u64 = 1735689600;

const MODEL_IDS: &[&str] = &[
    "auto",
    "gpt-5",
    "gpt-5-codex",
    "sonnet-4.5",
    "sonnet-4.5-thinking",
    "opus-4.1",
    "grok",
];

/// Entries for the `/v1/models` response.
pub fn model_catalog() -> Vec<ModelEntry> {
    MODEL_IDS
        .iter()
        .map(|&id| ModelEntry {
            id,
            object: "model",
            created: CATALOG_CREATED,
            owned_by: PROVIDER_ID,
        })
        .collect()
}
