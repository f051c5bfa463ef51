//! Upstream failure parsing.
//!
//! Spawn failures and non-zero exits are never surfaced as HTTP errors; the
//! chat stream stays 200 and carries the parsed error as assistant content so
//! UI clients display it. Phrase matching is case-insensitive substring.

/// Category of an upstream failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    Quota,
    Auth,
    Network,
    Model,
    Unknown,
}

/// Parsed upstream failure with a user-facing rendering.
#[derive(Clone, Debug)]
pub struct UpstreamError {
    pub kind: UpstreamErrorKind,
    pub user_message: String,
    pub suggestion: Option<String>,
    pub recoverable: bool,
    /// First line of the raw output, for logs.
    pub raw: String,
}

const QUOTA_PHRASES: &[&str] = &["usage limit", "quota exceeded", "rate limit"];
const AUTH_PHRASES: &[&str] = &[
    "not logged in",
    "unauthorized",
    "invalid api key",
    "authentication failed",
    "please log in",
];
const NETWORK_PHRASES: &[&str] = &[
    "econnrefused",
    "enotfound",
    "econnreset",
    "socket hang up",
    "network error",
    "fetch failed",
];
const MODEL_PHRASES: &[&str] = &["model not found", "unknown model", "unsupported model"];

/// Classifies raw upstream output (stderr, or stdout when stderr is empty).
pub fn parse_upstream_error(output: &str) -> UpstreamError {
    let lower = output.to_lowercase();
    let hit = |phrases: &[&str]| phrases.iter().any(|p| lower.contains(p));
    let raw = output
        .lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("")
        .trim()
        .to_string();

    if hit(QUOTA_PHRASES) {
        UpstreamError {
            kind: UpstreamErrorKind::Quota,
            user_message: "You've hit your Cursor usage limit.".to_string(),
            suggestion: Some(
                "Wait for the limit to reset or switch to a different plan.".to_string(),
            ),
            recoverable: false,
            raw,
        }
    } else if hit(AUTH_PHRASES) {
        UpstreamError {
            kind: UpstreamErrorKind::Auth,
            user_message: "You are not logged in to Cursor.".to_string(),
            suggestion: Some("Run `cursor-agent login` and retry.".to_string()),
            recoverable: true,
            raw,
        }
    } else if hit(NETWORK_PHRASES) {
        UpstreamError {
            kind: UpstreamErrorKind::Network,
            user_message: "Could not reach the Cursor service.".to_string(),
            suggestion: Some("Check your network connection and retry.".to_string()),
            recoverable: true,
            raw,
        }
    } else if hit(MODEL_PHRASES) {
        UpstreamError {
            kind: UpstreamErrorKind::Model,
            user_message: "The requested model is not available.".to_string(),
            suggestion: Some("Pick another model or use \"auto\".".to_string()),
            recoverable: true,
            raw,
        }
    } else {
        let user_message = if raw.is_empty() {
            "The Cursor agent exited unexpectedly.".to_string()
        } else {
            raw.clone()
        };
        UpstreamError {
            kind: UpstreamErrorKind::Unknown,
            user_message,
            suggestion: None,
            recoverable: false,
            raw,
        }
    }
}

/// Renders the failure as assistant content: `cursor-acp error: <message>`,
/// with the suggestion on a second line when present.
pub fn render_error_content(err: &UpstreamError) -> String {
    match &err.suggestion {
        Some(suggestion) => format!("cursor-acp error: {}\n{}", err.user_message, suggestion),
        None => format!("cursor-acp error: {}", err.user_message),
    }
}
