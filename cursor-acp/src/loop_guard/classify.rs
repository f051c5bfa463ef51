//! Error-class resolution for prior tool results.
//!
//! Classification is case-insensitive substring matching against a fixed
//! phrase set chosen empirically; keep the lists verbatim so guard behavior
//! reproduces on fixtures.

/// Outcome class of one tool result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Validation,
    NotFound,
    Permission,
    Timeout,
    ToolError,
    Success,
    Unknown,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Validation => "validation",
            ErrorClass::NotFound => "not_found",
            ErrorClass::Permission => "permission",
            ErrorClass::Timeout => "timeout",
            ErrorClass::ToolError => "tool_error",
            ErrorClass::Success => "success",
            ErrorClass::Unknown => "unknown",
        }
    }
}

const VALIDATION_PHRASES: &[&str] = &[
    "missing required",
    "invalid arguments",
    "invalid argument",
    "invalid_type",
    "does not match schema",
    "schema validation",
];

const NOT_FOUND_PHRASES: &[&str] = &["enoent", "no such file", "not found", "does not exist"];

const PERMISSION_PHRASES: &[&str] = &[
    "eacces",
    "eperm",
    "permission denied",
    "access denied",
    "operation not permitted",
];

const TIMEOUT_PHRASES: &[&str] = &["etimedout", "timed out", "timeout"];

const SUCCESS_PHRASES: &[&str] = &[
    "\"success\":true",
    "\"success\": true",
    "successfully",
    "file created",
    "file written",
    "file updated",
    "edit applied",
];

const TOOL_ERROR_PHRASES: &[&str] = &["tool_error", "error", "failed", "exception"];

/// Tools whose `unknown` results are promoted to `success`: read-only tools
/// rarely echo an explicit success marker.
pub const READ_ONLY_TOOLS: &[&str] = &["bash", "read", "grep", "ls", "glob", "stat", "webfetch"];

/// Classifies one tool-result text. More specific classes are checked before
/// the generic `tool_error` phrases.
pub fn classify_result_text(text: &str) -> ErrorClass {
    let lower = text.to_lowercase();
    let hit = |phrases: &[&str]| phrases.iter().any(|p| lower.contains(p));
    if hit(VALIDATION_PHRASES) {
        ErrorClass::Validation
    } else if hit(NOT_FOUND_PHRASES) {
        ErrorClass::NotFound
    } else if hit(PERMISSION_PHRASES) {
        ErrorClass::Permission
    } else if hit(TIMEOUT_PHRASES) {
        ErrorClass::Timeout
    } else if hit(SUCCESS_PHRASES) {
        ErrorClass::Success
    } else if hit(TOOL_ERROR_PHRASES) {
        ErrorClass::ToolError
    } else {
        ErrorClass::Unknown
    }
}

/// Applies the read-only-tool promotion: `unknown` becomes `success`.
pub fn promote_for_tool(tool: &str, class: ErrorClass) -> ErrorClass {
    if class == ErrorClass::Unknown && READ_ONLY_TOOLS.contains(&tool.to_lowercase().as_str()) {
        ErrorClass::Success
    } else {
        class
    }
}
