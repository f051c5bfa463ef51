//! Typed daemon settings parsed from environment variables.
//!
//! Every variable is optional; unset or unparseable values fall back to the
//! listed default. Call [`crate::load_and_apply`] first so `.env` / XDG
//! values are visible here.

use std::path::PathBuf;
use std::str::FromStr;

/// How intercepted tool calls are handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ToolLoopMode {
    /// Hand tool calls back to the caller over the chat protocol.
    #[default]
    Opencode,
    /// The daemon executes tool calls itself via an external router.
    ProxyExec,
    /// No tool interception.
    Off,
}

impl FromStr for ToolLoopMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "opencode" => Ok(ToolLoopMode::Opencode),
            "proxy-exec" | "proxy_exec" => Ok(ToolLoopMode::ProxyExec),
            "off" => Ok(ToolLoopMode::Off),
            other => Err(format!("unknown tool loop mode: {other}")),
        }
    }
}

/// Which provider-boundary policy generation is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoundaryMode {
    Legacy,
    #[default]
    V1,
}

impl FromStr for BoundaryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "legacy" => Ok(BoundaryMode::Legacy),
            "v1" => Ok(BoundaryMode::V1),
            other => Err(format!("unknown boundary mode: {other}")),
        }
    }
}

/// Daemon settings, one field per `CURSOR_ACP_*` variable.
#[derive(Clone, Debug)]
pub struct Settings {
    /// CURSOR_ACP_TOOL_LOOP_MODE: opencode | proxy-exec | off.
    pub tool_loop_mode: ToolLoopMode,
    /// CURSOR_ACP_PROVIDER_BOUNDARY: legacy | v1.
    pub provider_boundary: BoundaryMode,
    /// CURSOR_ACP_AUTO_FALLBACK_LEGACY: retry boundary errors on legacy once per request.
    pub auto_fallback_to_legacy: bool,
    /// CURSOR_ACP_TOOL_LOOP_MAX_REPEAT: identical-call budget before the guard trips.
    pub tool_loop_max_repeat: u32,
    /// CURSOR_ACP_FORCE_TOOL_MODE: intercept tool calls even when the tool
    /// loop mode is off.
    pub force_tool_mode: bool,
    /// CURSOR_ACP_EMIT_TOOL_UPDATES: side-channel tool updates (default off to
    /// avoid double reporting in opencode mode).
    pub emit_tool_updates: bool,
    /// CURSOR_ACP_FORWARD_TOOL_CALLS (proxy-exec only).
    pub forward_tool_calls: bool,
    /// CURSOR_ACP_REUSE_EXISTING_PROXY: probe /health on the fixed port and
    /// reuse a compatible instance.
    pub reuse_existing_proxy: bool,
    /// CURSOR_ACP_EDIT_COMPAT_REPAIR: edit content/new_string/old_string repair.
    pub edit_compat_repair: bool,
    /// CURSOR_ACP_WORKSPACE: explicit workspace override.
    pub workspace_override: Option<PathBuf>,
    /// CURSOR_ACP_TOOL_TIMEOUT_MS: per-call budget handed to the proxy-exec
    /// tool router; the pipeline itself has no timeouts.
    pub tool_timeout_ms: Option<u64>,
    /// CURSOR_ACP_AGENT_CMD: replaces the PATH lookup of cursor-agent
    /// (whitespace-split into program + leading args).
    pub agent_command: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tool_loop_mode: ToolLoopMode::Opencode,
            provider_boundary: BoundaryMode::V1,
            auto_fallback_to_legacy: true,
            tool_loop_max_repeat: 2,
            force_tool_mode: false,
            emit_tool_updates: false,
            forward_tool_calls: false,
            reuse_existing_proxy: true,
            edit_compat_repair: true,
            workspace_override: None,
            tool_timeout_ms: None,
            agent_command: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tool_loop_mode: parse_var("CURSOR_ACP_TOOL_LOOP_MODE", defaults.tool_loop_mode),
            provider_boundary: parse_var("CURSOR_ACP_PROVIDER_BOUNDARY", defaults.provider_boundary),
            auto_fallback_to_legacy: bool_var(
                "CURSOR_ACP_AUTO_FALLBACK_LEGACY",
                defaults.auto_fallback_to_legacy,
            ),
            tool_loop_max_repeat: parse_var(
                "CURSOR_ACP_TOOL_LOOP_MAX_REPEAT",
                defaults.tool_loop_max_repeat,
            ),
            force_tool_mode: bool_var("CURSOR_ACP_FORCE_TOOL_MODE", defaults.force_tool_mode),
            emit_tool_updates: bool_var("CURSOR_ACP_EMIT_TOOL_UPDATES", defaults.emit_tool_updates),
            forward_tool_calls: bool_var(
                "CURSOR_ACP_FORWARD_TOOL_CALLS",
                defaults.forward_tool_calls,
            ),
            reuse_existing_proxy: bool_var(
                "CURSOR_ACP_REUSE_EXISTING_PROXY",
                defaults.reuse_existing_proxy,
            ),
            edit_compat_repair: bool_var(
                "CURSOR_ACP_EDIT_COMPAT_REPAIR",
                defaults.edit_compat_repair,
            ),
            workspace_override: std::env::var("CURSOR_ACP_WORKSPACE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            tool_timeout_ms: std::env::var("CURSOR_ACP_TOOL_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.trim().parse().ok()),
            agent_command: std::env::var("CURSOR_ACP_AGENT_CMD")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        }
    }
}

fn parse_var<T: FromStr + Copy>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn bool_var(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(
            v.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}
