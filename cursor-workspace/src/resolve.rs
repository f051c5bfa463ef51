//! Workspace resolution order.
//!
//! 1. Explicit override (env).
//! 2. Caller `worktree`, when outside the daemon's config prefix (pins the session).
//! 3. The session's pinned workspace, when the worktree hint is missing.
//! 4. Caller `directory`, when outside the config prefix.
//! 5. Current working directory.
//! 6. The config prefix itself.
//!
//! Candidates are canonicalized through the filesystem (following symlinks);
//! prefix comparison is case-insensitive on macOS.

use crate::session::SessionPins;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Workspace hints extracted from one request.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkspaceHints<'a> {
    pub worktree: Option<&'a str>,
    pub directory: Option<&'a str>,
    pub session_id: Option<&'a str>,
}

/// The daemon's config prefix: `~/.config/cursor-acp` (or the XDG override).
/// Workspaces inside it are rejected as hints; it is also the last resort.
pub fn config_prefix() -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cursor-acp")
}

/// Resolves workspaces for the lifetime of the daemon; owns the pin cache.
#[derive(Debug)]
pub struct WorkspaceResolver {
    config_prefix: PathBuf,
    pins: SessionPins,
}

impl WorkspaceResolver {
    pub fn new(config_prefix: PathBuf) -> Self {
        Self {
            config_prefix,
            pins: SessionPins::new(),
        }
    }

    /// Applies the resolution order for one request.
    pub fn resolve(&self, override_path: Option<&Path>, hints: &WorkspaceHints) -> PathBuf {
        if let Some(path) = override_path {
            return canonicalize_lenient(path);
        }

        if let Some(worktree) = hints.worktree {
            if let Some(path) = self.usable_hint(worktree) {
                if let Some(session) = hints.session_id {
                    self.pins.pin(session, path.clone());
                }
                return path;
            }
        } else if let Some(session) = hints.session_id {
            if let Some(pinned) = self.pins.get(session) {
                debug!(session, path = %pinned.display(), "using pinned workspace");
                return pinned;
            }
        }

        if let Some(directory) = hints.directory {
            if let Some(path) = self.usable_hint(directory) {
                return path;
            }
        }

        if let Ok(cwd) = std::env::current_dir() {
            return cwd;
        }
        self.config_prefix.clone()
    }

    /// A hint is usable when it exists and is not under the config prefix.
    fn usable_hint(&self, raw: &str) -> Option<PathBuf> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let path = std::fs::canonicalize(raw).ok()?;
        if !path.is_dir() || is_within(&path, &self.config_prefix) {
            return None;
        }
        Some(path)
    }
}

fn canonicalize_lenient(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Prefix check after canonicalization; macOS filesystems are
/// case-insensitive by default, so compare folded there.
fn is_within(path: &Path, prefix: &Path) -> bool {
    if cfg!(target_os = "macos") {
        let fold = |p: &Path| p.to_string_lossy().to_lowercase();
        fold(path).starts_with(&fold(prefix))
    } else {
        path.starts_with(prefix)
    }
}
