//! Per-request boundary context with single-shot legacy fallback.

use super::{BoundaryError, LegacyBoundary, ProviderBoundary, V1Boundary};
use crate::events::ToolEventSink;
use env_config::BoundaryMode;
use tracing::warn;

/// Wraps the active boundary for one request. The first [`BoundaryError`]
/// raised under v1 (when auto-fallback is enabled) switches the context to
/// legacy for the rest of the request and retries the operation once.
pub struct BoundaryContext {
    active: BoundaryMode,
    auto_fallback: bool,
    fell_back: bool,
    legacy: LegacyBoundary,
    v1: V1Boundary,
}

impl BoundaryContext {
    pub fn new(mode: BoundaryMode, auto_fallback: bool) -> Self {
        Self {
            active: mode,
            auto_fallback,
            fell_back: false,
            legacy: LegacyBoundary,
            v1: V1Boundary,
        }
    }

    pub fn active_mode(&self) -> BoundaryMode {
        self.active
    }

    /// True once the context has switched to legacy during this request.
    pub fn fell_back(&self) -> bool {
        self.fell_back
    }

    pub fn boundary(&self) -> &dyn ProviderBoundary {
        match self.active {
            BoundaryMode::Legacy => &self.legacy,
            BoundaryMode::V1 => &self.v1,
        }
    }

    /// Runs a boundary operation, falling back to legacy once on error.
    ///
    /// Non-boundary errors do not reach here; the operation's own error type
    /// is [`BoundaryError`], so anything else propagates through the caller.
    pub fn run<T, F>(&mut self, sink: &dyn ToolEventSink, op: F) -> Result<T, BoundaryError>
    where
        F: Fn(&dyn ProviderBoundary) -> Result<T, BoundaryError>,
    {
        match op(self.boundary()) {
            Ok(value) => Ok(value),
            Err(err) => {
                if self.active != BoundaryMode::V1 || !self.auto_fallback || self.fell_back {
                    return Err(err);
                }
                warn!("provider boundary error, falling back to legacy: {err}");
                self.active = BoundaryMode::Legacy;
                self.fell_back = true;
                sink.on_fallback_to_legacy(&err);
                op(self.boundary())
            }
        }
    }
}
