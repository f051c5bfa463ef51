//! Bounded per-session workspace pins.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;

/// Pin-cache capacity; old sessions fall off the end.
const CAPACITY: usize = 200;

/// Least-recently-used map of session id → pinned workspace.
///
/// Shared process-wide behind the app state; interior mutability keeps the
/// call sites read-shaped.
#[derive(Debug, Default)]
pub struct SessionPins {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    map: HashMap<String, PathBuf>,
    order: VecDeque<String>,
}

impl SessionPins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a session's pin and refreshes its recency.
    pub fn get(&self, session_id: &str) -> Option<PathBuf> {
        let mut inner = self.inner.lock().ok()?;
        let path = inner.map.get(session_id).cloned()?;
        inner.order.retain(|s| s != session_id);
        inner.order.push_back(session_id.to_string());
        Some(path)
    }

    /// Pins (or re-pins) a session's workspace, evicting the least recently
    /// used entry at capacity.
    pub fn pin(&self, session_id: &str, path: PathBuf) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        if inner.map.insert(session_id.to_string(), path).is_none() {
            inner.order.push_back(session_id.to_string());
            if inner.order.len() > CAPACITY {
                if let Some(evicted) = inner.order.pop_front() {
                    inner.map.remove(&evicted);
                }
            }
        } else {
            inner.order.retain(|s| s != session_id);
            inner.order.push_back(session_id.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_and_get() {
        let pins = SessionPins::new();
        pins.pin("s1", PathBuf::from("/a"));
        assert_eq!(pins.get("s1"), Some(PathBuf::from("/a")));
        assert_eq!(pins.get("s2"), None);
    }

    #[test]
    fn repin_updates_path() {
        let pins = SessionPins::new();
        pins.pin("s1", PathBuf::from("/a"));
        pins.pin("s1", PathBuf::from("/b"));
        assert_eq!(pins.get("s1"), Some(PathBuf::from("/b")));
        assert_eq!(pins.len(), 1);
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let pins = SessionPins::new();
        for i in 0..CAPACITY {
            pins.pin(&format!("s{i}"), PathBuf::from("/x"));
        }
        // Touch s0 so s1 becomes the eviction candidate.
        assert!(pins.get("s0").is_some());
        pins.pin("overflow", PathBuf::from("/y"));
        assert_eq!(pins.len(), CAPACITY);
        assert!(pins.get("s0").is_some());
        assert!(pins.get("s1").is_none());
    }
}
