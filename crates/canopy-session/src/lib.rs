#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Per-turn session state for the Canopy agent orchestration runtime.
//!
//! A [`SessionState`] is a string-keyed map of string values, exclusive to
//! one executing user turn, written by nodes' `output_key` and read back by
//! prompt-template resolution. It is safe to read and write concurrently —
//! a `parallel` node fans out several children against the same state.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Per-turn session state: a thread-safe string-keyed mapping.
///
/// Cloning a `SessionState` clones the `Arc`, not the contents — clones
/// share the same underlying map. Use [`SessionState::snapshot`] to get an
/// independent, persistable copy and [`SessionState::load`] to restore one.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl SessionState {
    /// An empty session state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a session state pre-populated from a restored snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: HashMap<String, String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Read a key's current value.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.inner.read().await.get(key).cloned()
    }

    /// Write a key's value, overwriting any prior value.
    pub async fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.write().await.insert(key.into(), value.into());
    }

    /// A deep copy of the current contents, suitable for persisting as
    /// pipeline state at a pause point.
    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.inner.read().await.clone()
    }

    /// Replace the entire contents with `map`, discarding whatever was there.
    ///
    /// Used to restore state from a saved pipeline snapshot on resume.
    pub async fn load(&self, map: HashMap<String, String>) {
        *self.inner.write().await = map;
    }

    /// Resolve `{key}` placeholders in `template` against this state's
    /// current values. Placeholders with no matching key are left intact so
    /// a misconfigured template is visible rather than silently blanked.
    pub async fn resolve_template(&self, template: &str) -> String {
        let snapshot = self.snapshot().await;
        resolve_template_against(template, &snapshot)
    }
}

/// Resolve `{key}` placeholders against an already-materialized map.
///
/// Split out from [`SessionState::resolve_template`] so callers holding a
/// snapshot (e.g. the node executor replaying history) can resolve without
/// re-acquiring the lock.
#[must_use]
pub fn resolve_template_against(template: &str, values: &HashMap<String, String>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '{' {
            let mut key = String::new();
            let mut closed = false;
            for next in chars.by_ref() {
                if next == '}' {
                    closed = true;
                    break;
                }
                key.push(next);
            }
            if closed {
                match values.get(&key) {
                    Some(value) => result.push_str(value),
                    None => {
                        result.push('{');
                        result.push_str(&key);
                        result.push('}');
                    }
                }
            } else {
                result.push('{');
                result.push_str(&key);
            }
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_roundtrips() {
        let state = SessionState::new();
        state.set("a", "1").await;
        assert_eq!(state.get("a").await, Some("1".to_string()));
        assert_eq!(state.get("missing").await, None);
    }

    #[tokio::test]
    async fn snapshot_and_load_roundtrip() {
        let state = SessionState::new();
        state.set("k", "v").await;
        let snap = state.snapshot().await;

        let restored = SessionState::from_snapshot(HashMap::new());
        restored.load(snap).await;
        assert_eq!(restored.get("k").await, Some("v".to_string()));
    }

    #[tokio::test]
    async fn concurrent_writers_do_not_lose_distinct_keys() {
        let state = SessionState::new();
        let a = state.clone();
        let b = state.clone();
        let (_, _) = tokio::join!(a.set("a", "1"), b.set("b", "2"));
        assert_eq!(state.get("a").await, Some("1".to_string()));
        assert_eq!(state.get("b").await, Some("2".to_string()));
    }

    #[test]
    fn resolves_known_placeholders_and_preserves_unknown() {
        let mut values = HashMap::new();
        values.insert("name".to_string(), "world".to_string());
        let rendered = resolve_template_against("hello {name}, see {missing}", &values);
        assert_eq!(rendered, "hello world, see {missing}");
    }

    #[tokio::test]
    async fn resolve_template_reads_current_state() {
        let state = SessionState::new();
        state.set("question", "why").await;
        let rendered = state.resolve_template("Q: {question}?").await;
        assert_eq!(rendered, "Q: why?");
    }
}
