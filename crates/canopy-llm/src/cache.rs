use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::adapter::LlmAdapter;

/// A per-model cache of LLM adapter instances, guarded by a single mutex.
///
/// Different nodes of the same tree may request different models; this
/// cache lets them share one client per model rather than constructing a
/// fresh one on every call.
#[derive(Default)]
pub struct LlmClientCache {
    clients: Mutex<HashMap<String, Arc<dyn LlmAdapter>>>,
}

impl LlmClientCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached adapter for `model`, constructing and caching one
    /// via `factory` if this is the first request for that model.
    pub async fn get_or_create<F>(&self, model: &str, factory: F) -> Arc<dyn LlmAdapter>
    where
        F: FnOnce() -> Arc<dyn LlmAdapter>,
    {
        let mut clients = self.clients.lock().await;
        if let Some(existing) = clients.get(model) {
            return existing.clone();
        }
        let created = factory();
        clients.insert(model.to_string(), created.clone());
        created
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLlmAdapter;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn factory_runs_once_per_model() {
        let cache = LlmClientCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            cache
                .get_or_create("gpt", move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Arc::new(MockLlmAdapter::new("gpt"))
                })
                .await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_models_get_distinct_entries() {
        let cache = LlmClientCache::new();
        let a = cache
            .get_or_create("gpt", || Arc::new(MockLlmAdapter::new("gpt")))
            .await;
        let b = cache
            .get_or_create("claude", || Arc::new(MockLlmAdapter::new("claude")))
            .await;
        assert_eq!(a.model(), "gpt");
        assert_eq!(b.model(), "claude");
    }
}
