use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use canopy_core::{RequestContext, ToolDescriptor};
use tokio::sync::Mutex;

use crate::backend::{BackendStatus, ToolBackend};
use crate::error::{ToolsError, ToolsResult};
use crate::outcome::{ToolArgs, ToolCallOutcome};

/// How long [`ToolBroker::start`] retries a backend that fails to come up,
/// to tolerate colocated-service boot races. Retries back off exponentially
/// from `BACKEND_START_RETRY_INITIAL_INTERVAL`, doubling each attempt up to
/// `BACKEND_START_RETRY_MAX_INTERVAL`.
const BACKEND_START_RETRY_BUDGET: Duration = Duration::from_secs(10);
const BACKEND_START_RETRY_INITIAL_INTERVAL: Duration = Duration::from_millis(250);
const BACKEND_START_RETRY_MAX_INTERVAL: Duration = Duration::from_secs(2);

struct CatalogEntry {
    descriptor: ToolDescriptor,
    backend_index: usize,
}

/// Aggregates N named tool backends behind one merged catalog.
///
/// `call_tool` is serialized by a single mutex: concurrent siblings of a
/// `parallel` node must not race a non-reentrant backend connection. The
/// mutex guards dispatch bookkeeping only — the backend call itself runs
/// while held, favoring safety over throughput.
pub struct ToolBroker {
    backends: Vec<Arc<dyn ToolBackend>>,
    catalog: HashMap<String, CatalogEntry>,
    call_lock: Mutex<()>,
}

impl ToolBroker {
    /// Start every backend in order, merging their catalogs.
    ///
    /// Each backend gets a bounded retry budget before its startup is
    /// considered failed. On the k-th backend's failure (after retries are
    /// exhausted), every previously started backend (`0..k-1`) is stopped
    /// and the error is returned — no partial broker is left running.
    ///
    /// # Errors
    ///
    /// Returns [`ToolsError::BackendStartFailed`] if a backend never comes
    /// up within its retry budget, or [`ToolsError::DuplicateToolName`] if
    /// the accumulated catalog has a name collision.
    pub async fn start(backends: Vec<Arc<dyn ToolBackend>>) -> ToolsResult<Self> {
        let mut started: Vec<Arc<dyn ToolBackend>> = Vec::with_capacity(backends.len());
        let mut catalog: HashMap<String, CatalogEntry> = HashMap::new();

        for backend in backends {
            if let Err(err) = start_with_retry(backend.as_ref()).await {
                roll_back(&started).await;
                return Err(err);
            }

            let tools = match backend.list_tools().await {
                Ok(tools) => tools,
                Err(err) => {
                    started.push(Arc::clone(&backend));
                    roll_back(&started).await;
                    return Err(err);
                }
            };

            let backend_index = started.len();
            for descriptor in tools {
                if let Some(existing) = catalog.get(&descriptor.name) {
                    let first_backend = started[existing.backend_index].name().to_string();
                    started.push(Arc::clone(&backend));
                    roll_back(&started).await;
                    return Err(ToolsError::DuplicateToolName {
                        tool: descriptor.name,
                        first_backend,
                        second_backend: backend.name().to_string(),
                    });
                }
                catalog.insert(
                    descriptor.name.clone(),
                    CatalogEntry {
                        descriptor,
                        backend_index,
                    },
                );
            }

            started.push(backend);
        }

        Ok(Self {
            backends: started,
            catalog,
            call_lock: Mutex::new(()),
        })
    }

    /// The merged catalog: every tool contributed by every backend.
    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.catalog.values().map(|e| e.descriptor.clone()).collect()
    }

    /// Look up one tool by name.
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<&ToolDescriptor> {
        self.catalog.get(name).map(|e| &e.descriptor)
    }

    /// Invoke `name` with `args`, routing to the backend that registered it.
    ///
    /// # Errors
    ///
    /// Returns [`ToolsError::UnknownTool`] if no backend registered `name`,
    /// or whatever the owning backend's `call_tool` returns.
    pub async fn call_tool(
        &self,
        ctx: &RequestContext,
        name: &str,
        args: ToolArgs,
    ) -> ToolsResult<ToolCallOutcome> {
        let entry = self
            .catalog
            .get(name)
            .ok_or_else(|| ToolsError::UnknownTool(name.to_string()))?;
        let backend = self.backends[entry.backend_index].clone();

        let _guard = self.call_lock.lock().await;
        backend.call_tool(ctx, name, args).await
    }

    /// Per-backend alive/tool-count snapshot, for a caller building a status page.
    #[must_use]
    pub fn status(&self) -> Vec<BackendStatus> {
        self.backends
            .iter()
            .enumerate()
            .map(|(index, backend)| {
                let tool_count = self
                    .catalog
                    .values()
                    .filter(|e| e.backend_index == index)
                    .count();
                BackendStatus {
                    name: backend.name().to_string(),
                    alive: true,
                    tool_count,
                }
            })
            .collect()
    }

    /// Stop every backend.
    ///
    /// # Errors
    ///
    /// Returns the first backend stop failure encountered; remaining
    /// backends are still given a chance to stop.
    pub async fn shutdown(&self) -> ToolsResult<()> {
        let mut first_error = None;
        for backend in &self.backends {
            if let Err(err) = backend.stop().await {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

async fn start_with_retry(backend: &dyn ToolBackend) -> ToolsResult<()> {
    let deadline = tokio::time::Instant::now() + BACKEND_START_RETRY_BUDGET;
    let mut last_error = None;
    let mut interval = BACKEND_START_RETRY_INITIAL_INTERVAL;

    loop {
        match backend.start().await {
            Ok(()) => return Ok(()),
            Err(err) => {
                tracing::warn!(backend = backend.name(), error = %err, "backend start failed, retrying");
                last_error = Some(err);
                if tokio::time::Instant::now() >= deadline {
                    break;
                }
                tokio::time::sleep(interval).await;
                interval = (interval * 2).min(BACKEND_START_RETRY_MAX_INTERVAL);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| ToolsError::BackendStartFailed {
        name: backend.name().to_string(),
        reason: "exhausted retry budget".to_string(),
    }))
}

async fn roll_back(started: &[Arc<dyn ToolBackend>]) {
    for backend in started {
        if let Err(err) = backend.stop().await {
            tracing::warn!(backend = backend.name(), error = %err, "failed to roll back backend");
        }
    }
}

/// A [`ToolBroker`] is itself a valid backend, so brokers can be nested.
#[async_trait]
impl ToolBackend for ToolBroker {
    fn name(&self) -> &str {
        "broker"
    }

    async fn start(&self) -> ToolsResult<()> {
        // Backends are started at construction time via `ToolBroker::start`;
        // a broker wrapped as a sub-backend is already live by the time it
        // is handed to the parent broker.
        Ok(())
    }

    async fn stop(&self) -> ToolsResult<()> {
        self.shutdown().await
    }

    async fn list_tools(&self) -> ToolsResult<Vec<ToolDescriptor>> {
        Ok(self.list_tools())
    }

    async fn call_tool(
        &self,
        ctx: &RequestContext,
        name: &str,
        args: ToolArgs,
    ) -> ToolsResult<ToolCallOutcome> {
        self.call_tool(ctx, name, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noop::NoOpBackend;
    use crate::outcome::ToolCallResult;
    use async_trait::async_trait;

    struct StubBackend {
        name: String,
        tools: Vec<ToolDescriptor>,
    }

    #[async_trait]
    impl ToolBackend for StubBackend {
        fn name(&self) -> &str {
            &self.name
        }

        async fn start(&self) -> ToolsResult<()> {
            Ok(())
        }

        async fn stop(&self) -> ToolsResult<()> {
            Ok(())
        }

        async fn list_tools(&self) -> ToolsResult<Vec<ToolDescriptor>> {
            Ok(self.tools.clone())
        }

        async fn call_tool(
            &self,
            _ctx: &RequestContext,
            name: &str,
            _args: ToolArgs,
        ) -> ToolsResult<ToolCallOutcome> {
            Ok(ToolCallOutcome::Result(ToolCallResult::text(format!(
                "{}:{name}",
                self.name
            ))))
        }
    }

    struct AlwaysFailsBackend;

    #[async_trait]
    impl ToolBackend for AlwaysFailsBackend {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn start(&self) -> ToolsResult<()> {
            Err(ToolsError::BackendStartFailed {
                name: "flaky".to_string(),
                reason: "nope".to_string(),
            })
        }

        async fn stop(&self) -> ToolsResult<()> {
            Ok(())
        }

        async fn list_tools(&self) -> ToolsResult<Vec<ToolDescriptor>> {
            Ok(Vec::new())
        }

        async fn call_tool(
            &self,
            _ctx: &RequestContext,
            name: &str,
            _args: ToolArgs,
        ) -> ToolsResult<ToolCallOutcome> {
            Err(ToolsError::UnknownTool(name.to_string()))
        }
    }

    #[tokio::test]
    async fn merges_catalogs_from_every_backend() {
        let a = Arc::new(StubBackend {
            name: "a".to_string(),
            tools: vec![ToolDescriptor::new("tool_a", "desc", "a")],
        });
        let b = Arc::new(StubBackend {
            name: "b".to_string(),
            tools: vec![ToolDescriptor::new("tool_b", "desc", "b")],
        });

        let broker = ToolBroker::start(vec![a, b]).await.unwrap();
        let mut names: Vec<_> = broker.list_tools().into_iter().map(|t| t.name).collect();
        names.sort();
        assert_eq!(names, vec!["tool_a".to_string(), "tool_b".to_string()]);
    }

    #[tokio::test]
    async fn duplicate_tool_name_is_startup_fatal() {
        let a = Arc::new(StubBackend {
            name: "a".to_string(),
            tools: vec![ToolDescriptor::new("shared", "desc", "a")],
        });
        let b = Arc::new(StubBackend {
            name: "b".to_string(),
            tools: vec![ToolDescriptor::new("shared", "desc", "b")],
        });

        let err = ToolBroker::start(vec![a, b]).await.unwrap_err();
        match err {
            ToolsError::DuplicateToolName {
                tool,
                first_backend,
                second_backend,
            } => {
                assert_eq!(tool, "shared");
                assert_eq!(first_backend, "a");
                assert_eq!(second_backend, "b");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn call_tool_routes_to_owning_backend() {
        let a = Arc::new(StubBackend {
            name: "a".to_string(),
            tools: vec![ToolDescriptor::new("tool_a", "desc", "a")],
        });
        let broker = ToolBroker::start(vec![a]).await.unwrap();
        let ctx = RequestContext::new();
        let outcome = broker.call_tool(&ctx, "tool_a", ToolArgs::Null).await.unwrap();
        match outcome {
            ToolCallOutcome::Result(result) => assert_eq!(result.first_text(), Some("a:tool_a")),
            ToolCallOutcome::AuthRequired { .. } => panic!("expected a result"),
        }
    }

    #[tokio::test]
    async fn call_unknown_tool_errors() {
        let broker = ToolBroker::start(vec![Arc::new(NoOpBackend::new("empty"))])
            .await
            .unwrap();
        let ctx = RequestContext::new();
        let err = broker
            .call_tool(&ctx, "missing", ToolArgs::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolsError::UnknownTool(_)));
    }

    #[tokio::test]
    async fn status_reports_tool_counts_per_backend() {
        let a = Arc::new(StubBackend {
            name: "a".to_string(),
            tools: vec![
                ToolDescriptor::new("one", "d", "a"),
                ToolDescriptor::new("two", "d", "a"),
            ],
        });
        let broker = ToolBroker::start(vec![a]).await.unwrap();
        let status = broker.status();
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].tool_count, 2);
        assert!(status[0].alive);
    }

    #[tokio::test]
    async fn failed_backend_start_rolls_back_earlier_backends() {
        let a = Arc::new(StubBackend {
            name: "a".to_string(),
            tools: vec![ToolDescriptor::new("tool_a", "desc", "a")],
        });
        let flaky = Arc::new(AlwaysFailsBackend);

        let err = ToolBroker::start(vec![a, flaky]).await.unwrap_err();
        assert!(matches!(err, ToolsError::BackendStartFailed { .. }));
    }
}
