//! Workflow registration
//!
//! A workflow is an async function registered under a name. Registration
//! returns a `Flow` handle that can be invoked in-process; the same name is
//! used as the flow half of a deployment reference when scheduling runs
//! through the orchestrator.

use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::errors::{FlowError, FlowResult};

type FlowFn = dyn Fn() -> BoxFuture<'static, FlowResult<()>> + Send + Sync;

/// Handle to a registered workflow
#[derive(Clone)]
pub struct Flow {
    name: String,
    func: Arc<FlowFn>,
}

impl Flow {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the workflow in the current task and wait for it to finish
    pub async fn invoke(&self) -> FlowResult<()> {
        tracing::info!("Beginning flow run for '{}'", self.name);
        let result = (self.func)().await;
        match &result {
            Ok(()) => tracing::info!("Flow '{}' finished", self.name),
            Err(e) => tracing::error!("Flow '{}' failed: {}", self.name, e),
        }
        result
    }
}

impl fmt::Debug for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flow").field("name", &self.name).finish()
    }
}

/// Wrap an async function as a named workflow
pub fn flow<F, Fut>(name: impl Into<String>, func: F) -> Flow
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FlowResult<()>> + Send + 'static,
{
    Flow {
        name: name.into(),
        func: Arc::new(move || -> BoxFuture<'static, FlowResult<()>> { Box::pin(func()) }),
    }
}

/// Workflows known to this process, by name
#[derive(Debug, Clone, Default)]
pub struct FlowRegistry {
    flows: BTreeMap<String, Flow>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a workflow, replacing any previous one with the same name
    pub fn register(&mut self, flow: Flow) -> &mut Self {
        self.flows.insert(flow.name.clone(), flow);
        self
    }

    pub fn get(&self, name: &str) -> FlowResult<&Flow> {
        self.flows
            .get(name)
            .ok_or_else(|| FlowError::UnknownFlow(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.flows.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_invoke_runs_function_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = flow("counting", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        handle.invoke().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handle.name(), "counting");
    }

    #[tokio::test]
    async fn test_invoke_propagates_errors() {
        let handle = flow("broken", || async { Err(FlowError::Failed("nope".to_string())) });

        let err = handle.invoke().await.unwrap_err();
        assert!(matches!(err, FlowError::Failed(msg) if msg == "nope"));
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = FlowRegistry::new();
        registry
            .register(flow("b-flow", || async { Ok(()) }))
            .register(flow("a-flow", || async { Ok(()) }));

        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a-flow", "b-flow"]);
        assert_eq!(registry.get("a-flow").unwrap().name(), "a-flow");
        assert!(matches!(
            registry.get("missing"),
            Err(FlowError::UnknownFlow(name)) if name == "missing"
        ));
    }
}
