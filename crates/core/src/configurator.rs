//! Configurators turn a declared graph into pending transactions.

use crate::{ConfigureError, ExecutionMode, MemoizedFactory, OmniFactory};
use async_trait::async_trait;
use omnigraph_types::{flatten_transactions, OmniTransaction};
use std::sync::Arc;
use tracing::{debug, info};

/// Diffs declared configuration against live state.
///
/// `G` is the graph type and `T` the SDK handle the configurator reads
/// through. A configurator only reads; the transactions it returns are never
/// submitted by it. Any read failure other than the protocol's unset sentinel
/// fails the whole call.
#[async_trait]
pub trait Configurator<G: ?Sized + Sync, T: ?Sized + Send + Sync>: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &'static str;

    /// Compute the transactions needed to converge live state to `graph`.
    ///
    /// `mode` selects how independent nodes/edges are fanned out. The order of
    /// the returned transactions is stable regardless of `mode`.
    async fn configure(
        &self,
        graph: &G,
        factory: &dyn OmniFactory<T>,
        mode: ExecutionMode,
    ) -> Result<Vec<OmniTransaction>, ConfigureError>;
}

/// Runs a fixed sequence of configurators and concatenates their output.
///
/// Steps always run one after another in declared order, since later steps
/// may depend on state changed by earlier ones at the same point. The
/// execution mode is forwarded to each step for its own fan-out.
///
/// Every step of one run reads through the same [`MemoizedFactory`], so a
/// point's handle is created once per run no matter how many steps touch it.
pub struct CompositeConfigurator<G: ?Sized, T: ?Sized> {
    name: &'static str,
    steps: Vec<Arc<dyn Configurator<G, T>>>,
}

impl<G: ?Sized + Sync, T: ?Sized + Send + Sync> CompositeConfigurator<G, T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
        }
    }

    /// Append a step.
    pub fn then(mut self, step: impl Configurator<G, T> + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    /// Append an already shared step.
    pub fn then_shared(mut self, step: Arc<dyn Configurator<G, T>>) -> Self {
        self.steps.push(step);
        self
    }

    /// Names of the steps in execution order.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name()).collect()
    }
}

#[async_trait]
impl<G, T> Configurator<G, T> for CompositeConfigurator<G, T>
where
    G: ?Sized + Sync,
    T: ?Sized + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    async fn configure(
        &self,
        graph: &G,
        factory: &dyn OmniFactory<T>,
        mode: ExecutionMode,
    ) -> Result<Vec<OmniTransaction>, ConfigureError> {
        let handles: MemoizedFactory<_, T> = MemoizedFactory::new(factory);
        let mut outputs = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let transactions = step.configure(graph, &handles, mode).await?;
            debug!(
                composite = self.name,
                step = step.name(),
                count = transactions.len(),
                "Configurator step finished"
            );
            outputs.push(transactions);
        }

        let transactions = flatten_transactions(outputs);
        info!(
            composite = self.name,
            count = transactions.len(),
            handles = handles.cached_points(),
            %mode,
            "Configuration computed"
        );
        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{factory_fn, FactoryError};
    use omnigraph_test_helpers::{point, transaction};
    use omnigraph_types::OmniPoint;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tracing_test::traced_test;

    struct Handle;

    struct Fixed {
        name: &'static str,
        tags: Vec<&'static str>,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Configurator<(), Handle> for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn configure(
            &self,
            _graph: &(),
            factory: &dyn OmniFactory<Handle>,
            _mode: ExecutionMode,
        ) -> Result<Vec<OmniTransaction>, ConfigureError> {
            let at = point(1, "0xa");
            factory.create(&at).await?;
            self.log.lock().unwrap().push(self.name);
            Ok(self.tags.iter().map(|tag| transaction(&at, tag)).collect())
        }
    }

    struct Failing;

    #[async_trait]
    impl Configurator<(), Handle> for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn configure(
            &self,
            _graph: &(),
            _factory: &dyn OmniFactory<Handle>,
            _mode: ExecutionMode,
        ) -> Result<Vec<OmniTransaction>, ConfigureError> {
            Err(ConfigureError::Factory(FactoryError::Unsupported(point(
                1, "0xa",
            ))))
        }
    }

    fn fixed(
        name: &'static str,
        tags: Vec<&'static str>,
        log: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Fixed {
        Fixed {
            name,
            tags,
            log: log.clone(),
        }
    }

    fn counting(calls: &Arc<AtomicUsize>) -> impl OmniFactory<Handle> {
        let calls = calls.clone();
        factory_fn(move |_point: OmniPoint| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(Handle))
            }
        })
    }

    #[traced_test]
    #[tokio::test]
    async fn test_steps_run_in_declared_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        let factory = counting(&calls);
        let composite = CompositeConfigurator::new("everything")
            .then(fixed("register", vec!["r1", "r2"], &log))
            .then(fixed("noop", vec![], &log))
            .then(fixed("default", vec!["d1"], &log));

        for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
            log.lock().unwrap().clear();
            let transactions = composite.configure(&(), &factory, mode).await.unwrap();

            let descriptions: Vec<_> = transactions
                .iter()
                .map(|tx| tx.description.as_str())
                .collect();
            assert_eq!(descriptions, vec!["r1", "r2", "d1"]);
            assert_eq!(*log.lock().unwrap(), vec!["register", "noop", "default"]);
        }
        assert_eq!(composite.step_names(), vec!["register", "noop", "default"]);
        assert!(logs_contain("Configuration computed"));
    }

    #[tokio::test]
    async fn test_steps_share_handles_within_a_run() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        let factory = counting(&calls);
        let inner = CompositeConfigurator::new("inner")
            .then(fixed("inner-first", vec![], &log))
            .then(fixed("inner-second", vec![], &log));
        let composite = CompositeConfigurator::new("outer")
            .then(fixed("first", vec!["a"], &log))
            .then(inner)
            .then(fixed("last", vec!["b"], &log));

        composite
            .configure(&(), &factory, ExecutionMode::Parallel)
            .await
            .unwrap();
        assert_eq!(log.lock().unwrap().len(), 4);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // A new run starts with an empty cache.
        composite
            .configure(&(), &factory, ExecutionMode::Parallel)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failing_step_aborts_composite() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        let composite = CompositeConfigurator::new("everything")
            .then(fixed("first", vec!["a"], &log))
            .then(Failing)
            .then(fixed("never", vec!["b"], &log));

        let result = composite
            .configure(&(), &counting(&calls), ExecutionMode::Parallel)
            .await;

        assert!(result.is_err());
        assert_eq!(*log.lock().unwrap(), vec!["first"]);
    }
}
