//! Population phase: bounded fan-out of producers into the registry
//!
//! Producers run concurrently under a semaphore and are joined before the
//! next stage (or the generation phase) starts. The registry enforces no
//! ordering of its own, so hard dependencies between object kinds are
//! expressed as consecutive stages of a [`PopulationPlan`].

use crate::config::{FailurePolicy, PipelineConfig};
use crate::error::{ExportError, PopulationError, ProducerError, ProducerFailure, Result};
use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tfexport_registry::ResourceRegistry;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

/// A unit of work that turns source-system objects into descriptors
///
/// Network calls happen inside `populate`; the registry lock is only held
/// for the duration of each registry call.
#[async_trait]
pub trait Producer: Send + Sync {
    /// Name used in diagnostics and failure reports
    fn name(&self) -> &str;

    /// Fetch objects and insert their descriptors
    async fn populate(&self, registry: Arc<ResourceRegistry>) -> std::result::Result<(), ProducerError>;
}

type ProducerOutcome = (String, std::result::Result<(), ProducerError>);

/// Bounded group of concurrently running producers
pub struct PopulationGroup {
    registry: Arc<ResourceRegistry>,
    permits: Arc<Semaphore>,
    policy: FailurePolicy,
    tasks: JoinSet<ProducerOutcome>,
}

impl PopulationGroup {
    /// Create an empty group writing into `registry`
    pub fn new(registry: Arc<ResourceRegistry>, config: &PipelineConfig) -> Self {
        Self {
            registry,
            permits: Arc::new(Semaphore::new(config.max_concurrent_producers.max(1))),
            policy: config.failure_policy,
            tasks: JoinSet::new(),
        }
    }

    /// Number of dispatched producers not yet joined
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Dispatch a producer; it starts once a concurrency permit is free
    pub fn spawn(&mut self, producer: Arc<dyn Producer>) {
        let registry = self.registry.clone();
        let permits = self.permits.clone();
        let name = producer.name().to_string();

        debug!(producer = %name, pending = self.tasks.len(), "Dispatching producer");

        self.tasks.spawn(async move {
            let result = match permits.acquire_owned().await {
                Ok(_permit) => AssertUnwindSafe(producer.populate(registry))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| Err(ProducerError::Panicked(panic_message(&*panic)))),
                Err(_) => Err(ProducerError::Cancelled),
            };
            (name, result)
        });
    }

    /// Wait for every dispatched producer
    ///
    /// Under [`FailurePolicy::FailFast`] the first failure aborts the
    /// producers still running and closes the semaphore, so producers still
    /// waiting for a permit never start. Descriptors inserted before the
    /// abort stay in the registry.
    #[instrument(skip(self), fields(producers = self.tasks.len(), policy = ?self.policy))]
    pub async fn join(mut self) -> std::result::Result<(), PopulationError> {
        let mut failures = Vec::new();
        let mut cancelled = 0usize;

        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((producer, Err(ProducerError::Cancelled))) => {
                    debug!(producer = %producer, "Producer never started");
                    cancelled += 1;
                }
                Ok((producer, Err(source))) => {
                    warn!(producer = %producer, error = %source, "Producer failed");
                    failures.push(ProducerFailure { producer, source });

                    if self.policy == FailurePolicy::FailFast {
                        // Queued producers wake up with a closed semaphore.
                        self.permits.close();
                        self.tasks.abort_all();
                    }
                }
                Err(err) if err.is_cancelled() => cancelled += 1,
                Err(err) => failures.push(ProducerFailure {
                    producer: "<unknown>".into(),
                    source: ProducerError::Panicked(err.to_string()),
                }),
            }
        }

        if cancelled > 0 {
            info!(cancelled, "Producers aborted after failure");
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PopulationError { failures })
        }
    }
}

struct Stage {
    name: String,
    producers: Vec<Arc<dyn Producer>>,
}

/// Ordered stages of producers
///
/// Producers within a stage run concurrently. A stage starts only after the
/// previous one joined without error, so a producer may rely on every
/// descriptor inserted by earlier stages.
#[derive(Default)]
pub struct PopulationPlan {
    stages: Vec<Stage>,
}

impl PopulationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage
    pub fn stage<I>(mut self, name: impl Into<String>, producers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Producer>>,
    {
        self.stages.push(Stage {
            name: name.into(),
            producers: producers.into_iter().collect(),
        });
        self
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Total number of producers across all stages
    pub fn producer_count(&self) -> usize {
        self.stages.iter().map(|s| s.producers.len()).sum()
    }

    /// Run every stage in order, joining each before starting the next
    #[instrument(skip_all, fields(stages = self.stages.len()))]
    pub async fn run(&self, registry: &Arc<ResourceRegistry>, config: &PipelineConfig) -> Result<()> {
        config.validate()?;

        for stage in &self.stages {
            let mut group = PopulationGroup::new(registry.clone(), config);
            for producer in &stage.producers {
                group.spawn(producer.clone());
            }

            group.join().await.map_err(|source| ExportError::Population {
                stage: stage.name.clone(),
                source,
            })?;

            info!(
                stage = %stage.name,
                resources = registry.len(),
                "Population stage joined"
            );
        }

        Ok(())
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tfexport_registry::ResourceDescriptor;

    enum Outcome {
        Insert,
        Fail,
        Panic,
    }

    struct TestProducer {
        name: String,
        delay: Duration,
        outcome: Outcome,
    }

    impl TestProducer {
        fn new(name: &str, delay_ms: u64, outcome: Outcome) -> Arc<dyn Producer> {
            Arc::new(Self {
                name: name.to_string(),
                delay: Duration::from_millis(delay_ms),
                outcome,
            })
        }
    }

    #[async_trait]
    impl Producer for TestProducer {
        fn name(&self) -> &str {
            &self.name
        }

        async fn populate(
            &self,
            registry: Arc<ResourceRegistry>,
        ) -> std::result::Result<(), ProducerError> {
            tokio::time::sleep(self.delay).await;
            match self.outcome {
                Outcome::Insert => {
                    registry.insert([ResourceDescriptor::new(&self.name, "Test")
                        .with_lookup(format!("${{test.{}}}", self.name))]);
                    Ok(())
                }
                Outcome::Fail => Err(ProducerError::fetch("Test", "connection reset")),
                Outcome::Panic => panic!("producer {} exploded", self.name),
            }
        }
    }

    struct GaugeProducer {
        name: String,
        active: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Producer for GaugeProducer {
        fn name(&self) -> &str {
            &self.name
        }

        async fn populate(
            &self,
            registry: Arc<ResourceRegistry>,
        ) -> std::result::Result<(), ProducerError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            registry.insert([ResourceDescriptor::new(&self.name, "Gauge")]);
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let registry = Arc::new(ResourceRegistry::new());
        let config = PipelineConfig::default().with_max_concurrent_producers(2);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut group = PopulationGroup::new(registry.clone(), &config);
        for i in 0..8 {
            group.spawn(Arc::new(GaugeProducer {
                name: format!("gauge-{i}"),
                active: active.clone(),
                peak: peak.clone(),
            }));
        }
        assert_eq!(group.len(), 8);

        group.join().await.unwrap();

        assert_eq!(registry.count_of_type("Gauge"), 8);
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_run_to_completion_finishes_siblings() {
        let registry = Arc::new(ResourceRegistry::new());
        let config = PipelineConfig::default().with_failure_policy(FailurePolicy::RunToCompletion);

        let mut group = PopulationGroup::new(registry.clone(), &config);
        group.spawn(TestProducer::new("broken", 0, Outcome::Fail));
        group.spawn(TestProducer::new("also-broken", 5, Outcome::Fail));
        group.spawn(TestProducer::new("a", 20, Outcome::Insert));
        group.spawn(TestProducer::new("b", 40, Outcome::Insert));

        let err = group.join().await.unwrap_err();

        assert_eq!(err.failures.len(), 2);
        assert!(registry.exists("Test", "a"));
        assert!(registry.exists("Test", "b"));
    }

    #[tokio::test]
    async fn test_fail_fast_aborts_siblings() {
        let registry = Arc::new(ResourceRegistry::new());
        let config = PipelineConfig::default().with_failure_policy(FailurePolicy::FailFast);

        let mut group = PopulationGroup::new(registry.clone(), &config);
        group.spawn(TestProducer::new("broken", 0, Outcome::Fail));
        group.spawn(TestProducer::new("slow-a", 30_000, Outcome::Insert));
        group.spawn(TestProducer::new("slow-b", 30_000, Outcome::Insert));

        let started = std::time::Instant::now();
        let err = group.join().await.unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].producer, "broken");
        assert!(registry.is_empty());
    }

    struct CountingProducer {
        started: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Producer for CountingProducer {
        fn name(&self) -> &str {
            "queued"
        }

        async fn populate(
            &self,
            registry: Arc<ResourceRegistry>,
        ) -> std::result::Result<(), ProducerError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            self.started.fetch_add(1, Ordering::SeqCst);
            registry.insert([ResourceDescriptor::new("queued", "Test")]);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_fail_fast_closes_queue() {
        let registry = Arc::new(ResourceRegistry::new());
        let config = PipelineConfig::default()
            .with_max_concurrent_producers(1)
            .with_failure_policy(FailurePolicy::FailFast);
        let started = Arc::new(AtomicUsize::new(0));

        let mut group = PopulationGroup::new(registry.clone(), &config);
        group.spawn(TestProducer::new("broken", 0, Outcome::Fail));
        for _ in 0..4 {
            group.spawn(Arc::new(CountingProducer {
                started: started.clone(),
            }));
        }

        let err = group.join().await.unwrap_err();

        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].producer, "broken");
        assert_eq!(started.load(Ordering::SeqCst), 0);
        assert!(!registry.exists("Test", "queued"));
    }

    #[tokio::test]
    async fn test_panicking_producer_is_reported() {
        let registry = Arc::new(ResourceRegistry::new());
        let mut group = PopulationGroup::new(registry.clone(), &PipelineConfig::default());
        group.spawn(TestProducer::new("volatile", 0, Outcome::Panic));
        group.spawn(TestProducer::new("steady", 0, Outcome::Insert));

        let err = group.join().await.unwrap_err();

        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].producer, "volatile");
        assert!(matches!(
            &err.failures[0].source,
            ProducerError::Panicked(message) if message.contains("exploded")
        ));
        assert!(registry.exists("Test", "steady"));
    }

    #[tokio::test]
    async fn test_empty_group_joins() {
        let registry = Arc::new(ResourceRegistry::new());
        let group = PopulationGroup::new(registry, &PipelineConfig::default());
        assert!(group.is_empty());
        assert!(group.join().await.is_ok());
    }

    struct DependentProducer;

    #[async_trait]
    impl Producer for DependentProducer {
        fn name(&self) -> &str {
            "dependent"
        }

        async fn populate(
            &self,
            registry: Arc<ResourceRegistry>,
        ) -> std::result::Result<(), ProducerError> {
            let parent = registry.resolve("Test", "base");
            if parent.is_empty() {
                return Err(ProducerError::invalid("Dependent", "child", "base not populated"));
            }
            registry.insert([ResourceDescriptor::new("child", "Dependent").with_lookup(parent)]);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_plan_stages_run_in_order() {
        let registry = Arc::new(ResourceRegistry::new());
        let plan = PopulationPlan::new()
            .stage("base", [TestProducer::new("base", 30, Outcome::Insert)])
            .stage("dependent", [Arc::new(DependentProducer) as Arc<dyn Producer>]);

        assert_eq!(plan.stage_count(), 2);
        assert_eq!(plan.producer_count(), 2);

        plan.run(&registry, &PipelineConfig::default()).await.unwrap();

        assert_eq!(registry.resolve("Dependent", "child"), "${test.base}");
    }

    #[tokio::test]
    async fn test_failed_stage_stops_plan() {
        let registry = Arc::new(ResourceRegistry::new());
        let plan = PopulationPlan::new()
            .stage("first", [TestProducer::new("broken", 0, Outcome::Fail)])
            .stage("second", [TestProducer::new("never", 0, Outcome::Insert)]);

        let err = plan
            .run(&registry, &PipelineConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Population { ref stage, .. } if stage == "first"));
        assert!(!registry.exists("Test", "never"));
    }

    #[tokio::test]
    async fn test_plan_rejects_invalid_config() {
        let registry = Arc::new(ResourceRegistry::new());
        let config = PipelineConfig::default().with_max_concurrent_producers(0);

        let err = PopulationPlan::new().run(&registry, &config).await.unwrap_err();
        assert!(matches!(err, ExportError::InvalidConfig(_)));
    }
}
