//! Scheduler state machine and its run loop.
//!
//! One `Scheduler` owns one collector/analyzer pair and at most one loop task.
//! Status lives in an [`AtomicStatus`]; every state-dependent transition is a
//! compare-and-exchange. Lifecycle calls (`start`, `stop`) additionally hold a
//! per-scheduler async mutex so a start never interleaves with a stop.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use super::hooks::CycleHooks;
use super::observer::{EventBus, SchedulerObserver};
use super::panic_message;
use crate::analysis::AnalysisStrategy;
use crate::collection::CollectionStrategy;
use crate::config::{RuntimeConfig, SchedulerConfig};
use crate::domain::{AtomicStatus, SchedulerEvent, SchedulerStatus};
use crate::error::{Result, TrendError};

/// Control surface shared by every scheduler implementation
#[async_trait]
pub trait Lifecycle: Send + Sync {
    fn id(&self) -> &str;

    async fn start(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn resume(&self) -> Result<()>;

    fn status(&self) -> SchedulerStatus;

    fn add_observer(&self, observer: Arc<dyn SchedulerObserver>);

    fn remove_observer(&self, observer: &Arc<dyn SchedulerObserver>);
}

/// Runtime timings that are not part of a scheduler's own config
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerOptions {
    /// Pause after a failed cycle before resuming automatically
    pub error_cooldown: Duration,
    /// How long `stop()` waits for the loop before aborting it
    pub stop_grace: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            error_cooldown: Duration::from_secs(60),
            stop_grace: Duration::from_secs(5),
        }
    }
}

impl From<&RuntimeConfig> for SchedulerOptions {
    fn from(runtime: &RuntimeConfig) -> Self {
        Self {
            error_cooldown: runtime.error_cooldown(),
            stop_grace: runtime.stop_grace(),
        }
    }
}

struct SchedulerInner {
    config: SchedulerConfig,
    collector: Arc<dyn CollectionStrategy>,
    analyzer: Arc<dyn AnalysisStrategy>,
    hooks: CycleHooks,
    bus: EventBus,
    status: AtomicStatus,
    options: SchedulerOptions,
}

/// Handle to a live loop task
struct RunHandle {
    task: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

pub struct SchedulerBuilder {
    config: SchedulerConfig,
    collector: Arc<dyn CollectionStrategy>,
    analyzer: Arc<dyn AnalysisStrategy>,
    hooks: CycleHooks,
    options: SchedulerOptions,
}

impl SchedulerBuilder {
    pub fn hooks(mut self, hooks: CycleHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn options(mut self, options: SchedulerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Scheduler {
        Scheduler {
            inner: Arc::new(SchedulerInner {
                config: self.config,
                collector: self.collector,
                analyzer: self.analyzer,
                hooks: self.hooks,
                bus: EventBus::new(),
                status: AtomicStatus::default(),
                options: self.options,
            }),
            run: Mutex::new(None),
        }
    }
}

/// Periodic collect-then-analyze scheduler
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
    run: Mutex<Option<RunHandle>>,
}

impl Scheduler {
    pub fn builder(
        config: SchedulerConfig,
        collector: Arc<dyn CollectionStrategy>,
        analyzer: Arc<dyn AnalysisStrategy>,
    ) -> SchedulerBuilder {
        SchedulerBuilder {
            config,
            collector,
            analyzer,
            hooks: CycleHooks::default(),
            options: SchedulerOptions::default(),
        }
    }

    pub fn new(
        config: SchedulerConfig,
        collector: Arc<dyn CollectionStrategy>,
        analyzer: Arc<dyn AnalysisStrategy>,
    ) -> Self {
        Self::builder(config, collector, analyzer).build()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// Execute one cycle in the caller's task, outside the run loop.
    ///
    /// Events and hooks fire as in a scheduled cycle, but the status is left
    /// untouched and a failure is returned instead of entering the cooldown.
    pub async fn run_once(&self) -> Result<()> {
        let (_keep, mut shutdown) = watch::channel(false);
        self.inner.execute_cycle(&mut shutdown).await
    }
}

#[async_trait]
impl Lifecycle for Scheduler {
    fn id(&self) -> &str {
        self.inner.config.id()
    }

    async fn start(&self) -> Result<()> {
        let mut run = self.run.lock().await;
        let id = self.id();

        match self
            .inner
            .status
            .compare_exchange(SchedulerStatus::Stopped, SchedulerStatus::Running)
        {
            Ok(_) => {}
            Err(SchedulerStatus::Running) => {
                tracing::warn!(scheduler_id = %id, "Scheduler already running");
                return Ok(());
            }
            Err(SchedulerStatus::Paused) => {
                drop(run);
                return self.resume().await;
            }
            Err(observed) => {
                return Err(TrendError::InvalidState(format!(
                    "{} cannot start while {}",
                    id, observed
                )));
            }
        }

        if let Some(stale) = run.take() {
            stale.task.abort();
        }

        let (shutdown, receiver) = watch::channel(false);
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(inner.run_loop(receiver));
        *run = Some(RunHandle { task, shutdown });

        tracing::info!(scheduler_id = %id, interval_secs = self.inner.config.interval().as_secs(), "Scheduler started");
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let mut run = self.run.lock().await;
        let id = self.id();

        let previous = self
            .inner
            .status
            .transition_from(SchedulerStatus::Stopped, |_| true)
            .unwrap_or(SchedulerStatus::Stopped);

        let Some(RunHandle { mut task, shutdown }) = run.take() else {
            tracing::debug!(scheduler_id = %id, "Scheduler not running");
            return Ok(());
        };

        let _ = shutdown.send(true);
        match tokio::time::timeout(self.inner.options.stop_grace, &mut task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(scheduler_id = %id, error = %e, "Scheduler loop ended abnormally"),
            Err(_) => {
                tracing::warn!(scheduler_id = %id, "Scheduler loop did not exit in time, cancelling");
                task.abort();
                let _ = task.await;
            }
        }
        self.inner.status.store(SchedulerStatus::Stopped);

        tracing::info!(scheduler_id = %id, previous = %previous, "Scheduler stopped");
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.inner
            .status
            .compare_exchange(SchedulerStatus::Running, SchedulerStatus::Paused)
            .map_err(|observed| {
                TrendError::InvalidState(format!("{} cannot pause while {}", self.id(), observed))
            })?;
        tracing::info!(scheduler_id = %self.id(), "Scheduler paused");
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        self.inner
            .status
            .compare_exchange(SchedulerStatus::Paused, SchedulerStatus::Running)
            .map_err(|observed| {
                TrendError::InvalidState(format!("{} cannot resume while {}", self.id(), observed))
            })?;
        tracing::info!(scheduler_id = %self.id(), "Scheduler resumed");
        Ok(())
    }

    fn status(&self) -> SchedulerStatus {
        self.inner.status.load()
    }

    fn add_observer(&self, observer: Arc<dyn SchedulerObserver>) {
        self.inner.bus.subscribe(observer);
    }

    fn remove_observer(&self, observer: &Arc<dyn SchedulerObserver>) {
        self.inner.bus.unsubscribe(observer);
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.run.get_mut().take() {
            let _ = handle.shutdown.send(true);
            handle.task.abort();
        }
    }
}

impl SchedulerInner {
    fn id(&self) -> &str {
        self.config.id()
    }

    async fn run_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        tracing::debug!(scheduler_id = %self.id(), "Run loop entered");

        loop {
            if self.status.load() == SchedulerStatus::Running {
                self.run_guarded_cycle(&mut shutdown).await;
            }
            if !sleep_unless_shutdown(&mut shutdown, self.config.interval()).await {
                break;
            }
        }

        tracing::debug!(scheduler_id = %self.id(), "Run loop exited");
    }

    async fn run_guarded_cycle(&self, shutdown: &mut watch::Receiver<bool>) {
        let error = match AssertUnwindSafe(self.execute_cycle(shutdown)).catch_unwind().await {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e,
            Err(panic) => TrendError::Operational(format!("cycle panicked: {}", panic_message(&panic))),
        };
        self.handle_error(error, shutdown).await;
    }

    /// Snapshot, collect, analyze, aggregate, tag
    async fn execute_cycle(&self, shutdown: &mut watch::Receiver<bool>) -> Result<()> {
        let started = Instant::now();
        let id = self.id();
        tracing::info!(scheduler_id = %id, strategy = self.collector.name(), "Cycle started");

        self.hooks.run_snapshot(id).await;

        let target = self.config.collection().max_items();
        self.bus.publish(&SchedulerEvent::collection_started(id, target)).await;
        let collector = &self.collector;
        let collection = Arc::new(
            self.with_retry("collect", shutdown, move || collector.collect(target))
                .await?,
        );
        self.bus
            .publish(&SchedulerEvent::collection_completed(id, Arc::clone(&collection)))
            .await;

        if !collection.is_empty() {
            let items = collection.items.as_slice();
            self.bus.publish(&SchedulerEvent::analysis_started(id, items.len())).await;
            let analyzer = &self.analyzer;
            let analysis = self
                .with_retry("analyze", shutdown, move || analyzer.analyze(items))
                .await?;
            tracing::info!(
                scheduler_id = %id,
                analyzed = items.len(),
                trending = analysis.trending_items.len(),
                "Analysis finished"
            );
            self.bus
                .publish(&SchedulerEvent::analysis_completed(id, Arc::new(analysis)))
                .await;
        }

        self.hooks.run_aggregation(id).await;
        self.hooks.run_tags(id).await;

        tracing::info!(
            scheduler_id = %id,
            collected = collection.total_collected,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Cycle finished"
        );
        Ok(())
    }

    /// Run `attempt` with the configured retries, each bounded by the execution limit.
    ///
    /// Only transient errors are retried; anything else fails the stage at once.
    async fn with_retry<T, F, Fut>(&self, stage: &str, shutdown: &mut watch::Receiver<bool>, attempt: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.config.retry_count() + 1;
        let limit = self.config.max_execution();
        let mut last_error = None;

        for n in 1..=attempts {
            let error = match tokio::time::timeout(limit, attempt()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => e,
                Err(_) => TrendError::Timeout(format!("{} exceeded {}s", stage, limit.as_secs())),
            };

            if !error.is_transient() || n == attempts {
                return Err(error);
            }

            tracing::warn!(
                scheduler_id = %self.id(),
                stage,
                attempt = n,
                error = %error,
                "Stage failed, retrying"
            );
            last_error = Some(error);

            if !sleep_unless_shutdown(shutdown, self.config.retry_delay()).await {
                break;
            }
        }

        Err(last_error.unwrap_or_else(|| TrendError::Operational(format!("{} was not attempted", stage))))
    }

    /// Enter Error from any live state, publish, cool down, then go back to Running.
    ///
    /// A pause taken while the failing cycle was in flight does not survive the cooldown.
    async fn handle_error(&self, error: TrendError, shutdown: &mut watch::Receiver<bool>) {
        let id = self.id();
        tracing::error!(scheduler_id = %id, error = %error, "Cycle failed");

        if self
            .status
            .transition_from(SchedulerStatus::Error, |s| s != SchedulerStatus::Stopped)
            .is_err()
        {
            return;
        }

        let context = format!("Scheduler {} execution", id);
        self.bus.publish(&SchedulerEvent::error(id, &error, context)).await;

        if !sleep_unless_shutdown(shutdown, self.options.error_cooldown).await {
            return;
        }

        match self
            .status
            .compare_exchange(SchedulerStatus::Error, SchedulerStatus::Running)
        {
            Ok(_) => tracing::info!(scheduler_id = %id, "Resumed after error cooldown"),
            Err(observed) => tracing::debug!(scheduler_id = %id, status = %observed, "Cooldown ended, status changed"),
        }
    }
}

/// Resolves once shutdown is raised or the sender is gone
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        let stop = *shutdown.borrow_and_update();
        if stop {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Sleep for `duration`; false when shutdown interrupted the wait
async fn sleep_unless_shutdown(shutdown: &mut watch::Receiver<bool>, duration: Duration) -> bool {
    tokio::select! {
        biased;
        _ = shutdown_requested(shutdown) => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
