//! Scheduler Manager: a registry of named schedulers.
//!
//! The manager:
//! 1. Registers schedulers by id, replacing duplicates with a warning
//! 2. Attaches its logging observer to every registered scheduler
//! 3. Fans `start_all` / `stop_all` out concurrently, isolating failures
//! 4. Answers live status queries

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::RwLock;

use super::lifecycle::Lifecycle;
use super::observer::{LoggingObserver, SchedulerObserver};
use super::panic_message;
use crate::domain::SchedulerStatus;
use crate::error::{Result, TrendError};

/// Outcome of a fan-out operation across all schedulers
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FanOutReport {
    pub succeeded: Vec<String>,
    /// Scheduler id and error message
    pub failed: Vec<(String, String)>,
}

impl FanOutReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
enum FanOut {
    Start,
    Stop,
}

impl FanOut {
    fn verb(self) -> &'static str {
        match self {
            FanOut::Start => "start",
            FanOut::Stop => "stop",
        }
    }
}

pub struct SchedulerManager {
    name: String,
    schedulers: RwLock<BTreeMap<String, Arc<dyn Lifecycle>>>,
    observer: Arc<dyn SchedulerObserver>,
}

impl SchedulerManager {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            observer: Arc::new(LoggingObserver::new(name.clone())),
            name,
            schedulers: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register under the scheduler's own id; returns the replaced scheduler, if any.
    ///
    /// A replaced scheduler is detached from the manager's observer and stopped.
    pub async fn register(&self, scheduler: Arc<dyn Lifecycle>) -> Option<Arc<dyn Lifecycle>> {
        let id = scheduler.id().to_string();
        scheduler.add_observer(Arc::clone(&self.observer));

        let replaced = self.schedulers.write().await.insert(id.clone(), scheduler);

        if let Some(old) = &replaced {
            tracing::warn!(scheduler_id = %id, manager = %self.name, "Scheduler already registered, replacing");
            old.remove_observer(&self.observer);
            if old.status() != SchedulerStatus::Stopped {
                if let Err(e) = old.stop().await {
                    tracing::warn!(scheduler_id = %id, error = %e, "Failed to stop replaced scheduler");
                }
            }
        } else {
            tracing::info!(scheduler_id = %id, manager = %self.name, "Scheduler registered");
        }
        replaced
    }

    /// Remove from the registry without stopping; the caller owns the returned scheduler
    pub async fn unregister(&self, id: &str) -> Option<Arc<dyn Lifecycle>> {
        let removed = self.schedulers.write().await.remove(id);
        match &removed {
            Some(scheduler) => {
                scheduler.remove_observer(&self.observer);
                tracing::info!(scheduler_id = %id, manager = %self.name, "Scheduler unregistered");
            }
            None => tracing::warn!(scheduler_id = %id, "Unregister of unknown scheduler"),
        }
        removed
    }

    pub async fn get(&self, id: &str) -> Option<Arc<dyn Lifecycle>> {
        self.schedulers.read().await.get(id).cloned()
    }

    async fn require(&self, id: &str) -> Result<Arc<dyn Lifecycle>> {
        self.get(id).await.ok_or_else(|| TrendError::NotFound(id.to_string()))
    }

    pub async fn start(&self, id: &str) -> Result<()> {
        self.require(id).await?.start().await
    }

    pub async fn stop(&self, id: &str) -> Result<()> {
        self.require(id).await?.stop().await
    }

    /// Start every scheduler currently Stopped
    pub async fn start_all(&self) -> FanOutReport {
        let targets = self
            .snapshot()
            .await
            .into_iter()
            .filter(|(_, s)| s.status() == SchedulerStatus::Stopped)
            .collect();
        self.fan_out(targets, FanOut::Start).await
    }

    /// Stop every scheduler not already Stopped
    pub async fn stop_all(&self) -> FanOutReport {
        let targets = self
            .snapshot()
            .await
            .into_iter()
            .filter(|(_, s)| s.status() != SchedulerStatus::Stopped)
            .collect();
        self.fan_out(targets, FanOut::Stop).await
    }

    async fn snapshot(&self) -> Vec<(String, Arc<dyn Lifecycle>)> {
        self.schedulers
            .read()
            .await
            .iter()
            .map(|(id, s)| (id.clone(), Arc::clone(s)))
            .collect()
    }

    async fn fan_out(&self, targets: Vec<(String, Arc<dyn Lifecycle>)>, op: FanOut) -> FanOutReport {
        let tasks = targets.into_iter().map(|(id, scheduler)| async move {
            let call = async {
                match op {
                    FanOut::Start => scheduler.start().await,
                    FanOut::Stop => scheduler.stop().await,
                }
            };
            let outcome = match AssertUnwindSafe(call).catch_unwind().await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(panic) => Err(format!("panicked: {}", panic_message(&panic))),
            };
            (id, outcome)
        });

        let mut report = FanOutReport::default();
        for (id, outcome) in join_all(tasks).await {
            match outcome {
                Ok(()) => report.succeeded.push(id),
                Err(e) => {
                    tracing::error!(scheduler_id = %id, error = %e, "Failed to {} scheduler", op.verb());
                    report.failed.push((id, e));
                }
            }
        }

        tracing::info!(
            manager = %self.name,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Fan-out {} finished",
            op.verb()
        );
        report
    }

    /// Live status of one scheduler
    pub async fn get_status(&self, id: &str) -> Option<SchedulerStatus> {
        self.schedulers.read().await.get(id).map(|s| s.status())
    }

    pub async fn statuses(&self) -> BTreeMap<String, SchedulerStatus> {
        self.schedulers
            .read()
            .await
            .iter()
            .map(|(id, s)| (id.clone(), s.status()))
            .collect()
    }

    pub async fn list_ids(&self) -> Vec<String> {
        self.schedulers.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.schedulers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
