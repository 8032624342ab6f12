//! Observer contract and the per-scheduler event bus.
//!
//! Delivery is sequential in subscription order and at-most-once per observer.
//! An observer that fails or panics is logged and skipped; the remaining
//! observers still receive the event and the cycle carries on.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use futures::FutureExt;

use super::panic_message;
use crate::domain::{AnalysisResult, CollectionResult, EventPayload, SchedulerEvent};
use crate::error::Result;

/// Receives scheduler lifecycle events.
///
/// Implement `on_event` to see every event, or override only the per-kind
/// handlers; the default `on_event` routes each payload to its handler.
#[async_trait]
pub trait SchedulerObserver: Send + Sync {
    fn name(&self) -> &str {
        "observer"
    }

    async fn on_event(&self, event: &SchedulerEvent) -> Result<()> {
        let id = event.scheduler_id.as_str();
        match &event.payload {
            EventPayload::CollectionStarted { target_count } => self.on_collection_started(id, *target_count).await,
            EventPayload::CollectionCompleted { result } => self.on_collection_completed(id, result).await,
            EventPayload::AnalysisStarted { item_count } => self.on_analysis_started(id, *item_count).await,
            EventPayload::AnalysisCompleted { result } => self.on_analysis_completed(id, result).await,
            EventPayload::Error { error, context } => self.on_error(id, error, context).await,
        }
    }

    async fn on_collection_started(&self, _scheduler_id: &str, _target_count: usize) -> Result<()> {
        Ok(())
    }

    async fn on_collection_completed(&self, _scheduler_id: &str, _result: &CollectionResult) -> Result<()> {
        Ok(())
    }

    async fn on_analysis_started(&self, _scheduler_id: &str, _item_count: usize) -> Result<()> {
        Ok(())
    }

    async fn on_analysis_completed(&self, _scheduler_id: &str, _result: &AnalysisResult) -> Result<()> {
        Ok(())
    }

    async fn on_error(&self, _scheduler_id: &str, _error: &str, _context: &str) -> Result<()> {
        Ok(())
    }
}

/// Ordered set of observers attached to one scheduler
#[derive(Default)]
pub struct EventBus {
    observers: RwLock<Vec<Arc<dyn SchedulerObserver>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an observer; attaching the same `Arc` twice is a no-op
    pub fn subscribe(&self, observer: Arc<dyn SchedulerObserver>) {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        if !observers.iter().any(|o| Arc::ptr_eq(o, &observer)) {
            observers.push(observer);
        }
    }

    /// Detach an observer by identity; returns whether it was attached
    pub fn unsubscribe(&self, observer: &Arc<dyn SchedulerObserver>) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|o| !Arc::ptr_eq(o, observer));
        observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every observer; returns how many handled it cleanly
    pub async fn publish(&self, event: &SchedulerEvent) -> usize {
        let observers = self.observers.read().unwrap_or_else(PoisonError::into_inner).clone();
        let mut delivered = 0;

        for observer in observers {
            match AssertUnwindSafe(observer.on_event(event)).catch_unwind().await {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => log::warn!(
                    "Observer '{}' failed on {:?} from {}: {}",
                    observer.name(),
                    event.kind(),
                    event.scheduler_id,
                    e
                ),
                Err(panic) => log::error!(
                    "Observer '{}' panicked on {:?} from {}: {}",
                    observer.name(),
                    event.kind(),
                    event.scheduler_id,
                    panic_message(&panic)
                ),
            }
        }
        delivered
    }
}

/// Logs completed stages and errors under a manager name
pub struct LoggingObserver {
    name: String,
}

impl LoggingObserver {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl SchedulerObserver for LoggingObserver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_collection_completed(&self, scheduler_id: &str, result: &CollectionResult) -> Result<()> {
        log::info!(
            "[{}] {} collected {} items ({} filtered) in {:.2}s",
            self.name,
            scheduler_id,
            result.total_collected,
            result.filtered_count,
            result.execution_secs
        );
        Ok(())
    }

    async fn on_analysis_completed(&self, scheduler_id: &str, result: &AnalysisResult) -> Result<()> {
        log::info!(
            "[{}] {} found {} trending items across {} categories",
            self.name,
            scheduler_id,
            result.trending_items.len(),
            result.category_trends.len()
        );
        Ok(())
    }

    async fn on_error(&self, scheduler_id: &str, error: &str, context: &str) -> Result<()> {
        log::error!("[{}] {} error in {}: {}", self.name, scheduler_id, context, error);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::testing::RecordingObserver;
    use super::*;
    use crate::domain::EventKind;
    use crate::error::TrendError;

    struct FailingObserver;

    #[async_trait]
    impl SchedulerObserver for FailingObserver {
        async fn on_event(&self, _event: &SchedulerEvent) -> Result<()> {
            Err(TrendError::Observer("boom".into()))
        }
    }

    struct PanickingObserver;

    #[async_trait]
    impl SchedulerObserver for PanickingObserver {
        async fn on_collection_started(&self, _id: &str, _n: usize) -> Result<()> {
            panic!("observer exploded");
        }
    }

    #[derive(Default)]
    struct ErrorCounter {
        errors: AtomicUsize,
        started: AtomicUsize,
    }

    #[async_trait]
    impl SchedulerObserver for ErrorCounter {
        async fn on_collection_started(&self, _id: &str, _n: usize) -> Result<()> {
            self.started.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn on_error(&self, _id: &str, _error: &str, context: &str) -> Result<()> {
            assert_eq!(context, "Scheduler s1 execution");
            self.errors.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_default_on_event_routes_by_kind() {
        let counter = Arc::new(ErrorCounter::default());
        let bus = EventBus::new();
        bus.subscribe(counter.clone());

        bus.publish(&SchedulerEvent::collection_started("s1", 5)).await;
        bus.publish(&SchedulerEvent::error("s1", "bad", "Scheduler s1 execution")).await;
        bus.publish(&SchedulerEvent::analysis_started("s1", 3)).await;

        assert_eq!(counter.started.load(Ordering::SeqCst), 1);
        assert_eq!(counter.errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_and_panicking_observers_are_isolated() {
        let recorder = Arc::new(RecordingObserver::default());
        let bus = EventBus::new();
        bus.subscribe(Arc::new(FailingObserver));
        bus.subscribe(Arc::new(PanickingObserver));
        bus.subscribe(recorder.clone());

        let delivered = bus.publish(&SchedulerEvent::collection_started("s1", 5)).await;

        assert_eq!(delivered, 1);
        assert_eq!(recorder.kinds(), vec![EventKind::CollectionStarted]);
    }

    #[tokio::test]
    async fn test_subscribe_is_idempotent_and_unsubscribe_by_identity() {
        let recorder: Arc<dyn SchedulerObserver> = Arc::new(RecordingObserver::default());
        let other: Arc<dyn SchedulerObserver> = Arc::new(RecordingObserver::default());
        let bus = EventBus::new();

        bus.subscribe(recorder.clone());
        bus.subscribe(recorder.clone());
        assert_eq!(bus.len(), 1);

        assert!(!bus.unsubscribe(&other));
        assert!(bus.unsubscribe(&recorder));
        assert!(bus.is_empty());
    }

    #[tokio::test]
    async fn test_logging_observer_never_fails() {
        let observer = LoggingObserver::new("manager");
        let event = SchedulerEvent::error("s1", "bad", "ctx");
        assert!(observer.on_event(&event).await.is_ok());
        assert_eq!(observer.name(), "manager");
    }
}
