//! Injected side effects run around each cycle.
//!
//! Every hook is best-effort: errors and panics are logged and the cycle
//! continues with the next stage.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use super::panic_message;
use crate::error::Result;

/// A whole-cycle side effect (snapshot, secondary aggregation)
#[async_trait]
pub trait SideEffectHook: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, scheduler_id: &str) -> Result<()>;
}

/// Per-category tag aggregation
#[async_trait]
pub trait CategoryTagHook: Send + Sync {
    async fn categories(&self) -> Result<Vec<String>>;

    async fn update_category(&self, category: &str) -> Result<()>;
}

/// Optional hooks for the snapshot, aggregation, and tag stages
#[derive(Clone, Default)]
pub struct CycleHooks {
    snapshot: Option<Arc<dyn SideEffectHook>>,
    aggregation: Option<Arc<dyn SideEffectHook>>,
    tags: Option<Arc<dyn CategoryTagHook>>,
}

impl CycleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(mut self, hook: Arc<dyn SideEffectHook>) -> Self {
        self.snapshot = Some(hook);
        self
    }

    pub fn with_aggregation(mut self, hook: Arc<dyn SideEffectHook>) -> Self {
        self.aggregation = Some(hook);
        self
    }

    pub fn with_tags(mut self, hook: Arc<dyn CategoryTagHook>) -> Self {
        self.tags = Some(hook);
        self
    }

    /// Stage 1
    pub async fn run_snapshot(&self, scheduler_id: &str) {
        if let Some(hook) = &self.snapshot {
            run_side_effect(hook.as_ref(), scheduler_id).await;
        }
    }

    /// Stage 4
    pub async fn run_aggregation(&self, scheduler_id: &str) {
        if let Some(hook) = &self.aggregation {
            run_side_effect(hook.as_ref(), scheduler_id).await;
        }
    }

    /// Stage 5; returns how many categories were updated
    pub async fn run_tags(&self, scheduler_id: &str) -> usize {
        let Some(hook) = &self.tags else {
            return 0;
        };

        let categories = match AssertUnwindSafe(hook.categories()).catch_unwind().await {
            Ok(Ok(categories)) => categories,
            Ok(Err(e)) => {
                log::warn!("{}: failed to list tag categories: {}", scheduler_id, e);
                return 0;
            }
            Err(panic) => {
                log::error!("{}: tag category listing panicked: {}", scheduler_id, panic_message(&panic));
                return 0;
            }
        };

        let mut updated = 0;
        for category in &categories {
            match AssertUnwindSafe(hook.update_category(category)).catch_unwind().await {
                Ok(Ok(())) => updated += 1,
                Ok(Err(e)) => log::warn!("{}: tag update for '{}' failed: {}", scheduler_id, category, e),
                Err(panic) => log::error!(
                    "{}: tag update for '{}' panicked: {}",
                    scheduler_id,
                    category,
                    panic_message(&panic)
                ),
            }
        }
        log::debug!("{}: updated tags for {}/{} categories", scheduler_id, updated, categories.len());
        updated
    }
}

async fn run_side_effect(hook: &dyn SideEffectHook, scheduler_id: &str) {
    match AssertUnwindSafe(hook.run(scheduler_id)).catch_unwind().await {
        Ok(Ok(())) => log::debug!("{}: {} hook done", scheduler_id, hook.name()),
        Ok(Err(e)) => log::warn!("{}: {} hook failed: {}", scheduler_id, hook.name(), e),
        Err(panic) => log::error!("{}: {} hook panicked: {}", scheduler_id, hook.name(), panic_message(&panic)),
    }
}
