//! Lifecycle events emitted by a scheduler during its cycles.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::result::{AnalysisResult, CollectionResult};

/// One notification delivered to scheduler observers
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerEvent {
    pub scheduler_id: String,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

/// Variant-specific event data
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    CollectionStarted { target_count: usize },
    CollectionCompleted { result: Arc<CollectionResult> },
    AnalysisStarted { item_count: usize },
    AnalysisCompleted { result: Arc<AnalysisResult> },
    Error { error: String, context: String },
}

/// Discriminant of [`EventPayload`], handy for assertions and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CollectionStarted,
    CollectionCompleted,
    AnalysisStarted,
    AnalysisCompleted,
    Error,
}

impl SchedulerEvent {
    pub fn new(scheduler_id: &str, payload: EventPayload) -> Self {
        Self {
            scheduler_id: scheduler_id.to_string(),
            timestamp: Utc::now(),
            payload,
        }
    }

    pub fn collection_started(scheduler_id: &str, target_count: usize) -> Self {
        Self::new(scheduler_id, EventPayload::CollectionStarted { target_count })
    }

    pub fn collection_completed(scheduler_id: &str, result: Arc<CollectionResult>) -> Self {
        Self::new(scheduler_id, EventPayload::CollectionCompleted { result })
    }

    pub fn analysis_started(scheduler_id: &str, item_count: usize) -> Self {
        Self::new(scheduler_id, EventPayload::AnalysisStarted { item_count })
    }

    pub fn analysis_completed(scheduler_id: &str, result: Arc<AnalysisResult>) -> Self {
        Self::new(scheduler_id, EventPayload::AnalysisCompleted { result })
    }

    pub fn error(scheduler_id: &str, error: impl ToString, context: impl Into<String>) -> Self {
        Self::new(
            scheduler_id,
            EventPayload::Error {
                error: error.to_string(),
                context: context.into(),
            },
        )
    }

    pub fn kind(&self) -> EventKind {
        match self.payload {
            EventPayload::CollectionStarted { .. } => EventKind::CollectionStarted,
            EventPayload::CollectionCompleted { .. } => EventKind::CollectionCompleted,
            EventPayload::AnalysisStarted { .. } => EventKind::AnalysisStarted,
            EventPayload::AnalysisCompleted { .. } => EventKind::AnalysisCompleted,
            EventPayload::Error { .. } => EventKind::Error,
        }
    }
}
