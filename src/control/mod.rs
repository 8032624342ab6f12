//! Control surface: serialisable views over a scheduler manager.
//!
//! Every operation answers with a plain struct suitable for JSON output.
//! Unknown scheduler ids are reported as `TrendError::NotFound`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::SchedulerStatus;
use crate::error::{Result, TrendError};
use crate::scheduler::SchedulerManager;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulerList {
    pub schedulers: Vec<String>,
    pub total_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSummary {
    pub schedulers: BTreeMap<String, SchedulerStatus>,
    pub total_count: usize,
    pub running_count: usize,
    pub stopped_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub scheduler_id: String,
    pub status: SchedulerStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionView {
    pub scheduler_id: String,
    /// "started" or "stopped"
    pub action: &'static str,
    /// Status observed after the action
    pub status: SchedulerStatus,
}

pub struct ControlSurface {
    manager: Arc<SchedulerManager>,
}

impl ControlSurface {
    pub fn new(manager: Arc<SchedulerManager>) -> Self {
        Self { manager }
    }

    pub async fn list(&self) -> SchedulerList {
        let schedulers = self.manager.list_ids().await;
        SchedulerList {
            total_count: schedulers.len(),
            schedulers,
        }
    }

    pub async fn all_statuses(&self) -> StatusSummary {
        let schedulers = self.manager.statuses().await;
        let count = |wanted: SchedulerStatus| schedulers.values().filter(|s| **s == wanted).count();
        StatusSummary {
            total_count: schedulers.len(),
            running_count: count(SchedulerStatus::Running),
            stopped_count: count(SchedulerStatus::Stopped),
            schedulers,
        }
    }

    pub async fn status(&self, id: &str) -> Result<StatusView> {
        let status = self
            .manager
            .get_status(id)
            .await
            .ok_or_else(|| TrendError::NotFound(id.to_string()))?;
        Ok(StatusView {
            scheduler_id: id.to_string(),
            status,
        })
    }

    pub async fn start(&self, id: &str) -> Result<ActionView> {
        self.manager.start(id).await?;
        self.action(id, "started").await
    }

    pub async fn stop(&self, id: &str) -> Result<ActionView> {
        self.manager.stop(id).await?;
        self.action(id, "stopped").await
    }

    async fn action(&self, id: &str, action: &'static str) -> Result<ActionView> {
        let view = self.status(id).await?;
        Ok(ActionView {
            scheduler_id: view.scheduler_id,
            action,
            status: view.status,
        })
    }
}
