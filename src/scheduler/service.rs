//! Service handle owning the manager for the host process.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::factory::{SchedulerDeps, build_scheduler};
use super::manager::{FanOutReport, SchedulerManager};
use crate::config::{SchedulerConfig, SchedulerSettings};
use crate::error::Result;

/// Name the service's manager logs under
pub const SERVICE_MANAGER_NAME: &str = "trend_manager";

pub struct TrendService {
    manager: Arc<SchedulerManager>,
    settings: Vec<SchedulerSettings>,
    deps: SchedulerDeps,
    initialized: Mutex<bool>,
}

impl TrendService {
    pub fn new(settings: Vec<SchedulerSettings>, deps: SchedulerDeps) -> Self {
        Self {
            manager: Arc::new(SchedulerManager::new(SERVICE_MANAGER_NAME)),
            settings,
            deps,
            initialized: Mutex::new(false),
        }
    }

    pub fn manager(&self) -> Arc<SchedulerManager> {
        Arc::clone(&self.manager)
    }

    /// Validate every settings block, then build and register the enabled ones.
    ///
    /// Runs once; later calls return the registry size. A single invalid block
    /// fails the call before anything is registered.
    pub async fn initialize(&self) -> Result<usize> {
        let mut initialized = self.initialized.lock().await;
        if *initialized {
            return Ok(self.manager.len().await);
        }

        let configs = self
            .settings
            .iter()
            .cloned()
            .map(SchedulerConfig::try_from)
            .collect::<Result<Vec<_>>>()?;

        for config in configs {
            if !config.enabled() {
                log::info!("Scheduler {} is disabled, skipping", config.id());
                continue;
            }
            let scheduler = build_scheduler(config, &self.deps);
            self.manager.register(Arc::new(scheduler)).await;
        }

        *initialized = true;
        let count = self.manager.len().await;
        log::info!("Trend service initialized with {} schedulers", count);
        Ok(count)
    }

    /// Initialize if needed, then start every scheduler
    pub async fn start(&self) -> Result<FanOutReport> {
        self.initialize().await?;
        let report = self.manager.start_all().await;
        log::info!("Trend service started");
        Ok(report)
    }

    pub async fn shutdown(&self) -> FanOutReport {
        let report = self.manager.stop_all().await;
        log::info!("Trend service stopped");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SchedulerStatus;
    use crate::source::{MemorySink, MemorySource};

    fn deps() -> SchedulerDeps {
        SchedulerDeps::new(Arc::new(MemorySource::new(Vec::new())), Arc::new(MemorySink::new()))
    }

    #[tokio::test]
    async fn test_initialize_registers_enabled_once() {
        let disabled = SchedulerSettings {
            enabled: false,
            ..SchedulerSettings::new("off")
        };
        let service = TrendService::new(vec![SchedulerSettings::mvp("mvp"), disabled], deps());

        assert_eq!(service.initialize().await.unwrap(), 1);
        assert_eq!(service.initialize().await.unwrap(), 1);
        assert_eq!(service.manager().list_ids().await, vec!["mvp"]);
    }

    #[tokio::test]
    async fn test_invalid_settings_register_nothing() {
        let mut bad = SchedulerSettings::new("bad");
        bad.analysis.weights.view = 0.9;
        let service = TrendService::new(vec![SchedulerSettings::new("good"), bad], deps());

        assert!(service.initialize().await.is_err());
        assert!(service.manager().is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_and_shutdown() {
        let service = TrendService::new(vec![SchedulerSettings::new("a"), SchedulerSettings::new("b")], deps());

        let report = service.start().await.unwrap();
        assert!(report.is_clean());
        assert_eq!(service.manager().get_status("a").await, Some(SchedulerStatus::Running));

        let report = service.shutdown().await;
        assert_eq!(report.succeeded, vec!["a", "b"]);
        assert_eq!(service.manager().get_status("b").await, Some(SchedulerStatus::Stopped));
    }
}
