//! Builds a ready-to-register scheduler from a validated config.

use std::sync::Arc;

use super::hooks::CycleHooks;
use super::lifecycle::{Scheduler, SchedulerOptions};
use crate::analysis::CompositeTrendAnalyzer;
use crate::collection::{Collector, CollectorContext};
use crate::config::SchedulerConfig;
use crate::source::{ItemSource, PersistenceSink};

/// Collaborators shared by every scheduler a service builds
#[derive(Clone)]
pub struct SchedulerDeps {
    pub source: Arc<dyn ItemSource>,
    pub sink: Arc<dyn PersistenceSink>,
    pub hooks: CycleHooks,
    pub options: SchedulerOptions,
}

impl SchedulerDeps {
    pub fn new(source: Arc<dyn ItemSource>, sink: Arc<dyn PersistenceSink>) -> Self {
        Self {
            source,
            sink,
            hooks: CycleHooks::default(),
            options: SchedulerOptions::default(),
        }
    }

    pub fn with_hooks(mut self, hooks: CycleHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_options(mut self, options: SchedulerOptions) -> Self {
        self.options = options;
        self
    }
}

/// Collector chosen by `config.strategy()`, analyzer with sink-backed baselines
pub fn build_scheduler(config: SchedulerConfig, deps: &SchedulerDeps) -> Scheduler {
    let context = CollectorContext::new(
        config.collection().clone(),
        Arc::clone(&deps.source),
        Arc::clone(&deps.sink),
    );
    let collector = Arc::new(Collector::build(config.strategy(), context));
    let analyzer =
        Arc::new(CompositeTrendAnalyzer::new(config.analysis().clone()).with_history(Arc::clone(&deps.sink)));

    log::debug!("Building scheduler {} with {} collector", config.id(), config.strategy().as_str());

    Scheduler::builder(config, collector, analyzer)
        .hooks(deps.hooks.clone())
        .options(deps.options.clone())
        .build()
}
