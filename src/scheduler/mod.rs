//! Scheduler module: periodic trend cycles and their orchestration.
//!
//! This module provides:
//! - **Scheduler**: a per-id state machine (Stopped, Running, Paused, Error)
//!   running collect then analyze on an interval, with interruptible waits.
//! - **Observers**: an event bus delivering lifecycle events to isolated observers.
//! - **Hooks**: injected best-effort side effects around each cycle.
//! - **SchedulerManager**: a registry with concurrent, failure-isolated fan-out.
//! - **TrendService**: the host-owned handle that builds and registers schedulers.
//!
//! # Example
//!
//! ```ignore
//! use trendwatch::scheduler::{SchedulerDeps, TrendService};
//!
//! let service = TrendService::new(config.schedulers, SchedulerDeps::new(source, sink));
//! service.start().await?;
//! // ...
//! service.shutdown().await;
//! ```

mod factory;
mod hooks;
mod lifecycle;
mod manager;
mod observer;
mod service;

use std::any::Any;

pub use factory::{SchedulerDeps, build_scheduler};
pub use hooks::{CategoryTagHook, CycleHooks, SideEffectHook};
pub use lifecycle::{Lifecycle, Scheduler, SchedulerBuilder, SchedulerOptions};
pub use manager::{FanOutReport, SchedulerManager};
pub use observer::{EventBus, LoggingObserver, SchedulerObserver};
pub use service::{SERVICE_MANAGER_NAME, TrendService};

#[cfg(test)]
pub(crate) use manager::testing as manager_testing;

/// Best-effort text of a caught panic payload
pub(crate) fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
