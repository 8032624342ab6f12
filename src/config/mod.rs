//! Configuration system for trendwatch.
//!
//! Two layers:
//! 1. Application config (`~/.config/trendwatch/trendwatch.yml` or `./trendwatch.yml`)
//! 2. Per-scheduler settings, validated into immutable `SchedulerConfig`s

mod app;
mod policy;
mod scheduler;

pub use self::app::{Config, DEFAULT_SCHEDULER_ID, FeedConfig, RuntimeConfig};
pub use self::policy::{
    AnalysisMethod, AnalysisPolicy, AnalysisSettings, CollectionPolicy, CollectionSettings, CollectorKind,
    DEFAULT_BASELINE_VIEWS_PER_HOUR, ScoreWeights, WEIGHT_SUM_TOLERANCE,
};
pub use self::scheduler::{SchedulerConfig, SchedulerSettings};
