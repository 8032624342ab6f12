//! Domain types for trendwatch
//!
//! Items, per-cycle results, lifecycle events and scheduler status.

pub mod event;
pub mod item;
pub mod result;
pub mod status;

pub use event::{EventKind, EventPayload, SchedulerEvent};
pub use item::{DEFAULT_PLATFORM, Item, SHORT_FORM_MAX_SECS, parse_iso_duration};
pub use result::{AnalysisResult, CollectionResult, ScoredItem};
pub use status::{AtomicStatus, SchedulerStatus};
