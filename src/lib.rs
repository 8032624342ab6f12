//! Trendwatch - periodic trend collection and scoring
//!
//! Trendwatch runs independent schedulers that, on a fixed interval, collect
//! a batch of content items, score them against category-relative baselines,
//! and publish lifecycle events to observers.

pub mod analysis;
pub mod collection;
pub mod config;
pub mod control;
pub mod domain;
pub mod error;
pub mod scheduler;
pub mod scoring;
pub mod source;

pub use error::{Result, TrendError};
