//! Content item as delivered by an item source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform tag stamped on items that arrive without one
pub const DEFAULT_PLATFORM: &str = "youtube";

/// A single candidate item with its engagement metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Source-unique identifier
    pub id: String,

    /// Channel that published the item
    pub channel_id: String,

    pub title: String,

    pub published_at: Option<DateTime<Utc>>,

    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,

    /// Length in seconds, when the source reports it
    pub duration_secs: Option<u32>,

    pub category_id: Option<u32>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub platform: String,

    /// When this item was picked up by a collector
    pub collected_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Create an item with zeroed metrics
    pub fn new(id: impl Into<String>, channel_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            title: title.into(),
            published_at: None,
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            duration_secs: None,
            category_id: None,
            tags: Vec::new(),
            platform: DEFAULT_PLATFORM.to_string(),
            collected_at: None,
        }
    }

    pub fn with_metrics(mut self, views: u64, likes: u64, comments: u64) -> Self {
        self.view_count = views;
        self.like_count = likes;
        self.comment_count = comments;
        self
    }

    pub fn published(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }

    pub fn in_category(mut self, category_id: u32) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_duration(mut self, secs: u32) -> Self {
        self.duration_secs = Some(secs);
        self
    }

    /// Hours elapsed between publication and `now`; None when unpublished
    pub fn age_hours(&self, now: DateTime<Utc>) -> Option<f64> {
        self.published_at
            .map(|published| (now - published).num_milliseconds() as f64 / 3_600_000.0)
    }

    /// Whether the item fits the short-form length limit
    pub fn is_short(&self) -> Option<bool> {
        self.duration_secs.map(|secs| secs <= SHORT_FORM_MAX_SECS)
    }
}

/// Longest duration still counted as short-form content
pub const SHORT_FORM_MAX_SECS: u32 = 60;

/// Parse an ISO-8601 duration of the `PT#H#M#S` form into seconds.
///
/// Returns None for anything that does not start with `PT` or has
/// non-numeric components.
pub fn parse_iso_duration(raw: &str) -> Option<u32> {
    let mut rest = raw.strip_prefix("PT")?;
    let mut total: u32 = 0;

    for (unit, factor) in [('H', 3600u32), ('M', 60), ('S', 1)] {
        if let Some((value, tail)) = rest.split_once(unit) {
            let value: u32 = value.parse().ok()?;
            total = total.checked_add(value.checked_mul(factor)?)?;
            rest = tail;
        }
    }

    if rest.is_empty() { Some(total) } else { None }
}
