//! Per-cycle value objects handed to observers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::Item;

/// Outcome of one collection pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionResult {
    /// Kept items, unique by id
    pub items: Vec<Item>,
    pub total_collected: usize,
    /// Items rejected by the policy or discarded as in-cycle duplicates
    pub filtered_count: usize,
    pub execution_secs: f64,
    pub timestamp: DateTime<Utc>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl CollectionResult {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Outcome of one analysis pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Items at or above the threshold, score-descending
    pub trending_items: Vec<ScoredItem>,
    pub metrics: BTreeMap<String, f64>,
    /// Category label to at most five top items
    pub category_trends: BTreeMap<String, Vec<ScoredItem>>,
    pub timestamp: DateTime<Utc>,
}

/// An item paired with the score that ranked it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item: Item,
    pub score: f64,
}
