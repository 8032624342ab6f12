//! In-memory source and sink.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use super::{ItemSource, PersistenceSink, QuerySpec, RecentFilter, answer_query};
use crate::domain::Item;
use crate::error::{Result, TrendError};

/// Fixed catalogue answering queries locally
#[derive(Debug, Default)]
pub struct MemorySource {
    catalogue: Vec<Item>,
}

impl MemorySource {
    pub fn new(items: Vec<Item>) -> Self {
        Self { catalogue: items }
    }
}

#[async_trait]
impl ItemSource for MemorySource {
    async fn fetch(&self, query: &QuerySpec) -> Result<Vec<Item>> {
        Ok(answer_query(query, &self.catalogue))
    }
}

/// Upserted items keyed by id
#[derive(Debug, Default)]
pub struct MemorySink {
    items: RwLock<HashMap<String, Item>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink pre-loaded with history
    pub fn with_items(items: Vec<Item>) -> Self {
        Self {
            items: RwLock::new(items.into_iter().map(|item| (item.id.clone(), item)).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &str) -> Option<Item> {
        self.items.read().ok().and_then(|items| items.get(id).cloned())
    }
}

#[async_trait]
impl PersistenceSink for MemorySink {
    async fn upsert(&self, item: &Item) -> Result<()> {
        let mut items = self.items.write().map_err(|e| TrendError::Persistence(e.to_string()))?;
        items.insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn get_recent(&self, filter: &RecentFilter) -> Result<Vec<Item>> {
        let cutoff = Utc::now() - Duration::hours(i64::from(filter.hours));
        let items = self.items.read().map_err(|e| TrendError::Persistence(e.to_string()))?;

        let mut recent: Vec<Item> = items
            .values()
            .filter(|item| item.platform == filter.platform)
            .filter(|item| item.published_at.or(item.collected_at).is_some_and(|at| at >= cutoff))
            .cloned()
            .collect();
        recent.sort_by(|a, b| {
            b.published_at
                .or(b.collected_at)
                .cmp(&a.published_at.or(a.collected_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        recent.truncate(filter.limit);
        Ok(recent)
    }
}
