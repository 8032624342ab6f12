//! Collection strategies.
//!
//! A collector turns a handful of source queries into one de-duplicated,
//! policy-filtered `CollectionResult` per cycle. Sub-fetch failures are
//! logged and skipped; the result just gets smaller.

mod batch;
mod filter;
mod popular;
mod selective;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use batch::CycleBatch;
pub use filter::should_include;
pub use popular::{CategoryCollector, MOST_POPULAR_MAX_RESULTS, PER_CATEGORY_MAX_RESULTS, TrendingCollector};
pub use selective::{DEFAULT_SURGE_KEYWORDS, SelectiveCollector};

use crate::config::{CollectionPolicy, CollectorKind};
use crate::domain::{CollectionResult, DEFAULT_PLATFORM, Item};
use crate::error::Result;
use crate::source::{ItemSource, PersistenceSink, QuerySpec};

/// Produces one batch of candidate items per call
#[async_trait]
pub trait CollectionStrategy: Send + Sync {
    /// Strategy name recorded in result metadata
    fn name(&self) -> &'static str;

    /// Collect at most `max_items` items
    async fn collect(&self, max_items: usize) -> Result<CollectionResult>;
}

/// Everything a collector needs: its policy and both collaborators
#[derive(Clone)]
pub struct CollectorContext {
    policy: CollectionPolicy,
    source: Arc<dyn ItemSource>,
    sink: Arc<dyn PersistenceSink>,
}

impl CollectorContext {
    pub fn new(policy: CollectionPolicy, source: Arc<dyn ItemSource>, sink: Arc<dyn PersistenceSink>) -> Self {
        Self { policy, source, sink }
    }

    pub fn policy(&self) -> &CollectionPolicy {
        &self.policy
    }

    pub(crate) fn source(&self) -> &dyn ItemSource {
        self.source.as_ref()
    }

    pub(crate) fn sink(&self) -> &dyn PersistenceSink {
        self.sink.as_ref()
    }

    /// Run one query; a failure is logged and yields nothing
    pub(crate) async fn fetch_or_empty(&self, query: &QuerySpec) -> Vec<Item> {
        match self.source.fetch(query).await {
            Ok(items) => items,
            Err(e) => {
                log::warn!("{} fetch failed: {}", query.label(), e);
                Vec::new()
            }
        }
    }

    /// Stamp, persist and package the kept items.
    ///
    /// A failed upsert is logged and counted; the item stays in the result.
    pub(crate) async fn finish(
        &self,
        batch: CycleBatch<'_>,
        started: Instant,
        timestamp: DateTime<Utc>,
        mut metadata: BTreeMap<String, serde_json::Value>,
    ) -> CollectionResult {
        let (mut items, filtered_count) = batch.into_parts();
        let collected_at = Utc::now();
        let mut persist_failures = 0usize;

        for item in items.iter_mut() {
            item.collected_at = Some(collected_at);
            if item.platform.is_empty() {
                item.platform = DEFAULT_PLATFORM.to_string();
            }
            if let Err(e) = self.sink.upsert(item).await {
                log::warn!("Failed to persist item {}: {}", item.id, e);
                persist_failures += 1;
            }
        }
        metadata.insert("persist_failures".into(), persist_failures.into());

        log::info!("Collected {} items, filtered {}", items.len(), filtered_count);

        CollectionResult {
            total_collected: items.len(),
            items,
            filtered_count,
            execution_secs: started.elapsed().as_secs_f64(),
            timestamp,
            metadata,
        }
    }
}

/// The closed set of collectors, chosen once from a [`CollectorKind`]
pub enum Collector {
    Selective(SelectiveCollector),
    Trending(TrendingCollector),
    CategoryBased(CategoryCollector),
}

impl Collector {
    pub fn build(kind: CollectorKind, context: CollectorContext) -> Self {
        match kind {
            CollectorKind::SelectiveItems => Collector::Selective(SelectiveCollector::new(context)),
            CollectorKind::TrendingItems => Collector::Trending(TrendingCollector::new(context)),
            CollectorKind::CategoryBased => Collector::CategoryBased(CategoryCollector::new(context)),
        }
    }

    pub fn kind(&self) -> CollectorKind {
        match self {
            Collector::Selective(_) => CollectorKind::SelectiveItems,
            Collector::Trending(_) => CollectorKind::TrendingItems,
            Collector::CategoryBased(_) => CollectorKind::CategoryBased,
        }
    }
}

#[async_trait]
impl CollectionStrategy for Collector {
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    async fn collect(&self, max_items: usize) -> Result<CollectionResult> {
        match self {
            Collector::Selective(c) => c.collect(max_items).await,
            Collector::Trending(c) => c.collect(max_items).await,
            Collector::CategoryBased(c) => c.collect(max_items).await,
        }
    }
}
