//! Most-popular collectors: one global chart, or one chart per category.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::Utc;

use super::{CollectorContext, CycleBatch};
use crate::domain::CollectionResult;
use crate::error::Result;
use crate::source::QuerySpec;

/// Upper bound of one global most-popular request
pub const MOST_POPULAR_MAX_RESULTS: usize = 50;
/// Upper bound of one per-category most-popular request
pub const PER_CATEGORY_MAX_RESULTS: usize = 20;

pub struct TrendingCollector {
    context: CollectorContext,
}

impl TrendingCollector {
    pub fn new(context: CollectorContext) -> Self {
        Self { context }
    }

    pub async fn collect(&self, max_items: usize) -> Result<CollectionResult> {
        let started = Instant::now();
        let timestamp = Utc::now();

        let query = QuerySpec::MostPopular {
            category: None,
            max_results: max_items.min(MOST_POPULAR_MAX_RESULTS),
        };
        let fetched = self.context.fetch_or_empty(&query).await;

        let mut metadata = BTreeMap::new();
        metadata.insert("strategy".into(), "trending_items".into());
        metadata.insert("trending_count".into(), fetched.len().into());

        let mut batch = CycleBatch::new(self.context.policy(), max_items, timestamp);
        batch.offer(fetched);
        Ok(self.context.finish(batch, started, timestamp, metadata).await)
    }
}

pub struct CategoryCollector {
    context: CollectorContext,
}

impl CategoryCollector {
    pub fn new(context: CollectorContext) -> Self {
        Self { context }
    }

    pub async fn collect(&self, max_items: usize) -> Result<CollectionResult> {
        let started = Instant::now();
        let timestamp = Utc::now();
        let categories = self.context.policy().categories().to_vec();

        let mut metadata = BTreeMap::new();
        metadata.insert("strategy".into(), "category_based".into());
        metadata.insert("category_count".into(), categories.len().into());

        let mut batch = CycleBatch::new(self.context.policy(), max_items, timestamp);

        if categories.is_empty() {
            log::info!("No target categories configured, skipping category collection");
        } else {
            let per_category = (max_items / categories.len()).clamp(1, PER_CATEGORY_MAX_RESULTS);
            let mut fetched_total = 0usize;

            for category in categories {
                let query = QuerySpec::MostPopular {
                    category: Some(category),
                    max_results: per_category,
                };
                let fetched = self.context.fetch_or_empty(&query).await;
                fetched_total += fetched.len();
                batch.offer(fetched);
            }
            metadata.insert("fetched_count".into(), fetched_total.into());
        }

        Ok(self.context.finish(batch, started, timestamp, metadata).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::testing::*;
    use crate::config::{CollectionPolicy, CollectionSettings};
    use crate::domain::Item;
    use chrono::Duration;
    use std::sync::Arc;

    fn item(id: &str, category: u32) -> Item {
        Item::new(id, "c", "t")
            .in_category(category)
            .published(Utc::now() - Duration::hours(1))
    }

    fn category_policy(categories: Vec<u32>) -> CollectionPolicy {
        CollectionPolicy::try_from(CollectionSettings {
            min_view_count: 0,
            min_like_count: 0,
            target_categories: categories,
            shorts_only: false,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_trending_caps_request_at_fifty() {
        let source = Arc::new(ScriptedSource::new());
        let collector = TrendingCollector::new(context(open_policy(), source.clone(), memory_sink()));
        collector.collect(80).await.unwrap();

        let queries = source.queries.lock().unwrap().clone();
        assert_eq!(
            queries,
            vec![QuerySpec::MostPopular {
                category: None,
                max_results: 50
            }]
        );
    }

    #[tokio::test]
    async fn test_trending_respects_max_items() {
        let mut source = ScriptedSource::new();
        source.popular = (0..10).map(|i| item(&format!("v{}", i), 10)).collect();
        let collector = TrendingCollector::new(context(open_policy(), Arc::new(source), memory_sink()));

        let result = collector.collect(4).await.unwrap();
        assert_eq!(result.items.len(), 4);
    }

    #[tokio::test]
    async fn test_category_queries_split_budget() {
        let source = Arc::new(ScriptedSource::new());
        let collector = CategoryCollector::new(context(category_policy(vec![10, 24, 25]), source.clone(), memory_sink()));
        let result = collector.collect(60).await.unwrap();

        let queries = source.queries.lock().unwrap().clone();
        assert_eq!(queries.len(), 3);
        assert!(queries.contains(&QuerySpec::MostPopular {
            category: Some(24),
            max_results: 20
        }));
        assert_eq!(result.metadata["category_count"], 3);
    }

    #[tokio::test]
    async fn test_no_categories_yields_empty_batch() {
        let source = Arc::new(ScriptedSource::new());
        let collector = CategoryCollector::new(context(category_policy(vec![]), source.clone(), memory_sink()));
        let result = collector.collect(60).await.unwrap();

        assert!(result.is_empty());
        assert!(source.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_category_failure_is_skipped() {
        let mut source = ScriptedSource::new();
        source.fail = vec!["most_popular"];
        let collector = CategoryCollector::new(context(category_policy(vec![10]), Arc::new(source), memory_sink()));

        let result = collector.collect(10).await.unwrap();
        assert!(result.is_empty());
    }
}
