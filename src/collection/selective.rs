//! Selective collection: surging candidates first, then popular, then tracked items.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};

use super::{CollectorContext, CycleBatch};
use crate::domain::{CollectionResult, DEFAULT_PLATFORM, Item, ScoredItem};
use crate::error::Result;
use crate::scoring::{candidate_rate, is_surge_candidate, rank_stable};
use crate::scoring::surge::SURGE_WINDOW_HOURS;
use crate::source::{QuerySpec, RecentFilter};

/// Search terms probed for fresh uploads, in priority order
pub const DEFAULT_SURGE_KEYWORDS: &[&str] = &[
    "christmas",
    "year end",
    "new year",
    "trend",
    "popular",
    "hot topic",
    "shorts",
    "vlog",
    "review",
    "challenge",
    "recipe",
];

const KEYWORDS_PER_CYCLE: usize = 3;
const RESULTS_PER_KEYWORD: usize = 10;
const POPULAR_MAX_RESULTS: usize = 50;
const TRACKED_WINDOW_HOURS: u32 = 24;
const TRACKED_LIMIT: usize = 20;

pub struct SelectiveCollector {
    context: CollectorContext,
    keywords: Vec<String>,
}

impl SelectiveCollector {
    pub fn new(context: CollectorContext) -> Self {
        Self {
            context,
            keywords: DEFAULT_SURGE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    /// Fresh search hits gaining views fast, best candidate rate first
    async fn surging(&self, limit: usize, now: DateTime<Utc>) -> Vec<Item> {
        let published_after = now - Duration::minutes((SURGE_WINDOW_HOURS * 60.0) as i64);
        let mut candidates: Vec<ScoredItem> = Vec::new();

        for keyword in self.keywords.iter().take(KEYWORDS_PER_CYCLE) {
            let query = QuerySpec::Search {
                keyword: keyword.clone(),
                published_after: Some(published_after),
                max_results: RESULTS_PER_KEYWORD,
            };
            match self.context.source().fetch(&query).await {
                Ok(items) => candidates.extend(
                    items
                        .into_iter()
                        .filter(|item| is_surge_candidate(item, now))
                        .map(|item| ScoredItem {
                            score: candidate_rate(&item, now),
                            item,
                        }),
                ),
                Err(e) => log::warn!("Search for keyword '{}' failed: {}", keyword, e),
            }
        }

        rank_stable(&mut candidates);

        let mut seen = HashSet::new();
        let surging: Vec<Item> = candidates
            .into_iter()
            .map(|scored| scored.item)
            .filter(|item| seen.insert(item.id.clone()))
            .take(limit)
            .collect();

        log::info!("Detected {} surging candidates", surging.len());
        surging
    }

    async fn popular(&self, limit: usize) -> Vec<Item> {
        if limit == 0 {
            return Vec::new();
        }
        let query = QuerySpec::MostPopular {
            category: None,
            max_results: limit.min(POPULAR_MAX_RESULTS),
        };
        self.context.fetch_or_empty(&query).await
    }

    /// Refreshed metrics for items persisted during the last day
    async fn tracked(&self) -> Vec<Item> {
        let filter = RecentFilter {
            platform: DEFAULT_PLATFORM.to_string(),
            hours: TRACKED_WINDOW_HOURS,
            limit: TRACKED_LIMIT,
        };
        let recent = match self.context.sink().get_recent(&filter).await {
            Ok(recent) => recent,
            Err(e) => {
                log::warn!("Failed to load tracked items: {}", e);
                return Vec::new();
            }
        };

        let ids: Vec<String> = recent.into_iter().map(|item| item.id).filter(|id| !id.is_empty()).collect();
        if ids.is_empty() {
            return Vec::new();
        }
        self.context.fetch_or_empty(&QuerySpec::ByIds(ids)).await
    }

    pub async fn collect(&self, max_items: usize) -> Result<CollectionResult> {
        let started = Instant::now();
        let timestamp = Utc::now();

        let surging = self.surging(max_items / 2, timestamp).await;
        let popular = self.popular(max_items / 3).await;
        let tracked = self.tracked().await;

        let mut metadata = BTreeMap::new();
        metadata.insert("strategy".into(), "selective_items".into());
        metadata.insert("surging_count".into(), surging.len().into());
        metadata.insert("trending_count".into(), popular.len().into());
        metadata.insert("tracked_count".into(), tracked.len().into());

        let mut batch = CycleBatch::new(self.context.policy(), max_items, timestamp);
        batch.offer(surging);
        batch.offer(popular);
        batch.offer(tracked);

        Ok(self.context.finish(batch, started, timestamp, metadata).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::testing::*;
    use crate::source::{MemorySink, PersistenceSink};
    use std::sync::Arc;

    fn fresh(id: &str, views: u64, likes: u64, hours: i64, now: DateTime<Utc>) -> Item {
        Item::new(id, "c", format!("title {}", id))
            .with_metrics(views, likes, 0)
            .published(now - Duration::hours(hours))
    }

    #[tokio::test]
    async fn test_same_id_from_three_sources_kept_once() {
        let now = Utc::now();
        let dup = fresh("dup", 4_000, 40, 1, now);

        let mut source = ScriptedSource::new();
        source.search = vec![dup.clone()];
        source.popular = vec![dup.clone(), fresh("pop", 100, 0, 5, now)];
        source.by_ids = vec![dup.clone()];

        let sink = Arc::new(MemorySink::with_items(vec![dup.clone()]));
        let collector = SelectiveCollector::new(context(open_policy(), Arc::new(source), sink.clone()));

        let result = collector.collect(30).await.unwrap();
        let ids: Vec<_> = result.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["dup", "pop"]);
        // repeats from the popular and tracked fetches
        assert_eq!(result.filtered_count, 2);
        assert_eq!(result.total_collected, 2);
        assert_eq!(result.metadata["strategy"], "selective_items");
        assert_eq!(result.metadata["surging_count"], 1);
    }

    #[tokio::test]
    async fn test_failing_search_degrades_gracefully() {
        let now = Utc::now();
        let mut source = ScriptedSource::new();
        source.fail = vec!["search", "by_ids"];
        source.popular = vec![fresh("pop", 100, 0, 5, now)];

        let sink = Arc::new(MemorySink::with_items(vec![fresh("old", 1, 0, 2, now)]));
        let collector = SelectiveCollector::new(context(open_policy(), Arc::new(source), sink));

        let result = collector.collect(30).await.unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].id, "pop");
    }

    #[tokio::test]
    async fn test_surging_ranked_by_candidate_rate_and_thresholded() {
        let now = Utc::now();
        let mut source = ScriptedSource::new();
        source.search = vec![
            fresh("slow", 600, 0, 2, now),
            fresh("fast", 6_000, 0, 2, now),
            fresh("liked", 6_000, 600, 2, now),
            fresh("stale", 90_000, 0, 10, now),
        ];
        let collector = SelectiveCollector::new(context(open_policy(), Arc::new(source), memory_sink()))
            .with_keywords(vec!["only".into()]);

        let surging = collector.surging(10, now).await;
        let ids: Vec<_> = surging.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["liked", "fast"]);
    }

    #[tokio::test]
    async fn test_surging_rate_ties_break_by_views() {
        let now = Utc::now();
        let mut source = ScriptedSource::new();
        // both gain 3000 views per hour
        source.search = vec![fresh("smaller", 6_000, 0, 2, now), fresh("bigger", 12_000, 0, 4, now)];
        let collector = SelectiveCollector::new(context(open_policy(), Arc::new(source), memory_sink()))
            .with_keywords(vec!["only".into()]);

        let surging = collector.surging(10, now).await;
        let ids: Vec<_> = surging.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["bigger", "smaller"]);
    }

    #[tokio::test]
    async fn test_query_shapes() {
        let now = Utc::now();
        let source = Arc::new(ScriptedSource::new());
        let sink = Arc::new(MemorySink::new());
        sink.upsert(&fresh("seen", 10, 0, 1, now)).await.unwrap();

        let collector = SelectiveCollector::new(context(open_policy(), source.clone(), sink));
        collector.collect(30).await.unwrap();

        let queries = source.queries.lock().unwrap().clone();
        let searches = queries
            .iter()
            .filter(|q| matches!(q, QuerySpec::Search { max_results: 10, .. }))
            .count();
        assert_eq!(searches, 3);
        assert!(queries.contains(&QuerySpec::MostPopular {
            category: None,
            max_results: 10
        }));
        assert!(queries.contains(&QuerySpec::ByIds(vec!["seen".into()])));
    }

    #[tokio::test]
    async fn test_kept_items_are_persisted() {
        let now = Utc::now();
        let mut source = ScriptedSource::new();
        source.popular = vec![fresh("pop", 100, 0, 5, now)];
        let sink = memory_sink();
        let collector = SelectiveCollector::new(context(open_policy(), Arc::new(source), sink.clone()));

        collector.collect(30).await.unwrap();
        assert!(sink.get("pop").is_some());
    }
}
