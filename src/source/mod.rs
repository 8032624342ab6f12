//! Collaborator interfaces consumed by collectors and analyzers.
//!
//! An `ItemSource` answers queries against some external catalogue; a
//! `PersistenceSink` stores kept items and serves recent history back for
//! category baselines. Both are called from inside a cycle and may fail per
//! call.

mod feed;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use feed::{FeedDuration, FeedRecord, FeedSource};
pub use memory::{MemorySink, MemorySource};

use crate::domain::Item;
use crate::error::Result;

/// One request to an item source
#[derive(Debug, Clone, PartialEq)]
pub enum QuerySpec {
    /// Keyword search, newest first
    Search {
        keyword: String,
        published_after: Option<DateTime<Utc>>,
        max_results: usize,
    },
    /// Most-viewed items, optionally within one category
    MostPopular { category: Option<u32>, max_results: usize },
    /// Fresh metrics for known ids
    ByIds(Vec<String>),
}

impl QuerySpec {
    /// Short name used in logs and collection metadata
    pub fn label(&self) -> &'static str {
        match self {
            QuerySpec::Search { .. } => "search",
            QuerySpec::MostPopular { .. } => "most_popular",
            QuerySpec::ByIds(_) => "by_ids",
        }
    }
}

/// History query against a persistence sink
#[derive(Debug, Clone, PartialEq)]
pub struct RecentFilter {
    pub platform: String,
    /// Look-back window
    pub hours: u32,
    pub limit: usize,
}

#[async_trait]
pub trait ItemSource: Send + Sync {
    async fn fetch(&self, query: &QuerySpec) -> Result<Vec<Item>>;
}

#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Insert or refresh one item
    async fn upsert(&self, item: &Item) -> Result<()>;

    /// Most recent items of a platform, newest first
    async fn get_recent(&self, filter: &RecentFilter) -> Result<Vec<Item>>;
}

/// Answer a query from an in-memory catalogue
pub(crate) fn answer_query(query: &QuerySpec, catalogue: &[Item]) -> Vec<Item> {
    match query {
        QuerySpec::Search {
            keyword,
            published_after,
            max_results,
        } => {
            let needle = keyword.to_lowercase();
            let mut hits: Vec<Item> = catalogue
                .iter()
                .filter(|item| {
                    item.title.to_lowercase().contains(&needle)
                        || item.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
                })
                .filter(|item| match published_after {
                    Some(after) => item.published_at.is_some_and(|at| at >= *after),
                    None => true,
                })
                .cloned()
                .collect();
            hits.sort_by(|a, b| b.published_at.cmp(&a.published_at));
            hits.truncate(*max_results);
            hits
        }
        QuerySpec::MostPopular { category, max_results } => {
            let mut hits: Vec<Item> = catalogue
                .iter()
                .filter(|item| category.is_none() || item.category_id == *category)
                .cloned()
                .collect();
            hits.sort_by(|a, b| b.view_count.cmp(&a.view_count));
            hits.truncate(*max_results);
            hits
        }
        QuerySpec::ByIds(ids) => catalogue
            .iter()
            .filter(|item| ids.contains(&item.id))
            .cloned()
            .collect(),
    }
}
