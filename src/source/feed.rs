//! JSON file item source.
//!
//! The feed file holds an array of [`FeedRecord`]s. It is re-read on every
//! fetch so an external process can refresh metrics between cycles.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ItemSource, QuerySpec, answer_query};
use crate::domain::{DEFAULT_PLATFORM, Item, parse_iso_duration};
use crate::error::{Result, TrendError};

/// Length as plain seconds or an ISO-8601 `PT#M#S` string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedDuration {
    Seconds(u32),
    Iso(String),
}

impl FeedDuration {
    pub fn as_secs(&self) -> Option<u32> {
        match self {
            FeedDuration::Seconds(secs) => Some(*secs),
            FeedDuration::Iso(raw) => parse_iso_duration(raw),
        }
    }
}

/// One entry of a feed file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedRecord {
    pub id: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub duration: Option<FeedDuration>,
    #[serde(default)]
    pub category_id: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

impl From<FeedRecord> for Item {
    fn from(record: FeedRecord) -> Self {
        Item {
            duration_secs: record.duration.as_ref().and_then(FeedDuration::as_secs),
            id: record.id,
            channel_id: record.channel_id,
            title: record.title,
            published_at: record.published_at,
            view_count: record.view_count,
            like_count: record.like_count,
            comment_count: record.comment_count,
            category_id: record.category_id,
            tags: record.tags,
            platform: record.platform.unwrap_or_else(|| DEFAULT_PLATFORM.to_string()),
            collected_at: None,
        }
    }
}

/// Item source backed by a JSON feed file
#[derive(Debug, Clone)]
pub struct FeedSource {
    path: PathBuf,
}

impl FeedSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the whole feed
    pub async fn load(&self) -> Result<Vec<Item>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| TrendError::Source(format!("{}: {}", self.path.display(), e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Vec<Item>> {
        let records: Vec<FeedRecord> = serde_json::from_str(content)?;
        Ok(records.into_iter().map(Item::from).collect())
    }
}

#[async_trait]
impl ItemSource for FeedSource {
    async fn fetch(&self, query: &QuerySpec) -> Result<Vec<Item>> {
        let catalogue = self.load().await?;
        log::debug!(
            "feed {} answered {} against {} records",
            self.path.display(),
            query.label(),
            catalogue.len()
        );
        Ok(answer_query(query, &catalogue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const FEED: &str = r#"[
        {"id": "a", "channel_id": "c1", "title": "Short clip", "view_count": 1200,
         "duration": "PT45S", "category_id": 10, "published_at": "2026-01-01T00:00:00Z"},
        {"id": "b", "title": "Long video", "view_count": 50, "duration": 600,
         "platform": "tiktok", "tags": ["music"]}
    ]"#;

    #[test]
    fn test_parse_durations_and_defaults() {
        let items = FeedSource::parse(FEED).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].duration_secs, Some(45));
        assert_eq!(items[0].platform, DEFAULT_PLATFORM);
        assert_eq!(items[1].duration_secs, Some(600));
        assert_eq!(items[1].platform, "tiktok");
        assert_eq!(items[1].like_count, 0);
        assert!(items[1].published_at.is_none());
    }

    #[test]
    fn test_bad_iso_duration_is_unknown() {
        let items = FeedSource::parse(r#"[{"id": "x", "duration": "ten minutes"}]"#).unwrap();
        assert_eq!(items[0].duration_secs, None);
    }

    #[test]
    fn test_malformed_feed_is_error() {
        assert!(matches!(FeedSource::parse("{not json"), Err(TrendError::Json(_))));
    }

    #[tokio::test]
    async fn test_fetch_rereads_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("feed.json");
        fs::write(&path, FEED).unwrap();

        let source = FeedSource::new(&path);
        let query = QuerySpec::ByIds(vec!["c".into()]);
        assert!(source.fetch(&query).await.unwrap().is_empty());

        fs::write(&path, r#"[{"id": "c", "title": "new"}]"#).unwrap();
        assert_eq!(source.fetch(&query).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_source_error() {
        let temp = TempDir::new().unwrap();
        let source = FeedSource::new(temp.path().join("missing.json"));
        let err = source.fetch(&QuerySpec::ByIds(vec![])).await.unwrap_err();
        assert!(matches!(err, TrendError::Source(_)));
        assert!(err.is_transient());
    }
}
