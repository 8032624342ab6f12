//! Composite trend analyzer.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::AnalysisStrategy;
use super::categories::category_label;
use crate::config::AnalysisPolicy;
use crate::domain::{AnalysisResult, DEFAULT_PLATFORM, Item, ScoredItem};
use crate::error::Result;
use crate::scoring::{CategoryBaselines, ScoringEngine, rank_stable};
use crate::source::{PersistenceSink, RecentFilter};

/// Items kept per category in `category_trends`
pub const CATEGORY_TREND_LIMIT: usize = 5;
/// History window for category baselines
pub const BASELINE_HISTORY_HOURS: u32 = 168;
pub const BASELINE_HISTORY_LIMIT: usize = 100;

/// Scores a batch with the policy's method and keeps everything at or above the threshold
pub struct CompositeTrendAnalyzer {
    policy: AnalysisPolicy,
    history: Option<Arc<dyn PersistenceSink>>,
}

impl CompositeTrendAnalyzer {
    /// Analyzer without history; every category uses the policy fallback baseline
    pub fn new(policy: AnalysisPolicy) -> Self {
        Self { policy, history: None }
    }

    /// Derive category baselines from the sink's recent items
    pub fn with_history(mut self, sink: Arc<dyn PersistenceSink>) -> Self {
        self.history = Some(sink);
        self
    }

    pub fn policy(&self) -> &AnalysisPolicy {
        &self.policy
    }

    async fn baselines(&self, now: DateTime<Utc>) -> CategoryBaselines {
        let fallback = self.policy.baseline_fallback();
        let Some(sink) = &self.history else {
            return CategoryBaselines::fallback_only(fallback);
        };

        let filter = RecentFilter {
            platform: DEFAULT_PLATFORM.to_string(),
            hours: BASELINE_HISTORY_HOURS,
            limit: BASELINE_HISTORY_LIMIT,
        };
        match sink.get_recent(&filter).await {
            Ok(history) => CategoryBaselines::from_history(&history, now, fallback),
            Err(e) => {
                log::warn!("Failed to load category baselines: {}", e);
                CategoryBaselines::fallback_only(fallback)
            }
        }
    }

    /// Score every item against fixed baselines and time
    pub fn score_all(&self, items: &[Item], baselines: &CategoryBaselines, now: DateTime<Utc>) -> Vec<ScoredItem> {
        let engine = ScoringEngine::at(now);
        items
            .iter()
            .map(|item| ScoredItem {
                score: engine.score(item, &self.policy, baselines.for_category(item.category_id)),
                item: item.clone(),
            })
            .collect()
    }

    fn category_trends(trending: &[ScoredItem]) -> BTreeMap<String, Vec<ScoredItem>> {
        let mut trends: BTreeMap<String, Vec<ScoredItem>> = BTreeMap::new();
        for scored in trending {
            let Some(category) = scored.item.category_id else {
                continue;
            };
            let group = trends.entry(category_label(category)).or_default();
            if group.len() < CATEGORY_TREND_LIMIT {
                group.push(scored.clone());
            }
        }
        trends
    }

    fn metrics(&self, all: &[ScoredItem], trending: &[ScoredItem]) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        if all.is_empty() {
            return metrics;
        }

        let total = all.len() as f64;
        let sum: f64 = all.iter().map(|s| s.score).sum();
        let max = all.iter().map(|s| s.score).fold(f64::MIN, f64::max);
        let categories: HashSet<u32> = trending.iter().filter_map(|s| s.item.category_id).collect();

        metrics.insert("total_analyzed".into(), total);
        metrics.insert("trending_count".into(), trending.len() as f64);
        metrics.insert("trending_ratio".into(), trending.len() as f64 / total);
        metrics.insert("avg_trend_score".into(), sum / total);
        metrics.insert("max_trend_score".into(), max);
        metrics.insert("category_count".into(), categories.len() as f64);
        metrics.insert("analysis_window_hours".into(), f64::from(self.policy.window_hours()));
        metrics.insert("min_threshold".into(), self.policy.min_score());
        metrics
    }
}

#[async_trait]
impl AnalysisStrategy for CompositeTrendAnalyzer {
    async fn analyze(&self, items: &[Item]) -> Result<AnalysisResult> {
        let now = Utc::now();
        if items.is_empty() {
            return Ok(AnalysisResult {
                timestamp: now,
                ..Default::default()
            });
        }

        let baselines = self.baselines(now).await;
        let all = self.score_all(items, &baselines, now);

        let mut trending: Vec<ScoredItem> = all
            .iter()
            .filter(|s| s.score >= self.policy.min_score())
            .cloned()
            .collect();
        rank_stable(&mut trending);

        let category_trends = Self::category_trends(&trending);
        let metrics = self.metrics(&all, &trending);

        log::info!("Analyzed {} items, found {} trending", items.len(), trending.len());

        Ok(AnalysisResult {
            trending_items: trending,
            metrics,
            category_trends,
            timestamp: now,
        })
    }
}
