//! Composite trend score.
//!
//! Four normalized sub-scores, each in `[0, 1]`, combined with the policy
//! weights:
//! - view: views per hour, relative to the category baseline when one exists
//! - like: like ratio against a 3% reference, capped at 5x
//! - comment: comment ratio against a 0.5% reference, capped at 10x
//! - velocity: log-scaled views per hour, decaying across the analysis window

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::{AnalysisMethod, AnalysisPolicy, ScoreWeights};
use crate::domain::Item;

/// Views per hour that earns a full view score without a baseline
pub const ABSOLUTE_VIEWS_PER_HOUR: f64 = 10_000.0;
/// Cap on views-per-hour relative to the category baseline
pub const MAX_RELATIVE_VIEWS: f64 = 10.0;
/// Reference like ratio
pub const BASELINE_LIKE_RATIO: f64 = 0.03;
pub const MAX_RELATIVE_LIKES: f64 = 5.0;
/// Reference comment ratio
pub const BASELINE_COMMENT_RATIO: f64 = 0.005;
pub const MAX_RELATIVE_COMMENTS: f64 = 10.0;
/// Decades of velocity mapped onto `[0, 1]`
pub const VELOCITY_LOG_SCALE: f64 = 6.0;

/// Views-per-hour score.
///
/// Zero when the age is unknown or not positive.
pub fn view_score(views: u64, age_hours: Option<f64>, baseline: Option<f64>) -> f64 {
    let age = match age_hours {
        Some(age) if age > 0.0 => age,
        _ => return 0.0,
    };
    let views_per_hour = views as f64 / age;

    match baseline {
        Some(avg) if avg > 0.0 => {
            let relative = (views_per_hour / avg).min(MAX_RELATIVE_VIEWS);
            (1.0 + relative).log10() / (1.0 + MAX_RELATIVE_VIEWS).log10()
        }
        _ => (views_per_hour / ABSOLUTE_VIEWS_PER_HOUR).min(1.0),
    }
}

pub fn like_score(likes: u64, views: u64) -> f64 {
    if views == 0 {
        return 0.0;
    }
    let ratio = likes as f64 / views as f64;
    (ratio / BASELINE_LIKE_RATIO).min(MAX_RELATIVE_LIKES) / MAX_RELATIVE_LIKES
}

pub fn comment_score(comments: u64, views: u64) -> f64 {
    if views == 0 {
        return 0.0;
    }
    let ratio = comments as f64 / views as f64;
    (ratio / BASELINE_COMMENT_RATIO).min(MAX_RELATIVE_COMMENTS) / MAX_RELATIVE_COMMENTS
}

/// Recency-weighted velocity.
///
/// Non-zero only for `0 < age <= window_hours`.
pub fn velocity_score(views: u64, age_hours: Option<f64>, window_hours: u32) -> f64 {
    let window = f64::from(window_hours);
    let age = match age_hours {
        Some(age) if age > 0.0 && age <= window => age,
        _ => return 0.0,
    };

    let time_factor = 1.0 - age / window;
    let velocity = views as f64 / age;
    time_factor * ((1.0 + velocity).log10() / VELOCITY_LOG_SCALE).min(1.0)
}

/// The four sub-scores of one item
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SubScores {
    pub view: f64,
    pub like: f64,
    pub comment: f64,
    pub velocity: f64,
}

impl SubScores {
    pub fn weighted(&self, weights: &ScoreWeights) -> f64 {
        self.view * weights.view
            + self.like * weights.like
            + self.comment * weights.comment
            + self.velocity * weights.velocity
    }
}

/// Pure scoring against a fixed reference time
#[derive(Debug, Clone, Copy)]
pub struct ScoringEngine {
    now: DateTime<Utc>,
}

impl ScoringEngine {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn sub_scores(&self, item: &Item, policy: &AnalysisPolicy, baseline: Option<f64>) -> SubScores {
        let age = item.age_hours(self.now);
        SubScores {
            view: view_score(item.view_count, age, baseline),
            like: like_score(item.like_count, item.view_count),
            comment: comment_score(item.comment_count, item.view_count),
            velocity: velocity_score(item.view_count, age, policy.window_hours()),
        }
    }

    /// Weighted sum of the four sub-scores
    pub fn composite(&self, item: &Item, policy: &AnalysisPolicy, baseline: Option<f64>) -> f64 {
        self.sub_scores(item, policy, baseline).weighted(&policy.weights())
    }

    /// Ranking score for the policy's analysis method
    pub fn score(&self, item: &Item, policy: &AnalysisPolicy, baseline: Option<f64>) -> f64 {
        match policy.method() {
            AnalysisMethod::CompositeScore => self.composite(item, policy, baseline),
            AnalysisMethod::GrowthRate => {
                let age = item.age_hours(self.now);
                (view_score(item.view_count, age, baseline) + like_score(item.like_count, item.view_count)) / 2.0
            }
            AnalysisMethod::VelocityBased => {
                velocity_score(item.view_count, item.age_hours(self.now), policy.window_hours())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisSettings;
    use chrono::Duration;

    const EPS: f64 = 1e-9;

    fn policy_with(method: AnalysisMethod, weights: ScoreWeights) -> AnalysisPolicy {
        AnalysisPolicy::try_from(AnalysisSettings {
            method,
            weights,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_view_score_absolute() {
        // 5000 views over 1 hour -> 0.5
        assert!((view_score(5_000, Some(1.0), None) - 0.5).abs() < EPS);
        // capped at 1.0
        assert!((view_score(1_000_000, Some(1.0), None) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_view_score_relative_to_baseline() {
        // vph equals baseline -> log10(2)/log10(11)
        let expected = 2f64.log10() / 11f64.log10();
        assert!((view_score(1_000, Some(1.0), Some(1_000.0)) - expected).abs() < EPS);
        // relative capped at 10 -> 1.0
        assert!((view_score(1_000_000, Some(1.0), Some(1_000.0)) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_view_score_zero_baseline_uses_absolute() {
        assert!((view_score(5_000, Some(1.0), Some(0.0)) - 0.5).abs() < EPS);
    }

    #[test]
    fn test_non_positive_age_contributes_nothing() {
        for age in [Some(0.0), Some(-3.0), None] {
            assert_eq!(view_score(u64::MAX / 2, age, None), 0.0);
            assert_eq!(view_score(u64::MAX / 2, age, Some(100.0)), 0.0);
            assert_eq!(velocity_score(u64::MAX / 2, age, 8), 0.0);
        }
    }

    #[test]
    fn test_like_score() {
        assert_eq!(like_score(10, 0), 0.0);
        // 3% ratio -> relative 1 -> 0.2
        assert!((like_score(30, 1_000) - 0.2).abs() < EPS);
        // 30% ratio -> capped at 5 -> 1.0
        assert!((like_score(300, 1_000) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_comment_score() {
        assert_eq!(comment_score(10, 0), 0.0);
        // 0.5% ratio -> relative 1 -> 0.1
        assert!((comment_score(5, 1_000) - 0.1).abs() < EPS);
        assert!((comment_score(500, 1_000) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_velocity_score_window() {
        // age 2h of an 8h window, 1998 views/hour -> 0.75 * log10(1999)/6
        let expected = 0.75 * (1_999f64.log10() / 6.0);
        assert!((velocity_score(3_996, Some(2.0), 8) - expected).abs() < EPS);
        // outside the window
        assert_eq!(velocity_score(3_996, Some(9.0), 8), 0.0);
        // exactly at the window edge the time factor is zero
        assert_eq!(velocity_score(3_996, Some(8.0), 8), 0.0);
    }

    #[test]
    fn test_velocity_log_cap() {
        // a million+ views per hour saturates the log term
        let score = velocity_score(10_000_000, Some(1.0), 2);
        assert!((score - 0.5).abs() < EPS);
    }

    #[test]
    fn test_composite_is_weighted_sum() {
        let now = Utc::now();
        let item = Item::new("v", "c", "t")
            .with_metrics(4_000, 120, 20)
            .published(now - Duration::hours(2));
        let policy = AnalysisPolicy::default();
        let engine = ScoringEngine::at(now);

        let subs = engine.sub_scores(&item, &policy, None);
        let expected = subs.view * 0.4 + subs.like * 0.3 + subs.comment * 0.2 + subs.velocity * 0.1;
        assert!((engine.composite(&item, &policy, None) - expected).abs() < EPS);
        assert!((engine.score(&item, &policy, None) - expected).abs() < EPS);
    }

    #[test]
    fn test_score_methods() {
        let now = Utc::now();
        let item = Item::new("v", "c", "t")
            .with_metrics(4_000, 120, 20)
            .published(now - Duration::hours(2));
        let engine = ScoringEngine::at(now);

        let growth = policy_with(AnalysisMethod::GrowthRate, ScoreWeights::default());
        let subs = engine.sub_scores(&item, &growth, None);
        assert!((engine.score(&item, &growth, None) - (subs.view + subs.like) / 2.0).abs() < EPS);

        let velocity = policy_with(AnalysisMethod::VelocityBased, ScoreWeights::default());
        assert!((engine.score(&item, &velocity, None) - subs.velocity).abs() < EPS);
    }

    #[test]
    fn test_score_monotonic_in_relative_views_per_hour() {
        let now = Utc::now();
        let engine = ScoringEngine::at(now);
        let policy = policy_with(
            AnalysisMethod::CompositeScore,
            ScoreWeights {
                view: 1.0,
                like: 0.0,
                comment: 0.0,
                velocity: 0.0,
            },
        );

        let mut previous = -1.0;
        for views in (0..40).map(|i| i * 2_500u64) {
            let item = Item::new("v", "c", "t")
                .with_metrics(views, 0, 0)
                .published(now - Duration::hours(3));
            let score = engine.score(&item, &policy, Some(5_000.0));
            assert!(score >= previous, "score dropped at {} views", views);
            previous = score;
        }
    }
}
