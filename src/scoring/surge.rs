//! Surge scoring.
//!
//! Two related measures live here:
//! - `candidate_rate` ranks fresh search results while they are collected
//! - `SurgeInput::score` ranks items that have a previous view snapshot to grow from

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ordering::rank_stable;
use crate::domain::{Item, ScoredItem};

/// Age floor used by the surge-candidate views-per-hour check
pub const MIN_CANDIDATE_AGE_HOURS: f64 = 0.1;
/// Window a search result must be published within to count as surging
pub const SURGE_WINDOW_HOURS: f64 = 8.0;
/// Views per hour a surging search result must reach
pub const SURGE_MIN_VIEWS_PER_HOUR: f64 = 500.0;
/// Decay rate of the freshness term per hour of age
pub const FRESHNESS_DECAY: f64 = 0.05;
/// Freshness used when the publish time is unknown
pub const UNKNOWN_AGE_FRESHNESS: f64 = 0.5;

/// Step multiplier rewarding very recent items
pub fn freshness_bonus(age_hours: f64) -> f64 {
    if age_hours <= 24.0 {
        1.5
    } else if age_hours <= 48.0 {
        1.2
    } else if age_hours <= 72.0 {
        1.1
    } else {
        1.0
    }
}

/// Exponential decay by age, boosted by [`freshness_bonus`]
pub fn freshness(age_hours: Option<f64>) -> f64 {
    match age_hours {
        Some(age) => (-FRESHNESS_DECAY * age).exp() * freshness_bonus(age),
        None => UNKNOWN_AGE_FRESHNESS,
    }
}

/// Views per hour boosted by like ratio; zero for unpublished or future items
pub fn candidate_rate(item: &Item, now: DateTime<Utc>) -> f64 {
    let age = match item.age_hours(now) {
        Some(age) if age > 0.0 => age,
        _ => return 0.0,
    };
    if item.view_count == 0 {
        return 0.0;
    }

    let views_per_hour = item.view_count as f64 / age;
    let like_ratio = item.like_count as f64 / item.view_count as f64;
    views_per_hour * (1.0 + like_ratio * 10.0)
}

/// Recently published and gaining views fast enough to follow up on
pub fn is_surge_candidate(item: &Item, now: DateTime<Utc>) -> bool {
    let age = match item.age_hours(now) {
        Some(age) if age >= 0.0 && age <= SURGE_WINDOW_HOURS => age.max(MIN_CANDIDATE_AGE_HOURS),
        _ => return false,
    };
    item.view_count as f64 / age >= SURGE_MIN_VIEWS_PER_HOUR
}

/// View growth between two snapshots of the same item
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SurgeInput {
    pub current_views: u64,
    pub previous_views: u64,
    /// Days between the two snapshots
    pub elapsed_days: f64,
    pub age_hours: Option<f64>,
}

/// The four additive terms of a surge score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SurgeBreakdown {
    pub growth_factor: f64,
    pub velocity_factor: f64,
    pub popularity_factor: f64,
    pub freshness_factor: f64,
    /// Step multiplier already folded into `freshness_factor`
    pub freshness_bonus: f64,
}

impl SurgeBreakdown {
    pub fn total(&self) -> f64 {
        self.growth_factor + self.velocity_factor + self.popularity_factor + self.freshness_factor
    }
}

impl SurgeInput {
    pub fn for_item(item: &Item, previous_views: u64, elapsed_days: f64, now: DateTime<Utc>) -> Self {
        Self {
            current_views: item.view_count,
            previous_views,
            elapsed_days,
            age_hours: item.age_hours(now),
        }
    }

    fn delta(&self) -> f64 {
        self.current_views as f64 - self.previous_views as f64
    }

    /// Relative growth; zero without a previous count
    pub fn growth_rate(&self) -> f64 {
        if self.previous_views == 0 {
            return 0.0;
        }
        self.delta() / self.previous_views as f64
    }

    /// Views gained per day; zero when no time elapsed
    pub fn velocity(&self) -> f64 {
        if self.elapsed_days <= 0.0 {
            return 0.0;
        }
        self.delta() / self.elapsed_days
    }

    pub fn breakdown(&self) -> SurgeBreakdown {
        SurgeBreakdown {
            growth_factor: self.growth_rate() * 100.0,
            velocity_factor: self.velocity() / 1000.0,
            popularity_factor: ((self.current_views.max(1) as f64) + 10.0).ln() * 0.1,
            freshness_factor: freshness(self.age_hours) * 50.0,
            freshness_bonus: self.age_hours.map(freshness_bonus).unwrap_or(1.0),
        }
    }

    pub fn score(&self) -> f64 {
        self.breakdown().total()
    }
}

/// Score every item by surge and rank them with the shared tie-break order
pub fn rank_by_surge(candidates: Vec<(Item, SurgeInput)>) -> Vec<ScoredItem> {
    let mut scored: Vec<ScoredItem> = candidates
        .into_iter()
        .map(|(item, input)| ScoredItem {
            score: input.score(),
            item,
        })
        .collect();
    rank_stable(&mut scored);
    scored
}
