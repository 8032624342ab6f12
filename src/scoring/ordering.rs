//! Deterministic ranking order.
//!
//! Score descending, then view count descending, then most recently
//! collected first. The sort is stable, so fully tied items keep their
//! input order.

use std::cmp::Ordering;

use crate::domain::ScoredItem;

pub fn compare_ranked(a: &ScoredItem, b: &ScoredItem) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.item.view_count.cmp(&a.item.view_count))
        .then_with(|| b.item.collected_at.cmp(&a.item.collected_at))
}

pub fn rank_stable(items: &mut [ScoredItem]) {
    items.sort_by(compare_ranked);
}
