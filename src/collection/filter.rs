//! Per-item collection filter.

use chrono::{DateTime, Duration, Utc};

use crate::config::CollectionPolicy;
use crate::domain::Item;

/// Whether `item` passes `policy` at time `now`.
///
/// Checks run cheapest first and stop at the first rejection. An item
/// without a publish time passes the age check, and one without a known
/// duration passes the shorts-only check.
pub fn should_include(item: &Item, policy: &CollectionPolicy, now: DateTime<Utc>) -> bool {
    if item.id.trim().is_empty() || item.title.trim().is_empty() {
        return false;
    }

    if item.view_count < policy.min_views() || item.like_count < policy.min_likes() {
        return false;
    }

    if let Some(published) = item.published_at {
        let oldest = now - Duration::hours(i64::from(policy.max_age_hours()));
        if published < oldest {
            return false;
        }
    }

    let categories = policy.categories();
    if !categories.is_empty() && !item.category_id.is_some_and(|id| categories.contains(&id)) {
        return false;
    }

    if policy.excluded_channels().iter().any(|channel| *channel == item.channel_id) {
        return false;
    }

    if policy.shorts_only() && item.is_short() == Some(false) {
        return false;
    }

    true
}
