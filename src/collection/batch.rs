//! Per-cycle accumulation of fetched items.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::filter::should_include;
use crate::config::CollectionPolicy;
use crate::domain::Item;

/// Accepts fetched items in priority order until the limit is reached.
///
/// The seen-id set lives only as long as the batch, so de-duplication is
/// scoped to one cycle.
#[derive(Debug)]
pub struct CycleBatch<'a> {
    policy: &'a CollectionPolicy,
    now: DateTime<Utc>,
    limit: usize,
    seen: HashSet<String>,
    kept: Vec<Item>,
    filtered: usize,
}

impl<'a> CycleBatch<'a> {
    pub fn new(policy: &'a CollectionPolicy, limit: usize, now: DateTime<Utc>) -> Self {
        Self {
            policy,
            now,
            limit,
            seen: HashSet::new(),
            kept: Vec::new(),
            filtered: 0,
        }
    }

    /// Offer one source's items; returns how many were kept
    pub fn offer(&mut self, items: impl IntoIterator<Item = Item>) -> usize {
        let before = self.kept.len();
        for item in items {
            if self.is_full() {
                break;
            }
            if self.seen.contains(&item.id) || !should_include(&item, self.policy, self.now) {
                self.filtered += 1;
                continue;
            }
            self.seen.insert(item.id.clone());
            self.kept.push(item);
        }
        self.kept.len() - before
    }

    pub fn is_full(&self) -> bool {
        self.kept.len() >= self.limit
    }

    pub fn filtered(&self) -> usize {
        self.filtered
    }

    pub fn into_parts(self) -> (Vec<Item>, usize) {
        (self.kept, self.filtered)
    }
}
