//! Per-category views-per-hour baselines derived from recent history.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::Item;

/// Average views per hour by category, with a fallback for the rest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryBaselines {
    averages: HashMap<u32, f64>,
    fallback: Option<f64>,
}

impl CategoryBaselines {
    /// No history; every category resolves to `fallback`
    pub fn fallback_only(fallback: Option<f64>) -> Self {
        Self {
            averages: HashMap::new(),
            fallback,
        }
    }

    /// Average views per hour of every published, viewed item in `history`
    pub fn from_history(history: &[Item], now: DateTime<Utc>, fallback: Option<f64>) -> Self {
        let mut sums: HashMap<u32, (f64, usize)> = HashMap::new();

        for item in history {
            let (Some(category), Some(age)) = (item.category_id, item.age_hours(now)) else {
                continue;
            };
            if age <= 0.0 || item.view_count == 0 {
                continue;
            }
            let entry = sums.entry(category).or_insert((0.0, 0));
            entry.0 += item.view_count as f64 / age;
            entry.1 += 1;
        }

        let averages = sums
            .into_iter()
            .map(|(category, (sum, count))| (category, sum / count as f64))
            .filter(|(_, avg)| *avg > 0.0)
            .collect();

        Self { averages, fallback }
    }

    pub fn for_category(&self, category: Option<u32>) -> Option<f64> {
        category
            .and_then(|id| self.averages.get(&id).copied())
            .or(self.fallback)
    }

    pub fn len(&self) -> usize {
        self.averages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.averages.is_empty()
    }
}
