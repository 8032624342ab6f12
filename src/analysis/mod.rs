//! Trend analysis.

mod categories;
mod trend;

use async_trait::async_trait;

pub use categories::category_label;
pub use trend::{BASELINE_HISTORY_HOURS, BASELINE_HISTORY_LIMIT, CATEGORY_TREND_LIMIT, CompositeTrendAnalyzer};

use crate::domain::{AnalysisResult, Item};
use crate::error::Result;

/// Ranks one collected batch into a trending subset plus aggregate metrics
#[async_trait]
pub trait AnalysisStrategy: Send + Sync {
    async fn analyze(&self, items: &[Item]) -> Result<AnalysisResult>;
}
