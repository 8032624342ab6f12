//! Collection and analysis policies.
//!
//! `*Settings` structs are the raw, deserializable form with the defaults
//! the collectors were tuned with. They convert into the validated,
//! immutable `*Policy` types through `TryFrom`; conversion fails closed on
//! any out-of-range value rather than clamping it.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrendError};

/// Allowed deviation of the four analysis weights from 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// Views per hour assumed for a category without usable history
pub const DEFAULT_BASELINE_VIEWS_PER_HOUR: f64 = 10_000.0;

/// Which collector a scheduler runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectorKind {
    TrendingItems,
    SelectiveItems,
    CategoryBased,
}

impl CollectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectorKind::TrendingItems => "trending_items",
            CollectorKind::SelectiveItems => "selective_items",
            CollectorKind::CategoryBased => "category_based",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim() {
            "trending_items" | "trending_videos" => Ok(CollectorKind::TrendingItems),
            "selective_items" | "selective_videos" => Ok(CollectorKind::SelectiveItems),
            "category_based" => Ok(CollectorKind::CategoryBased),
            other => Err(TrendError::Validation(format!("unknown collection strategy: {}", other))),
        }
    }
}

/// How an analyzer turns sub-scores into a ranking score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMethod {
    GrowthRate,
    VelocityBased,
    CompositeScore,
}

impl AnalysisMethod {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim() {
            "growth_rate" => Ok(AnalysisMethod::GrowthRate),
            "velocity_based" => Ok(AnalysisMethod::VelocityBased),
            "composite_score" => Ok(AnalysisMethod::CompositeScore),
            other => Err(TrendError::Validation(format!("unknown analysis method: {}", other))),
        }
    }
}

/// Raw collection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionSettings {
    pub max_items_per_cycle: usize,
    pub min_view_count: u64,
    pub min_like_count: u64,
    pub max_age_hours: u32,
    /// Category allow-list; empty means every category
    pub target_categories: Vec<u32>,
    pub exclude_channels: Vec<String>,
    pub shorts_only: bool,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            max_items_per_cycle: 50,
            min_view_count: 1000,
            min_like_count: 10,
            max_age_hours: 24,
            target_categories: vec![10, 24, 25],
            exclude_channels: Vec::new(),
            shorts_only: true,
        }
    }
}

/// Validated collection policy
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionPolicy {
    max_items: usize,
    min_views: u64,
    min_likes: u64,
    max_age_hours: u32,
    categories: Vec<u32>,
    excluded_channels: Vec<String>,
    shorts_only: bool,
}

impl CollectionPolicy {
    pub fn max_items(&self) -> usize {
        self.max_items
    }

    pub fn min_views(&self) -> u64 {
        self.min_views
    }

    pub fn min_likes(&self) -> u64 {
        self.min_likes
    }

    pub fn max_age_hours(&self) -> u32 {
        self.max_age_hours
    }

    pub fn categories(&self) -> &[u32] {
        &self.categories
    }

    pub fn excluded_channels(&self) -> &[String] {
        &self.excluded_channels
    }

    pub fn shorts_only(&self) -> bool {
        self.shorts_only
    }
}

impl TryFrom<CollectionSettings> for CollectionPolicy {
    type Error = TrendError;

    fn try_from(settings: CollectionSettings) -> Result<Self> {
        if settings.max_items_per_cycle == 0 {
            return Err(TrendError::Validation("max_items_per_cycle must be positive".into()));
        }
        if settings.max_age_hours == 0 {
            return Err(TrendError::Validation("max_age_hours must be positive".into()));
        }

        Ok(Self {
            max_items: settings.max_items_per_cycle,
            min_views: settings.min_view_count,
            min_likes: settings.min_like_count,
            max_age_hours: settings.max_age_hours,
            categories: settings.target_categories,
            excluded_channels: settings.exclude_channels,
            shorts_only: settings.shorts_only,
        })
    }
}

impl Default for CollectionPolicy {
    fn default() -> Self {
        let defaults = CollectionSettings::default();
        Self {
            max_items: defaults.max_items_per_cycle,
            min_views: defaults.min_view_count,
            min_likes: defaults.min_like_count,
            max_age_hours: defaults.max_age_hours,
            categories: defaults.target_categories,
            excluded_channels: defaults.exclude_channels,
            shorts_only: defaults.shorts_only,
        }
    }
}

/// The four composite-score weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub view: f64,
    pub like: f64,
    pub comment: f64,
    pub velocity: f64,
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.view + self.like + self.comment + self.velocity
    }

    fn validate(&self) -> Result<()> {
        for (name, weight) in [
            ("view", self.view),
            ("like", self.like),
            ("comment", self.comment),
            ("velocity", self.velocity),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(TrendError::Validation(format!(
                    "{} weight must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(TrendError::Validation(format!(
                "weight sum must equal 1.0 (±{}), got {:.4}",
                WEIGHT_SUM_TOLERANCE, sum
            )));
        }
        Ok(())
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            view: 0.4,
            like: 0.3,
            comment: 0.2,
            velocity: 0.1,
        }
    }
}

/// Raw analysis settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub method: AnalysisMethod,
    pub weights: ScoreWeights,
    pub min_score: f64,
    pub window_hours: u32,
    /// Baseline used when a category has no history; `None` selects the absolute view formula
    pub baseline_fallback_views_per_hour: Option<f64>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            method: AnalysisMethod::CompositeScore,
            weights: ScoreWeights::default(),
            min_score: 0.6,
            window_hours: 8,
            baseline_fallback_views_per_hour: Some(DEFAULT_BASELINE_VIEWS_PER_HOUR),
        }
    }
}

/// Validated analysis policy
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisPolicy {
    method: AnalysisMethod,
    weights: ScoreWeights,
    min_score: f64,
    window_hours: u32,
    baseline_fallback: Option<f64>,
}

impl AnalysisPolicy {
    pub fn method(&self) -> AnalysisMethod {
        self.method
    }

    pub fn weights(&self) -> ScoreWeights {
        self.weights
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    pub fn window_hours(&self) -> u32 {
        self.window_hours
    }

    pub fn baseline_fallback(&self) -> Option<f64> {
        self.baseline_fallback
    }
}

impl TryFrom<AnalysisSettings> for AnalysisPolicy {
    type Error = TrendError;

    fn try_from(settings: AnalysisSettings) -> Result<Self> {
        settings.weights.validate()?;

        if !settings.min_score.is_finite() || settings.min_score < 0.0 {
            return Err(TrendError::Validation(format!(
                "min_score must be a non-negative number, got {}",
                settings.min_score
            )));
        }
        if settings.window_hours == 0 {
            return Err(TrendError::Validation("window_hours must be positive".into()));
        }
        if let Some(fallback) = settings.baseline_fallback_views_per_hour {
            if !fallback.is_finite() || fallback <= 0.0 {
                return Err(TrendError::Validation(format!(
                    "baseline_fallback_views_per_hour must be positive, got {}",
                    fallback
                )));
            }
        }

        Ok(Self {
            method: settings.method,
            weights: settings.weights,
            min_score: settings.min_score,
            window_hours: settings.window_hours,
            baseline_fallback: settings.baseline_fallback_views_per_hour,
        })
    }
}

impl Default for AnalysisPolicy {
    fn default() -> Self {
        let defaults = AnalysisSettings::default();
        Self {
            method: defaults.method,
            weights: defaults.weights,
            min_score: defaults.min_score,
            window_hours: defaults.window_hours,
            baseline_fallback: defaults.baseline_fallback_views_per_hour,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights(view: f64, like: f64, comment: f64, velocity: f64) -> ScoreWeights {
        ScoreWeights {
            view,
            like,
            comment,
            velocity,
        }
    }

    #[test]
    fn test_default_analysis_policy_is_valid() {
        let policy = AnalysisPolicy::try_from(AnalysisSettings::default()).unwrap();
        assert_eq!(policy.method(), AnalysisMethod::CompositeScore);
        assert!((policy.weights().sum() - 1.0).abs() < 1e-9);
        assert_eq!(policy.window_hours(), 8);
    }

    #[test]
    fn test_weight_sum_of_point_eight_fails() {
        let settings = AnalysisSettings {
            weights: weights(0.3, 0.2, 0.2, 0.1),
            ..Default::default()
        };
        let err = AnalysisPolicy::try_from(settings).unwrap_err();
        assert!(matches!(err, TrendError::Validation(_)));
    }

    #[test]
    fn test_weight_sum_within_tolerance_passes() {
        let settings = AnalysisSettings {
            weights: weights(0.405, 0.3, 0.2, 0.1),
            ..Default::default()
        };
        assert!(AnalysisPolicy::try_from(settings).is_ok());

        let settings = AnalysisSettings {
            weights: weights(0.395, 0.3, 0.2, 0.1),
            ..Default::default()
        };
        assert!(AnalysisPolicy::try_from(settings).is_ok());
    }

    #[test]
    fn test_weight_sum_just_outside_tolerance_fails() {
        let settings = AnalysisSettings {
            weights: weights(0.42, 0.3, 0.2, 0.1),
            ..Default::default()
        };
        assert!(AnalysisPolicy::try_from(settings).is_err());
    }

    #[test]
    fn test_negative_weight_fails_even_if_sum_is_one() {
        let settings = AnalysisSettings {
            weights: weights(1.2, -0.2, 0.0, 0.0),
            ..Default::default()
        };
        assert!(AnalysisPolicy::try_from(settings).is_err());
    }

    #[test]
    fn test_nan_threshold_fails() {
        let settings = AnalysisSettings {
            min_score: f64::NAN,
            ..Default::default()
        };
        assert!(AnalysisPolicy::try_from(settings).is_err());
    }

    #[test]
    fn test_zero_window_fails() {
        let settings = AnalysisSettings {
            window_hours: 0,
            ..Default::default()
        };
        assert!(AnalysisPolicy::try_from(settings).is_err());
    }

    #[test]
    fn test_non_positive_baseline_fallback_fails() {
        let settings = AnalysisSettings {
            baseline_fallback_views_per_hour: Some(0.0),
            ..Default::default()
        };
        assert!(AnalysisPolicy::try_from(settings).is_err());

        let settings = AnalysisSettings {
            baseline_fallback_views_per_hour: None,
            ..Default::default()
        };
        assert!(AnalysisPolicy::try_from(settings).is_ok());
    }

    #[test]
    fn test_collection_policy_defaults() {
        let policy = CollectionPolicy::try_from(CollectionSettings::default()).unwrap();
        assert_eq!(policy.max_items(), 50);
        assert_eq!(policy.categories(), &[10, 24, 25]);
        assert!(policy.shorts_only());
        assert_eq!(policy, CollectionPolicy::default());
    }

    #[test]
    fn test_collection_policy_rejects_zero_max_items() {
        let settings = CollectionSettings {
            max_items_per_cycle: 0,
            ..Default::default()
        };
        assert!(CollectionPolicy::try_from(settings).is_err());
    }

    #[test]
    fn test_collection_policy_rejects_zero_age_window() {
        let settings = CollectionSettings {
            max_age_hours: 0,
            ..Default::default()
        };
        assert!(CollectionPolicy::try_from(settings).is_err());
    }

    #[test]
    fn test_collector_kind_parse() {
        assert_eq!(CollectorKind::parse("selective_videos").unwrap(), CollectorKind::SelectiveItems);
        assert_eq!(CollectorKind::parse("category_based").unwrap(), CollectorKind::CategoryBased);
        assert!(CollectorKind::parse("random").is_err());
    }

    #[test]
    fn test_analysis_method_parse() {
        assert_eq!(AnalysisMethod::parse("growth_rate").unwrap(), AnalysisMethod::GrowthRate);
        assert!(AnalysisMethod::parse("magic").is_err());
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let yaml = "min_view_count: 500\nshorts_only: false\n";
        let settings: CollectionSettings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.min_view_count, 500);
        assert!(!settings.shorts_only);
        assert_eq!(settings.max_items_per_cycle, 50);
    }
}
