//! Per-scheduler configuration.
//!
//! A `SchedulerConfig` is built once at startup from `SchedulerSettings`
//! (YAML, environment, or one of the presets) and never changes afterwards.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::policy::{
    AnalysisMethod, AnalysisPolicy, AnalysisSettings, CollectionPolicy, CollectionSettings, CollectorKind,
    ScoreWeights,
};
use crate::error::{Result, TrendError};

/// Raw scheduler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub id: String,
    pub interval_minutes: u64,
    pub strategy: CollectorKind,
    pub collection: CollectionSettings,
    pub analysis: AnalysisSettings,
    pub enabled: bool,
    pub retry_count: u32,
    pub retry_delay_secs: u64,
    pub max_execution_minutes: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            id: String::new(),
            interval_minutes: 30,
            strategy: CollectorKind::SelectiveItems,
            collection: CollectionSettings::default(),
            analysis: AnalysisSettings::default(),
            enabled: true,
            retry_count: 3,
            retry_delay_secs: 60,
            max_execution_minutes: 10,
        }
    }
}

impl SchedulerSettings {
    /// Defaults with the given id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Short-cycle preset tuned for catching early surges
    pub fn mvp(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            interval_minutes: 10,
            strategy: CollectorKind::SelectiveItems,
            collection: CollectionSettings {
                max_items_per_cycle: 30,
                min_view_count: 500,
                min_like_count: 5,
                max_age_hours: 8,
                target_categories: vec![10, 22, 24, 25],
                exclude_channels: Vec::new(),
                shorts_only: false,
            },
            analysis: AnalysisSettings {
                method: AnalysisMethod::CompositeScore,
                weights: ScoreWeights {
                    view: 0.5,
                    like: 0.3,
                    comment: 0.1,
                    velocity: 0.1,
                },
                min_score: 0.7,
                window_hours: 8,
                ..Default::default()
            },
            enabled: true,
            retry_count: 3,
            retry_delay_secs: 60,
            max_execution_minutes: 15,
        }
    }

    /// Settings read from the process environment
    pub fn from_env(id: impl Into<String>) -> Result<Self> {
        Self::from_lookup(id, |key| std::env::var(key).ok())
    }

    /// Settings read through an arbitrary key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(id: impl Into<String>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::new(id);
        let collection_defaults = CollectionSettings::default();
        let analysis_defaults = AnalysisSettings::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let target_categories = match get("TARGET_CATEGORIES") {
            Some(raw) => raw
                .split(',')
                .map(|part| parse_value::<u32>("TARGET_CATEGORIES", part.trim()))
                .collect::<Result<Vec<_>>>()?,
            None => collection_defaults.target_categories,
        };
        let exclude_channels = match get("EXCLUDE_CHANNELS") {
            Some(raw) => raw.split(',').map(|c| c.trim().to_string()).filter(|c| !c.is_empty()).collect(),
            None => Vec::new(),
        };

        let collection = CollectionSettings {
            max_items_per_cycle: env_or(&get, "MAX_VIDEOS_PER_CYCLE", collection_defaults.max_items_per_cycle)?,
            min_view_count: env_or(&get, "MIN_VIEW_COUNT", collection_defaults.min_view_count)?,
            min_like_count: env_or(&get, "MIN_LIKE_COUNT", collection_defaults.min_like_count)?,
            max_age_hours: env_or(&get, "MAX_VIDEO_AGE_HOURS", collection_defaults.max_age_hours)?,
            target_categories,
            exclude_channels,
            shorts_only: env_flag(&get, "INCLUDE_SHORTS_ONLY", collection_defaults.shorts_only)?,
        };

        let method = match get("ANALYSIS_METHOD") {
            Some(raw) => AnalysisMethod::parse(&raw)?,
            None => analysis_defaults.method,
        };
        let analysis = AnalysisSettings {
            method,
            weights: ScoreWeights {
                view: env_or(&get, "VIEW_GROWTH_WEIGHT", analysis_defaults.weights.view)?,
                like: env_or(&get, "LIKE_GROWTH_WEIGHT", analysis_defaults.weights.like)?,
                comment: env_or(&get, "COMMENT_GROWTH_WEIGHT", analysis_defaults.weights.comment)?,
                velocity: env_or(&get, "VELOCITY_WEIGHT", analysis_defaults.weights.velocity)?,
            },
            min_score: env_or(&get, "MIN_TREND_SCORE", analysis_defaults.min_score)?,
            window_hours: env_or(&get, "ANALYSIS_WINDOW_HOURS", analysis_defaults.window_hours)?,
            baseline_fallback_views_per_hour: analysis_defaults.baseline_fallback_views_per_hour,
        };

        let strategy = match get("COLLECTION_STRATEGY") {
            Some(raw) => CollectorKind::parse(&raw)?,
            None => defaults.strategy,
        };

        Ok(Self {
            interval_minutes: env_or(&get, "SCHEDULER_INTERVAL_MINUTES", defaults.interval_minutes)?,
            strategy,
            collection,
            analysis,
            enabled: env_flag(&get, "SCHEDULER_ENABLED", defaults.enabled)?,
            retry_count: env_or(&get, "SCHEDULER_RETRY_COUNT", defaults.retry_count)?,
            retry_delay_secs: env_or(&get, "SCHEDULER_RETRY_DELAY", defaults.retry_delay_secs)?,
            max_execution_minutes: env_or(&get, "SCHEDULER_MAX_EXECUTION_TIME", defaults.max_execution_minutes)?,
            ..defaults
        })
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse::<T>()
        .map_err(|_| TrendError::Validation(format!("{} has an invalid value: {:?}", key, raw)))
}

fn env_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn env_flag<G>(get: &G, key: &str, default: bool) -> Result<bool>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) if raw.eq_ignore_ascii_case("true") => Ok(true),
        Some(raw) if raw.eq_ignore_ascii_case("false") => Ok(false),
        Some(raw) => Err(TrendError::Validation(format!(
            "{} must be true or false, got {:?}",
            key, raw
        ))),
        None => Ok(default),
    }
}

fn minutes(id: &str, field: &str, value: u64) -> Result<Duration> {
    value
        .checked_mul(60)
        .map(Duration::from_secs)
        .ok_or_else(|| TrendError::Validation(format!("{}: {} is too large: {}", id, field, value)))
}

/// Validated, immutable scheduler configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    id: String,
    interval: Duration,
    strategy: CollectorKind,
    collection: CollectionPolicy,
    analysis: AnalysisPolicy,
    enabled: bool,
    retry_count: u32,
    retry_delay: Duration,
    max_execution: Duration,
}

impl SchedulerConfig {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn strategy(&self) -> CollectorKind {
        self.strategy
    }

    pub fn collection(&self) -> &CollectionPolicy {
        &self.collection
    }

    pub fn analysis(&self) -> &AnalysisPolicy {
        &self.analysis
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub fn max_execution(&self) -> Duration {
        self.max_execution
    }
}

impl TryFrom<SchedulerSettings> for SchedulerConfig {
    type Error = TrendError;

    fn try_from(settings: SchedulerSettings) -> Result<Self> {
        let id = settings.id.trim().to_string();
        if id.is_empty() {
            return Err(TrendError::Validation("scheduler id is required".into()));
        }
        if settings.interval_minutes == 0 {
            return Err(TrendError::Validation(format!(
                "{}: interval_minutes must be positive",
                id
            )));
        }
        if settings.max_execution_minutes == 0 {
            return Err(TrendError::Validation(format!(
                "{}: max_execution_minutes must be positive",
                id
            )));
        }

        let interval = minutes(&id, "interval_minutes", settings.interval_minutes)?;
        let max_execution = minutes(&id, "max_execution_minutes", settings.max_execution_minutes)?;

        let collection = CollectionPolicy::try_from(settings.collection)
            .map_err(|e| TrendError::Validation(format!("{}: {}", id, e)))?;
        let analysis = AnalysisPolicy::try_from(settings.analysis)
            .map_err(|e| TrendError::Validation(format!("{}: {}", id, e)))?;

        Ok(Self {
            id,
            interval,
            strategy: settings.strategy,
            collection,
            analysis,
            enabled: settings.enabled,
            retry_count: settings.retry_count,
            retry_delay: Duration::from_secs(settings.retry_delay_secs),
            max_execution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_settings_build() {
        let config = SchedulerConfig::try_from(SchedulerSettings::new("s1")).unwrap();
        assert_eq!(config.id(), "s1");
        assert_eq!(config.interval(), Duration::from_secs(30 * 60));
        assert_eq!(config.retry_count(), 3);
        assert_eq!(config.strategy(), CollectorKind::SelectiveItems);
    }

    #[test]
    fn test_missing_id_fails() {
        let err = SchedulerConfig::try_from(SchedulerSettings::new("  ")).unwrap_err();
        assert!(err.to_string().contains("id is required"));
    }

    #[test]
    fn test_zero_interval_fails() {
        let settings = SchedulerSettings {
            interval_minutes: 0,
            ..SchedulerSettings::new("s1")
        };
        assert!(SchedulerConfig::try_from(settings).is_err());
    }

    #[test]
    fn test_oversized_minutes_fail_validation() {
        let settings = SchedulerSettings {
            interval_minutes: u64::MAX,
            ..SchedulerSettings::new("s1")
        };
        let err = SchedulerConfig::try_from(settings).unwrap_err();
        assert!(matches!(err, TrendError::Validation(_)));
        assert!(err.to_string().contains("interval_minutes"));

        let settings = SchedulerSettings {
            max_execution_minutes: u64::MAX / 2,
            ..SchedulerSettings::new("s1")
        };
        let err = SchedulerConfig::try_from(settings).unwrap_err();
        assert!(err.to_string().contains("max_execution_minutes"));
    }

    #[test]
    fn test_invalid_nested_policy_fails() {
        let mut settings = SchedulerSettings::new("s1");
        settings.analysis.weights.view = 0.1;
        let err = SchedulerConfig::try_from(settings).unwrap_err();
        assert!(err.to_string().contains("s1"));
        assert!(err.to_string().contains("weight sum"));
    }

    #[test]
    fn test_mvp_preset_is_valid() {
        let config = SchedulerConfig::try_from(SchedulerSettings::mvp("mvp")).unwrap();
        assert_eq!(config.interval(), Duration::from_secs(600));
        assert_eq!(config.collection().max_items(), 30);
        assert_eq!(config.collection().categories(), &[10, 22, 24, 25]);
        assert!(!config.collection().shorts_only());
        assert_eq!(config.analysis().min_score(), 0.7);
        assert_eq!(config.max_execution(), Duration::from_secs(15 * 60));
    }

    #[test]
    fn test_from_lookup_defaults_when_unset() {
        let settings = SchedulerSettings::from_lookup("env", lookup(&[])).unwrap();
        assert_eq!(settings, SchedulerSettings::new("env"));
    }

    #[test]
    fn test_from_lookup_reads_values() {
        let settings = SchedulerSettings::from_lookup(
            "env",
            lookup(&[
                ("SCHEDULER_INTERVAL_MINUTES", "5"),
                ("COLLECTION_STRATEGY", "category_based"),
                ("TARGET_CATEGORIES", "10, 20"),
                ("EXCLUDE_CHANNELS", "spam1,spam2"),
                ("INCLUDE_SHORTS_ONLY", "false"),
                ("ANALYSIS_METHOD", "velocity_based"),
                ("MIN_TREND_SCORE", "0.5"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.interval_minutes, 5);
        assert_eq!(settings.strategy, CollectorKind::CategoryBased);
        assert_eq!(settings.collection.target_categories, vec![10, 20]);
        assert_eq!(settings.collection.exclude_channels, vec!["spam1", "spam2"]);
        assert!(!settings.collection.shorts_only);
        assert_eq!(settings.analysis.method, AnalysisMethod::VelocityBased);
        assert_eq!(settings.analysis.min_score, 0.5);
    }

    #[test]
    fn test_from_lookup_fails_closed_on_garbage() {
        let result = SchedulerSettings::from_lookup("env", lookup(&[("SCHEDULER_RETRY_COUNT", "-1")]));
        assert!(matches!(result, Err(TrendError::Validation(_))));

        let result = SchedulerSettings::from_lookup("env", lookup(&[("VIEW_GROWTH_WEIGHT", "lots")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_from_lookup_rejects_unknown_flags() {
        let result = SchedulerSettings::from_lookup("env", lookup(&[("SCHEDULER_ENABLED", "yes")]));
        assert!(matches!(result, Err(TrendError::Validation(_))));

        let result = SchedulerSettings::from_lookup("env", lookup(&[("INCLUDE_SHORTS_ONLY", "flase")]));
        assert!(matches!(result, Err(TrendError::Validation(_))));

        let settings = SchedulerSettings::from_lookup(
            "env",
            lookup(&[("SCHEDULER_ENABLED", "FALSE"), ("INCLUDE_SHORTS_ONLY", "True")]),
        )
        .unwrap();
        assert!(!settings.enabled);
        assert!(settings.collection.shorts_only);
    }

    #[test]
    fn test_settings_from_yaml() {
        let yaml = r#"
id: yaml_scheduler
interval_minutes: 15
strategy: trending_items
analysis:
  min_score: 0.4
"#;
        let settings: SchedulerSettings = serde_yaml::from_str(yaml).unwrap();
        let config = SchedulerConfig::try_from(settings).unwrap();
        assert_eq!(config.strategy(), CollectorKind::TrendingItems);
        assert_eq!(config.analysis().min_score(), 0.4);
        assert_eq!(config.interval(), Duration::from_secs(900));
    }
}
