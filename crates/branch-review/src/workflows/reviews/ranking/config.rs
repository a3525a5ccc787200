use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_OUTSTANDING_THRESHOLD: f64 = 3.0;
pub const DEFAULT_ROTATION_SECS: u64 = 5;

/// Where a review's contribution to its branch average comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeanSource {
    /// The stored `average_score`, which is re-derived from answers on every save.
    #[default]
    StoredSummary,
    /// The mean of the record's scored answers, falling back to the stored
    /// `average_score` for records without scored answers.
    PreferAnswers,
}

impl MeanSource {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stored" | "stored_summary" | "summary" => Some(Self::StoredSummary),
            "answers" | "prefer_answers" => Some(Self::PreferAnswers),
            _ => None,
        }
    }
}

/// Dials for branch ranking and the featured-branch rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    pub outstanding_threshold: f64,
    pub mean_source: MeanSource,
    pub rotation_interval_secs: u64,
}

impl RankingConfig {
    /// Parses an outstanding threshold; it must be a finite score on the 1-5 scale.
    pub fn parse_threshold(raw: &str) -> Option<f64> {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && (1.0..=5.0).contains(value))
    }

    pub fn rotation_interval(&self) -> Duration {
        Duration::from_secs(self.rotation_interval_secs)
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            outstanding_threshold: DEFAULT_OUTSTANDING_THRESHOLD,
            mean_source: MeanSource::default(),
            rotation_interval_secs: DEFAULT_ROTATION_SECS,
        }
    }
}
