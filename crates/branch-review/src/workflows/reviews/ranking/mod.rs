//! Cross-review branch aggregation.
//!
//! Reviews are grouped by branch name, each review contributes one mean, and a
//! branch's average is the unweighted mean of those review means. Branches are
//! then split at the outstanding threshold and ranked.

mod config;
pub mod views;

pub use config::{MeanSource, RankingConfig, DEFAULT_OUTSTANDING_THRESHOLD, DEFAULT_ROTATION_SECS};

use super::domain::{Branch, ReviewRecord};
use serde::Serialize;
use std::cmp::Ordering;

/// Derived per-branch summary. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchAggregate {
    pub name: String,
    pub average: f64,
    pub scores: Vec<f64>,
    pub manager: String,
    pub contact: String,
}

/// Row of the full ranking table; ranks start at 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedBranch {
    pub rank: usize,
    #[serde(flatten)]
    pub branch: BranchAggregate,
}

/// Full ranking, with an explicit state when nothing could be ranked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RankingTable {
    NoData,
    Ranked { rows: Vec<RankedBranch> },
}

impl RankingTable {
    pub fn rows(&self) -> &[RankedBranch] {
        match self {
            RankingTable::NoData => &[],
            RankingTable::Ranked { rows } => rows,
        }
    }
}

/// Result of one ranking pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchRanking {
    pub outstanding: Vec<BranchAggregate>,
    pub needs_improvement: Vec<BranchAggregate>,
    pub table: RankingTable,
}

impl BranchRanking {
    pub fn is_empty(&self) -> bool {
        matches!(self.table, RankingTable::NoData)
    }
}

/// Stateless ranking pass over the full review collection.
#[derive(Debug, Clone, Default)]
pub struct RankingEngine {
    config: RankingConfig,
}

impl RankingEngine {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// The single value a review contributes to its branch average, or
    /// `None` when the review has nothing scored.
    pub fn review_mean(&self, review: &ReviewRecord) -> Option<f64> {
        let stored = review.summary.average_score;
        let stored = (stored.is_finite() && stored > 0.0).then_some(stored);
        match self.config.mean_source {
            MeanSource::StoredSummary => stored,
            MeanSource::PreferAnswers => review.answer_mean().or(stored),
        }
    }

    pub fn rank(&self, reviews: &[ReviewRecord], roster: &[Branch]) -> BranchRanking {
        let mut groups: Vec<(&str, Vec<f64>)> = Vec::new();
        for review in reviews {
            let mean = self.review_mean(review);
            let index = match groups
                .iter()
                .position(|(name, _)| *name == review.branch.as_str())
            {
                Some(index) => index,
                None => {
                    groups.push((review.branch.as_str(), Vec::new()));
                    groups.len() - 1
                }
            };
            if let Some(mean) = mean {
                groups[index].1.push(mean);
            }
        }

        let aggregates: Vec<BranchAggregate> = groups
            .into_iter()
            .filter(|(_, scores)| !scores.is_empty())
            .map(|(name, scores)| {
                let average = scores.iter().sum::<f64>() / scores.len() as f64;
                let roster_entry = roster.iter().find(|branch| branch.name == name);
                BranchAggregate {
                    name: name.to_string(),
                    average,
                    scores,
                    manager: roster_entry
                        .map(|branch| branch.manager.clone())
                        .unwrap_or_default(),
                    contact: roster_entry
                        .map(|branch| branch.contact.clone())
                        .unwrap_or_default(),
                }
            })
            .collect();

        let threshold = self.config.outstanding_threshold;

        let mut needs_improvement: Vec<BranchAggregate> = aggregates
            .iter()
            .filter(|aggregate| aggregate.average < threshold)
            .cloned()
            .collect();
        needs_improvement.sort_by(|a, b| ascending(a.average, b.average));

        let mut ranked = aggregates;
        ranked.sort_by(|a, b| ascending(b.average, a.average));

        let outstanding = ranked
            .iter()
            .filter(|aggregate| aggregate.average >= threshold)
            .cloned()
            .collect();

        let table = if ranked.is_empty() {
            RankingTable::NoData
        } else {
            RankingTable::Ranked {
                rows: ranked
                    .into_iter()
                    .enumerate()
                    .map(|(position, branch)| RankedBranch {
                        rank: position + 1,
                        branch,
                    })
                    .collect(),
            }
        };

        BranchRanking {
            outstanding,
            needs_improvement,
            table,
        }
    }
}

fn ascending(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
