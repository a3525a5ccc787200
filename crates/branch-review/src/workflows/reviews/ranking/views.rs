use super::{BranchAggregate, BranchRanking, RankingConfig, RankingTable};
use crate::workflows::reviews::domain::{format_average, or_not_specified};
use serde::Serialize;

pub const NO_DATA_MESSAGE: &str = "no review data available";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchCard {
    pub name: String,
    pub average: f64,
    pub average_label: String,
    pub review_count: usize,
    pub manager: String,
    pub contact: String,
}

impl BranchCard {
    pub(crate) fn from_aggregate(aggregate: &BranchAggregate) -> Self {
        Self {
            name: aggregate.name.clone(),
            average: aggregate.average,
            average_label: format_average(aggregate.average),
            review_count: aggregate.scores.len(),
            manager: or_not_specified(&aggregate.manager).to_string(),
            contact: or_not_specified(&aggregate.contact).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingRow {
    pub rank: usize,
    #[serde(flatten)]
    pub card: BranchCard,
    pub outstanding: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RankingTableView {
    NoData { message: &'static str },
    Ranked { rows: Vec<RankingRow> },
}

/// Presentation of a ranking pass for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub threshold: f64,
    pub rotation_interval_secs: u64,
    pub total_reviews: usize,
    pub outstanding: Vec<BranchCard>,
    pub needs_improvement: Vec<BranchCard>,
    pub table: RankingTableView,
}

impl DashboardView {
    pub fn build(ranking: &BranchRanking, config: &RankingConfig, total_reviews: usize) -> Self {
        let table = match &ranking.table {
            RankingTable::NoData => RankingTableView::NoData {
                message: NO_DATA_MESSAGE,
            },
            RankingTable::Ranked { rows } => RankingTableView::Ranked {
                rows: rows
                    .iter()
                    .map(|row| RankingRow {
                        rank: row.rank,
                        card: BranchCard::from_aggregate(&row.branch),
                        outstanding: row.branch.average >= config.outstanding_threshold,
                    })
                    .collect(),
            },
        };

        Self {
            threshold: config.outstanding_threshold,
            rotation_interval_secs: config.rotation_interval_secs,
            total_reviews,
            outstanding: ranking
                .outstanding
                .iter()
                .map(BranchCard::from_aggregate)
                .collect(),
            needs_improvement: ranking
                .needs_improvement
                .iter()
                .map(BranchCard::from_aggregate)
                .collect(),
            table,
        }
    }
}
