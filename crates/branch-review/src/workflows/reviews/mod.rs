//! Branch inspection reviews: survey scoring, branch ranking and the
//! catalogs (surveys, topics, roster) the reviews reference.

pub mod carousel;
pub mod catalog;
pub mod domain;
pub mod handoff;
pub mod import;
pub mod ranking;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod store;
pub mod surveys;

#[cfg(test)]
mod tests;

pub use carousel::{
    Carousel, CarouselState, Direction, FeaturedBranch, FeaturedView, Lane, RankingCarousels,
};
pub use catalog::{CatalogService, ImportSummary};
pub use domain::{
    Answer, AnswerInput, AnswerRecord, Branch, BranchDraft, BranchId, ItemType, QuestionDraft,
    QuestionSpec, ReviewEdit, ReviewId, ReviewRecord, ReviewSubmission, ScoreSummary,
    StatusToken, SurveyDefinition, SurveyDraft, SurveyId,
};
pub use handoff::{CurrentReview, ReviewMailbox};
pub use import::{parse_branch_roster, read_branch_roster, ImportError};
pub use ranking::views::{BranchCard, DashboardView, RankingRow, RankingTableView};
pub use ranking::{
    BranchAggregate, BranchRanking, MeanSource, RankedBranch, RankingConfig, RankingEngine,
    RankingTable,
};
pub use repository::{Document, DocumentStore, RepositoryError, Revision, Snapshot, Topic};
pub use router::{review_router, ReviewApi};
pub use scoring::{
    summarize, topic_breakdown, AnswerProblem, ReviewScorer, ReviewValidationError, TopicScore,
    Violation,
};
pub use service::{ReviewDetail, ReviewService, ReviewServiceError};
pub use store::{JsonFileStore, MemoryDocumentStore};
pub use surveys::{CatalogError, SurveyCatalog};
