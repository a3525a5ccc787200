use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::domain::{
    or_not_specified, Branch, ReviewEdit, ReviewId, ReviewRecord, ReviewSubmission,
    SurveyDefinition,
};
use super::ranking::views::DashboardView;
use super::ranking::{BranchRanking, RankingConfig, RankingEngine};
use super::repository::{Document, DocumentStore, RepositoryError, Revision, Snapshot};
use super::scoring::{topic_breakdown, ReviewScorer, ReviewValidationError, TopicScore};
use super::surveys::CatalogError;

/// Service composing the scorer, ranking engine and document store.
pub struct ReviewService<S> {
    store: Arc<S>,
    scorer: ReviewScorer,
    ranking: RankingEngine,
}

impl<S> ReviewService<S>
where
    S: DocumentStore + 'static,
{
    pub fn new(store: Arc<S>, config: RankingConfig) -> Self {
        Self {
            store,
            scorer: ReviewScorer::new(),
            ranking: RankingEngine::new(config),
        }
    }

    pub fn ranking_config(&self) -> &RankingConfig {
        self.ranking.config()
    }

    /// Validate, score and persist a new review. Nothing is stored on failure.
    pub fn submit(&self, submission: ReviewSubmission) -> Result<ReviewRecord, ReviewServiceError> {
        let surveys: Snapshot<SurveyDefinition> = self.store.load_all()?;
        let survey = surveys
            .items
            .iter()
            .find(|survey| survey.name == submission.survey.trim());

        let record = self
            .scorer
            .score_submission(survey, &submission, ReviewId::generate())
            .inspect_err(|err| {
                warn!(
                    violations = err.violations.len(),
                    branch = %submission.branch,
                    "review rejected by validation"
                );
            })?;

        let mut reviews: Snapshot<ReviewRecord> = self.store.load_all()?;
        reviews.items.push(record.clone());
        persist(self.store.as_ref(), reviews)?;

        info!(
            review_id = %record.id.0,
            branch = %record.branch,
            survey = %record.survey,
            average = record.summary.average_score,
            "review saved"
        );
        Ok(record)
    }

    /// Re-score an existing review from re-selected answers.
    pub fn update(
        &self,
        review_id: &ReviewId,
        edit: ReviewEdit,
    ) -> Result<ReviewRecord, ReviewServiceError> {
        let mut reviews: Snapshot<ReviewRecord> = self.store.load_all()?;
        let position = reviews
            .items
            .iter()
            .position(|record| &record.id == review_id)
            .ok_or(RepositoryError::NotFound)?;

        let surveys: Snapshot<SurveyDefinition> = self.store.load_all()?;
        let current = &reviews.items[position];
        let survey = surveys
            .items
            .iter()
            .find(|survey| survey.name == current.survey);
        if survey.is_none() {
            debug!(
                review_id = %review_id.0,
                survey = %current.survey,
                "survey no longer exists; re-scoring against stored questions"
            );
        }

        let updated = self.scorer.rescore_edit(current, &edit, survey)?;
        reviews.items[position] = updated.clone();
        persist(self.store.as_ref(), reviews)?;

        info!(review_id = %review_id.0, average = updated.summary.average_score, "review updated");
        Ok(updated)
    }

    pub fn delete(&self, review_id: &ReviewId) -> Result<ReviewRecord, ReviewServiceError> {
        let mut reviews: Snapshot<ReviewRecord> = self.store.load_all()?;
        let position = reviews
            .items
            .iter()
            .position(|record| &record.id == review_id)
            .ok_or(RepositoryError::NotFound)?;
        let removed = reviews.items.remove(position);
        persist(self.store.as_ref(), reviews)?;

        info!(review_id = %review_id.0, branch = %removed.branch, "review deleted");
        Ok(removed)
    }

    pub fn get(&self, review_id: &ReviewId) -> Result<ReviewRecord, ReviewServiceError> {
        let reviews: Snapshot<ReviewRecord> = self.store.load_all()?;
        let record = reviews
            .items
            .into_iter()
            .find(|record| &record.id == review_id)
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn list(&self) -> Result<Vec<ReviewRecord>, ReviewServiceError> {
        self.filter(|_| true)
    }

    pub fn filter<P>(&self, predicate: P) -> Result<Vec<ReviewRecord>, ReviewServiceError>
    where
        P: Fn(&ReviewRecord) -> bool,
    {
        let reviews: Snapshot<ReviewRecord> = self.store.load_all()?;
        Ok(reviews
            .items
            .into_iter()
            .filter(|record| predicate(record))
            .collect())
    }

    /// Review plus the roster and schema context needed to display it.
    pub fn detail(&self, review_id: &ReviewId) -> Result<ReviewDetail, ReviewServiceError> {
        let record = self.get(review_id)?;
        let branches: Snapshot<Branch> = self.store.load_all()?;
        let surveys: Snapshot<SurveyDefinition> = self.store.load_all()?;

        let branch = branches
            .items
            .iter()
            .find(|branch| branch.name == record.branch);
        let survey = surveys
            .items
            .iter()
            .find(|survey| survey.name == record.survey);

        Ok(ReviewDetail {
            average_label: record.average_label(),
            topics: topic_breakdown(&record),
            branch_manager: or_not_specified(branch.map(|b| b.manager.as_str()).unwrap_or(""))
                .to_string(),
            branch_contact: or_not_specified(branch.map(|b| b.contact.as_str()).unwrap_or(""))
                .to_string(),
            survey_description: or_not_specified(
                survey.map(|s| s.description.as_str()).unwrap_or(""),
            )
            .to_string(),
            survey_resolved: survey.is_some(),
            record,
        })
    }

    /// Recompute branch rankings from the full review collection.
    pub fn rankings(&self) -> Result<BranchRanking, ReviewServiceError> {
        let reviews: Snapshot<ReviewRecord> = self.store.load_all()?;
        let branches: Snapshot<Branch> = self.store.load_all()?;
        let ranking = self.ranking.rank(&reviews.items, &branches.items);
        debug!(
            reviews = reviews.items.len(),
            ranked = ranking.table.rows().len(),
            outstanding = ranking.outstanding.len(),
            needs_improvement = ranking.needs_improvement.len(),
            "branch rankings recomputed"
        );
        Ok(ranking)
    }

    pub fn dashboard(&self) -> Result<DashboardView, ReviewServiceError> {
        let reviews: Snapshot<ReviewRecord> = self.store.load_all()?;
        let branches: Snapshot<Branch> = self.store.load_all()?;
        let ranking = self.ranking.rank(&reviews.items, &branches.items);
        Ok(DashboardView::build(
            &ranking,
            self.ranking.config(),
            reviews.items.len(),
        ))
    }
}

/// Write a collection back at the revision it was read at.
pub(crate) fn persist<S, T>(store: &S, snapshot: Snapshot<T>) -> Result<Revision, RepositoryError>
where
    S: DocumentStore,
    T: Document,
{
    store
        .save_all(snapshot.revision, &snapshot.items)
        .inspect_err(|err| {
            error!(collection = T::COLLECTION, error = %err, "failed to persist collection");
        })
}

/// Display payload for a single review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewDetail {
    pub record: ReviewRecord,
    pub average_label: String,
    pub topics: Vec<TopicScore>,
    pub branch_manager: String,
    pub branch_contact: String,
    pub survey_description: String,
    pub survey_resolved: bool,
}

/// Error raised by the review and catalog services.
#[derive(Debug, thiserror::Error)]
pub enum ReviewServiceError {
    #[error(transparent)]
    Validation(#[from] ReviewValidationError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
