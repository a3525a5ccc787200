use std::sync::Arc;

use axum::response::Response;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::reviews::catalog::CatalogService;
use crate::workflows::reviews::domain::{
    Answer, AnswerInput, AnswerRecord, Branch, BranchId, ItemType, QuestionSpec, ReviewId,
    ReviewRecord, ReviewSubmission, ScoreSummary, SurveyDefinition, SurveyId,
};
use crate::workflows::reviews::ranking::RankingConfig;
use crate::workflows::reviews::repository::{DocumentStore, RepositoryError, Revision};
use crate::workflows::reviews::router::{review_router, ReviewApi};
use crate::workflows::reviews::service::ReviewService;
use crate::workflows::reviews::store::MemoryDocumentStore;

pub(super) const SERVICE_QUALITY: &str = "Service Quality";

pub(super) fn question(item_name: &str, item_type: ItemType, topic: &str) -> QuestionSpec {
    QuestionSpec {
        item_name: item_name.to_string(),
        item_type,
        question_text: format!("{item_name}?"),
        topic: topic.to_string(),
        subtopic: None,
        created_at: Utc
            .with_ymd_and_hms(2024, 1, 15, 9, 0, 0)
            .single()
            .expect("valid timestamp"),
    }
}

/// Heading, two ratings, one status and one free-text item.
pub(super) fn inspection_survey() -> SurveyDefinition {
    SurveyDefinition {
        id: SurveyId("srv-inspection".to_string()),
        name: "Branch Inspection".to_string(),
        description: "Quarterly walk-through".to_string(),
        questions: vec![
            question("front", ItemType::GroupTitle, "Front of house"),
            question("greeting", ItemType::Rating, "Front of house"),
            question("cleanliness", ItemType::Status, "Hygiene"),
            question("queue", ItemType::Rating, "Front of house"),
            question("notes", ItemType::FreeText, "Hygiene"),
        ],
    }
}

/// Three rating questions only.
pub(super) fn service_quality_survey() -> SurveyDefinition {
    SurveyDefinition {
        id: SurveyId("srv-service".to_string()),
        name: SERVICE_QUALITY.to_string(),
        description: String::new(),
        questions: vec![
            question("courtesy", ItemType::Rating, "Service"),
            question("speed", ItemType::Rating, "Service"),
            question("accuracy", ItemType::Rating, "Service"),
        ],
    }
}

pub(super) fn rating(question_index: usize, value: u8) -> AnswerInput {
    AnswerInput {
        question_index,
        rating: Some(value),
        ..AnswerInput::default()
    }
}

pub(super) fn status(question_index: usize, value: &str) -> AnswerInput {
    AnswerInput {
        question_index,
        status: Some(value.to_string()),
        ..AnswerInput::default()
    }
}

pub(super) fn free_text(question_index: usize, text: &str, value: Option<u8>) -> AnswerInput {
    AnswerInput {
        question_index,
        text: Some(text.to_string()),
        rating: value,
        status: None,
    }
}

pub(super) fn inspection_submission() -> ReviewSubmission {
    ReviewSubmission {
        branch: "Haifa Center".to_string(),
        survey: "Branch Inspection".to_string(),
        reviewer: "Noa Cohen".to_string(),
        date: "2024-03-04".to_string(),
        manager_summary: "Solid visit".to_string(),
        key_strengths: "Friendly staff".to_string(),
        areas_for_improvement: "Queue at lunch".to_string(),
        answers: vec![
            rating(1, 4),
            status(2, "partial"),
            rating(3, 2),
            free_text(4, "Floors clean, bins full", Some(5)),
        ],
    }
}

pub(super) fn service_quality_submission(branch: &str, scores: [u8; 3]) -> ReviewSubmission {
    ReviewSubmission {
        branch: branch.to_string(),
        survey: SERVICE_QUALITY.to_string(),
        reviewer: "Avi Mizrahi".to_string(),
        date: "2024-05-20".to_string(),
        answers: scores
            .iter()
            .enumerate()
            .map(|(index, score)| rating(index, *score))
            .collect(),
        ..ReviewSubmission::default()
    }
}

/// Stored review whose summary carries the given average.
pub(super) fn review(id: &str, branch: &str, average: f64) -> ReviewRecord {
    ReviewRecord {
        id: ReviewId(id.to_string()),
        branch: branch.to_string(),
        survey: SERVICE_QUALITY.to_string(),
        reviewer: "Avi Mizrahi".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 5, 20).expect("valid date"),
        manager_summary: String::new(),
        key_strengths: String::new(),
        areas_for_improvement: String::new(),
        questions: Vec::new(),
        summary: ScoreSummary {
            total_score: 0,
            average_score: average,
            answered_questions: usize::from(average > 0.0),
            total_questions: 1,
        },
    }
}

pub(super) fn rated_answer(question_index: usize, score: u8) -> AnswerRecord {
    AnswerRecord {
        question_index,
        item_name: format!("q{}", question_index + 1),
        item_type: ItemType::Rating,
        question_text: "How was it?".to_string(),
        topic: "Service".to_string(),
        answer: Answer::Rating { score },
    }
}

pub(super) fn roster_branch(name: &str, manager: &str) -> Branch {
    Branch {
        id: BranchId(format!("br-{}", name.to_ascii_lowercase().replace(' ', "-"))),
        name: name.to_string(),
        manager: manager.to_string(),
        contact: String::new(),
        address: String::new(),
    }
}

pub(super) struct Harness {
    pub(super) store: Arc<MemoryDocumentStore>,
    pub(super) reviews: Arc<ReviewService<MemoryDocumentStore>>,
    pub(super) catalog: Arc<CatalogService<MemoryDocumentStore>>,
}

impl Harness {
    pub(super) fn api(&self) -> ReviewApi<MemoryDocumentStore> {
        ReviewApi::new(self.reviews.clone(), self.catalog.clone())
    }

    pub(super) fn router(&self) -> axum::Router {
        review_router(self.api())
    }
}

/// Services over a memory store seeded with both fixture surveys.
pub(super) fn harness() -> Harness {
    let store = Arc::new(MemoryDocumentStore::default());
    store
        .save_all(
            Revision::default(),
            &[inspection_survey(), service_quality_survey()],
        )
        .expect("seed surveys");

    Harness {
        reviews: Arc::new(ReviewService::new(store.clone(), RankingConfig::default())),
        catalog: Arc::new(CatalogService::new(store.clone())),
        store,
    }
}

pub(super) struct UnavailableStore;

impl DocumentStore for UnavailableStore {
    fn load_raw(&self, _collection: &str) -> Result<(Revision, Option<Value>), RepositoryError> {
        Err(RepositoryError::Unavailable("disk offline".to_string()))
    }

    fn save_raw(
        &self,
        _collection: &str,
        _expected: Revision,
        _items: Value,
    ) -> Result<Revision, RepositoryError> {
        Err(RepositoryError::Unavailable("disk offline".to_string()))
    }
}

/// Reads fine but every write loses the revision race.
pub(super) struct StaleStore {
    pub(super) inner: MemoryDocumentStore,
}

impl DocumentStore for StaleStore {
    fn load_raw(&self, collection: &str) -> Result<(Revision, Option<Value>), RepositoryError> {
        self.inner.load_raw(collection)
    }

    fn save_raw(
        &self,
        collection: &str,
        expected: Revision,
        _items: Value,
    ) -> Result<Revision, RepositoryError> {
        Err(RepositoryError::Conflict {
            collection: collection.to_string(),
            expected,
            found: expected.next(),
        })
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
