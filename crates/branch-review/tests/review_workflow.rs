//! End-to-end review scenarios against the file-backed store: surveys are
//! authored through the catalog, reviews are scored and persisted, and a fresh
//! service over the same file sees the same rankings.

mod common {
    use std::path::PathBuf;
    use std::sync::Arc;

    use branch_review::workflows::reviews::{
        AnswerInput, CatalogService, ItemType, JsonFileStore, QuestionDraft, RankingConfig,
        ReviewService, ReviewSubmission, SurveyDraft,
    };

    pub(super) fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("branch-review-it-{}", uuid::Uuid::new_v4()))
            .join("reviews.json")
    }

    pub(super) fn services(
        path: &PathBuf,
    ) -> (
        ReviewService<JsonFileStore>,
        CatalogService<JsonFileStore>,
    ) {
        let store = Arc::new(JsonFileStore::open(path.clone()));
        (
            ReviewService::new(store.clone(), RankingConfig::default()),
            CatalogService::new(store),
        )
    }

    pub(super) fn author_survey(catalog: &CatalogService<JsonFileStore>) {
        let survey = catalog
            .create_survey(SurveyDraft {
                name: "Service Quality".to_string(),
                description: "Counter service".to_string(),
            })
            .expect("survey created");

        for (text, item_type) in [
            ("Counter", ItemType::GroupTitle),
            ("Courtesy", ItemType::Rating),
            ("Wait time", ItemType::Rating),
            ("Register area", ItemType::Status),
        ] {
            catalog
                .add_question(
                    &survey.id,
                    QuestionDraft {
                        item_name: String::new(),
                        item_type,
                        question_text: text.to_string(),
                        topic: "Service".to_string(),
                        subtopic: None,
                    },
                )
                .expect("question added");
        }
    }

    pub(super) fn submission(branch: &str, courtesy: u8, wait: u8, status: &str) -> ReviewSubmission {
        ReviewSubmission {
            branch: branch.to_string(),
            survey: "Service Quality".to_string(),
            reviewer: "Noa Cohen".to_string(),
            date: "2024-04-10".to_string(),
            answers: vec![
                AnswerInput {
                    question_index: 1,
                    rating: Some(courtesy),
                    ..AnswerInput::default()
                },
                AnswerInput {
                    question_index: 2,
                    rating: Some(wait),
                    ..AnswerInput::default()
                },
                AnswerInput {
                    question_index: 3,
                    status: Some(status.to_string()),
                    ..AnswerInput::default()
                },
            ],
            ..ReviewSubmission::default()
        }
    }
}

use branch_review::workflows::reviews::{
    DocumentStore, RepositoryError, ReviewRecord, Snapshot,
};
use common::*;

#[test]
fn rankings_survive_reopening_the_store() {
    let path = temp_path();
    let (reviews, catalog) = services(&path);
    author_survey(&catalog);

    let strong = reviews
        .submit(submission("Haifa Center", 5, 4, "ok"))
        .expect("review saved");
    assert_eq!(strong.summary.total_questions, 3);
    assert!((strong.summary.average_score - 14.0 / 3.0).abs() < 1e-9);

    reviews
        .submit(submission("Eilat Port", 2, 1, "not-ok"))
        .expect("review saved");
    reviews
        .submit(submission("Haifa Center", 3, 3, "partial"))
        .expect("review saved");

    let (reopened, _) = services(&path);
    let ranking = reopened.rankings().expect("rankings");
    let names: Vec<&str> = ranking
        .table
        .rows()
        .iter()
        .map(|row| row.branch.name.as_str())
        .collect();

    assert_eq!(names, vec!["Haifa Center", "Eilat Port"]);
    assert_eq!(ranking.outstanding.len(), 1);
    assert_eq!(ranking.needs_improvement[0].name, "Eilat Port");
    assert_eq!(reopened.list().expect("list").len(), 3);

    let _ = std::fs::remove_dir_all(path.parent().expect("temp dir"));
}

#[test]
fn concurrent_writers_cannot_overwrite_each_other() {
    let path = temp_path();
    let (reviews, catalog) = services(&path);
    author_survey(&catalog);
    reviews
        .submit(submission("Acre", 4, 4, "ok"))
        .expect("review saved");

    let store = branch_review::workflows::reviews::JsonFileStore::open(path.clone());
    let stale: Snapshot<ReviewRecord> = store.load_all().expect("load");

    reviews
        .submit(submission("Acre", 1, 1, "not-ok"))
        .expect("second session saves first");

    let error = store
        .save_all(stale.revision, &stale.items)
        .expect_err("stale snapshot is rejected");
    assert!(matches!(error, RepositoryError::Conflict { .. }));
    assert_eq!(reviews.list().expect("list").len(), 2);

    let _ = std::fs::remove_dir_all(path.parent().expect("temp dir"));
}
