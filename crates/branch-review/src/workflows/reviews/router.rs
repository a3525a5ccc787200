use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::catalog::CatalogService;
use super::domain::{
    BranchDraft, QuestionDraft, ReviewEdit, ReviewId, ReviewSubmission, SurveyDraft, SurveyId,
};
use super::handoff::ReviewMailbox;
use super::repository::{DocumentStore, RepositoryError};
use super::service::{ReviewService, ReviewServiceError};
use super::surveys::CatalogError;

/// Shared state behind the review endpoints.
pub struct ReviewApi<S> {
    pub reviews: Arc<ReviewService<S>>,
    pub catalog: Arc<CatalogService<S>>,
    pub mailbox: Arc<Mutex<ReviewMailbox>>,
}

impl<S> ReviewApi<S>
where
    S: DocumentStore + 'static,
{
    pub fn new(reviews: Arc<ReviewService<S>>, catalog: Arc<CatalogService<S>>) -> Self {
        Self {
            reviews,
            catalog,
            mailbox: Arc::new(Mutex::new(ReviewMailbox::default())),
        }
    }
}

impl<S> Clone for ReviewApi<S> {
    fn clone(&self) -> Self {
        Self {
            reviews: Arc::clone(&self.reviews),
            catalog: Arc::clone(&self.catalog),
            mailbox: Arc::clone(&self.mailbox),
        }
    }
}

/// Router builder exposing review, ranking and catalog endpoints.
pub fn review_router<S>(api: ReviewApi<S>) -> Router
where
    S: DocumentStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/reviews",
            post(submit_handler::<S>).get(list_handler::<S>),
        )
        .route(
            "/api/v1/reviews/:review_id",
            get(detail_handler::<S>)
                .put(update_handler::<S>)
                .delete(delete_handler::<S>),
        )
        .route(
            "/api/v1/reviews/:review_id/select",
            post(select_handler::<S>),
        )
        .route("/api/v1/current-review", get(current_review_handler::<S>))
        .route("/api/v1/rankings", get(dashboard_handler::<S>))
        .route(
            "/api/v1/surveys",
            get(list_surveys_handler::<S>).post(create_survey_handler::<S>),
        )
        .route("/api/v1/surveys/:survey_id", get(survey_handler::<S>))
        .route(
            "/api/v1/surveys/:survey_id/questions",
            post(add_question_handler::<S>),
        )
        .route("/api/v1/survey-editor", get(editor_target_handler::<S>))
        .route(
            "/api/v1/branches",
            get(list_branches_handler::<S>).post(create_branch_handler::<S>),
        )
        .route(
            "/api/v1/topics",
            get(list_topics_handler::<S>).post(add_topic_handler::<S>),
        )
        .with_state(api)
}

/// Maps service failures onto HTTP responses.
pub(crate) fn error_response(error: ReviewServiceError) -> Response {
    match error {
        ReviewServiceError::Validation(error) => {
            let payload = json!({
                "error": error.to_string(),
                "violations": error.violations,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        ReviewServiceError::Catalog(error) => {
            let status = match error {
                CatalogError::SurveyNotFound
                | CatalogError::BranchNotFound
                | CatalogError::TopicNotFound(_)
                | CatalogError::QuestionOutOfRange { .. } => StatusCode::NOT_FOUND,
                CatalogError::DuplicateName(_) => StatusCode::CONFLICT,
                CatalogError::EmptyName | CatalogError::EmptyQuestion => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
            };
            (status, Json(json!({ "error": error.to_string() }))).into_response()
        }
        ReviewServiceError::Repository(RepositoryError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "review not found" })),
        )
            .into_response(),
        ReviewServiceError::Repository(RepositoryError::Conflict { .. }) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "data changed in another session; reload and try again",
            })),
        )
            .into_response(),
        ReviewServiceError::Repository(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "failed to access review storage" })),
        )
            .into_response(),
    }
}

fn respond<T: serde::Serialize>(
    status: StatusCode,
    result: Result<T, ReviewServiceError>,
) -> Response {
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<S>(
    State(api): State<ReviewApi<S>>,
    Json(submission): Json<ReviewSubmission>,
) -> Response
where
    S: DocumentStore + 'static,
{
    respond(StatusCode::CREATED, api.reviews.submit(submission))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReviewListQuery {
    #[serde(default)]
    branch: Option<String>,
    #[serde(default)]
    survey: Option<String>,
}

pub(crate) async fn list_handler<S>(
    State(api): State<ReviewApi<S>>,
    Query(query): Query<ReviewListQuery>,
) -> Response
where
    S: DocumentStore + 'static,
{
    let result = api.reviews.filter(|record| {
        query
            .branch
            .as_deref()
            .map_or(true, |branch| record.branch == branch)
            && query
                .survey
                .as_deref()
                .map_or(true, |survey| record.survey == survey)
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn detail_handler<S>(
    State(api): State<ReviewApi<S>>,
    Path(review_id): Path<String>,
) -> Response
where
    S: DocumentStore + 'static,
{
    respond(StatusCode::OK, api.reviews.detail(&ReviewId(review_id)))
}

pub(crate) async fn update_handler<S>(
    State(api): State<ReviewApi<S>>,
    Path(review_id): Path<String>,
    Json(edit): Json<ReviewEdit>,
) -> Response
where
    S: DocumentStore + 'static,
{
    respond(StatusCode::OK, api.reviews.update(&ReviewId(review_id), edit))
}

pub(crate) async fn delete_handler<S>(
    State(api): State<ReviewApi<S>>,
    Path(review_id): Path<String>,
) -> Response
where
    S: DocumentStore + 'static,
{
    let id = ReviewId(review_id);
    let result = api.reviews.delete(&id);
    if result.is_ok() {
        if let Ok(mut mailbox) = api.mailbox.lock() {
            if mailbox.peek().is_some_and(|current| current.review_id == id) {
                mailbox.take();
            }
        }
    }
    respond(StatusCode::OK, result)
}

pub(crate) async fn select_handler<S>(
    State(api): State<ReviewApi<S>>,
    Path(review_id): Path<String>,
) -> Response
where
    S: DocumentStore + 'static,
{
    let record = match api.reviews.get(&ReviewId(review_id)) {
        Ok(record) => record,
        Err(error) => return error_response(error),
    };

    match api.mailbox.lock() {
        Ok(mut mailbox) => {
            mailbox.select(record);
            let payload = mailbox.peek().cloned();
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "review selection unavailable" })),
        )
            .into_response(),
    }
}

pub(crate) async fn current_review_handler<S>(State(api): State<ReviewApi<S>>) -> Response
where
    S: DocumentStore + 'static,
{
    let current = api
        .mailbox
        .lock()
        .ok()
        .and_then(|mailbox| mailbox.peek().cloned());
    match current {
        Some(current) => (StatusCode::OK, Json(current)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "no review selected" })),
        )
            .into_response(),
    }
}

pub(crate) async fn dashboard_handler<S>(State(api): State<ReviewApi<S>>) -> Response
where
    S: DocumentStore + 'static,
{
    respond(StatusCode::OK, api.reviews.dashboard())
}

pub(crate) async fn list_surveys_handler<S>(State(api): State<ReviewApi<S>>) -> Response
where
    S: DocumentStore + 'static,
{
    respond(StatusCode::OK, api.catalog.list_surveys())
}

pub(crate) async fn create_survey_handler<S>(
    State(api): State<ReviewApi<S>>,
    Json(draft): Json<SurveyDraft>,
) -> Response
where
    S: DocumentStore + 'static,
{
    respond(StatusCode::CREATED, api.catalog.create_survey(draft))
}

pub(crate) async fn survey_handler<S>(
    State(api): State<ReviewApi<S>>,
    Path(survey_id): Path<String>,
) -> Response
where
    S: DocumentStore + 'static,
{
    respond(StatusCode::OK, api.catalog.get_survey(&SurveyId(survey_id)))
}

pub(crate) async fn add_question_handler<S>(
    State(api): State<ReviewApi<S>>,
    Path(survey_id): Path<String>,
    Json(draft): Json<QuestionDraft>,
) -> Response
where
    S: DocumentStore + 'static,
{
    respond(
        StatusCode::CREATED,
        api.catalog.add_question(&SurveyId(survey_id), draft),
    )
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EditorQuery {
    #[serde(default)]
    survey: Option<String>,
    #[serde(default)]
    index: Option<usize>,
}

pub(crate) async fn editor_target_handler<S>(
    State(api): State<ReviewApi<S>>,
    Query(query): Query<EditorQuery>,
) -> Response
where
    S: DocumentStore + 'static,
{
    match api
        .catalog
        .editor_target(query.survey.as_deref(), query.index)
    {
        Ok(Some(survey)) => (StatusCode::OK, Json(survey)).into_response(),
        Ok(None) => error_response(CatalogError::SurveyNotFound.into()),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_branches_handler<S>(State(api): State<ReviewApi<S>>) -> Response
where
    S: DocumentStore + 'static,
{
    respond(StatusCode::OK, api.catalog.list_branches())
}

pub(crate) async fn create_branch_handler<S>(
    State(api): State<ReviewApi<S>>,
    Json(draft): Json<BranchDraft>,
) -> Response
where
    S: DocumentStore + 'static,
{
    respond(StatusCode::CREATED, api.catalog.create_branch(draft))
}

pub(crate) async fn list_topics_handler<S>(State(api): State<ReviewApi<S>>) -> Response
where
    S: DocumentStore + 'static,
{
    respond(StatusCode::OK, api.catalog.list_topics())
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopicPayload {
    name: String,
}

pub(crate) async fn add_topic_handler<S>(
    State(api): State<ReviewApi<S>>,
    Json(payload): Json<TopicPayload>,
) -> Response
where
    S: DocumentStore + 'static,
{
    let result = api
        .catalog
        .add_topic(&payload.name)
        .and_then(|_| api.catalog.list_topics());
    respond(StatusCode::CREATED, result)
}
