use crate::infra::{AppState, AppStore};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use branch_review::error::AppError;
use branch_review::workflows::reviews::{
    review_router, Direction, Lane, RankingCarousels, ReviewApi, ReviewServiceError,
};
use serde_json::json;
use tracing::debug;

pub(crate) fn with_review_routes(api: ReviewApi<AppStore>) -> axum::Router {
    review_router(api)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/rankings/featured",
            axum::routing::get(featured_endpoint),
        )
        .route(
            "/api/v1/rankings/featured/:lane/:direction",
            axum::routing::post(step_featured_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Failure while serving the featured carousels.
#[derive(Debug)]
pub(crate) enum FeaturedError {
    Ranking(AppError),
    CarouselUnavailable,
}

impl From<ReviewServiceError> for FeaturedError {
    fn from(err: ReviewServiceError) -> Self {
        FeaturedError::Ranking(err.into())
    }
}

impl IntoResponse for FeaturedError {
    fn into_response(self) -> Response {
        match self {
            FeaturedError::Ranking(err) => err.into_response(),
            FeaturedError::CarouselUnavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "featured carousel unavailable" })),
            )
                .into_response(),
        }
    }
}

/// Bring the carousels in line with the current rankings, then apply `apply`.
///
/// `apply` learns whether the refresh reset the lanes.
pub(crate) fn with_carousels<T>(
    state: &AppState,
    apply: impl FnOnce(&mut RankingCarousels, bool) -> T,
) -> Result<T, FeaturedError> {
    let ranking = state.reviews.rankings()?;
    let mut carousels = state
        .carousels
        .lock()
        .map_err(|_| FeaturedError::CarouselUnavailable)?;
    let reset = carousels.refresh(&ranking);
    if reset {
        debug!("featured carousels reset after ranking change");
    }
    Ok(apply(&mut carousels, reset))
}

pub(crate) async fn featured_endpoint(Extension(state): Extension<AppState>) -> Response {
    match with_carousels(&state, |carousels, _| carousels.featured()) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn step_featured_endpoint(
    Extension(state): Extension<AppState>,
    Path((lane, direction)): Path<(Lane, Direction)>,
) -> Response {
    let stepped = with_carousels(&state, |carousels, _| {
        carousels.step(lane, direction);
        carousels.featured()
    });
    match stepped {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{build_services, open_store};
    use axum::body::Body;
    use axum::http::Request;
    use branch_review::workflows::reviews::{
        AnswerInput, RankingCarousels, RankingConfig, ReviewSubmission, SurveyDraft,
    };
    use branch_review::workflows::reviews::{ItemType, QuestionDraft};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    fn app(ready: bool) -> (axum::Router, AppState) {
        let services = build_services(open_store(None), RankingConfig::default());
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            reviews: services.reviews.clone(),
            carousels: Arc::new(Mutex::new(RankingCarousels::new(
                RankingConfig::default().rotation_interval(),
            ))),
        };

        let catalog = services.catalog.clone();
        let survey = catalog
            .create_survey(SurveyDraft {
                name: "Service Quality".to_string(),
                description: String::new(),
            })
            .expect("survey created");
        catalog
            .add_question(
                &survey.id,
                QuestionDraft {
                    item_name: String::new(),
                    item_type: ItemType::Rating,
                    question_text: "Courtesy".to_string(),
                    topic: String::new(),
                    subtopic: None,
                },
            )
            .expect("question added");

        let router = with_review_routes(ReviewApi::new(services.reviews, services.catalog))
            .layer(Extension(state.clone()));
        (router, state)
    }

    fn review(branch: &str, score: u8) -> ReviewSubmission {
        ReviewSubmission {
            branch: branch.to_string(),
            survey: "Service Quality".to_string(),
            reviewer: "Noa Cohen".to_string(),
            date: "2024-02-01".to_string(),
            answers: vec![AnswerInput {
                question_index: 0,
                rating: Some(score),
                ..AnswerInput::default()
            }],
            ..ReviewSubmission::default()
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json payload")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request builds")
    }

    fn post(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .expect("request builds")
    }

    #[tokio::test]
    async fn readiness_reflects_startup_flag() {
        let (router, _) = app(false);
        let response = router.oneshot(get("/ready")).await.expect("responds");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let (router, _) = app(true);
        let response = router.oneshot(get("/ready")).await.expect("responds");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn featured_lanes_are_empty_without_reviews() {
        let (router, _) = app(true);
        let response = router
            .oneshot(get("/api/v1/rankings/featured"))
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["outstanding"].is_null());
        assert!(body["needs_improvement"].is_null());
    }

    #[tokio::test]
    async fn stepping_a_lane_wraps_around() {
        let (router, state) = app(true);
        for (branch, score) in [("Haifa Center", 5), ("Acre", 4), ("Eilat Port", 2)] {
            state.reviews.submit(review(branch, score)).expect("saved");
        }

        let response = router
            .clone()
            .oneshot(post("/api/v1/rankings/featured/outstanding/prev"))
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["outstanding"]["name"], "Acre");
        assert_eq!(body["outstanding"]["position"], 2);
        assert_eq!(body["needs_improvement"]["name"], "Eilat Port");

        let response = router
            .oneshot(post("/api/v1/rankings/featured/outstanding/next"))
            .await
            .expect("responds");
        let body = body_json(response).await;
        assert_eq!(body["outstanding"]["name"], "Haifa Center");
    }

    #[tokio::test]
    async fn poisoned_carousel_lock_reports_carousel_unavailable() {
        let (router, state) = app(true);
        let carousels = state.carousels.clone();
        let _ = std::thread::spawn(move || {
            let _guard = carousels.lock().expect("carousel lock");
            panic!("rotation panicked while holding the lock");
        })
        .join();

        let response = router
            .oneshot(get("/api/v1/rankings/featured"))
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "featured carousel unavailable");
    }

    #[tokio::test]
    async fn unknown_lane_is_rejected() {
        let (router, _) = app(true);
        let response = router
            .oneshot(post("/api/v1/rankings/featured/sideways/next"))
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
