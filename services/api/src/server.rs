use crate::cli::ServeArgs;
use crate::infra::{build_services, configured_store, AppState};
use crate::routes::{with_carousels, with_review_routes, FeaturedError};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use branch_review::config::AppConfig;
use branch_review::error::AppError;
use branch_review::telemetry;
use branch_review::workflows::reviews::{RankingCarousels, ReviewApi};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let services = build_services(configured_store(&config.storage), config.ranking.clone());
    let interval = config.ranking.rotation_interval();

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        reviews: services.reviews.clone(),
        carousels: Arc::new(Mutex::new(RankingCarousels::new(interval))),
    };

    tokio::spawn(rotate_featured(app_state.clone(), interval));

    let app = with_review_routes(ReviewApi::new(services.reviews, services.catalog))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        threshold = config.ranking.outstanding_threshold,
        "branch review service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Timer resolution of the rotation task. The carousels accumulate these ticks
/// and advance only after a full interval without a manual step.
const ROTATION_TICK: Duration = Duration::from_secs(1);

pub(crate) fn rotation_tick(interval: Duration) -> Duration {
    interval.min(ROTATION_TICK)
}

/// Feed one timer tick into the carousels. A reset lane starts over at its
/// first branch instead of advancing.
pub(crate) fn advance_featured(state: &AppState, elapsed: Duration) -> Result<(), FeaturedError> {
    with_carousels(state, |carousels, reset| {
        if !reset {
            carousels.tick(elapsed);
        }
    })
}

async fn rotate_featured(state: AppState, interval: Duration) {
    let tick = rotation_tick(interval);
    let mut ticker = tokio::time::interval(tick);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match advance_featured(&state, tick) {
            Ok(()) => {}
            Err(FeaturedError::Ranking(err)) => {
                warn!(error = %err, "featured rotation skipped");
            }
            Err(FeaturedError::CarouselUnavailable) => {
                warn!("featured carousel lock poisoned; stopping rotation");
                return;
            }
        }
    }
}
