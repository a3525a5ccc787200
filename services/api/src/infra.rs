use branch_review::config::StorageConfig;
use branch_review::workflows::reviews::{
    CatalogService, DocumentStore, JsonFileStore, MemoryDocumentStore, RankingCarousels,
    RankingConfig, RepositoryError, ReviewService, Revision,
};
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) reviews: Arc<ReviewService<AppStore>>,
    pub(crate) carousels: Arc<Mutex<RankingCarousels>>,
}

/// Backing store picked at startup from `APP_DATA_PATH`.
#[derive(Debug)]
pub(crate) enum AppStore {
    Memory(MemoryDocumentStore),
    File(JsonFileStore),
}

impl DocumentStore for AppStore {
    fn load_raw(
        &self,
        collection: &str,
    ) -> Result<(Revision, Option<serde_json::Value>), RepositoryError> {
        match self {
            AppStore::Memory(store) => store.load_raw(collection),
            AppStore::File(store) => store.load_raw(collection),
        }
    }

    fn save_raw(
        &self,
        collection: &str,
        expected: Revision,
        items: serde_json::Value,
    ) -> Result<Revision, RepositoryError> {
        match self {
            AppStore::Memory(store) => store.save_raw(collection, expected, items),
            AppStore::File(store) => store.save_raw(collection, expected, items),
        }
    }
}

pub(crate) fn open_store(data_path: Option<&Path>) -> AppStore {
    match data_path {
        Some(path) => {
            info!(path = %path.display(), "using json document store");
            AppStore::File(JsonFileStore::open(path))
        }
        None => {
            info!("APP_DATA_PATH not set; reviews are kept in memory");
            AppStore::Memory(MemoryDocumentStore::default())
        }
    }
}

pub(crate) fn configured_store(storage: &StorageConfig) -> AppStore {
    open_store(storage.data_path.as_deref())
}

pub(crate) struct Services {
    pub(crate) reviews: Arc<ReviewService<AppStore>>,
    pub(crate) catalog: Arc<CatalogService<AppStore>>,
}

pub(crate) fn build_services(store: AppStore, ranking: RankingConfig) -> Services {
    let store = Arc::new(store);
    Services {
        reviews: Arc::new(ReviewService::new(store.clone(), ranking)),
        catalog: Arc::new(CatalogService::new(store)),
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_threshold(raw: &str) -> Result<f64, String> {
    RankingConfig::parse_threshold(raw)
        .ok_or_else(|| format!("'{raw}' is not a threshold between 1 and 5"))
}
