use std::sync::Arc;

use tracing::info;

use crate::{
    config::{AppConfig, StorageBackend},
    db,
    error::AppError,
    services::{
        kv::{FileKvStore, KeyValueStore, SqliteKvStore},
        trips::TripStore,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub trips: TripStore,
}

impl AppState {
    pub fn new(config: AppConfig, kv: Arc<dyn KeyValueStore>) -> Self {
        let trips = TripStore::new(kv, config.utc_offset);
        Self { config, trips }
    }

    /// Opens the configured storage backend and builds the state on top.
    pub async fn open(config: AppConfig) -> Result<Self, AppError> {
        let kv: Arc<dyn KeyValueStore> = match config.storage {
            StorageBackend::Sqlite => {
                let pool = db::init_pool(&config.database_url).await?;
                db::migrate(&pool).await?;
                info!("storing trips in {}", config.database_url);
                Arc::new(SqliteKvStore::new(pool))
            }
            StorageBackend::File => {
                let store = FileKvStore::new(config.data_root.clone());
                store.ensure_structure().await?;
                info!("storing trips under {}", config.data_root.display());
                Arc::new(store)
            }
        };
        Ok(Self::new(config, kv))
    }
}
