use crate::config::AppConfig;
use crate::db;
use crate::storage::{LocalStorage, StorageClient};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.database_url).await?;
        let storage = Arc::new(LocalStorage::new(&config.upload_dir)) as Arc<dyn StorageClient>;

        Ok(Self::from_parts(db, config, storage))
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>, storage: Arc<dyn StorageClient>) -> Self {
        Self {
            db,
            config,
            storage,
        }
    }

    /// Migrated in-memory database, admin `admin` / `changeme`, uploads under
    /// `upload_dir`.
    #[cfg(test)]
    pub async fn for_tests(upload_dir: &std::path::Path) -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::for_tests(upload_dir.to_path_buf()));
        let db = db::memory().await?;
        crate::auth::repo_types::User::ensure_admin(&db, &config.admin).await?;
        let storage = Arc::new(LocalStorage::new(upload_dir)) as Arc<dyn StorageClient>;
        Ok(Self::from_parts(db, config, storage))
    }
}
