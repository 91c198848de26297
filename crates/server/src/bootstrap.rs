use std::sync::Arc;
use std::time::Duration;

use prodrev_core::config::{AppConfig, StorageBackend};
use prodrev_db::{
    connect_with_retry, migrations, DbPool, InMemoryProductRepository, ProductRepository,
    RetryPolicy, SqlProductRepository,
};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub repository: Arc<dyn ProductRepository>,
    /// Present only for the sqlite backend; closed on shutdown.
    pub db_pool: Option<DbPool>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        backend = ?config.storage.backend,
        "starting application bootstrap"
    );

    let db_pool = match config.storage.backend {
        StorageBackend::Memory => None,
        StorageBackend::Sqlite => Some(connect_database(&config).await?),
    };
    let repository: Arc<dyn ProductRepository> = match &db_pool {
        Some(pool) => Arc::new(SqlProductRepository::new(pool.clone())),
        None => Arc::new(InMemoryProductRepository::default()),
    };

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        backend = repository.backend_name(),
        "product repository initialized"
    );

    Ok(Application { config, repository, db_pool })
}

async fn connect_database(config: &AppConfig) -> Result<DbPool, BootstrapError> {
    let retry = RetryPolicy {
        attempts: config.database.connect_attempts,
        delay: Duration::from_secs(config.database.retry_delay_secs),
    };
    let pool = connect_with_retry(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
        retry,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;

    migrations::run_pending(&pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use prodrev_core::config::{AppConfig, StorageBackend};
    use prodrev_core::Product;
    use prodrev_db::migrations;

    use super::{bootstrap_with_config, BootstrapError};

    #[tokio::test]
    async fn memory_backend_needs_no_database() {
        let app = bootstrap_with_config(AppConfig::default()).await.expect("bootstrap");

        assert!(app.db_pool.is_none());
        assert_eq!(app.repository.backend_name(), "memory");
        assert_eq!(app.repository.count().await.expect("count"), 0);
    }

    #[tokio::test]
    async fn sqlite_backend_connects_and_migrates() {
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Sqlite;
        config.database.url = "sqlite::memory:".to_string();
        config.database.max_connections = 1;

        let app = bootstrap_with_config(config).await.expect("bootstrap");

        assert_eq!(app.repository.backend_name(), "sqlite");
        let products = app.repository.create(Product::new("N1", "R1")).await.expect("create");
        assert_eq!(products.len(), 1);

        let pool = app.db_pool.expect("sqlite pool");
        assert!(migrations::products_table_exists(&pool).await.expect("table lookup"));

        pool.close().await;
    }

    #[tokio::test]
    async fn unreachable_database_fails_after_retries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Sqlite;
        config.database.url = format!("sqlite://{}/missing/prodrev.db", dir.path().display());
        config.database.connect_attempts = 2;
        config.database.retry_delay_secs = 0;

        let result = bootstrap_with_config(config).await;

        assert!(matches!(result, Err(BootstrapError::DatabaseConnect(_))));
    }
}
