use std::time::Duration;

use prodrev_core::config::{AppConfig, LoadOptions, StorageBackend};
use prodrev_db::{connect_with_retry, migrations, DbPool, RetryPolicy};
use serde_json::json;

use crate::commands::{CommandOutcome, CommandResult};

const COMMAND: &str = "migrate";

/// Schema state observed around a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SchemaChange {
    table_before: bool,
    table_after: bool,
}

#[derive(Debug)]
struct MigrateFailure {
    error_class: &'static str,
    message: String,
    exit_code: u8,
}

impl MigrateFailure {
    fn new(error_class: &'static str, message: impl Into<String>, exit_code: u8) -> Self {
        Self { error_class, message: message.into(), exit_code }
    }
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandOutcome::error(
                COMMAND,
                "config_validation",
                format!("configuration issue: {error}"),
            )
            .into_result(2);
        }
    };

    let backend = format!("{:?}", config.storage.backend).to_ascii_lowercase();
    match apply(&config) {
        Ok(change) => {
            let message = match (change.table_before, config.storage.backend) {
                (true, _) => "products table already present, pending migrations applied",
                (false, StorageBackend::Sqlite) => "products table created",
                (false, StorageBackend::Memory) => {
                    "products table created (storage.backend is memory, the server will not use it)"
                }
            };
            CommandOutcome::ok(COMMAND, message)
                .with_details(json!({
                    "storage_backend": backend,
                    "products_table_before": change.table_before,
                    "products_table_after": change.table_after,
                }))
                .into_result(0)
        }
        Err(failure) => CommandOutcome::error(COMMAND, failure.error_class, failure.message)
            .with_details(json!({ "storage_backend": backend }))
            .into_result(failure.exit_code),
    }
}

fn apply(config: &AppConfig) -> Result<SchemaChange, MigrateFailure> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(
        |error| {
            MigrateFailure::new(
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            )
        },
    )?;

    runtime.block_on(async {
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
        .map_err(|error| MigrateFailure::new("db_connectivity", error.to_string(), 4))?;

        let outcome = migrate_pool(&pool).await;
        pool.close().await;
        outcome
    })
}

async fn migrate_pool(pool: &DbPool) -> Result<SchemaChange, MigrateFailure> {
    let table_before = migrations::products_table_exists(pool).await.map_err(schema_lookup)?;
    migrations::run_pending(pool)
        .await
        .map_err(|error| MigrateFailure::new("migration", error.to_string(), 5))?;
    let table_after = migrations::products_table_exists(pool).await.map_err(schema_lookup)?;

    if !table_after {
        return Err(MigrateFailure::new(
            "migration",
            "migrations ran but the products table is still missing",
            5,
        ));
    }

    Ok(SchemaChange { table_before, table_after })
}

fn schema_lookup(error: impl std::fmt::Display) -> MigrateFailure {
    MigrateFailure::new("schema_lookup", format!("schema lookup failed: {error}"), 5)
}
