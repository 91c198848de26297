use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;
use tracing::{info, warn};

pub type DbPool = sqlx::SqlitePool;

pub async fn connect(database_url: &str) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(database_url, 5, 30).await
}

pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { attempts: 3, delay: Duration::from_secs(5) }
    }
}

/// Connects, retrying up to `retry.attempts` times with `retry.delay` between
/// attempts. The error from the final attempt is returned.
pub async fn connect_with_retry(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
    retry: RetryPolicy,
) -> Result<DbPool, sqlx::Error> {
    let attempts = retry.attempts.max(1);
    let mut attempt = 1;

    loop {
        match connect_with_settings(database_url, max_connections, timeout_secs).await {
            Ok(pool) => {
                info!(
                    event_name = "system.database.connected",
                    attempt,
                    "connection to the database established"
                );
                return Ok(pool);
            }
            Err(error) if attempt < attempts => {
                warn!(
                    event_name = "system.database.connect_retry",
                    attempt,
                    max_attempts = attempts,
                    retry_in_secs = retry.delay.as_secs(),
                    error = %error,
                    "database connection attempt failed, retrying"
                );
                tokio::time::sleep(retry.delay).await;
                attempt += 1;
            }
            Err(error) => {
                warn!(
                    event_name = "system.database.connect_exhausted",
                    attempt,
                    error = %error,
                    "max database connection attempts reached"
                );
                return Err(error);
            }
        }
    }
}
