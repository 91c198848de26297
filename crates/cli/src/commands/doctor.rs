use prodrev_core::config::{AppConfig, LoadOptions, StorageBackend};
use prodrev_db::{connect_with_settings, migrations, DbPool};
use serde::Serialize;
use serde_json::json;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Skipped, details: details.into() }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    storage_backend: Option<StorageBackend>,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            json!({
                "overall_status": CheckStatus::Fail,
                "summary": "doctor serialization failed",
                "error": error.to_string(),
            })
            .to_string()
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();
    let mut storage_backend = None;

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            storage_backend = Some(config.storage.backend);
            checks.push(DoctorCheck::pass(
                "config_validation",
                "configuration loaded and validated",
            ));
            match config.storage.backend {
                StorageBackend::Memory => {
                    let reason = "storage.backend is memory, no database in use";
                    checks.push(DoctorCheck::skipped("database_connectivity", reason));
                    checks.push(DoctorCheck::skipped("schema_readiness", reason));
                }
                StorageBackend::Sqlite => checks.extend(check_database(&config)),
            }
        }
        Err(error) => {
            let reason = "skipped because configuration did not load";
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            checks.push(DoctorCheck::skipped("database_connectivity", reason));
            checks.push(DoctorCheck::skipped("schema_readiness", reason));
        }
    }

    let healthy = checks.iter().all(|check| check.status != CheckStatus::Fail);
    let overall_status = if healthy { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if healthy {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, storage_backend, summary, checks }
}

fn check_database(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck::fail(
                    "database_connectivity",
                    format!("failed to initialize async runtime: {error}"),
                ),
                DoctorCheck::skipped("schema_readiness", "skipped because runtime did not start"),
            ];
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck::fail(
                        "database_connectivity",
                        format!("failed to connect to database: {error}"),
                    ),
                    DoctorCheck::skipped(
                        "schema_readiness",
                        "skipped because the database is unreachable",
                    ),
                ];
            }
        };

        let checks = vec![
            DoctorCheck::pass(
                "database_connectivity",
                format!("connected using `{}`", config.database.url),
            ),
            check_schema(&pool).await,
        ];
        pool.close().await;
        checks
    })
}

async fn check_schema(pool: &DbPool) -> DoctorCheck {
    match migrations::products_table_exists(pool).await {
        Ok(true) => DoctorCheck::pass("schema_readiness", "products table present"),
        Ok(false) => {
            DoctorCheck::fail("schema_readiness", "products table missing, run `prodrev migrate`")
        }
        Err(error) => {
            DoctorCheck::fail("schema_readiness", format!("schema lookup failed: {error}"))
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{render_human, CheckStatus, DoctorCheck, DoctorReport};

    #[test]
    fn check_status_serializes_in_snake_case() {
        assert_eq!(json!(CheckStatus::Fail), json!("fail"));
        assert_eq!(json!(CheckStatus::Skipped), json!("skipped"));
    }

    #[test]
    fn human_output_marks_failed_checks() {
        let report = DoctorReport {
            overall_status: CheckStatus::Fail,
            storage_backend: None,
            summary: "doctor: one or more readiness checks failed".to_string(),
            checks: vec![
                DoctorCheck::fail("config_validation", "bad backend"),
                DoctorCheck::skipped("schema_readiness", "skipped"),
            ],
        };

        let output = render_human(&report);

        assert!(output.contains("- [fail] config_validation: bad backend"));
        assert!(output.contains("- [skip] schema_readiness: skipped"));
    }
}
