pub mod config;
pub mod doctor;
pub mod migrate;

use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

/// JSON line printed by commands that report a single outcome.
#[derive(Debug, Serialize)]
pub struct CommandOutcome {
    pub command: &'static str,
    pub status: &'static str,
    pub error_class: Option<&'static str>,
    pub message: String,
    /// Command-specific facts, omitted when there are none.
    #[serde(skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

impl CommandOutcome {
    pub fn ok(command: &'static str, message: impl Into<String>) -> Self {
        Self {
            command,
            status: "ok",
            error_class: None,
            message: message.into(),
            details: Value::Null,
        }
    }

    pub fn error(
        command: &'static str,
        error_class: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            command,
            status: "error",
            error_class: Some(error_class),
            message: message.into(),
            details: Value::Null,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    pub fn into_result(self, exit_code: u8) -> CommandResult {
        CommandResult { exit_code, output: to_json(&self, self.command) }
    }
}

/// Serializes `payload`, falling back to a minimal error document that is
/// still valid JSON.
pub(crate) fn to_json(payload: &impl Serialize, command: &str) -> String {
    serde_json::to_string(payload).unwrap_or_else(|error| {
        json!({
            "command": command,
            "status": "error",
            "error_class": "serialization",
            "message": error.to_string(),
        })
        .to_string()
    })
}
