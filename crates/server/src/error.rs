use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use prodrev_core::errors::{ApplicationError, InterfaceError};
use prodrev_db::RepositoryError;
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
    pub correlation_id: String,
}

/// Error half of every product handler. Carries the interface-level error so
/// the status code and client-facing text are decided in one place.
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self(InterfaceError::NotFound { message: message.into(), correlation_id: correlation_id() })
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(InterfaceError::BadRequest {
            message: message.into(),
            correlation_id: correlation_id(),
        })
    }

    pub fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::BadRequest { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(value: RepositoryError) -> Self {
        Self(ApplicationError::from(value).into_interface(correlation_id()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::bad_request(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self.0 {
            InterfaceError::NotFound { message, correlation_id } => {
                info!(
                    event_name = "api.product.not_found",
                    correlation_id = %correlation_id,
                    detail = %message,
                    "product lookup missed"
                );
            }
            other => {
                error!(
                    event_name = "api.request.failed",
                    correlation_id = %other.correlation_id(),
                    status = status.as_u16(),
                    error = %other,
                    "request failed"
                );
            }
        }

        let body = ErrorBody {
            detail: self.0.user_message().to_string(),
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn correlation_id() -> String {
    Uuid::new_v4().simple().to_string()
}
