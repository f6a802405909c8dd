//! Mapping of service errors onto HTTP responses.
//!
//! Bodies are plain text, one line, as produced by the error's `Display`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::db::AccessError;
use crate::health::ProbeError;
use crate::todos::ValidationError;

pub const BREAKER_OPEN_MESSAGE: &str = "Service Unavailable (Circuit Breaker Open)";

#[derive(Debug)]
pub enum ApiError {
    /// Caller input rejected before any database work.
    Validation(ValidationError),
    Access(AccessError),
    Probe(ProbeError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Access(AccessError::BreakerOpen) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Access(_) | ApiError::Probe(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Validation(e) => e.to_string(),
            ApiError::Access(AccessError::BreakerOpen) => BREAKER_OPEN_MESSAGE.to_string(),
            ApiError::Access(e) => e.to_string(),
            ApiError::Probe(e) => e.to_string(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::Validation(error)
    }
}

impl From<AccessError> for ApiError {
    fn from(error: AccessError) -> Self {
        ApiError::Access(error)
    }
}

impl From<ProbeError> for ApiError {
    fn from(error: ProbeError) -> Self {
        ApiError::Probe(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        match &self {
            ApiError::Access(AccessError::Store { kind, source }) => {
                tracing::error!(operation = kind.label(), error = %source, "Database operation failed");
            }
            ApiError::Probe(e) => tracing::error!(error = %e, "Health check failed"),
            _ => tracing::debug!(status = status.as_u16(), error = %message, "Request rejected"),
        }

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::OperationKind;
    use crate::store::StoreError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::from(ValidationError::EmptyTask).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(AccessError::BreakerOpen).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        let store = AccessError::Store {
            kind: OperationKind::ListTodos,
            source: StoreError::Unavailable("connection refused".into()),
        };
        let err = ApiError::from(store);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "database unavailable: connection refused");
    }

    #[test]
    fn test_breaker_open_message() {
        assert_eq!(
            ApiError::from(AccessError::BreakerOpen).message(),
            "Service Unavailable (Circuit Breaker Open)"
        );
    }
}
