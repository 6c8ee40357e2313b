//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its mapping
//! onto HTTP responses.

use crate::config::ConfigError;
use crate::web::envelope::{ErrorBody, ErrorResponse};
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chat_widget_core::{PortError, WidgetError};

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A widget operation was refused or could not be persisted.
    #[error("Widget error: {0}")]
    Widget(#[from] WidgetError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error related to the WebSocket connection.
    #[error("WebSocket Error: {0}")]
    Websocket(#[from] axum::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Widget(WidgetError::EmptyMessage)
            | ApiError::Widget(WidgetError::UnsupportedLanguage(_)) => StatusCode::BAD_REQUEST,
            ApiError::Widget(WidgetError::RateLimitExceeded { .. }) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            ApiError::Widget(WidgetError::PersistenceUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Port(_) => StatusCode::BAD_GATEWAY,
            ApiError::Config(_)
            | ApiError::Websocket(_)
            | ApiError::Io(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The machine-readable part of the error, shared by REST and WebSocket replies.
    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Widget(err) => ErrorBody::from(err),
            ApiError::Port(err) => ErrorBody::new("upstream_error", err.to_string()),
            // Internal details stay in the logs.
            _ => ErrorBody::new("internal_error", "An internal error occurred"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = self.body();
        let retry_after = body.retry_after_ms.map(retry_after_seconds);
        let mut response = (status, Json(ErrorResponse::new(body))).into_response();
        if let Some(seconds) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }
        response
    }
}

/// `Retry-After` is expressed in whole seconds, rounded up.
fn retry_after_seconds(retry_after_ms: i64) -> u64 {
    let seconds = (retry_after_ms.max(0) as u64).div_ceil(1000);
    seconds.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_widget_errors_to_statuses() {
        assert_eq!(
            ApiError::from(WidgetError::EmptyMessage).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(WidgetError::RateLimitExceeded { retry_after_ms: 10 }).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::from(WidgetError::PersistenceUnavailable("disk full".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn rate_limit_response_carries_retry_after_header() {
        let err = ApiError::from(WidgetError::RateLimitExceeded { retry_after_ms: 59_997 });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "60");
    }

    #[test]
    fn retry_after_rounds_up_to_at_least_one_second() {
        assert_eq!(retry_after_seconds(1), 1);
        assert_eq!(retry_after_seconds(1_000), 1);
        assert_eq!(retry_after_seconds(1_001), 2);
        assert_eq!(retry_after_seconds(0), 1);
    }
}
