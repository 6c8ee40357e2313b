//! services/api/src/web/envelope.rs
//!
//! The uniform response envelope shared by every REST route:
//! `{ "success": bool, "data": T | null, "error": ErrorBody | null }`.

use chat_widget_core::WidgetError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorBody>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// The operation took effect but is reported as failed, e.g. a message
    /// that was stored in memory but could not be saved.
    pub fn applied_with_error(data: T, error: ErrorBody) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(error),
        }
    }
}

/// The envelope of a refused request. `data` is always `null`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    #[schema(value_type = Option<Object>)]
    pub data: Option<()>,
    pub error: ErrorBody,
}

impl ErrorResponse {
    pub fn new(error: ErrorBody) -> Self {
        Self {
            success: false,
            data: None,
            error,
        }
    }
}

/// A machine-readable error code plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    /// Present on rate limit rejections so the UI can show a countdown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<i64>,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            retry_after_ms: None,
        }
    }
}

impl From<&WidgetError> for ErrorBody {
    fn from(err: &WidgetError) -> Self {
        let code = match err {
            WidgetError::EmptyMessage => "empty_message",
            WidgetError::RateLimitExceeded { .. } => "rate_limit_exceeded",
            WidgetError::UnsupportedLanguage(_) => "unsupported_language",
            WidgetError::PersistenceUnavailable(_) => "persistence_unavailable",
        };
        let retry_after_ms = match err {
            WidgetError::RateLimitExceeded { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        };
        Self {
            code: code.to_string(),
            message: err.to_string(),
            retry_after_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn error_response_has_null_data() {
        let body = ErrorBody::from(&WidgetError::RateLimitExceeded { retry_after_ms: 1_500 });
        let json = serde_json::to_value(ErrorResponse::new(body)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["data"], Value::Null);
        assert_eq!(json["error"]["code"], "rate_limit_exceeded");
        assert_eq!(json["error"]["retryAfterMs"], 1_500);
    }

    #[test]
    fn applied_with_error_keeps_the_data() {
        let body = ErrorBody::new("persistence_unavailable", "disk full");
        let json = serde_json::to_value(ApiResponse::applied_with_error(7, body)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["data"], 7);
        assert_eq!(json["error"]["code"], "persistence_unavailable");
    }
}
