//! crates/chat_widget_core/src/error.rs
//!
//! The error taxonomy surfaced by widget operations. Every variant is
//! recoverable by the caller.

use crate::ports::PortError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WidgetError {
    #[error("Message text is empty")]
    EmptyMessage,

    /// The send was throttled; the UI can count down `retry_after_ms`.
    #[error("Rate limit exceeded, retry in {retry_after_ms} ms")]
    RateLimitExceeded { retry_after_ms: i64 },

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The mutation was applied in memory but could not be saved.
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),
}

impl From<PortError> for WidgetError {
    fn from(err: PortError) -> Self {
        WidgetError::PersistenceUnavailable(err.to_string())
    }
}

/// A convenience type alias for `Result<T, WidgetError>`.
pub type WidgetResult<T> = Result<T, WidgetError>;
