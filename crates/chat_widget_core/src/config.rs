//! crates/chat_widget_core/src/config.rs
//!
//! Tunables supplied to the widget at construction.

use chrono::Duration;

/// The longest supported rate limit window: one year.
pub const MAX_WINDOW_MS: i64 = 365 * 86_400_000;

/// Throttling and staleness settings for one widget instance.
///
/// Values are not validated here; a zero `limit` simply rejects every send.
/// Windows longer than [`MAX_WINDOW_MS`] are clamped to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetConfig {
    pub limit: u32,
    pub window_duration: Duration,
    pub staleness_threshold: Duration,
}

impl WidgetConfig {
    pub fn new(limit: u32, window_duration_ms: i64, staleness_threshold_ms: i64) -> Self {
        Self {
            limit,
            window_duration: Duration::milliseconds(window_duration_ms.min(MAX_WINDOW_MS)),
            staleness_threshold: Duration::milliseconds(staleness_threshold_ms),
        }
    }
}

impl Default for WidgetConfig {
    /// 20 messages per minute; snapshots expire after a day.
    fn default() -> Self {
        Self::new(20, 60_000, 86_400_000)
    }
}
