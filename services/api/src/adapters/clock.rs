//! services/api/src/adapters/clock.rs

use chat_widget_core::Clock;
use chrono::{DateTime, Utc};

/// Wall-clock time. The message store clamps timestamps, so a clock that
/// steps backwards cannot reorder the transcript.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
