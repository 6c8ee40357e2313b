//! crates/chat_widget_core/src/rate_limiter.rs
//!
//! Fixed-window throttle for user-initiated sends.
//!
//! Each window admits at most `limit` messages and resets once
//! `window_duration` has elapsed since its start. Time is always supplied by
//! the caller, so the limiter itself never reads a clock.

use crate::domain::{RateLimitInfo, RateLimitState};
use chrono::{DateTime, Duration, Utc};

/// The outcome of one admission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The send may proceed; the caller stores the returned info.
    Admitted(RateLimitInfo),
    /// The send is throttled; the stored state must not change.
    Rejected { retry_after: Duration },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted(_))
    }
}

/// Decides whether one more message fits in the window active at `now`.
///
/// This is a pure function: on rejection the input state is left as it was.
pub fn try_admit(
    now: DateTime<Utc>,
    state: &RateLimitState,
    limit: u32,
    window_duration: Duration,
) -> Admission {
    let window = current_window(now, state, limit, window_duration);

    if window.message_count < limit {
        Admission::Admitted(RateLimitInfo {
            message_count: window.message_count + 1,
            ..window
        })
    } else {
        Admission::Rejected {
            retry_after: (window.window_end() - now).max(Duration::zero()),
        }
    }
}

/// The window that applies at `now`, after any reset that is due.
fn current_window(
    now: DateTime<Utc>,
    state: &RateLimitState,
    limit: u32,
    window_duration: Duration,
) -> RateLimitInfo {
    let fresh = RateLimitInfo {
        message_count: 0,
        window_start: now,
        limit,
        window_duration_ms: window_duration.num_milliseconds(),
    };

    match state {
        RateLimitState::Uninitialized => fresh,
        RateLimitState::Active(info) if now - info.window_start >= window_duration => fresh,
        RateLimitState::Active(info) => RateLimitInfo {
            limit,
            window_duration_ms: window_duration.num_milliseconds(),
            ..info.clone()
        },
    }
}

/// A limiter bound to one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiter {
    limit: u32,
    window_duration: Duration,
}

impl RateLimiter {
    pub fn new(limit: u32, window_duration: Duration) -> Self {
        Self {
            limit,
            window_duration,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window_duration(&self) -> Duration {
        self.window_duration
    }

    pub fn try_admit(&self, now: DateTime<Utc>, state: &RateLimitState) -> Admission {
        try_admit(now, state, self.limit, self.window_duration)
    }

    /// How many more sends would be admitted at `now`.
    pub fn remaining(&self, now: DateTime<Utc>, state: &RateLimitState) -> u32 {
        let window = current_window(now, state, self.limit, self.window_duration);
        self.limit.saturating_sub(window.message_count)
    }
}
