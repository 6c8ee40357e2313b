//! Test doubles shared by the integration tests.

use async_trait::async_trait;
use chat_widget_core::{Clock, PersistenceAdapter, PortError, PortResult, WidgetState};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn at(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).unwrap()
}

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn starting_at(ms: i64) -> Self {
        Self {
            now: Mutex::new(at(ms)),
        }
    }

    pub fn set(&self, ms: i64) {
        *self.now.lock().unwrap() = at(ms);
    }

    #[allow(dead_code)]
    pub fn advance(&self, ms: i64) {
        let mut now = self.now.lock().unwrap();
        *now = *now + Duration::milliseconds(ms);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Keeps the last saved snapshot in memory and can be told to fail.
#[derive(Default)]
pub struct MemoryStore {
    slot: Mutex<Option<WidgetState>>,
    failing: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn with_snapshot(state: WidgetState) -> Self {
        Self {
            slot: Mutex::new(Some(state)),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn stored(&self) -> Option<WidgetState> {
        self.slot.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PersistenceAdapter for MemoryStore {
    async fn load(&self) -> PortResult<Option<WidgetState>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("store offline".to_string()));
        }
        Ok(self.slot.lock().unwrap().clone())
    }

    async fn save(&self, state: &WidgetState) -> PortResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("store offline".to_string()));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.slot.lock().unwrap() = Some(state.clone());
        Ok(())
    }
}
