//! services/api/src/adapters/memory.rs
//!
//! An in-memory `PersistenceAdapter`. Nothing survives a restart; the
//! availability switch lets callers exercise the degraded path.

use async_trait::async_trait;
use chat_widget_core::{PersistenceAdapter, PortError, PortResult, WidgetState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    slot: Mutex<Option<WidgetState>>,
    unavailable: AtomicBool,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(state: WidgetState) -> Self {
        Self {
            slot: Mutex::new(Some(state)),
            unavailable: AtomicBool::new(false),
        }
    }

    /// While set, every load and save fails with `PortError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// The last successfully saved snapshot.
    pub fn stored(&self) -> Option<WidgetState> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn check_available(&self) -> PortResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("in-memory store switched off".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceAdapter for InMemoryPersistence {
    async fn load(&self) -> PortResult<Option<WidgetState>> {
        self.check_available()?;
        Ok(self.stored())
    }

    async fn save(&self, state: &WidgetState) -> PortResult<()> {
        self.check_available()?;
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(state.clone());
        Ok(())
    }
}
