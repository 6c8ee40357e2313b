//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use chat_widget_core::{ReplyService, WidgetState, WidgetStateMachine};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// The shared application state, created once at startup and passed to all handlers.
///
/// The widget is a single instance per process. Every handler takes the lock for
/// the duration of one operation, so operations run one at a time and each
/// one's save happens before the next operation starts.
#[derive(Clone)]
pub struct AppState {
    pub widget: Arc<Mutex<WidgetStateMachine>>,
    /// A receiver kept for cloning into WebSocket subscribers without locking.
    pub updates: watch::Receiver<WidgetState>,
    pub config: Arc<Config>,
    pub reply_service: Option<Arc<dyn ReplyService>>,
}

impl AppState {
    pub fn new(
        widget: WidgetStateMachine,
        config: Arc<Config>,
        reply_service: Option<Arc<dyn ReplyService>>,
    ) -> Self {
        let updates = widget.subscribe();
        Self {
            widget: Arc::new(Mutex::new(widget)),
            updates,
            config,
            reply_service,
        }
    }
}
