//! crates/chat_widget_core/src/widget.rs
//!
//! The widget state machine. It owns visibility, language, the transcript and
//! the rate limiter snapshot, and saves the combined state after every
//! applied mutation.
//!
//! Operations either apply fully or leave the state untouched. The only
//! exception is persistence: a failed save is reported to the caller, but the
//! in-memory state stays authoritative and the save is retried on the next
//! mutation (or by [`WidgetStateMachine::flush`]).

use crate::config::WidgetConfig;
use crate::domain::{
    Language, Message, MessagePart, RateLimitState, Role, Visibility, WidgetState,
};
use crate::error::{WidgetError, WidgetResult};
use crate::message_store::MessageStore;
use crate::ports::{Clock, PersistenceAdapter};
use crate::rate_limiter::{Admission, RateLimiter};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// How the initial state was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Nothing was stored; started empty.
    Fresh,
    /// The stored snapshot was reused.
    Restored,
    /// The stored snapshot was too old and was dropped.
    DiscardedStale { age_ms: i64 },
    /// The adapter failed; started empty.
    LoadFailed(String),
}

/// A user message the rate limiter admitted.
///
/// The send stands even when the save failed: the message is in the
/// transcript and the quota is spent, so callers still see the message.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmittedMessage {
    pub message: Message,
    /// Outcome of saving the updated state.
    pub saved: WidgetResult<()>,
}

impl AdmittedMessage {
    /// Treats a failed save as a failed send.
    pub fn into_result(self) -> WidgetResult<Message> {
        self.saved.map(|()| self.message)
    }
}

pub struct WidgetStateMachine {
    config: WidgetConfig,
    limiter: RateLimiter,
    persistence: Arc<dyn PersistenceAdapter>,
    clock: Arc<dyn Clock>,
    state: WidgetState,
    updates: watch::Sender<WidgetState>,
    restore_outcome: RestoreOutcome,
    unsaved: bool,
}

impl WidgetStateMachine {
    /// Builds the widget from whatever the adapter has stored.
    ///
    /// Missing, stale or unreadable snapshots all yield the empty closed state.
    pub async fn restore(
        config: WidgetConfig,
        persistence: Arc<dyn PersistenceAdapter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let now = clock.now();
        let (state, restore_outcome) = match persistence.load().await {
            Ok(None) => {
                debug!("No stored widget snapshot, starting fresh");
                (WidgetState::empty(now), RestoreOutcome::Fresh)
            }
            Ok(Some(stored)) if stored.is_stale(now, config.staleness_threshold) => {
                let age_ms = stored.age(now).num_milliseconds();
                info!(age_ms, "Discarding stale widget snapshot");
                (WidgetState::empty(now), RestoreOutcome::DiscardedStale { age_ms })
            }
            Ok(Some(stored)) => {
                info!(messages = stored.messages.len(), "Restored widget snapshot");
                (stored, RestoreOutcome::Restored)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load widget snapshot, starting fresh");
                (WidgetState::empty(now), RestoreOutcome::LoadFailed(e.to_string()))
            }
        };

        let (updates, _) = watch::channel(state.clone());
        Self {
            config,
            limiter: RateLimiter::new(config.limit, config.window_duration),
            persistence,
            clock,
            state,
            updates,
            restore_outcome,
            unsaved: false,
        }
    }

    //=====================================================================================
    // Reads
    //=====================================================================================

    pub fn snapshot(&self) -> &WidgetState {
        &self.state
    }

    pub fn visibility(&self) -> Visibility {
        self.state.visibility
    }

    pub fn language(&self) -> Language {
        self.state.language
    }

    pub fn messages(&self) -> &MessageStore {
        &self.state.messages
    }

    pub fn rate_limit(&self) -> &RateLimitState {
        &self.state.rate_limit
    }

    /// Sends still admissible in the current window.
    pub fn remaining_quota(&self) -> u32 {
        self.limiter.remaining(self.clock.now(), &self.state.rate_limit)
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn restore_outcome(&self) -> &RestoreOutcome {
        &self.restore_outcome
    }

    /// True while the latest mutation has not reached the adapter.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Registers an observer. The receiver starts at the current state and
    /// sees every applied mutation.
    pub fn subscribe(&self) -> watch::Receiver<WidgetState> {
        self.updates.subscribe()
    }

    //=====================================================================================
    // Mutations
    //=====================================================================================

    pub async fn open(&mut self) -> WidgetResult<()> {
        self.set_visibility(Visibility::Open).await
    }

    pub async fn close(&mut self) -> WidgetResult<()> {
        self.set_visibility(Visibility::Closed).await
    }

    /// Flips between `Open` and `Closed`, returning the new visibility.
    pub async fn toggle_open(&mut self) -> WidgetResult<Visibility> {
        let next = self.state.visibility.toggled();
        let now = self.clock.now();
        self.state.visibility = next;
        self.commit(now).await?;
        Ok(next)
    }

    async fn set_visibility(&mut self, visibility: Visibility) -> WidgetResult<()> {
        if self.state.visibility == visibility {
            debug!(?visibility, "Widget already in requested visibility");
            return Ok(());
        }
        let now = self.clock.now();
        self.state.visibility = visibility;
        self.commit(now).await
    }

    /// Records a user message if it is non-empty and the rate limiter admits it.
    ///
    /// Validation and throttling failures are returned as errors and change
    /// nothing. Once admitted, a persistence failure is carried in
    /// [`AdmittedMessage::saved`] instead.
    pub async fn send_user_message(&mut self, text: &str) -> WidgetResult<AdmittedMessage> {
        if text.is_empty() {
            return Err(WidgetError::EmptyMessage);
        }

        let now = self.clock.now();
        let info = match self.limiter.try_admit(now, &self.state.rate_limit) {
            Admission::Admitted(info) => info,
            Admission::Rejected { retry_after } => {
                let retry_after_ms = retry_after.num_milliseconds();
                warn!(retry_after_ms, "User message rejected by rate limiter");
                return Err(WidgetError::RateLimitExceeded { retry_after_ms });
            }
        };

        let message = self.state.messages.append(Role::User, text, None, now);
        debug!(id = %message.id, count = info.message_count, "User message admitted");
        self.state.rate_limit = RateLimitState::Active(info);
        let saved = self.commit(now).await;
        Ok(AdmittedMessage { message, saved })
    }

    /// Switches the display language. Unknown codes leave the state untouched.
    pub async fn set_language(&mut self, code: &str) -> WidgetResult<Language> {
        let language: Language = code.parse()?;
        let now = self.clock.now();
        self.state.language = language;
        self.commit(now).await?;
        Ok(language)
    }

    /// Appends an assistant reply. Replies are not rate limited and are
    /// accepted whether or not the widget is open.
    pub async fn deliver_assistant_message(
        &mut self,
        text: &str,
        parts: Option<Vec<MessagePart>>,
    ) -> WidgetResult<Message> {
        let now = self.clock.now();
        let message = self.state.messages.append(Role::Assistant, text, parts, now);
        debug!(id = %message.id, "Assistant message delivered");
        self.commit(now).await?;
        Ok(message)
    }

    /// Retries an outstanding save, if any.
    pub async fn flush(&mut self) -> WidgetResult<()> {
        if !self.unsaved {
            return Ok(());
        }
        self.persist().await
    }

    //=====================================================================================
    // Internals
    //=====================================================================================

    async fn commit(&mut self, now: DateTime<Utc>) -> WidgetResult<()> {
        self.state.last_updated = self.state.last_updated.max(now);
        self.updates.send_replace(self.state.clone());
        self.unsaved = true;
        self.persist().await
    }

    async fn persist(&mut self) -> WidgetResult<()> {
        match self.persistence.save(&self.state).await {
            Ok(()) => {
                self.unsaved = false;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to persist widget snapshot, keeping in-memory state");
                Err(e.into())
            }
        }
    }
}
