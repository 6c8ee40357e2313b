//! crates/chat_widget_core/src/ports.rs
//!
//! Defines the collaborator contracts (traits) of the widget core.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! core independent of where snapshots are stored, how time is read, and how
//! assistant replies are produced.

use crate::domain::{Language, Message, MessagePart, WidgetState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors of storage backends and network clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Stored snapshot is corrupt: {0}")]
    Corrupt(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Reads the last saved snapshot, or `None` if nothing was ever saved.
    async fn load(&self) -> PortResult<Option<WidgetState>>;

    /// Replaces the stored snapshot with `state`.
    async fn save(&self, state: &WidgetState) -> PortResult<()>;
}

/// Source of the current time. Callers must supply non-decreasing values.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// An assistant reply produced outside the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantReply {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<MessagePart>>,
}

#[async_trait]
pub trait ReplyService: Send + Sync {
    /// Produces the assistant's answer to the conversation so far.
    async fn request_reply(
        &self,
        transcript: &[Message],
        language: Language,
    ) -> PortResult<AssistantReply>;
}
