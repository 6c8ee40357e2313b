//! crates/chat_widget_core/src/message_store.rs
//!
//! The append-only conversation transcript.

use crate::domain::{Message, MessagePart, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::slice;
use uuid::Uuid;

/// Ordered transcript. Messages are only ever appended; there is no update or
/// delete, so corrections are recorded as new messages.
///
/// Serialized as a plain JSON array. Deserialization rejects transcripts whose
/// timestamps go backwards or whose ids repeat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Message>", into = "Vec<Message>")]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message stamped no earlier than the newest one already stored.
    pub fn append(
        &mut self,
        role: Role,
        content: impl Into<String>,
        parts: Option<Vec<MessagePart>>,
        now: DateTime<Utc>,
    ) -> Message {
        let timestamp = match self.messages.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };
        let message = Message {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp,
            parts,
        };
        self.messages.push(message.clone());
        message
    }

    /// Messages in insertion order. The iterator can be cloned to restart it.
    pub fn all(&self) -> slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn get(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }
}

impl<'a> IntoIterator for &'a MessageStore {
    type Item = &'a Message;
    type IntoIter = slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.all()
    }
}

impl TryFrom<Vec<Message>> for MessageStore {
    type Error = String;

    fn try_from(messages: Vec<Message>) -> Result<Self, Self::Error> {
        let mut seen = HashSet::with_capacity(messages.len());
        for (index, message) in messages.iter().enumerate() {
            if !seen.insert(message.id) {
                return Err(format!("duplicate message id {}", message.id));
            }
            if index > 0 && message.timestamp < messages[index - 1].timestamp {
                return Err(format!(
                    "message {} is older than the message before it",
                    message.id
                ));
            }
        }
        Ok(Self { messages })
    }
}

impl From<MessageStore> for Vec<Message> {
    fn from(store: MessageStore) -> Self {
        store.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn append_assigns_unique_ids_in_order() {
        let mut store = MessageStore::new();
        let a = store.append(Role::User, "hi", None, at(0));
        let b = store.append(Role::Assistant, "hello", None, at(5));
        let c = store.append(Role::User, "pricing?", None, at(9));

        let ids: Vec<Uuid> = store.all().map(|m| m.id).collect();
        assert_eq!(ids, vec![a.id, b.id, c.id]);
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(b.id).unwrap().content, "hello");
    }

    #[test]
    fn timestamps_never_go_backwards() {
        let mut store = MessageStore::new();
        store.append(Role::User, "first", None, at(100));
        let late = store.append(Role::Assistant, "second", None, at(40));

        assert_eq!(late.timestamp, at(100));
        let stamps: Vec<_> = store.all().map(|m| m.timestamp).collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn all_is_restartable() {
        let mut store = MessageStore::new();
        store.append(Role::User, "one", None, at(1));
        store.append(Role::User, "two", None, at(2));

        let iter = store.all();
        let first_pass: Vec<_> = iter.clone().map(|m| m.content.as_str()).collect();
        let second_pass: Vec<_> = iter.map(|m| m.content.as_str()).collect();
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn empty_content_is_accepted_at_this_layer() {
        let mut store = MessageStore::new();
        let message = store.append(Role::Assistant, "", None, at(0));
        assert!(message.content.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn deserializing_out_of_order_transcript_fails() {
        let mut store = MessageStore::new();
        store.append(Role::User, "a", None, at(10));
        store.append(Role::User, "b", None, at(20));
        let mut raw: Vec<Message> = store.into();
        raw.swap(0, 1);

        let json = serde_json::to_string(&raw).unwrap();
        assert!(serde_json::from_str::<MessageStore>(&json).is_err());
    }

    #[test]
    fn deserializing_duplicate_ids_fails() {
        let mut store = MessageStore::new();
        let message = store.append(Role::User, "a", None, at(10));
        let raw = vec![message.clone(), message];

        let json = serde_json::to_string(&raw).unwrap();
        assert!(serde_json::from_str::<MessageStore>(&json).is_err());
    }
}
