//! crates/chat_widget_core/src/domain.rs
//!
//! Defines the pure data structures of the chat widget.
//! The serialized shape mirrors the fields one-to-one so any persistence
//! adapter can store a snapshot as a flat JSON object.

use crate::error::WidgetError;
use crate::message_store::MessageStore;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Messages
//=========================================================================================

/// Who authored a message. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A typed rendering fragment attached to a message.
///
/// Parts are presentational only; they never influence ordering or rate limiting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePart {
    Text {
        text: String,
    },
    Image {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
    },
    Tool {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<serde_json::Value>,
    },
}

/// A single transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<MessagePart>>,
}

//=========================================================================================
// Language
//=========================================================================================

/// The locales the widget can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
    Es,
    Cn,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::En, Language::Fr, Language::Es, Language::Cn];

    /// The short code used on the wire.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
            Language::Es => "es",
            Language::Cn => "cn",
        }
    }

    /// The language's name in its own script, for the language picker.
    pub fn label(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Fr => "Français",
            Language::Es => "Español",
            Language::Cn => "中文",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = WidgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| lang.code() == code)
            .ok_or_else(|| WidgetError::UnsupportedLanguage(s.to_string()))
    }
}

//=========================================================================================
// Visibility
//=========================================================================================

/// Whether the widget panel is shown. Persisted as the `isOpen` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum Visibility {
    #[default]
    Closed,
    Open,
}

impl Visibility {
    pub fn is_open(self) -> bool {
        matches!(self, Visibility::Open)
    }

    pub fn toggled(self) -> Self {
        match self {
            Visibility::Closed => Visibility::Open,
            Visibility::Open => Visibility::Closed,
        }
    }
}

impl From<bool> for Visibility {
    fn from(is_open: bool) -> Self {
        if is_open {
            Visibility::Open
        } else {
            Visibility::Closed
        }
    }
}

impl From<Visibility> for bool {
    fn from(visibility: Visibility) -> Self {
        visibility.is_open()
    }
}

//=========================================================================================
// Rate Limit Snapshot
//=========================================================================================

/// Counter state of the current fixed window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    pub message_count: u32,
    pub window_start: DateTime<Utc>,
    pub limit: u32,
    pub window_duration_ms: i64,
}

impl RateLimitInfo {
    pub fn window_duration(&self) -> Duration {
        Duration::milliseconds(self.window_duration_ms)
    }

    /// The instant at which this window closes, saturating at the latest
    /// representable time.
    pub fn window_end(&self) -> DateTime<Utc> {
        self.window_start
            .checked_add_signed(self.window_duration())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Rate limiter state: nothing is tracked until the first send attempt.
///
/// Serialized as an optional `rateLimit` field (`null` or absent when uninitialized).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<RateLimitInfo>", into = "Option<RateLimitInfo>")]
pub enum RateLimitState {
    #[default]
    Uninitialized,
    Active(RateLimitInfo),
}

impl RateLimitState {
    pub fn info(&self) -> Option<&RateLimitInfo> {
        match self {
            RateLimitState::Uninitialized => None,
            RateLimitState::Active(info) => Some(info),
        }
    }

    pub fn is_uninitialized(&self) -> bool {
        matches!(self, RateLimitState::Uninitialized)
    }
}

impl From<Option<RateLimitInfo>> for RateLimitState {
    fn from(info: Option<RateLimitInfo>) -> Self {
        info.map_or(RateLimitState::Uninitialized, RateLimitState::Active)
    }
}

impl From<RateLimitState> for Option<RateLimitInfo> {
    fn from(state: RateLimitState) -> Self {
        match state {
            RateLimitState::Uninitialized => None,
            RateLimitState::Active(info) => Some(info),
        }
    }
}

//=========================================================================================
// Widget Snapshot
//=========================================================================================

/// The complete persisted state of one widget instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetState {
    #[serde(rename = "isOpen")]
    pub visibility: Visibility,
    pub messages: MessageStore,
    pub last_updated: DateTime<Utc>,
    pub language: Language,
    #[serde(default, skip_serializing_if = "RateLimitState::is_uninitialized")]
    pub rate_limit: RateLimitState,
}

impl WidgetState {
    /// The state a first-time visitor starts with.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            visibility: Visibility::Closed,
            messages: MessageStore::new(),
            last_updated: now,
            language: Language::default(),
            rate_limit: RateLimitState::Uninitialized,
        }
    }

    pub fn is_open(&self) -> bool {
        self.visibility.is_open()
    }

    /// Time elapsed since the last mutation, as seen at `now`.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_updated
    }

    /// A snapshot is stale once it is strictly older than `threshold`.
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        self.age(now) > threshold
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
    fn language_parses_supported_codes() {
        assert_eq!("en".parse::<Language>().unwrap(), Language::En);
        assert_eq!(" FR ".parse::<Language>().unwrap(), Language::Fr);
        assert_eq!("cn".parse::<Language>().unwrap(), Language::Cn);
    }

    #[test]
    fn language_rejects_unknown_code() {
        let err = "de".parse::<Language>().unwrap_err();
        assert!(matches!(err, WidgetError::UnsupportedLanguage(code) if code == "de"));
    }

    #[test]
    fn empty_state_is_closed_and_uninitialized() {
        let state = WidgetState::empty(at(0));
        assert!(!state.is_open());
        assert!(state.messages.is_empty());
        assert_eq!(state.language, Language::En);
        assert!(state.rate_limit.is_uninitialized());
    }

    #[test]
    fn serializes_with_flat_camel_case_fields() {
        let mut state = WidgetState::empty(at(0));
        state.visibility = Visibility::Open;
        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["isOpen"], serde_json::Value::Bool(true));
        assert_eq!(json["language"], "en");
        assert!(json["messages"].as_array().unwrap().is_empty());
        assert!(json.get("lastUpdated").is_some());
        assert!(json.get("rateLimit").is_none());
    }

    #[test]
    fn active_rate_limit_survives_serialization() {
        let mut state = WidgetState::empty(at(5));
        state.rate_limit = RateLimitState::Active(RateLimitInfo {
            message_count: 2,
            window_start: at(1),
            limit: 3,
            window_duration_ms: 60_000,
        });

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"messageCount\":2"));
        let back: WidgetState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn null_rate_limit_reads_as_uninitialized() {
        let json = r#"{
            "isOpen": false,
            "messages": [],
            "lastUpdated": "2024-01-01T00:00:00Z",
            "language": "es",
            "rateLimit": null
        }"#;
        let state: WidgetState = serde_json::from_str(json).unwrap();
        assert!(state.rate_limit.is_uninitialized());
        assert_eq!(state.language, Language::Es);
    }

    #[test]
    fn staleness_is_strictly_greater_than_threshold() {
        let state = WidgetState::empty(at(0));
        let threshold = Duration::milliseconds(1_000);
        assert!(!state.is_stale(at(1_000), threshold));
        assert!(state.is_stale(at(1_001), threshold));
    }

    #[test]
    fn window_end_saturates_instead_of_overflowing() {
        let info = RateLimitInfo {
            message_count: 1,
            window_start: at(0),
            limit: 1,
            window_duration_ms: i64::MAX / 2,
        };
        assert_eq!(info.window_end(), DateTime::<Utc>::MAX_UTC);

        let short = RateLimitInfo {
            window_duration_ms: 1_000,
            ..info
        };
        assert_eq!(short.window_end(), at(1_000));
    }

    #[test]
    fn tool_part_uses_type_tag() {
        let part = MessagePart::Tool {
            name: "lookup".to_string(),
            input: Some(serde_json::json!({"q": "pricing"})),
            output: None,
        };
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["type"], "tool");
        assert_eq!(json["name"], "lookup");
        assert!(json.get("output").is_none());
    }
}
