pub mod config;
pub mod domain;
pub mod error;
pub mod message_store;
pub mod ports;
pub mod rate_limiter;
pub mod widget;

pub use config::{WidgetConfig, MAX_WINDOW_MS};
pub use domain::{
    Language, Message, MessagePart, RateLimitInfo, RateLimitState, Role, Visibility, WidgetState,
};
pub use error::{WidgetError, WidgetResult};
pub use message_store::MessageStore;
pub use ports::{
    AssistantReply, Clock, PersistenceAdapter, PortError, PortResult, ReplyService,
};
pub use rate_limiter::{try_admit, Admission, RateLimiter};
pub use widget::{AdmittedMessage, RestoreOutcome, WidgetStateMachine};
