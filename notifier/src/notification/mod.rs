//! "Channel went live" notifications.
//!
//! Entries are queued and shown one at a time through a pluggable sink.

pub mod queue;
pub mod sink;
pub mod types;

pub use queue::{
    DispatcherEvent, NOTIFICATION_PACING, NotificationDispatcher, NotificationReply,
    NotificationSink,
};
pub use sink::LogSink;
pub use types::{ClickCallback, NOTIFICATION_TITLE, NotificationEntry};
