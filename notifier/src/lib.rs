//! Followed-channel live notifier for Twitch.
//!
//! A single controller task owns all state and handles one event at a time;
//! timers, notification replies, logo downloads, and console input post
//! events to it through the scheduler.

pub mod app;
pub mod assets;
pub mod bootstrap;
pub mod config;
pub mod console;
pub mod events;
pub mod index;
pub mod log_buffer;
pub mod notification;
pub mod presentation;
pub mod reconciler;
pub mod scheduler;
pub mod shutdown;
pub mod timeline;

pub use bootstrap::init_foundation;
