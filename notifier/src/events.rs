//! Messages handled by the controller run loop.
//!
//! Everything that happens off the controller (timers, notification
//! replies, logo downloads, console input, signals) arrives as one of
//! these, posted through the scheduler.

use crate::assets::LogoFetched;
use crate::notification::DispatcherEvent;

/// Position in the online or offline channel list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListPosition {
    pub online: bool,
    pub index: usize,
}

impl ListPosition {
    pub fn online(index: usize) -> Self {
        Self {
            online: true,
            index,
        }
    }

    pub fn offline(index: usize) -> Self {
        Self {
            online: false,
            index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Run a reconciler cycle.
    Poll,
    /// Reload the followed channels now, cutting short the current wait.
    ReloadChannels,
    Dispatcher(DispatcherEvent),
    /// A list entry was selected. Shown after a short delay unless the
    /// entry is activated first.
    SelectChannel(ListPosition),
    /// A list entry was activated (double click, enter).
    ActivateChannel(ListPosition),
    /// Delayed half of a selection.
    ShowChannelInfo(ListPosition),
    /// Open a list entry's page in the browser.
    OpenChannel(ListPosition),
    /// Open the channel of the `n`-th timeline event, newest first.
    OpenTimelineEntry(usize),
    /// Log the channel lists and recent events.
    ListChannels,
    LogoLoaded(LogoFetched),
    Shutdown,
}

impl From<DispatcherEvent> for AppEvent {
    fn from(event: DispatcherEvent) -> Self {
        AppEvent::Dispatcher(event)
    }
}

impl From<LogoFetched> for AppEvent {
    fn from(fetched: LogoFetched) -> Self {
        AppEvent::LogoLoaded(fetched)
    }
}
