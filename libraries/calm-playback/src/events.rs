//! Session Events
//!
//! Event-based communication for UI synchronization. Events are queued as the
//! session tables change and drained by the UI with `drain_events()`:
//! - Sound lifecycle (started/stopped)
//! - Volume and mute changes
//! - Tab and stop-all modal changes
//! - User-visible notifications for failures worth showing

use calm_core::Category;
use serde::{Deserialize, Serialize};

/// Events emitted by the session manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Sound is now playing
    SoundStarted {
        /// Sound name
        name: String,
        /// Handle came from the preload cache
        promoted: bool,
    },

    /// Sound was switched off
    ///
    /// Emitted when the intent table changes, before the platform release
    /// has completed.
    SoundStopped {
        /// Sound name
        name: String,
    },

    /// Recorded volume changed
    VolumeChanged {
        /// Sound name
        name: String,
        /// New level (0.0 - 1.0)
        level: f32,
    },

    /// Master volume or master mute changed
    MasterChanged {
        /// Master level (0.0 - 1.0)
        level: f32,
        /// Whether master is muted
        muted: bool,
    },

    /// Per-sound mute changed
    MuteChanged {
        /// Sound name
        name: String,
        /// New mute state
        muted: bool,
    },

    /// Active tab changed
    CategoryChanged {
        /// New tab
        category: Category,
    },

    /// Stop-all confirmation shown or hidden
    StopModalChanged {
        /// Whether the modal is open
        open: bool,
    },

    /// Something the user should be told about
    Notification(Notification),
}

/// Kind of user-visible notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    /// A sound could not be started
    CannotPlay,

    /// A volume change could not be applied to a live sound
    VolumeNotApplied,
}

/// User-visible notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// What went wrong
    pub kind: NotificationKind,

    /// Sound concerned
    pub sound: String,

    /// Message to display
    pub message: String,
}

impl Notification {
    /// "Cannot play <name>"
    pub fn cannot_play(sound: &str) -> Self {
        Self {
            kind: NotificationKind::CannotPlay,
            sound: sound.to_string(),
            message: format!("Cannot play {}", sound),
        }
    }

    /// "Cannot change volume of <name>"
    pub fn volume_not_applied(sound: &str) -> Self {
        Self {
            kind: NotificationKind::VolumeNotApplied,
            sound: sound.to_string(),
            message: format!("Cannot change volume of {}", sound),
        }
    }
}

impl SessionEvent {
    /// The notification carried by this event, if any
    pub fn notification(&self) -> Option<&Notification> {
        match self {
            Self::Notification(n) => Some(n),
            _ => None,
        }
    }
}
