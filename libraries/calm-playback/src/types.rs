//! Core types for session management

use calm_core::{AudioMode, CalmError, Category};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sounds warmed at startup unless the config says otherwise
///
/// Editorial choice, not derived from usage data.
pub const DEFAULT_PRELOAD: [&str; 3] = ["Rain 01", "Ocean", "White Noise"];

/// Configuration for the session manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerConfig {
    /// Names to warm into silent looping handles at startup
    /// (default: `DEFAULT_PRELOAD`)
    pub preload: Vec<String>,

    /// Audio session mode re-asserted before every start
    /// (default: mix with others, keep playing in background)
    pub audio_mode: AudioMode,

    /// Volume for sounds the user never adjusted (0.0 - 1.0, default: 1.0)
    pub default_volume: f32,

    /// Initial master volume (0.0 - 1.0, default: 1.0)
    pub master_volume: f32,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            preload: DEFAULT_PRELOAD.iter().map(ToString::to_string).collect(),
            audio_mode: AudioMode::default(),
            default_volume: 1.0,
            master_volume: 1.0,
        }
    }
}

impl MixerConfig {
    /// Default config with a custom preload list
    pub fn with_preload<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            preload: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Lifecycle phase of one sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundPhase {
    /// Not playing, no transition in flight
    Idle,

    /// Start in flight; further toggles are ignored
    Loading,

    /// Playing in a loop
    Playing,
}

/// What a `toggle` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Sound is now playing
    Started {
        /// Handle came from the preload cache instead of a fresh load
        promoted: bool,
    },

    /// Sound was playing and has been stopped
    Stopped,

    /// A start was already in flight for this name
    Ignored,

    /// Start failed; the sound is idle and a notification was queued
    Failed,

    /// A stop-all or shutdown overtook the start before it finished
    Cancelled,
}

/// Read-only projection of the session for rendering
///
/// Taken under a single lock, so every field describes the same moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Tab currently shown
    pub category: Category,

    /// Names that are on (playing, or attached and about to play)
    pub playing: Vec<String>,

    /// Names with a start in flight
    pub loading: Vec<String>,

    /// Names warmed and idle, ready for an instant start
    pub preloaded: Vec<String>,

    /// Volume per catalog name (recorded level, or the default)
    pub volumes: BTreeMap<String, f32>,

    /// Names muted individually
    pub muted: Vec<String>,

    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,

    /// Master mute state
    pub master_muted: bool,

    /// Whether the stop-all confirmation is showing
    pub stop_modal_open: bool,

    /// Whether the session has been shut down
    pub shut_down: bool,
}

impl SessionSnapshot {
    /// Number of sounds currently on
    pub fn playing_count(&self) -> usize {
        self.playing.len()
    }

    /// Check if a sound is on
    pub fn is_playing(&self, name: &str) -> bool {
        self.playing.iter().any(|n| n == name)
    }

    /// Check if a start is in flight for a sound
    pub fn is_loading(&self, name: &str) -> bool {
        self.loading.iter().any(|n| n == name)
    }

    /// Check if a sound can start without loading
    pub fn is_preloaded(&self, name: &str) -> bool {
        self.preloaded.iter().any(|n| n == name)
    }

    /// Volume shown on a sound's slider
    pub fn volume(&self, name: &str) -> Option<f32> {
        self.volumes.get(name).copied()
    }

    /// Phase of a sound as the UI should render it
    pub fn phase(&self, name: &str) -> SoundPhase {
        if self.is_loading(name) {
            SoundPhase::Loading
        } else if self.is_playing(name) {
            SoundPhase::Playing
        } else {
            SoundPhase::Idle
        }
    }

    /// Serialize for a UI bridge
    pub fn to_json(&self) -> Result<String, CalmError> {
        Ok(serde_json::to_string(self)?)
    }
}
