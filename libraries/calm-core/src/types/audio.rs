/// Platform audio types
use serde::{Deserialize, Serialize};

use super::HandleId;

/// Platform audio session mode
///
/// Applied through `AudioService::configure_mode`, which must be idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioMode {
    /// Mix with other sounds instead of interrupting them
    pub allow_simultaneous: bool,

    /// Keep playing when the app is backgrounded
    pub continue_in_background: bool,

    /// Go quiet when the hardware silent switch is on
    pub honor_silent_switch: bool,
}

impl Default for AudioMode {
    fn default() -> Self {
        Self {
            allow_simultaneous: true,
            continue_in_background: true,
            honor_silent_switch: false,
        }
    }
}

/// Initial status requested when loading a clip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Start playing as soon as the clip is loaded
    pub should_play: bool,

    /// Restart at the end of the clip
    pub looping: bool,

    /// Initial volume (0.0 - 1.0)
    pub volume: f32,
}

impl LoadOptions {
    /// Loaded, looping and silent: the shape of a preloaded clip
    pub fn warm() -> Self {
        Self {
            should_play: false,
            looping: true,
            volume: 1.0,
        }
    }

    /// Looping at `volume`, waiting for an explicit play command
    pub fn looping_at(volume: f32) -> Self {
        Self {
            should_play: false,
            looping: true,
            volume: volume.clamp(0.0, 1.0),
        }
    }
}

/// Live status reported by the platform for one handle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandleStatus {
    /// Whether the clip is still loaded
    pub is_loaded: bool,

    /// Whether the clip is currently playing
    pub is_playing: bool,

    /// Whether looping is enabled
    pub is_looping: bool,

    /// Current volume (0.0 - 1.0)
    pub volume: f32,
}

impl HandleStatus {
    /// Status of a handle that is no longer loaded
    pub fn unloaded() -> Self {
        Self {
            is_loaded: false,
            is_playing: false,
            is_looping: false,
            volume: 0.0,
        }
    }
}

/// One loaded clip instance, owned by exactly one table at a time
///
/// Deliberately not `Clone`: `AudioService::unload` consumes the handle, so a
/// released handle cannot be used again through this type.
#[derive(Debug, PartialEq, Eq)]
pub struct PlaybackHandle {
    id: HandleId,
}

impl PlaybackHandle {
    /// Wrap a platform id. Only audio backends should call this.
    pub fn new(id: HandleId) -> Self {
        Self { id }
    }

    /// Platform id used to address the handle
    pub fn id(&self) -> HandleId {
        self.id
    }
}
