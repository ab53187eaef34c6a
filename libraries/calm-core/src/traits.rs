/// Core traits for Calm Mixer
use crate::error::Result;
use crate::types::{AssetRef, AudioMode, HandleId, HandleStatus, LoadOptions, PlaybackHandle};
use async_trait::async_trait;

/// Platform audio engine
///
/// Implementers wrap whatever the host offers (a native mobile bridge, a
/// desktop output stream, an in-memory recorder for tests). Every call may
/// fail, and any call other than `load` may be issued on a handle the platform
/// has already released; implementers report that as an error, never a panic.
///
/// Handles are addressed by `HandleId`. `unload` consumes the owning
/// `PlaybackHandle`, which is the only way to give one back.
#[async_trait]
pub trait AudioService: Send + Sync {
    /// Configure the shared audio session
    ///
    /// Must be idempotent and must not disturb clips that are already playing.
    ///
    /// # Errors
    /// Returns `CalmError::Config` if the platform rejects the mode
    async fn configure_mode(&self, mode: AudioMode) -> Result<()>;

    /// Load a clip and return its handle
    ///
    /// # Errors
    /// Returns `CalmError::Load` if the asset is missing, corrupt, or the
    /// platform is out of resources
    async fn load(&self, source: &AssetRef, options: LoadOptions) -> Result<PlaybackHandle>;

    /// Start (or resume) playback
    async fn play(&self, handle: HandleId) -> Result<()>;

    /// Stop playback, keeping the clip loaded
    async fn stop(&self, handle: HandleId) -> Result<()>;

    /// Set volume (0.0 - 1.0)
    async fn set_volume(&self, handle: HandleId, volume: f32) -> Result<()>;

    /// Enable or disable looping
    async fn set_looping(&self, handle: HandleId, looping: bool) -> Result<()>;

    /// Release the clip
    ///
    /// The handle is consumed whether or not the platform call succeeds.
    async fn unload(&self, handle: PlaybackHandle) -> Result<()>;

    /// Probe the live status of a handle
    ///
    /// # Errors
    /// Returns `CalmError::StatusQuery` (or `HandleReleased`) when the handle
    /// is no longer valid
    async fn query_status(&self, handle: HandleId) -> Result<HandleStatus>;
}
