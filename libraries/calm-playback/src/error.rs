//! Error types for session management

use calm_core::CalmError;
use thiserror::Error;

/// Session errors
///
/// Only caller mistakes end up here. Platform failures are logged and turned
/// into notifications; the session always settles into a consistent state.
#[derive(Debug, Error)]
pub enum MixerError {
    /// Name is not in the catalog
    #[error("Unknown sound: {0}")]
    UnknownSound(String),

    /// Session was shut down and no longer accepts commands
    #[error("Session already shut down")]
    SessionShutDown,

    /// Volume is not a number
    #[error("Invalid volume: {0}")]
    InvalidVolume(f32),

    /// Core error
    #[error(transparent)]
    Core(#[from] CalmError),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, MixerError>;

/// Clamp a user volume into `[0, 1]`, rejecting NaN
pub(crate) fn checked_volume(value: f32) -> Result<f32> {
    if value.is_nan() {
        return Err(MixerError::InvalidVolume(value));
    }
    Ok(value.clamp(0.0, 1.0))
}
