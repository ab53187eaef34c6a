/// Core error types for Calm Mixer
use thiserror::Error;

use crate::types::HandleId;

/// Result type alias using `CalmError`
pub type Result<T> = std::result::Result<T, CalmError>;

/// Core error type for Calm Mixer
#[derive(Error, Debug)]
pub enum CalmError {
    /// Clip could not be loaded (missing/corrupt asset, resource exhaustion)
    #[error("Load error: {0}")]
    Load(String),

    /// Play/stop/volume/looping command rejected by the platform
    #[error("Playback error: {0}")]
    Playback(String),

    /// Audio mode configuration rejected
    #[error("Audio mode error: {0}")]
    Config(String),

    /// Status probe failed, usually on an already-released handle
    #[error("Status query error: {0}")]
    StatusQuery(String),

    /// Handle was already unloaded
    #[error("Handle already released: {0}")]
    HandleReleased(HandleId),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of thing looked up
        entity: String,
        /// Key that was not found
        id: String,
    },

    /// Duplicate entry
    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Audio service is no longer accepting commands
    #[error("Audio service shut down")]
    ShutDown,

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CalmError {
    /// Create a load error
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Create a playback error
    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    /// Create an audio mode error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a status query error
    pub fn status_query(msg: impl Into<String>) -> Self {
        Self::StatusQuery(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error means the handle can no longer be trusted
    ///
    /// Status probe failures and released handles are both treated as
    /// "already unloaded" by callers.
    pub fn is_stale_handle(&self) -> bool {
        matches!(self, Self::StatusQuery(_) | Self::HandleReleased(_))
    }
}
