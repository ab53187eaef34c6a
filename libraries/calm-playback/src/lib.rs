//! Calm Mixer - Playback Session Management
//!
//! Platform-agnostic session layer for a looping ambient-sound mixer.
//!
//! This crate provides:
//! - Sound catalog (ambient and white-noise tabs)
//! - Preload cache (popular sounds warmed silent at startup)
//! - Session manager (toggle, stop one, stop all, per-sound/master volume, mute)
//! - Per-sound phase machine (Idle, Loading, Playing)
//! - Session events and a read-only snapshot for the UI
//! - A recording `AudioService` for tests (feature `test-utils`)
//!
//! # Architecture
//!
//! `calm-playback` never touches audio hardware. The platform engine is
//! reached through `calm_core::AudioService`; native bridges implement it.
//!
//! Intent and completion are kept apart: a command updates the session tables
//! immediately, then awaits the platform. Release failures are logged and
//! never reconciled back into the tables.
//!
//! # Example
//!
//! ```rust
//! use calm_playback::{Catalog, MixerConfig, SessionManager, ToggleOutcome};
//! use calm_playback::testing::RecordingAudioService;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let service = Arc::new(RecordingAudioService::new());
//! let session = SessionManager::new(service, Catalog::builtin(), MixerConfig::default());
//!
//! // Warm the popular sounds
//! session.warm_preload().await;
//!
//! // Start a preloaded sound instantly, then lower it
//! let outcome = session.toggle("Ocean").await.unwrap();
//! assert_eq!(outcome, ToggleOutcome::Started { promoted: true });
//! session.set_volume("Ocean", 0.4).await.unwrap();
//!
//! // Everything off, then release the remaining preloads
//! session.stop_all().await.unwrap();
//! assert_eq!(session.snapshot().playing_count(), 0);
//! session.shutdown().await;
//! # }
//! ```

mod catalog;
mod error;
mod events;
mod manager;
mod preload;
mod release;
mod state;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod types;
mod volume;

// Public exports
pub use catalog::Catalog;
pub use error::{MixerError, Result};
pub use events::{Notification, NotificationKind, SessionEvent};
pub use manager::SessionManager;
pub use preload::PreloadCache;
pub use types::{MixerConfig, SessionSnapshot, SoundPhase, ToggleOutcome, DEFAULT_PRELOAD};
pub use volume::VolumeMix;
