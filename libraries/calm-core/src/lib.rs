//! Calm Mixer Core
//!
//! Platform-agnostic core types, traits, and error handling for Calm Mixer.
//!
//! This crate provides the building blocks shared by the playback session
//! layer and every platform audio backend.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `SoundDescriptor`, `Category`, `PlaybackHandle`, `HandleStatus`
//! - **Core Traits**: `AudioService`, the boundary to the platform audio engine
//! - **Error Handling**: Unified `CalmError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use calm_core::types::{AssetRef, Category, SoundDescriptor};
//!
//! let rain = SoundDescriptor::new(
//!     "Rain 01",
//!     Category::Ambient,
//!     AssetRef::new("assets/rain-01.mp3"),
//! );
//! assert_eq!(rain.name, "Rain 01");
//! assert!(rain.is_in(Category::Ambient));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CalmError, Result};
pub use traits::AudioService;

pub use types::{
    AssetRef, AudioMode, Category, HandleId, HandleStatus, LoadOptions, PlaybackHandle,
    SoundDescriptor,
};
