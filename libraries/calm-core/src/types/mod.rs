mod audio;
mod ids;
mod sound;

pub use audio::{AudioMode, HandleStatus, LoadOptions, PlaybackHandle};
pub use ids::HandleId;
pub use sound::{AssetRef, Category, SoundDescriptor};
