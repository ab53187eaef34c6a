/// Sound catalog types
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog tab a sound belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Nature and environment recordings
    #[default]
    Ambient,
    /// Synthetic noise and mechanical hums
    WhiteNoise,
}

impl Category {
    /// All categories in tab order
    pub const ALL: [Self; 2] = [Self::Ambient, Self::WhiteNoise];

    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ambient => "ambient",
            Self::WhiteNoise => "white_noise",
        }
    }

    /// Parse from string
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ambient" => Some(Self::Ambient),
            "white_noise" => Some(Self::WhiteNoise),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque reference to a bundled audio asset
///
/// Only the platform backend knows how to resolve it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    /// Create a new asset reference
    pub fn new(asset: impl Into<String>) -> Self {
        Self(asset.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of the sound catalog
///
/// Created once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundDescriptor {
    /// Display name, unique within the catalog
    pub name: String,

    /// Tab the sound is listed under
    pub category: Category,

    /// Asset to load
    pub source: AssetRef,
}

impl SoundDescriptor {
    /// Create a new descriptor
    pub fn new(name: impl Into<String>, category: Category, source: AssetRef) -> Self {
        Self {
            name: name.into(),
            category,
            source,
        }
    }

    /// Check whether the sound is listed under `category`
    pub fn is_in(&self, category: Category) -> bool {
        self.category == category
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_string_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_str(category.as_str()), Some(category));
        }
        assert_eq!(Category::from_str("podcasts"), None);
    }

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&Category::WhiteNoise).unwrap();
        assert_eq!(json, "\"white_noise\"");
    }

    #[test]
    fn descriptor_category_membership() {
        let fan = SoundDescriptor::new(
            "Fan",
            Category::WhiteNoise,
            AssetRef::new("assets/fan.mp3"),
        );
        assert!(fan.is_in(Category::WhiteNoise));
        assert!(!fan.is_in(Category::Ambient));
        assert_eq!(fan.source.as_str(), "assets/fan.mp3");
    }
}
