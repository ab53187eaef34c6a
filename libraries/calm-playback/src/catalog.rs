//! Sound catalog
//!
//! Static, ordered list of every sound the mixer can play.

use calm_core::{AssetRef, CalmError, Category, Result, SoundDescriptor};
use std::collections::HashMap;

const BUILTIN: &[(&str, Category, &str)] = &[
    ("Rain 01", Category::Ambient, "assets/rain-01.mp3"),
    ("Rain 02", Category::Ambient, "assets/rain-02.mp3"),
    ("Ocean", Category::Ambient, "assets/ocean.mp3"),
    ("Thunderstorm", Category::Ambient, "assets/thunderstorm.mp3"),
    ("Forest", Category::Ambient, "assets/forest.mp3"),
    ("Birds", Category::Ambient, "assets/birds.mp3"),
    ("River", Category::Ambient, "assets/river.mp3"),
    ("Wind", Category::Ambient, "assets/wind.mp3"),
    ("Fireplace", Category::Ambient, "assets/fireplace.mp3"),
    ("Night Crickets", Category::Ambient, "assets/night-crickets.mp3"),
    ("White Noise", Category::WhiteNoise, "assets/white-noise.mp3"),
    ("Pink Noise", Category::WhiteNoise, "assets/pink-noise.mp3"),
    ("Brown Noise", Category::WhiteNoise, "assets/brown-noise.mp3"),
    ("Fan", Category::WhiteNoise, "assets/fan.mp3"),
    ("Air Conditioner", Category::WhiteNoise, "assets/air-conditioner.mp3"),
    ("Car", Category::WhiteNoise, "assets/car.mp3"),
    ("Washing Machine", Category::WhiteNoise, "assets/washing-machine.mp3"),
];

/// Immutable sound catalog
///
/// Preserves insertion order for rendering and indexes names for lookup.
#[derive(Debug, Clone)]
pub struct Catalog {
    sounds: Vec<SoundDescriptor>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting empty or duplicate names
    pub fn new(sounds: Vec<SoundDescriptor>) -> Result<Self> {
        let mut index = HashMap::with_capacity(sounds.len());
        for (i, sound) in sounds.iter().enumerate() {
            if sound.name.trim().is_empty() {
                return Err(CalmError::invalid_input("sound name cannot be empty"));
            }
            if index.insert(sound.name.clone(), i).is_some() {
                return Err(CalmError::Duplicate(sound.name.clone()));
            }
        }
        Ok(Self { sounds, index })
    }

    /// The catalog shipped with the app
    pub fn builtin() -> Self {
        let sounds = BUILTIN
            .iter()
            .map(|(name, category, asset)| {
                SoundDescriptor::new(*name, *category, AssetRef::new(*asset))
            })
            .collect();
        Self::indexed(sounds)
    }

    // BUILTIN names are unique and non-empty (see `builtin_catalog_is_valid`)
    fn indexed(sounds: Vec<SoundDescriptor>) -> Self {
        let index = sounds
            .iter()
            .enumerate()
            .map(|(i, sound)| (sound.name.clone(), i))
            .collect();
        Self { sounds, index }
    }

    /// Sounds listed under a tab, in catalog order
    pub fn sounds_in(&self, category: Category) -> Vec<&SoundDescriptor> {
        self.sounds.iter().filter(|s| s.is_in(category)).collect()
    }

    /// Look up a descriptor by name
    pub fn get(&self, name: &str) -> Option<&SoundDescriptor> {
        self.index.get(name).map(|&i| &self.sounds[i])
    }

    /// Look up a descriptor by name
    ///
    /// # Errors
    /// Returns `CalmError::NotFound` if the name is not in the catalog. Callers
    /// only pass names taken from the catalog, so this is a programming error.
    pub fn find(&self, name: &str) -> Result<&SoundDescriptor> {
        self.get(name)
            .ok_or_else(|| CalmError::not_found("Sound", name))
    }

    /// Check if a name is in the catalog
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All sounds in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &SoundDescriptor> {
        self.sounds.iter()
    }

    /// Number of sounds
    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sound(name: &str, category: Category) -> SoundDescriptor {
        SoundDescriptor::new(name, category, AssetRef::new(format!("assets/{name}.mp3")))
    }

    #[test]
    fn builtin_catalog_is_valid() {
        let sounds = BUILTIN
            .iter()
            .map(|(name, category, asset)| {
                SoundDescriptor::new(*name, *category, AssetRef::new(*asset))
            })
            .collect();
        let catalog = Catalog::new(sounds).unwrap();
        assert_eq!(catalog.len(), BUILTIN.len());

        let builtin = Catalog::builtin();
        assert_eq!(builtin.len(), BUILTIN.len());
        for (name, category, _) in BUILTIN {
            assert_eq!(builtin.find(name).unwrap().category, *category);
        }
    }

    #[test]
    fn builtin_contains_default_preload() {
        let catalog = Catalog::builtin();
        for name in crate::types::DEFAULT_PRELOAD {
            assert!(catalog.contains(name), "{name} missing from catalog");
        }
    }

    #[test]
    fn sounds_are_split_by_category_in_order() {
        let catalog = Catalog::new(vec![
            sound("Ocean", Category::Ambient),
            sound("Fan", Category::WhiteNoise),
            sound("Rain 01", Category::Ambient),
        ])
        .unwrap();

        let ambient: Vec<_> = catalog
            .sounds_in(Category::Ambient)
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(ambient, vec!["Ocean", "Rain 01"]);

        let noise = catalog.sounds_in(Category::WhiteNoise);
        assert_eq!(noise.len(), 1);
        assert_eq!(noise[0].name, "Fan");
    }

    #[test]
    fn find_unknown_name_fails() {
        let catalog = Catalog::builtin();
        assert!(catalog.find("Ocean").is_ok());
        assert!(matches!(
            catalog.find("Whale Song"),
            Err(CalmError::NotFound { .. })
        ));
    }

    #[test]
    fn duplicate_names_rejected() {
        let result = Catalog::new(vec![
            sound("Ocean", Category::Ambient),
            sound("Ocean", Category::WhiteNoise),
        ]);
        assert!(matches!(result, Err(CalmError::Duplicate(name)) if name == "Ocean"));
    }

    #[test]
    fn empty_name_rejected() {
        let result = Catalog::new(vec![sound("  ", Category::Ambient)]);
        assert!(matches!(result, Err(CalmError::InvalidInput(_))));
    }
}
