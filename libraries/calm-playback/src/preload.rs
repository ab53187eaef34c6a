//! Preload cache
//!
//! Holds handles warmed at startup (loaded, looping, silent) until the session
//! promotes them or tears them down.

use crate::catalog::Catalog;
use calm_core::{AudioService, LoadOptions, PlaybackHandle, SoundDescriptor};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Warmed handles by sound name
#[derive(Debug, Default)]
pub struct PreloadCache {
    handles: HashMap<String, PlaybackHandle>,
}

impl PreloadCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache a warmed handle
    ///
    /// Gives the handle back if the name already has one, so the caller can
    /// release it.
    pub fn insert(&mut self, name: &str, handle: PlaybackHandle) -> Result<(), PlaybackHandle> {
        if self.handles.contains_key(name) {
            return Err(handle);
        }
        self.handles.insert(name.to_string(), handle);
        Ok(())
    }

    /// Take ownership of a warmed handle
    pub fn take(&mut self, name: &str) -> Option<PlaybackHandle> {
        self.handles.remove(name)
    }

    /// Check if a name is warmed
    pub fn contains(&self, name: &str) -> bool {
        self.handles.contains_key(name)
    }

    /// Warmed names, sorted
    pub fn names(&self) -> Vec<String> {
        self.handles
            .keys()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Remove every handle
    pub fn drain(&mut self) -> Vec<(String, PlaybackHandle)> {
        self.handles.drain().collect()
    }

    /// Number of warmed handles
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Check if nothing is warmed
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Resolve the editorial preload list against the catalog
///
/// Unknown names are skipped with a warning, repeats are dropped.
pub(crate) fn resolve_targets<'a>(
    catalog: &'a Catalog,
    names: &[String],
) -> Vec<&'a SoundDescriptor> {
    let mut seen = BTreeSet::new();
    let mut targets = Vec::with_capacity(names.len());
    for name in names {
        match catalog.get(name) {
            Some(descriptor) => {
                if seen.insert(name.as_str()) {
                    targets.push(descriptor);
                }
            }
            None => warn!("Skipping preload of unknown sound: {}", name),
        }
    }
    targets
}

/// Load one clip silent and looping
///
/// A failure is logged and yields `None`; no partial handle is kept.
pub(crate) async fn warm_one(
    service: &dyn AudioService,
    descriptor: &SoundDescriptor,
) -> Option<PlaybackHandle> {
    match service.load(&descriptor.source, LoadOptions::warm()).await {
        Ok(handle) => {
            debug!("Preloaded {} as {}", descriptor.name, handle.id());
            Some(handle)
        }
        Err(e) => {
            warn!("Failed to preload {}: {}", descriptor.name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Op, RecordingAudioService};
    use calm_core::{AssetRef, Category, HandleId};

    fn catalog() -> Catalog {
        Catalog::new(vec![
            SoundDescriptor::new("Ocean", Category::Ambient, AssetRef::new("ocean.mp3")),
            SoundDescriptor::new("Rain 01", Category::Ambient, AssetRef::new("rain.mp3")),
        ])
        .unwrap()
    }

    #[test]
    fn insert_take_round_trip() {
        let mut cache = PreloadCache::new();
        assert!(cache.insert("Ocean", PlaybackHandle::new(HandleId::new(1))).is_ok());
        assert!(cache.contains("Ocean"));

        let duplicate = cache.insert("Ocean", PlaybackHandle::new(HandleId::new(2)));
        assert_eq!(duplicate.unwrap_err().id(), HandleId::new(2));

        let handle = cache.take("Ocean").unwrap();
        assert_eq!(handle.id(), HandleId::new(1));
        assert!(cache.is_empty());
        assert!(cache.take("Ocean").is_none());
    }

    #[test]
    fn names_are_sorted() {
        let mut cache = PreloadCache::new();
        cache.insert("Rain 01", PlaybackHandle::new(HandleId::new(1))).unwrap();
        cache.insert("Ocean", PlaybackHandle::new(HandleId::new(2))).unwrap();
        assert_eq!(cache.names(), vec!["Ocean", "Rain 01"]);
        assert_eq!(cache.drain().len(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn unknown_and_repeated_names_are_skipped() {
        let catalog = catalog();
        let names = vec![
            "Ocean".to_string(),
            "Whale Song".to_string(),
            "Ocean".to_string(),
            "Rain 01".to_string(),
        ];
        let targets: Vec<_> = resolve_targets(&catalog, &names)
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(targets, vec!["Ocean", "Rain 01"]);
    }

    #[tokio::test]
    async fn warm_one_loads_silent_looping() {
        let service = RecordingAudioService::new();
        let catalog = catalog();
        let handle = warm_one(&service, catalog.find("Ocean").unwrap()).await.unwrap();

        let status = service.status(handle.id()).unwrap();
        assert!(status.is_loaded);
        assert!(!status.is_playing);
        assert!(status.is_looping);
    }

    #[tokio::test]
    async fn warm_one_failure_keeps_nothing() {
        let service = RecordingAudioService::new();
        service.fail(Op::Load);
        let catalog = catalog();

        assert!(warm_one(&service, catalog.find("Ocean").unwrap()).await.is_none());
        assert!(service.loaded_handles().is_empty());
    }
}
