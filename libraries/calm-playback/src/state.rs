//! Session tables
//!
//! Synchronous half of the session: the per-sound phase machine, the preload
//! cache, the volume mix and UI flags. Every method here runs under the
//! session lock and never awaits, so a caller always sees whole transitions.

use crate::events::{Notification, SessionEvent};
use crate::preload::PreloadCache;
use crate::types::SoundPhase;
use crate::volume::VolumeMix;
use calm_core::{Category, HandleId, PlaybackHandle};
use std::collections::{BTreeSet, HashMap};

/// Per-sound phase; absence from the table means `Idle`
#[derive(Debug)]
enum Phase {
    /// Start in flight. `handle` is set once a handle is attached and play
    /// has been issued but not confirmed.
    Loading { handle: Option<PlaybackHandle> },

    /// Playing in a loop
    Playing { handle: PlaybackHandle },
}

impl Phase {
    fn handle_id(&self) -> Option<HandleId> {
        match self {
            Self::Loading { handle } => handle.as_ref().map(PlaybackHandle::id),
            Self::Playing { handle } => Some(handle.id()),
        }
    }
}

/// First step of a toggle, decided atomically
#[derive(Debug)]
pub(crate) enum TogglePlan {
    /// Start already in flight
    Ignore,

    /// Sound was playing; it is now idle and the handle must be released
    Stop(PlaybackHandle),

    /// Sound was idle; it is now loading
    Start {
        /// Handle taken from the preload cache, if one was warmed
        warm: Option<PlaybackHandle>,
        /// Effective volume to load or promote with
        volume: f32,
    },
}

/// How a start ended once play returned
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum StartResolution {
    /// Now playing
    Playing,

    /// Stop-all or shutdown took the handle while play was in flight
    Cancelled,
}

/// Mutable session state
#[derive(Debug)]
pub(crate) struct SessionState {
    phases: HashMap<String, Phase>,
    preloaded: PreloadCache,
    pub(crate) mix: VolumeMix,
    category: Category,
    stop_modal_open: bool,
    preload_started: bool,
    shut_down: bool,
    events: Vec<SessionEvent>,
}

impl SessionState {
    pub(crate) fn new(mix: VolumeMix) -> Self {
        Self {
            phases: HashMap::new(),
            preloaded: PreloadCache::new(),
            mix,
            category: Category::default(),
            stop_modal_open: false,
            preload_started: false,
            shut_down: false,
            events: Vec::new(),
        }
    }

    // ===== Phase machine =====

    pub(crate) fn phase(&self, name: &str) -> SoundPhase {
        match self.phases.get(name) {
            None => SoundPhase::Idle,
            Some(Phase::Loading { .. }) => SoundPhase::Loading,
            Some(Phase::Playing { .. }) => SoundPhase::Playing,
        }
    }

    /// Decide what a toggle does and apply the synchronous part of it
    pub(crate) fn plan_toggle(&mut self, name: &str) -> TogglePlan {
        match self.phases.remove(name) {
            Some(loading @ Phase::Loading { .. }) => {
                self.phases.insert(name.to_string(), loading);
                TogglePlan::Ignore
            }
            Some(Phase::Playing { handle }) => {
                self.push(SessionEvent::SoundStopped {
                    name: name.to_string(),
                });
                TogglePlan::Stop(handle)
            }
            None => {
                self.phases
                    .insert(name.to_string(), Phase::Loading { handle: None });
                TogglePlan::Start {
                    warm: self.preloaded.take(name),
                    volume: self.mix.effective(name),
                }
            }
        }
    }

    /// Attach a resolved handle to a loading sound, making it active
    ///
    /// Gives the handle back if the session shut down meanwhile. Returns the
    /// current effective volume so the caller can catch up with a volume
    /// change made while the load was in flight.
    pub(crate) fn attach(
        &mut self,
        name: &str,
        handle: PlaybackHandle,
    ) -> Result<f32, PlaybackHandle> {
        if self.shut_down {
            return Err(handle);
        }
        match self.phases.get_mut(name) {
            Some(Phase::Loading { handle: slot @ None }) => {
                *slot = Some(handle);
                Ok(self.mix.effective(name))
            }
            _ => Err(handle),
        }
    }

    /// Promote an attached sound to playing once play returned
    ///
    /// The loading entry always belongs to the start in flight (toggles are
    /// ignored while loading), so it is cleared either way.
    pub(crate) fn finish_start(&mut self, name: &str, promoted: bool) -> StartResolution {
        match self.phases.remove(name) {
            Some(Phase::Loading {
                handle: Some(handle),
            }) => {
                self.phases
                    .insert(name.to_string(), Phase::Playing { handle });
                self.push(SessionEvent::SoundStarted {
                    name: name.to_string(),
                    promoted,
                });
                StartResolution::Playing
            }
            Some(Phase::Loading { handle: None }) | None => StartResolution::Cancelled,
            Some(playing @ Phase::Playing { .. }) => {
                self.phases.insert(name.to_string(), playing);
                StartResolution::Cancelled
            }
        }
    }

    /// Reset a failed start to idle, handing back any attached handle
    pub(crate) fn abort_start(&mut self, name: &str) -> Option<PlaybackHandle> {
        match self.phases.remove(name) {
            Some(Phase::Loading { handle }) => handle,
            Some(playing @ Phase::Playing { .. }) => {
                self.phases.insert(name.to_string(), playing);
                None
            }
            None => None,
        }
    }

    /// Switch off one playing sound
    pub(crate) fn take_playing(&mut self, name: &str) -> Option<PlaybackHandle> {
        match self.phases.remove(name) {
            Some(Phase::Playing { handle }) => {
                self.push(SessionEvent::SoundStopped {
                    name: name.to_string(),
                });
                Some(handle)
            }
            Some(other) => {
                self.phases.insert(name.to_string(), other);
                None
            }
            None => None,
        }
    }

    /// Switch off every active sound at once
    ///
    /// Playing sounds become idle. Sounds attached but still waiting on play
    /// lose their handle and stay loading until that start resolves, so the
    /// name cannot be started twice.
    pub(crate) fn take_all_active(&mut self) -> Vec<(String, PlaybackHandle)> {
        let mut taken = Vec::new();
        let names: Vec<String> = self.phases.keys().cloned().collect();
        for name in names {
            match self.phases.remove(&name) {
                Some(Phase::Playing { handle }) => taken.push((name, handle)),
                Some(Phase::Loading {
                    handle: Some(handle),
                }) => {
                    self.phases
                        .insert(name.clone(), Phase::Loading { handle: None });
                    taken.push((name, handle));
                }
                Some(idle_loading) => {
                    self.phases.insert(name, idle_loading);
                }
                None => {}
            }
        }
        taken.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, _) in &taken {
            self.events.push(SessionEvent::SoundStopped { name: name.clone() });
        }
        taken
    }

    /// Handle id of an active sound (playing, or attached and about to play)
    pub(crate) fn active_handle(&self, name: &str) -> Option<HandleId> {
        self.phases.get(name).and_then(Phase::handle_id)
    }

    /// Every active sound with its effective volume
    pub(crate) fn active_targets(&self) -> Vec<(String, HandleId, f32)> {
        self.phases
            .iter()
            .filter_map(|(name, phase)| {
                phase
                    .handle_id()
                    .map(|id| (name.clone(), id, self.mix.effective(name)))
            })
            .collect()
    }

    pub(crate) fn active_names(&self) -> Vec<String> {
        self.phases
            .iter()
            .filter(|(_, phase)| phase.handle_id().is_some())
            .map(|(name, _)| name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub(crate) fn loading_names(&self) -> Vec<String> {
        self.phases
            .iter()
            .filter(|(_, phase)| matches!(phase, Phase::Loading { .. }))
            .map(|(name, _)| name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub(crate) fn active_count(&self) -> usize {
        self.phases.values().filter(|p| p.handle_id().is_some()).count()
    }

    // ===== Preload cache =====

    /// Mark the preload as started; false if it already ran
    pub(crate) fn begin_preload(&mut self) -> bool {
        if self.preload_started || self.shut_down {
            return false;
        }
        self.preload_started = true;
        true
    }

    /// Cache a warmed handle unless the name was started meanwhile or the
    /// session shut down; otherwise give it back for release
    pub(crate) fn adopt_preloaded(
        &mut self,
        name: &str,
        handle: PlaybackHandle,
    ) -> Result<(), PlaybackHandle> {
        if self.shut_down || self.phases.contains_key(name) {
            return Err(handle);
        }
        self.preloaded.insert(name, handle)
    }

    pub(crate) fn preloaded_names(&self) -> Vec<String> {
        self.preloaded.names()
    }

    pub(crate) fn is_preloaded(&self, name: &str) -> bool {
        self.preloaded.contains(name)
    }

    // ===== Lifecycle =====

    pub(crate) fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Flip to shut down and hand over every handle; `None` if already done
    #[allow(clippy::type_complexity)]
    pub(crate) fn begin_shutdown(
        &mut self,
    ) -> Option<(Vec<(String, PlaybackHandle)>, Vec<(String, PlaybackHandle)>)> {
        if self.shut_down {
            return None;
        }
        self.shut_down = true;
        let active = self.take_all_active();
        let preloaded = self.preloaded.drain();
        self.set_stop_modal(false);
        Some((active, preloaded))
    }

    /// Handles still owned (used for leak diagnostics on drop)
    pub(crate) fn owned_handles(&self) -> usize {
        self.active_count() + self.preloaded.len()
    }

    // ===== UI flags =====

    pub(crate) fn category(&self) -> Category {
        self.category
    }

    pub(crate) fn set_category(&mut self, category: Category) -> bool {
        if self.category == category {
            return false;
        }
        self.category = category;
        self.push(SessionEvent::CategoryChanged { category });
        true
    }

    pub(crate) fn stop_modal_open(&self) -> bool {
        self.stop_modal_open
    }

    pub(crate) fn set_stop_modal(&mut self, open: bool) -> bool {
        if self.stop_modal_open == open {
            return false;
        }
        self.stop_modal_open = open;
        self.push(SessionEvent::StopModalChanged { open });
        true
    }

    // ===== Events =====

    pub(crate) fn push(&mut self, event: SessionEvent) {
        self.events.push(event);
    }

    pub(crate) fn notify(&mut self, notification: Notification) {
        self.events.push(SessionEvent::Notification(notification));
    }

    pub(crate) fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Check the phase/preload disjointness invariant
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        self.preloaded
            .names()
            .iter()
            .all(|name| !self.phases.contains_key(name))
    }
}
