//! Session manager - core orchestration
//!
//! Owns the session tables and drives the platform audio service. Every
//! operation updates the tables synchronously first (what the user sees as
//! "on" follows their intent at once), then performs the platform calls.
//! Platform completion is logged and never written back into the tables.

use crate::{
    catalog::Catalog,
    error::{checked_volume, MixerError, Result},
    events::{Notification, SessionEvent},
    preload::{resolve_targets, warm_one},
    release::{stop_and_unload, stop_and_unload_all, unload, unload_all},
    state::{SessionState, StartResolution, TogglePlan},
    types::{MixerConfig, SessionSnapshot, SoundPhase, ToggleOutcome},
    volume::VolumeMix,
};
use calm_core::{
    AudioService, CalmError, Category, HandleId, LoadOptions, PlaybackHandle, SoundDescriptor,
};
use futures_util::future::join_all;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Playback session manager
///
/// Methods take `&self`; concurrent commands (for example from `tokio::join!`
/// or tasks sharing an `Arc<SessionManager>`) interleave only at platform
/// calls. The lock is never held across an await.
///
/// Commands on one name are serialized by its phase: a toggle arriving while
/// that name is loading is dropped, not queued. Commands on different names
/// are independent.
pub struct SessionManager {
    service: Arc<dyn AudioService>,
    catalog: Catalog,
    config: MixerConfig,
    state: Mutex<SessionState>,
}

impl SessionManager {
    /// Create an idle session
    ///
    /// Nothing is loaded until `warm_preload` or the first `toggle`.
    pub fn new(service: Arc<dyn AudioService>, catalog: Catalog, config: MixerConfig) -> Self {
        let mix = VolumeMix::new(config.default_volume, config.master_volume);
        Self {
            service,
            catalog,
            config,
            state: Mutex::new(SessionState::new(mix)),
        }
    }

    /// The catalog this session plays from
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The configuration this session was built with
    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    // ===== Preload =====

    /// Warm the configured popular sounds into silent looping handles
    ///
    /// Runs once per session; later calls return 0 without loading anything.
    /// Loads run concurrently and fail independently. A handle that finishes
    /// warming after its sound was started (or after shutdown) is unloaded
    /// instead of cached.
    ///
    /// Returns the number of handles cached.
    pub async fn warm_preload(&self) -> usize {
        if !self.state.lock().begin_preload() {
            debug!("Preload already ran, skipping");
            return 0;
        }

        self.configure_mode().await;

        let targets = resolve_targets(&self.catalog, &self.config.preload);
        let warms = targets
            .into_iter()
            .map(|descriptor| async move { self.warm_and_adopt(descriptor).await });
        let cached = join_all(warms).await.into_iter().filter(|ok| *ok).count();

        info!(
            "Preloaded {} of {} sounds",
            cached,
            self.config.preload.len()
        );
        cached
    }

    async fn warm_and_adopt(&self, descriptor: &SoundDescriptor) -> bool {
        let Some(handle) = warm_one(self.service.as_ref(), descriptor).await else {
            return false;
        };
        let adopted = self.state.lock().adopt_preloaded(&descriptor.name, handle);
        match adopted {
            Ok(()) => true,
            Err(handle) => {
                debug!("{} no longer needs its preload, releasing", descriptor.name);
                unload(self.service.as_ref(), &descriptor.name, handle).await;
                false
            }
        }
    }

    // ===== Toggle =====

    /// Start the sound if it is off, stop it if it is on
    ///
    /// A toggle while the sound is loading is ignored. Start failures are
    /// reported through a `CannotPlay` notification and leave the sound idle;
    /// stop failures are only logged.
    ///
    /// # Errors
    /// `UnknownSound` if the name is not in the catalog, `SessionShutDown`
    /// after `shutdown`.
    pub async fn toggle(&self, name: &str) -> Result<ToggleOutcome> {
        let descriptor = self.known(name)?;

        let plan = {
            let mut state = self.state.lock();
            if state.is_shut_down() {
                return Err(MixerError::SessionShutDown);
            }
            state.plan_toggle(name)
        };

        match plan {
            TogglePlan::Ignore => {
                debug!("Ignoring toggle of {} while it is loading", name);
                Ok(ToggleOutcome::Ignored)
            }
            TogglePlan::Stop(handle) => {
                debug!("Stopping {}", name);
                stop_and_unload(self.service.as_ref(), name, handle).await;
                Ok(ToggleOutcome::Stopped)
            }
            TogglePlan::Start { warm, volume } => Ok(self.start(descriptor, warm, volume).await),
        }
    }

    /// Stop one playing sound
    ///
    /// Returns false if the sound was not playing (idle, or mid-start).
    pub async fn stop_one(&self, name: &str) -> Result<bool> {
        self.known(name)?;
        let handle = {
            let mut state = self.state.lock();
            if state.is_shut_down() {
                return Err(MixerError::SessionShutDown);
            }
            state.take_playing(name)
        };

        match handle {
            Some(handle) => {
                debug!("Stopping {}", name);
                stop_and_unload(self.service.as_ref(), name, handle).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn start(
        &self,
        descriptor: &SoundDescriptor,
        warm: Option<PlaybackHandle>,
        volume: f32,
    ) -> ToggleOutcome {
        let name = descriptor.name.as_str();
        self.configure_mode().await;

        let (handle, promoted) = match self.promote(name, warm, volume).await {
            Ok(Some(handle)) => (handle, true),
            Ok(None) => {
                match self
                    .service
                    .load(&descriptor.source, LoadOptions::looping_at(volume))
                    .await
                {
                    Ok(handle) => (handle, false),
                    Err(e) => return self.fail_start(name, &e).await,
                }
            }
            Err(e) => return self.fail_start(name, &e).await,
        };

        let id = handle.id();
        let attached = self.state.lock().attach(name, handle);
        let current = match attached {
            Ok(current) => current,
            Err(handle) => {
                debug!("Session shut down while {} was loading", name);
                stop_and_unload(self.service.as_ref(), name, handle).await;
                return self.cancel_start(name);
            }
        };

        // volume moved while the load was in flight
        if (current - volume).abs() > f32::EPSILON {
            if let Err(e) = self.service.set_volume(id, current).await {
                warn!("Failed to apply volume to {} ({}): {}", name, id, e);
            }
            // stop-all or shutdown may have taken the handle meanwhile
            if self.state.lock().active_handle(name) != Some(id) {
                debug!("{} was stopped before play was issued", name);
                return self.cancel_start(name);
            }
        }

        if let Err(e) = self.service.play(id).await {
            let handle = self.state.lock().abort_start(name);
            return match handle {
                Some(handle) => {
                    error!("Failed to play {}: {}", name, e);
                    stop_and_unload(self.service.as_ref(), name, handle).await;
                    self.state.lock().notify(Notification::cannot_play(name));
                    ToggleOutcome::Failed
                }
                // stopped while play was in flight; the stopper releases it
                None => ToggleOutcome::Cancelled,
            };
        }

        let resolution = self.state.lock().finish_start(name, promoted);
        match resolution {
            StartResolution::Playing => {
                info!(
                    "Playing {} ({}){}",
                    name,
                    id,
                    if promoted { " from preload" } else { "" }
                );
                ToggleOutcome::Started { promoted }
            }
            StartResolution::Cancelled => {
                debug!("{} was stopped while starting", name);
                ToggleOutcome::Cancelled
            }
        }
    }

    /// Verify and prepare a preloaded handle
    ///
    /// `Ok(None)` means fall back to a fresh load: nothing was warmed, or the
    /// warmed handle no longer answers as loaded and was discarded.
    async fn promote(
        &self,
        name: &str,
        warm: Option<PlaybackHandle>,
        volume: f32,
    ) -> std::result::Result<Option<PlaybackHandle>, CalmError> {
        let Some(handle) = warm else {
            return Ok(None);
        };
        let id = handle.id();

        match self.service.query_status(id).await {
            Ok(status) if status.is_loaded => {}
            Ok(_) => {
                debug!("Preloaded {} ({}) was unloaded, loading fresh", name, id);
                return Ok(None);
            }
            Err(e) => {
                debug!("Preloaded {} ({}) failed its probe, loading fresh: {}", name, id, e);
                return Ok(None);
            }
        }

        let prepared = match self.service.set_volume(id, volume).await {
            Ok(()) => self.service.set_looping(id, true).await,
            Err(e) => Err(e),
        };
        match prepared {
            Ok(()) => Ok(Some(handle)),
            Err(e) => {
                unload(self.service.as_ref(), name, handle).await;
                Err(e)
            }
        }
    }

    async fn fail_start(&self, name: &str, e: &CalmError) -> ToggleOutcome {
        error!("Cannot play {}: {}", name, e);
        let mut state = self.state.lock();
        let leftover = state.abort_start(name);
        debug_assert!(leftover.is_none(), "no handle is attached before play");
        state.notify(Notification::cannot_play(name));
        ToggleOutcome::Failed
    }

    fn cancel_start(&self, name: &str) -> ToggleOutcome {
        self.state.lock().abort_start(name);
        ToggleOutcome::Cancelled
    }

    async fn configure_mode(&self) {
        if let Err(e) = self.service.configure_mode(self.config.audio_mode).await {
            warn!("Audio mode rejected, continuing: {}", e);
        }
    }

    // ===== Stop all =====

    /// Open the stop-all confirmation
    ///
    /// Returns false (and stays closed) when nothing is playing.
    pub fn request_stop_all(&self) -> bool {
        let mut state = self.state.lock();
        if state.active_count() == 0 {
            return false;
        }
        state.set_stop_modal(true);
        true
    }

    /// Close the stop-all confirmation without stopping anything
    pub fn dismiss_stop_modal(&self) {
        self.state.lock().set_stop_modal(false);
    }

    /// Switch every sound off at once, then release all handles concurrently
    ///
    /// The session shows zero playing sounds before any platform call is
    /// made. Per-handle failures are logged and do not affect the others. The
    /// stop-all modal closes once every release has settled.
    ///
    /// Returns the number of sounds switched off.
    pub async fn stop_all(&self) -> Result<usize> {
        let handles = {
            let mut state = self.state.lock();
            if state.is_shut_down() {
                return Err(MixerError::SessionShutDown);
            }
            state.take_all_active()
        };

        let count = handles.len();
        if count > 0 {
            let released = stop_and_unload_all(self.service.as_ref(), handles).await;
            info!("Stopped {} sounds ({} released cleanly)", count, released);
        }

        self.state.lock().set_stop_modal(false);
        Ok(count)
    }

    // ===== Volume =====

    /// Record a sound's volume and apply it if the sound is on
    ///
    /// The level is remembered whether or not the sound is playing. If the
    /// sound is not active at call time nothing is sent to the platform. A
    /// platform failure queues a `VolumeNotApplied` notification unless the
    /// sound was stopped while the call was in flight. The recorded level is
    /// kept either way.
    pub async fn set_volume(&self, name: &str, value: f32) -> Result<()> {
        self.known(name)?;
        let level = checked_volume(value)?;

        let target = {
            let mut state = self.state.lock();
            if state.is_shut_down() {
                return Err(MixerError::SessionShutDown);
            }
            state.mix.set_level(name, level);
            state.push(SessionEvent::VolumeChanged {
                name: name.to_string(),
                level,
            });
            state
                .active_handle(name)
                .map(|id| (id, state.mix.effective(name)))
        };

        if let Some((id, effective)) = target {
            self.apply_volume(name, id, effective, true).await;
        }
        Ok(())
    }

    /// Set the master volume and re-apply every active sound's level
    pub async fn set_master_volume(&self, value: f32) -> Result<()> {
        let level = checked_volume(value)?;
        let targets = {
            let mut state = self.state.lock();
            if state.is_shut_down() {
                return Err(MixerError::SessionShutDown);
            }
            state.mix.set_master(level);
            let muted = state.mix.is_master_muted();
            state.push(SessionEvent::MasterChanged { level, muted });
            state.active_targets()
        };
        self.apply_volumes(targets).await;
        Ok(())
    }

    /// Toggle master mute, returning the new state
    pub async fn toggle_master_mute(&self) -> Result<bool> {
        let (muted, targets) = {
            let mut state = self.state.lock();
            if state.is_shut_down() {
                return Err(MixerError::SessionShutDown);
            }
            let muted = state.mix.toggle_master_mute();
            let level = state.mix.master();
            state.push(SessionEvent::MasterChanged { level, muted });
            (muted, state.active_targets())
        };
        self.apply_volumes(targets).await;
        Ok(muted)
    }

    /// Mute or unmute one sound without losing its level
    pub async fn set_muted(&self, name: &str, muted: bool) -> Result<()> {
        self.known(name)?;
        let target = {
            let mut state = self.state.lock();
            if state.is_shut_down() {
                return Err(MixerError::SessionShutDown);
            }
            if !state.mix.set_muted(name, muted) {
                return Ok(());
            }
            state.push(SessionEvent::MuteChanged {
                name: name.to_string(),
                muted,
            });
            state
                .active_handle(name)
                .map(|id| (id, state.mix.effective(name)))
        };

        if let Some((id, effective)) = target {
            self.apply_volume(name, id, effective, true).await;
        }
        Ok(())
    }

    /// Flip one sound's mute, returning the new state
    pub async fn toggle_mute(&self, name: &str) -> Result<bool> {
        let muted = !self.state.lock().mix.is_muted(name);
        self.set_muted(name, muted).await?;
        Ok(muted)
    }

    async fn apply_volumes(&self, targets: Vec<(String, HandleId, f32)>) {
        let applies = targets.iter().map(|(name, id, effective)| async move {
            self.apply_volume(name, *id, *effective, false).await;
        });
        join_all(applies).await;
    }

    async fn apply_volume(&self, name: &str, id: HandleId, effective: f32, notify: bool) {
        if let Err(e) = self.service.set_volume(id, effective).await {
            let mut state = self.state.lock();
            if state.active_handle(name) != Some(id) {
                // stopped while the call was in flight; the level stays recorded
                debug!("Dropped volume for {} ({}), no longer active: {}", name, id, e);
                return;
            }
            warn!("Failed to set volume of {} ({}): {}", name, id, e);
            if notify {
                state.notify(Notification::volume_not_applied(name));
            }
        }
    }

    // ===== Tabs =====

    /// Switch the visible tab
    pub fn select_category(&self, category: Category) {
        self.state.lock().set_category(category);
    }

    /// Sounds listed under the visible tab
    pub fn sounds_for_active_category(&self) -> Vec<SoundDescriptor> {
        let category = self.state.lock().category();
        self.catalog
            .sounds_in(category)
            .into_iter()
            .cloned()
            .collect()
    }

    // ===== Queries =====

    /// Consistent read-only view of the session for rendering
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock();
        SessionSnapshot {
            category: state.category(),
            playing: state.active_names(),
            loading: state.loading_names(),
            preloaded: state.preloaded_names(),
            volumes: state
                .mix
                .levels_for(self.catalog.iter().map(|s| s.name.as_str())),
            muted: state.mix.muted_names(),
            master_volume: state.mix.master(),
            master_muted: state.mix.is_master_muted(),
            stop_modal_open: state.stop_modal_open(),
            shut_down: state.is_shut_down(),
        }
    }

    /// Phase of one sound
    pub fn phase(&self, name: &str) -> SoundPhase {
        self.state.lock().phase(name)
    }

    /// Level the user last set for a sound, if any
    pub fn recorded_volume(&self, name: &str) -> Option<f32> {
        self.state.lock().mix.recorded(name)
    }

    /// Check if a sound is warmed and idle
    pub fn is_preloaded(&self, name: &str) -> bool {
        self.state.lock().is_preloaded(name)
    }

    /// Number of sounds currently on
    pub fn playing_count(&self) -> usize {
        self.state.lock().active_count()
    }

    /// Take every queued event
    pub fn drain_events(&self) -> Vec<SessionEvent> {
        self.state.lock().drain_events()
    }

    /// Check for queued events
    pub fn has_pending_events(&self) -> bool {
        self.state.lock().has_pending_events()
    }

    // ===== Lifecycle =====

    /// Release every handle the session owns
    ///
    /// Stops and unloads every active sound, then unloads every preloaded
    /// handle. Only the first call does anything; it returns true. Afterwards
    /// commands fail with `SessionShutDown` while queries keep working.
    pub async fn shutdown(&self) -> bool {
        let Some((active, preloaded)) = self.state.lock().begin_shutdown() else {
            debug!("Session already shut down");
            return false;
        };

        let stopped = stop_and_unload_all(self.service.as_ref(), active).await;
        let unloaded = unload_all(self.service.as_ref(), preloaded).await;
        info!(
            "Session shut down ({} active and {} preloaded handles released)",
            stopped, unloaded
        );
        true
    }

    /// Check if `shutdown` has run
    pub fn is_shut_down(&self) -> bool {
        self.state.lock().is_shut_down()
    }

    fn known(&self, name: &str) -> Result<&SoundDescriptor> {
        self.catalog
            .get(name)
            .ok_or_else(|| MixerError::UnknownSound(name.to_string()))
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if !state.is_shut_down() && state.owned_handles() > 0 {
            warn!(
                "Session dropped without shutdown, {} handles not released",
                state.owned_handles()
            );
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("catalog_len", &self.catalog.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
