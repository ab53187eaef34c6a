//! Recording audio backend
//!
//! In-memory `AudioService` that records every call, tracks the status of
//! every clip it loaded, and can be told to fail or to hold calls mid-flight.
//! Used by this crate's tests and by embedders testing their UI glue.

use async_trait::async_trait;
use calm_core::{
    AssetRef, AudioMode, AudioService, CalmError, HandleId, HandleStatus, LoadOptions,
    PlaybackHandle, Result,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};

/// Platform operation, for failure injection and counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ConfigureMode,
    Load,
    Play,
    Stop,
    SetVolume,
    SetLooping,
    Unload,
    QueryStatus,
}

/// One recorded call, in issue order
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCall {
    ConfigureMode(AudioMode),
    Load(AssetRef),
    Play(HandleId),
    Stop(HandleId),
    SetVolume(HandleId, f32),
    SetLooping(HandleId, bool),
    Unload(HandleId),
    QueryStatus(HandleId),
}

impl AudioCall {
    /// Operation kind
    pub fn op(&self) -> Op {
        match self {
            Self::ConfigureMode(_) => Op::ConfigureMode,
            Self::Load(_) => Op::Load,
            Self::Play(_) => Op::Play,
            Self::Stop(_) => Op::Stop,
            Self::SetVolume(..) => Op::SetVolume,
            Self::SetLooping(..) => Op::SetLooping,
            Self::Unload(_) => Op::Unload,
            Self::QueryStatus(_) => Op::QueryStatus,
        }
    }

    /// Handle addressed by the call, if any
    pub fn handle(&self) -> Option<HandleId> {
        match self {
            Self::ConfigureMode(_) | Self::Load(_) => None,
            Self::Play(id)
            | Self::Stop(id)
            | Self::SetVolume(id, _)
            | Self::SetLooping(id, _)
            | Self::Unload(id)
            | Self::QueryStatus(id) => Some(*id),
        }
    }
}

#[derive(Debug, Clone)]
enum Target {
    Any,
    Source(AssetRef),
    Handle(HandleId),
}

#[derive(Debug, Clone)]
struct FailureRule {
    op: Op,
    target: Target,
    once: bool,
}

#[derive(Debug)]
struct Clip {
    source: AssetRef,
    status: HandleStatus,
    unloads: usize,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    clips: HashMap<HandleId, Clip>,
    calls: Vec<AudioCall>,
    failures: Vec<FailureRule>,
    mode: Option<AudioMode>,
}

impl Inner {
    fn should_fail(&mut self, op: Op, source: Option<&AssetRef>, handle: Option<HandleId>) -> bool {
        let hit = self.failures.iter().position(|rule| {
            rule.op == op
                && match &rule.target {
                    Target::Any => true,
                    Target::Source(s) => source == Some(s),
                    Target::Handle(h) => handle == Some(*h),
                }
        });
        match hit {
            Some(i) => {
                if self.failures[i].once {
                    self.failures.remove(i);
                }
                true
            }
            None => false,
        }
    }

    fn live_clip(&mut self, id: HandleId) -> Result<&mut Clip> {
        match self.clips.get_mut(&id) {
            Some(clip) if clip.status.is_loaded => Ok(clip),
            _ => Err(CalmError::HandleReleased(id)),
        }
    }
}

struct Gate {
    entered: Notify,
    open: Semaphore,
}

/// In-memory audio backend that records calls
#[derive(Default)]
pub struct RecordingAudioService {
    inner: Mutex<Inner>,
    gates: Mutex<HashMap<Op, Arc<Gate>>>,
}

impl RecordingAudioService {
    /// Create a backend where every call succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future call of `op` fail
    pub fn fail(&self, op: Op) {
        self.push_rule(op, Target::Any, false);
    }

    /// Make the next call of `op` fail
    pub fn fail_once(&self, op: Op) {
        self.push_rule(op, Target::Any, true);
    }

    /// Make every call of `op` for one asset fail
    pub fn fail_source(&self, op: Op, source: AssetRef) {
        self.push_rule(op, Target::Source(source), false);
    }

    /// Make every call of `op` on one handle fail
    pub fn fail_handle(&self, op: Op, handle: HandleId) {
        self.push_rule(op, Target::Handle(handle), false);
    }

    /// Remove every failure rule
    pub fn clear_failures(&self) {
        self.inner.lock().failures.clear();
    }

    fn push_rule(&self, op: Op, target: Target, once: bool) {
        self.inner.lock().failures.push(FailureRule { op, target, once });
    }

    /// Hold every call of `op` at its start until `release(op)`
    ///
    /// The call is recorded before it blocks.
    pub fn hold(&self, op: Op) {
        self.gates.lock().insert(
            op,
            Arc::new(Gate {
                entered: Notify::new(),
                open: Semaphore::new(0),
            }),
        );
    }

    /// Let held and future calls of `op` through
    pub fn release(&self, op: Op) {
        if let Some(gate) = self.gates.lock().remove(&op) {
            gate.open.close();
        }
    }

    /// Wait until a call of `op` reaches its gate
    ///
    /// Must be preceded by `hold(op)`; returns immediately otherwise.
    pub async fn entered(&self, op: Op) {
        let gate = self.gates.lock().get(&op).cloned();
        if let Some(gate) = gate {
            gate.entered.notified().await;
        }
    }

    /// Simulate the platform dropping a clip behind the caller's back
    pub fn invalidate(&self, handle: HandleId) {
        if let Some(clip) = self.inner.lock().clips.get_mut(&handle) {
            clip.status = HandleStatus::unloaded();
        }
    }

    /// Every recorded call, in issue order
    pub fn calls(&self) -> Vec<AudioCall> {
        self.inner.lock().calls.clone()
    }

    /// Recorded calls addressing one handle
    pub fn calls_for(&self, handle: HandleId) -> Vec<AudioCall> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| c.handle() == Some(handle))
            .cloned()
            .collect()
    }

    /// Number of recorded calls of `op`
    pub fn count(&self, op: Op) -> usize {
        self.inner.lock().calls.iter().filter(|c| c.op() == op).count()
    }

    /// Forget recorded calls (clip state is kept)
    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    /// Live status of a clip this backend issued
    pub fn status(&self, handle: HandleId) -> Option<HandleStatus> {
        self.inner.lock().clips.get(&handle).map(|c| c.status)
    }

    /// Asset a handle was loaded from
    pub fn source_of(&self, handle: HandleId) -> Option<AssetRef> {
        self.inner.lock().clips.get(&handle).map(|c| c.source.clone())
    }

    /// Handles issued so far, in load order
    pub fn issued_handles(&self) -> Vec<HandleId> {
        let inner = self.inner.lock();
        let mut ids: Vec<_> = inner.clips.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Handles still loaded (leaks, once the session has shut down)
    pub fn loaded_handles(&self) -> Vec<HandleId> {
        let inner = self.inner.lock();
        let mut ids: Vec<_> = inner
            .clips
            .iter()
            .filter(|(_, c)| c.status.is_loaded)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Handles currently playing
    pub fn playing_handles(&self) -> Vec<HandleId> {
        let inner = self.inner.lock();
        let mut ids: Vec<_> = inner
            .clips
            .iter()
            .filter(|(_, c)| c.status.is_loaded && c.status.is_playing)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Number of successful unloads of a handle
    pub fn unload_count(&self, handle: HandleId) -> usize {
        self.inner.lock().clips.get(&handle).map_or(0, |c| c.unloads)
    }

    /// Last audio mode applied
    pub fn mode(&self) -> Option<AudioMode> {
        self.inner.lock().mode
    }

    async fn enter(&self, call: AudioCall) {
        let op = call.op();
        self.inner.lock().calls.push(call);
        let gate = self.gates.lock().get(&op).cloned();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            // Closed semaphore means the gate was released
            let _ = gate.open.acquire().await;
        }
    }

    fn update(
        &self,
        op: Op,
        id: HandleId,
        apply: impl FnOnce(&mut HandleStatus),
    ) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.should_fail(op, None, Some(id)) {
            return Err(CalmError::playback(format!("{:?} rejected for {}", op, id)));
        }
        let clip = inner.live_clip(id)?;
        apply(&mut clip.status);
        Ok(())
    }
}

#[async_trait]
impl AudioService for RecordingAudioService {
    async fn configure_mode(&self, mode: AudioMode) -> Result<()> {
        self.enter(AudioCall::ConfigureMode(mode)).await;
        let mut inner = self.inner.lock();
        if inner.should_fail(Op::ConfigureMode, None, None) {
            return Err(CalmError::config("audio mode rejected"));
        }
        inner.mode = Some(mode);
        Ok(())
    }

    async fn load(&self, source: &AssetRef, options: LoadOptions) -> Result<PlaybackHandle> {
        self.enter(AudioCall::Load(source.clone())).await;
        let mut inner = self.inner.lock();
        if inner.should_fail(Op::Load, Some(source), None) {
            return Err(CalmError::load(format!("cannot load {}", source)));
        }
        inner.next_id += 1;
        let id = HandleId::new(inner.next_id);
        inner.clips.insert(
            id,
            Clip {
                source: source.clone(),
                status: HandleStatus {
                    is_loaded: true,
                    is_playing: options.should_play,
                    is_looping: options.looping,
                    volume: options.volume,
                },
                unloads: 0,
            },
        );
        Ok(PlaybackHandle::new(id))
    }

    async fn play(&self, handle: HandleId) -> Result<()> {
        self.enter(AudioCall::Play(handle)).await;
        self.update(Op::Play, handle, |s| s.is_playing = true)
    }

    async fn stop(&self, handle: HandleId) -> Result<()> {
        self.enter(AudioCall::Stop(handle)).await;
        self.update(Op::Stop, handle, |s| s.is_playing = false)
    }

    async fn set_volume(&self, handle: HandleId, volume: f32) -> Result<()> {
        self.enter(AudioCall::SetVolume(handle, volume)).await;
        self.update(Op::SetVolume, handle, |s| s.volume = volume)
    }

    async fn set_looping(&self, handle: HandleId, looping: bool) -> Result<()> {
        self.enter(AudioCall::SetLooping(handle, looping)).await;
        self.update(Op::SetLooping, handle, |s| s.is_looping = looping)
    }

    async fn unload(&self, handle: PlaybackHandle) -> Result<()> {
        let id = handle.id();
        self.enter(AudioCall::Unload(id)).await;
        let mut inner = self.inner.lock();
        if inner.should_fail(Op::Unload, None, Some(id)) {
            return Err(CalmError::playback(format!("unload rejected for {}", id)));
        }
        let clip = inner.live_clip(id)?;
        clip.status = HandleStatus::unloaded();
        clip.unloads += 1;
        Ok(())
    }

    async fn query_status(&self, handle: HandleId) -> Result<HandleStatus> {
        self.enter(AudioCall::QueryStatus(handle)).await;
        let mut inner = self.inner.lock();
        if inner.should_fail(Op::QueryStatus, None, Some(handle)) {
            return Err(CalmError::status_query(format!("probe failed for {}", handle)));
        }
        match inner.clips.get(&handle) {
            Some(clip) if clip.status.is_loaded => Ok(clip.status),
            _ => Err(CalmError::status_query(format!("{} is not loaded", handle))),
        }
    }
}
