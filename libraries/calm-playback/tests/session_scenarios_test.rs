//! Session manager scenarios
//!
//! Drives the session against the recording backend and checks both the
//! session tables and the exact platform calls issued.

use calm_core::{AssetRef, Category, SoundDescriptor};
use calm_playback::testing::{AudioCall, Op, RecordingAudioService};
use calm_playback::{
    Catalog, MixerConfig, MixerError, NotificationKind, SessionEvent, SessionManager, SoundPhase,
    ToggleOutcome,
};
use std::sync::{Arc, Once};

// ===== Test Helpers =====

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

fn catalog() -> Catalog {
    Catalog::new(vec![
        SoundDescriptor::new("Ocean", Category::Ambient, AssetRef::new("assets/ocean.mp3")),
        SoundDescriptor::new("Rain 01", Category::Ambient, AssetRef::new("assets/rain-01.mp3")),
        SoundDescriptor::new(
            "White Noise",
            Category::WhiteNoise,
            AssetRef::new("assets/white-noise.mp3"),
        ),
        SoundDescriptor::new("Fan", Category::WhiteNoise, AssetRef::new("assets/fan.mp3")),
    ])
    .unwrap()
}

fn session(preload: &[&str]) -> (Arc<RecordingAudioService>, SessionManager) {
    init_tracing();
    let service = Arc::new(RecordingAudioService::new());
    let session = SessionManager::new(
        service.clone(),
        catalog(),
        MixerConfig::with_preload(preload.iter().copied()),
    );
    (service, session)
}

fn last_handle(service: &RecordingAudioService) -> calm_core::HandleId {
    *service.issued_handles().last().expect("no handle issued")
}

fn notifications(session: &SessionManager) -> Vec<(NotificationKind, String)> {
    session
        .drain_events()
        .iter()
        .filter_map(SessionEvent::notification)
        .map(|n| (n.kind, n.sound.clone()))
        .collect()
}

// ===== Core Scenarios =====

#[tokio::test]
async fn preloaded_sound_is_promoted_without_loading() {
    let (service, session) = session(&["Ocean"]);
    assert_eq!(session.warm_preload().await, 1);
    let h1 = last_handle(&service);
    assert!(session.is_preloaded("Ocean"));
    assert_eq!(session.snapshot().preloaded, vec!["Ocean"]);
    service.clear_calls();

    let outcome = session.toggle("Ocean").await.unwrap();

    assert_eq!(outcome, ToggleOutcome::Started { promoted: true });
    let snap = session.snapshot();
    assert_eq!(snap.playing, vec!["Ocean"]);
    assert!(snap.preloaded.is_empty());
    assert_eq!(service.count(Op::Load), 0);
    assert_eq!(service.count(Op::Play), 1);
    assert_eq!(service.playing_handles(), vec![h1]);
    assert!(service.status(h1).unwrap().is_looping);
}

#[tokio::test]
async fn cold_sound_is_loaded_then_played() {
    let (service, session) = session(&["Ocean"]);
    session.warm_preload().await;
    service.clear_calls();

    let outcome = session.toggle("Rain 01").await.unwrap();

    assert_eq!(outcome, ToggleOutcome::Started { promoted: false });
    let h2 = last_handle(&service);
    assert_eq!(service.count(Op::Load), 1);
    assert_eq!(service.count(Op::Play), 1);
    assert_eq!(session.snapshot().playing, vec!["Rain 01"]);
    assert_eq!(session.phase("Rain 01"), SoundPhase::Playing);
    assert_eq!(service.source_of(h2), Some(AssetRef::new("assets/rain-01.mp3")));

    let status = service.status(h2).unwrap();
    assert!(status.is_playing);
    assert!(status.is_looping);
    assert_eq!(status.volume, 1.0);
}

#[tokio::test]
async fn volume_change_reaches_live_handle() {
    let (service, session) = session(&[]);
    session.toggle("Rain 01").await.unwrap();
    let h2 = last_handle(&service);
    service.clear_calls();

    session.set_volume("Rain 01", 0.3).await.unwrap();

    assert_eq!(session.recorded_volume("Rain 01"), Some(0.3));
    assert_eq!(session.snapshot().volume("Rain 01"), Some(0.3));
    assert_eq!(service.calls(), vec![AudioCall::SetVolume(h2, 0.3)]);
}

#[tokio::test]
async fn second_toggle_stops_and_keeps_volume() {
    let (service, session) = session(&[]);
    session.toggle("Rain 01").await.unwrap();
    let h2 = last_handle(&service);
    session.set_volume("Rain 01", 0.3).await.unwrap();
    service.clear_calls();

    let outcome = session.toggle("Rain 01").await.unwrap();

    assert_eq!(outcome, ToggleOutcome::Stopped);
    assert_eq!(session.snapshot().playing_count(), 0);
    assert_eq!(
        service.calls_for(h2),
        vec![
            AudioCall::QueryStatus(h2),
            AudioCall::Stop(h2),
            AudioCall::Unload(h2)
        ]
    );
    assert_eq!(session.recorded_volume("Rain 01"), Some(0.3));
}

#[tokio::test]
async fn stop_all_releases_every_sound_despite_a_failure() {
    let (service, session) = session(&[]);
    session.toggle("Ocean").await.unwrap();
    let ocean = last_handle(&service);
    session.toggle("Fan").await.unwrap();
    let fan = last_handle(&service);
    service.fail_handle(Op::Unload, fan);

    assert!(session.request_stop_all());
    assert!(session.snapshot().stop_modal_open);

    let stopped = session.stop_all().await.unwrap();

    assert_eq!(stopped, 2);
    let snap = session.snapshot();
    assert_eq!(snap.playing_count(), 0);
    assert!(!snap.stop_modal_open);
    for id in [ocean, fan] {
        let calls = service.calls_for(id);
        assert!(calls.contains(&AudioCall::Stop(id)));
        assert!(calls.contains(&AudioCall::Unload(id)));
    }
    assert!(service.playing_handles().is_empty());
    assert_eq!(service.unload_count(ocean), 1);
}

// ===== Properties =====

#[tokio::test]
async fn volume_set_while_off_applies_on_start() {
    let (service, session) = session(&[]);

    session.set_volume("Fan", 0.25).await.unwrap();
    assert_eq!(service.count(Op::SetVolume), 0);

    session.toggle("Fan").await.unwrap();
    let status = service.status(last_handle(&service)).unwrap();
    assert_eq!(status.volume, 0.25);
}

#[tokio::test]
async fn start_stop_round_trip_leaks_nothing() {
    let (service, session) = session(&["Ocean"]);
    session.warm_preload().await;

    for name in ["Ocean", "Rain 01", "Ocean"] {
        assert!(matches!(
            session.toggle(name).await.unwrap(),
            ToggleOutcome::Started { .. }
        ));
        assert_eq!(session.toggle(name).await.unwrap(), ToggleOutcome::Stopped);
        assert_eq!(session.phase(name), SoundPhase::Idle);
    }

    assert!(service.loaded_handles().is_empty());
    for id in service.issued_handles() {
        assert_eq!(service.unload_count(id), 1, "{id} unloaded once");
    }
}

#[tokio::test]
async fn stale_preload_falls_back_to_fresh_load() {
    let (service, session) = session(&["Ocean"]);
    session.warm_preload().await;
    let warm = last_handle(&service);
    service.invalidate(warm);
    service.clear_calls();

    let outcome = session.toggle("Ocean").await.unwrap();

    assert_eq!(outcome, ToggleOutcome::Started { promoted: false });
    assert_eq!(service.count(Op::Load), 1);
    assert_ne!(last_handle(&service), warm);
    assert!(!session.is_preloaded("Ocean"));
}

#[tokio::test]
async fn preload_warms_handles_silently() {
    let (service, session) = session(&["Ocean", "White Noise"]);
    assert_eq!(session.warm_preload().await, 2);

    assert_eq!(service.count(Op::ConfigureMode), 1);
    for id in service.issued_handles() {
        let status = service.status(id).unwrap();
        assert!(status.is_loaded);
        assert!(!status.is_playing);
        assert!(status.is_looping);
    }
    assert_eq!(session.snapshot().playing_count(), 0);
}

#[tokio::test]
async fn preload_failures_are_isolated() {
    let (service, session) = session(&["Ocean", "Whale Song", "Rain 01"]);
    service.fail_source(Op::Load, AssetRef::new("assets/ocean.mp3"));

    assert_eq!(session.warm_preload().await, 1);

    assert_eq!(session.snapshot().preloaded, vec!["Rain 01"]);
    assert_eq!(service.count(Op::Load), 2);
    assert!(notifications(&session).is_empty());
}

#[tokio::test]
async fn preload_runs_once() {
    let (service, session) = session(&["Ocean"]);
    assert_eq!(session.warm_preload().await, 1);
    assert_eq!(session.warm_preload().await, 0);
    assert_eq!(service.count(Op::Load), 1);
}

// ===== Failures =====

#[tokio::test]
async fn load_failure_notifies_and_resets_to_idle() {
    let (service, session) = session(&[]);
    service.fail_source(Op::Load, AssetRef::new("assets/rain-01.mp3"));

    let outcome = session.toggle("Rain 01").await.unwrap();

    assert_eq!(outcome, ToggleOutcome::Failed);
    assert_eq!(session.phase("Rain 01"), SoundPhase::Idle);
    assert_eq!(
        notifications(&session),
        vec![(NotificationKind::CannotPlay, "Rain 01".to_string())]
    );

    service.clear_failures();
    assert_eq!(
        session.toggle("Rain 01").await.unwrap(),
        ToggleOutcome::Started { promoted: false }
    );
}

#[tokio::test]
async fn play_failure_releases_handle() {
    let (service, session) = session(&[]);
    service.fail_once(Op::Play);

    let outcome = session.toggle("Ocean").await.unwrap();

    assert_eq!(outcome, ToggleOutcome::Failed);
    assert_eq!(session.phase("Ocean"), SoundPhase::Idle);
    assert_eq!(session.snapshot().playing_count(), 0);
    assert!(service.loaded_handles().is_empty());
    assert_eq!(
        notifications(&session),
        vec![(NotificationKind::CannotPlay, "Ocean".to_string())]
    );
}

#[tokio::test]
async fn failed_preload_preparation_fails_the_start() {
    let (service, session) = session(&["Ocean"]);
    session.warm_preload().await;
    let warm = last_handle(&service);
    service.fail_handle(Op::SetVolume, warm);

    let outcome = session.toggle("Ocean").await.unwrap();

    assert_eq!(outcome, ToggleOutcome::Failed);
    assert_eq!(session.phase("Ocean"), SoundPhase::Idle);
    assert!(!session.is_preloaded("Ocean"));
    assert_eq!(service.unload_count(warm), 1);
    assert_eq!(
        notifications(&session),
        vec![(NotificationKind::CannotPlay, "Ocean".to_string())]
    );
}

#[tokio::test]
async fn audio_mode_failure_does_not_block_playback() {
    let (service, session) = session(&[]);
    service.fail(Op::ConfigureMode);

    let outcome = session.toggle("Fan").await.unwrap();

    assert_eq!(outcome, ToggleOutcome::Started { promoted: false });
    assert!(notifications(&session).is_empty());
}

#[tokio::test]
async fn mode_is_reasserted_before_every_start() {
    let (service, session) = session(&[]);
    session.toggle("Fan").await.unwrap();
    session.toggle("Ocean").await.unwrap();

    assert_eq!(service.count(Op::ConfigureMode), 2);
    let mode = service.mode().unwrap();
    assert!(mode.allow_simultaneous);
    assert!(mode.continue_in_background);
}

#[tokio::test]
async fn live_volume_failure_keeps_recorded_level() {
    let (service, session) = session(&[]);
    session.toggle("Ocean").await.unwrap();
    service.fail(Op::SetVolume);

    session.set_volume("Ocean", 0.5).await.unwrap();

    assert_eq!(session.recorded_volume("Ocean"), Some(0.5));
    let kinds: Vec<_> = notifications(&session);
    assert_eq!(
        kinds,
        vec![(NotificationKind::VolumeNotApplied, "Ocean".to_string())]
    );
}

#[tokio::test]
async fn unload_failure_on_stop_is_not_surfaced() {
    let (service, session) = session(&[]);
    session.toggle("Ocean").await.unwrap();
    service.fail(Op::Unload);

    assert_eq!(session.toggle("Ocean").await.unwrap(), ToggleOutcome::Stopped);
    assert_eq!(session.phase("Ocean"), SoundPhase::Idle);
    assert!(notifications(&session).is_empty());
}

#[tokio::test]
async fn unknown_names_and_nan_are_rejected() {
    let (_service, session) = session(&[]);

    assert!(matches!(
        session.toggle("Whale Song").await,
        Err(MixerError::UnknownSound(name)) if name == "Whale Song"
    ));
    assert!(matches!(
        session.set_volume("Ocean", f32::NAN).await,
        Err(MixerError::InvalidVolume(_))
    ));
    assert!(matches!(
        session.stop_one("Whale Song").await,
        Err(MixerError::UnknownSound(_))
    ));
}

// ===== Stop one / modal =====

#[tokio::test]
async fn stop_one_only_stops_playing_sounds() {
    let (service, session) = session(&[]);
    session.toggle("Ocean").await.unwrap();
    session.toggle("Fan").await.unwrap();

    assert!(session.stop_one("Ocean").await.unwrap());
    assert!(!session.stop_one("Ocean").await.unwrap());
    assert!(!session.stop_one("Rain 01").await.unwrap());

    assert_eq!(session.snapshot().playing, vec!["Fan"]);
    assert_eq!(service.count(Op::Unload), 1);
}

#[tokio::test]
async fn stop_modal_needs_something_playing() {
    let (_service, session) = session(&[]);
    assert!(!session.request_stop_all());
    assert!(!session.snapshot().stop_modal_open);

    session.toggle("Ocean").await.unwrap();
    assert!(session.request_stop_all());
    session.dismiss_stop_modal();
    assert!(!session.snapshot().stop_modal_open);
    assert_eq!(session.snapshot().playing_count(), 1);
}

#[tokio::test]
async fn stop_all_with_nothing_playing_is_a_no_op() {
    let (service, session) = session(&[]);
    assert_eq!(session.stop_all().await.unwrap(), 0);
    assert!(service.calls().is_empty());
}

// ===== Master volume and mute =====

#[tokio::test]
async fn master_volume_scales_live_sounds() {
    let (service, session) = session(&[]);
    session.toggle("Ocean").await.unwrap();
    let ocean = last_handle(&service);
    session.set_volume("Ocean", 0.5).await.unwrap();

    session.set_master_volume(0.5).await.unwrap();
    assert!((service.status(ocean).unwrap().volume - 0.25).abs() < 1e-6);
    assert_eq!(session.recorded_volume("Ocean"), Some(0.5));

    assert!(session.toggle_master_mute().await.unwrap());
    assert_eq!(service.status(ocean).unwrap().volume, 0.0);
    assert!(session.snapshot().master_muted);

    assert!(!session.toggle_master_mute().await.unwrap());
    assert!((service.status(ocean).unwrap().volume - 0.25).abs() < 1e-6);
}

#[tokio::test]
async fn muted_sound_keeps_level_and_starts_silent() {
    let (service, session) = session(&[]);
    session.toggle("Ocean").await.unwrap();
    let ocean = last_handle(&service);
    session.set_volume("Ocean", 0.6).await.unwrap();

    assert!(session.toggle_mute("Ocean").await.unwrap());
    assert_eq!(service.status(ocean).unwrap().volume, 0.0);
    assert_eq!(session.snapshot().muted, vec!["Ocean"]);
    assert_eq!(session.recorded_volume("Ocean"), Some(0.6));

    assert!(!session.toggle_mute("Ocean").await.unwrap());
    assert_eq!(service.status(ocean).unwrap().volume, 0.6);

    session.set_muted("Fan", true).await.unwrap();
    session.toggle("Fan").await.unwrap();
    assert_eq!(service.status(last_handle(&service)).unwrap().volume, 0.0);
}

// ===== Tabs and events =====

#[tokio::test]
async fn category_selection_filters_sounds() {
    let (_service, session) = session(&[]);
    assert_eq!(session.snapshot().category, Category::Ambient);

    session.select_category(Category::WhiteNoise);

    let names: Vec<_> = session
        .sounds_for_active_category()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["White Noise", "Fan"]);
    assert_eq!(session.snapshot().category, Category::WhiteNoise);
    assert_eq!(
        session.drain_events(),
        vec![SessionEvent::CategoryChanged {
            category: Category::WhiteNoise
        }]
    );
}

#[tokio::test]
async fn lifecycle_events_are_queued() {
    let (_service, session) = session(&[]);
    session.toggle("Ocean").await.unwrap();
    session.toggle("Ocean").await.unwrap();

    assert!(session.has_pending_events());
    assert_eq!(
        session.drain_events(),
        vec![
            SessionEvent::SoundStarted {
                name: "Ocean".to_string(),
                promoted: false
            },
            SessionEvent::SoundStopped {
                name: "Ocean".to_string()
            },
        ]
    );
    assert!(!session.has_pending_events());
}

#[tokio::test]
async fn snapshot_reports_default_volumes() {
    let (_service, session) = session(&[]);
    session.set_volume("Fan", 0.2).await.unwrap();

    let snap = session.snapshot();
    assert_eq!(snap.volumes.len(), 4);
    assert_eq!(snap.volume("Fan"), Some(0.2));
    assert_eq!(snap.volume("Ocean"), Some(1.0));
    assert_eq!(snap.master_volume, 1.0);
}

// ===== Shutdown =====

#[tokio::test]
async fn shutdown_releases_everything_exactly_once() {
    let (service, session) = session(&["Ocean", "White Noise"]);
    session.warm_preload().await;
    session.toggle("Ocean").await.unwrap();
    session.toggle("Rain 01").await.unwrap();
    session.set_volume("Rain 01", 0.4).await.unwrap();

    assert!(session.shutdown().await);
    assert!(!session.shutdown().await);

    assert!(service.loaded_handles().is_empty());
    assert_eq!(service.issued_handles().len(), 3);
    for id in service.issued_handles() {
        assert_eq!(service.unload_count(id), 1, "{id} unloaded once");
    }

    let snap = session.snapshot();
    assert!(snap.shut_down);
    assert_eq!(snap.playing_count(), 0);
    assert!(snap.preloaded.is_empty());
}

#[tokio::test]
async fn commands_after_shutdown_are_rejected() {
    let (_service, session) = session(&[]);
    session.shutdown().await;

    assert!(matches!(
        session.toggle("Ocean").await,
        Err(MixerError::SessionShutDown)
    ));
    assert!(matches!(
        session.set_volume("Ocean", 0.5).await,
        Err(MixerError::SessionShutDown)
    ));
    assert!(matches!(
        session.stop_all().await,
        Err(MixerError::SessionShutDown)
    ));
    assert_eq!(session.warm_preload().await, 0);
    assert!(session.is_shut_down());
}
