//! Handle release
//!
//! Release paths never surface errors: the intent table was already updated,
//! so a failure here is only logged. Each handle is released on its own so
//! one failure cannot skip the others.

use calm_core::{AudioService, PlaybackHandle};
use futures_util::future::join_all;
use tracing::{debug, warn};

/// Stop and unload a handle that may be playing
///
/// Probes the handle first. A failed probe or an already-unloaded handle is
/// treated as released and dropped without further calls.
///
/// Returns true if the platform confirmed the unload.
pub(crate) async fn stop_and_unload(
    service: &dyn AudioService,
    name: &str,
    handle: PlaybackHandle,
) -> bool {
    let id = handle.id();
    match service.query_status(id).await {
        Ok(status) if status.is_loaded => {}
        Ok(_) => {
            debug!("{} ({}) already unloaded", name, id);
            return false;
        }
        Err(e) => {
            debug!("Status probe failed for {} ({}), treating as released: {}", name, id, e);
            return false;
        }
    }

    if let Err(e) = service.stop(id).await {
        warn!("Failed to stop {} ({}): {}", name, id, e);
    }
    unload(service, name, handle).await
}

/// Unload a handle that is known to be silent
pub(crate) async fn unload(service: &dyn AudioService, name: &str, handle: PlaybackHandle) -> bool {
    let id = handle.id();
    match service.unload(handle).await {
        Ok(()) => {
            debug!("Unloaded {} ({})", name, id);
            true
        }
        Err(e) => {
            warn!("Failed to unload {} ({}): {}", name, id, e);
            false
        }
    }
}

/// Stop and unload every handle concurrently, waiting for all to settle
///
/// Returns how many unloads succeeded.
pub(crate) async fn stop_and_unload_all(
    service: &dyn AudioService,
    handles: Vec<(String, PlaybackHandle)>,
) -> usize {
    let releases = handles
        .into_iter()
        .map(|(name, handle)| async move { stop_and_unload(service, &name, handle).await });
    join_all(releases).await.into_iter().filter(|ok| *ok).count()
}

/// Unload every silent handle concurrently, waiting for all to settle
pub(crate) async fn unload_all(
    service: &dyn AudioService,
    handles: Vec<(String, PlaybackHandle)>,
) -> usize {
    let releases = handles
        .into_iter()
        .map(|(name, handle)| async move { unload(service, &name, handle).await });
    join_all(releases).await.into_iter().filter(|ok| *ok).count()
}
