//! Capture-exclusion guard.
//!
//! Wraps the OS primitive that marks a window as excluded from capture
//! output. The attribute can be invalidated by capture tools re-querying
//! window state, so the guard is built to be re-asserted freely: `exclude`
//! is called on every visibility transition and again by the foreground
//! poller whenever a capture tool looks active.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{DisplayAffinity, OverlayBackend};

pub struct CaptureAffinityGuard {
    backend: Arc<dyn OverlayBackend>,
    excluded: AtomicBool,
}

impl CaptureAffinityGuard {
    pub(crate) fn new(backend: Arc<dyn OverlayBackend>) -> Self {
        Self {
            backend,
            excluded: AtomicBool::new(false),
        }
    }

    /// Assert the capture-exclusion attribute. Idempotent and infallible:
    /// an OS that lacks the attribute leaves the overlay capturable, which
    /// is the documented degraded mode, not an error.
    pub fn exclude(&self) {
        match self.backend.set_affinity(DisplayAffinity::Excluded) {
            Ok(()) => {
                self.excluded.store(true, Ordering::SeqCst);
            }
            Err(e) => {
                log::debug!("[AFFINITY] exclusion not applied: {}", e);
            }
        }
        // Affinity changes can reset z-order; re-pin the window regardless.
        self.backend.raise();
    }

    /// Revert to normal capture visibility. Used only around the brief
    /// window-hidden capture step, where a stale attribute would otherwise
    /// linger in OS state.
    pub fn clear(&self) {
        if let Err(e) = self.backend.set_affinity(DisplayAffinity::Normal) {
            log::debug!("[AFFINITY] clear not applied: {}", e);
        }
        self.excluded.store(false, Ordering::SeqCst);
    }

    /// Last affinity the OS actually accepted.
    pub fn affinity(&self) -> DisplayAffinity {
        if self.excluded.load(Ordering::SeqCst) {
            DisplayAffinity::Excluded
        } else {
            DisplayAffinity::Normal
        }
    }
}
