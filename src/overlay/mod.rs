//! Overlay window domain — public API.
//!
//! The window itself (creation, layout, styling) belongs to the platform
//! layer; this module owns the state the rest of the system cares about:
//! whether the overlay is visible, what it shows, and whether the OS has
//! been told to keep it out of capture output.

mod affinity;
mod poller;

pub use affinity::CaptureAffinityGuard;
pub use poller::{ForegroundInspector, ForegroundPoller, CAPTURE_TOOL_NAMES, POLL_INTERVAL};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Per-window capture affinity as the OS sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayAffinity {
    /// Window appears in capture output normally.
    Normal,
    /// Capture and recording APIs omit the window's contents.
    Excluded,
}

#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    /// The OS rejected or does not implement the capture-exclusion
    /// attribute. Callers treat this as a no-op, never a hard failure.
    #[error("capture exclusion unavailable: {0}")]
    AffinityUnsupported(String),
}

/// Boundary to the windowing subsystem.
///
/// Every method may be called from any thread; implementations marshal
/// onto the one thread that owns the native window (the Win32 backend
/// posts messages to its UI thread, test backends just record).
pub trait OverlayBackend: Send + Sync {
    fn set_visible(&self, visible: bool);

    /// Replace the window's text. `loading` drives the progress indicator.
    fn set_content(&self, text: &str, loading: bool);

    /// Apply the capture-affinity attribute. Best-effort: an error means
    /// the attribute is unavailable, not that the window is broken.
    fn set_affinity(&self, affinity: DisplayAffinity) -> Result<(), OverlayError>;

    /// Re-pin the window topmost without moving or resizing it. Some
    /// affinity changes reset z-order, so this runs after each assertion.
    fn raise(&self);
}

/// The single response window, as the orchestrator and poller see it.
///
/// Owns no OS resources — the backend does. Tracks visibility in an atomic
/// so the poller can read it from its own task without locking.
pub struct Overlay {
    backend: Arc<dyn OverlayBackend>,
    guard: CaptureAffinityGuard,
    visible: AtomicBool,
}

impl Overlay {
    pub fn new(backend: Arc<dyn OverlayBackend>) -> Self {
        Self {
            guard: CaptureAffinityGuard::new(backend.clone()),
            backend,
            visible: AtomicBool::new(false),
        }
    }

    /// Show the overlay with the given content.
    ///
    /// Capture exclusion is re-asserted on every call, visible already or
    /// not — this is the primary exclusion mechanism; the foreground poller
    /// is only the defensive backstop.
    pub fn show(&self, text: &str, loading: bool) {
        self.backend.set_content(text, loading);
        if !self.visible.swap(true, Ordering::SeqCst) {
            self.backend.set_visible(true);
        }
        self.guard.exclude();
    }

    pub fn hide(&self) {
        if self.visible.swap(false, Ordering::SeqCst) {
            self.backend.set_visible(false);
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    pub fn guard(&self) -> &CaptureAffinityGuard {
        &self.guard
    }

    pub fn display_affinity(&self) -> DisplayAffinity {
        self.guard.affinity()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Backend that records every call and can simulate an OS without
    /// capture-affinity support.
    #[derive(Default)]
    pub struct RecordingBackend {
        pub affinity_unsupported: bool,
        pub visible_calls: Mutex<Vec<bool>>,
        pub affinity_calls: Mutex<Vec<DisplayAffinity>>,
        pub content_calls: Mutex<Vec<(String, bool)>>,
        pub raise_count: Mutex<usize>,
    }

    impl RecordingBackend {
        pub fn unsupported() -> Self {
            Self {
                affinity_unsupported: true,
                ..Default::default()
            }
        }

        pub fn exclusion_count(&self) -> usize {
            self.affinity_calls
                .lock()
                .unwrap()
                .iter()
                .filter(|a| **a == DisplayAffinity::Excluded)
                .count()
        }
    }

    impl OverlayBackend for RecordingBackend {
        fn set_visible(&self, visible: bool) {
            self.visible_calls.lock().unwrap().push(visible);
        }

        fn set_content(&self, text: &str, loading: bool) {
            self.content_calls
                .lock()
                .unwrap()
                .push((text.to_string(), loading));
        }

        fn set_affinity(&self, affinity: DisplayAffinity) -> Result<(), OverlayError> {
            if self.affinity_unsupported {
                return Err(OverlayError::AffinityUnsupported("not on this OS".into()));
            }
            self.affinity_calls.lock().unwrap().push(affinity);
            Ok(())
        }

        fn raise(&self) {
            *self.raise_count.lock().unwrap() += 1;
        }
    }
}
