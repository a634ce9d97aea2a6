//! Capture/analyze orchestration — the state machine at the heart of the
//! system.
//!
//! One toggle-triggered cycle walks Idle → Showing → Capturing → Analyzing
//! → Displaying → Idle. The machine guarantees three things:
//!
//! 1. Strict ordering: the overlay is hidden (and its exclusion attribute
//!    cleared) before the screen is read, so the overlay never appears in
//!    its own input image, and exclusion is re-asserted before it comes
//!    back.
//! 2. Single-flight: at most one cycle is ever in flight; a toggle during
//!    a cycle dismisses its visual effect instead of queueing a second one.
//! 3. Stale-result discard: there is no cancellation token for the remote
//!    call — a superseded cycle's continuation compares its session
//!    generation against the current one and drops the result without
//!    touching the overlay.
//!
//! All state/overlay mutations happen under one lock, so a dismissal can
//! never interleave between a state transition and its overlay effect.
//! Overlay backend calls are non-blocking posts, which keeps the critical
//! sections short.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::capture::FrameSource;
use crate::llm::Analyzer;
use crate::overlay::Overlay;

/// Shown while the capture step runs.
pub const ANALYZING_MESSAGE: &str = "Analyzing screen...";

/// Shown while the analysis request is in flight.
pub const PROCESSING_MESSAGE: &str = "Processing image...";

/// Initial overlay content before the first cycle.
pub const IDLE_MESSAGE: &str = "Press Ctrl+Alt+B to analyze screen";

/// Wait between hiding the overlay and reading pixels. The window system
/// gives no completion signal for a hide, so this is a best-effort bound,
/// not a barrier.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Lifecycle of the single capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Showing,
    Capturing,
    Analyzing,
    Displaying,
}

struct Inner {
    overlay: Arc<Overlay>,
    frames: Arc<dyn FrameSource>,
    analyzer: Arc<dyn Analyzer>,
    state: Mutex<SessionState>,
    /// Session generation. Bumped when a cycle starts and when one is
    /// dismissed; the only word shared between the toggle path and a
    /// cycle's completion continuation.
    generation: AtomicU64,
    settle_delay: Duration,
}

/// Cloneable handle driving the state machine. Clones share one session.
#[derive(Clone)]
pub struct CaptureOrchestrator {
    inner: Arc<Inner>,
}

impl CaptureOrchestrator {
    pub fn new(
        overlay: Arc<Overlay>,
        frames: Arc<dyn FrameSource>,
        analyzer: Arc<dyn Analyzer>,
    ) -> Self {
        Self::with_settle_delay(overlay, frames, analyzer, SETTLE_DELAY)
    }

    /// Like `new` with an explicit settle delay. Tests pass
    /// `Duration::ZERO` so cycles run without wall-clock waits.
    pub fn with_settle_delay(
        overlay: Arc<Overlay>,
        frames: Arc<dyn FrameSource>,
        analyzer: Arc<dyn Analyzer>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                overlay,
                frames,
                analyzer,
                state: Mutex::new(SessionState::Idle),
                generation: AtomicU64::new(0),
                settle_delay,
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.lock().unwrap()
    }

    /// The one external transition trigger. Must run inside a tokio
    /// runtime (the cycle task is spawned from here).
    ///
    /// - Mid-cycle: dismiss — hide the overlay, drop back to Idle, let any
    ///   pending network call finish into the void.
    /// - Idle with a result still on screen: just hide it (matches the
    ///   hotkey's show/hide feel).
    /// - Idle and hidden: start a new cycle.
    pub fn toggle(&self) {
        let inner = &self.inner;
        let mut state = inner.state.lock().unwrap();

        if *state != SessionState::Idle {
            inner.generation.fetch_add(1, Ordering::SeqCst);
            *state = SessionState::Idle;
            inner.overlay.hide();
            log::info!("[ORCH] cycle dismissed");
            return;
        }

        if inner.overlay.is_visible() {
            inner.overlay.hide();
            log::info!("[ORCH] overlay hidden");
            return;
        }

        let session = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *state = SessionState::Showing;
        inner.overlay.show(ANALYZING_MESSAGE, true);
        drop(state);

        log::info!("[ORCH] session {} started", session);
        tokio::spawn(run_cycle(Arc::clone(inner), session));
    }
}

impl Inner {
    fn is_current(&self, session: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == session
    }

    /// Transition to `next` and apply the matching overlay effect,
    /// atomically with the session check. Returns false when the session
    /// has been superseded, in which case nothing happens.
    fn advance(
        &self,
        session: u64,
        next: SessionState,
        apply: impl FnOnce(&Overlay),
    ) -> bool {
        let mut state = self.state.lock().unwrap();
        if !self.is_current(session) {
            return false;
        }
        *state = next;
        apply(&self.overlay);
        true
    }

    /// Terminal transition: write the result (or error text) into the
    /// overlay, pass through Displaying, settle at Idle. A stale session's
    /// result is discarded without touching the overlay.
    fn finish(&self, session: u64, text: String) {
        let mut state = self.state.lock().unwrap();
        if !self.is_current(session) {
            log::info!("[ORCH] session {} superseded, result discarded", session);
            return;
        }
        *state = SessionState::Displaying;
        self.overlay.show(&text, false);
        *state = SessionState::Idle;
        log::info!("[ORCH] session {} displayed ({} chars)", session, text.len());
    }
}

/// One capture/analyze cycle, spawned per session. Every await point is
/// followed by a generation check before the overlay is touched again.
async fn run_cycle(inner: Arc<Inner>, session: u64) {
    // Capturing: hide the overlay and drop its exclusion attribute — a
    // hidden window has nothing to exclude, and clearing avoids leaving
    // stale OS state behind.
    let entered = inner.advance(session, SessionState::Capturing, |overlay| {
        overlay.hide();
        overlay.guard().clear();
    });
    if !entered {
        return;
    }

    tokio::time::sleep(inner.settle_delay).await;
    if !inner.is_current(session) {
        return;
    }

    let frames = Arc::clone(&inner.frames);
    let payload = match tokio::task::spawn_blocking(move || frames.capture()).await {
        Ok(Ok(payload)) => payload,
        Ok(Err(e)) => return inner.finish(session, format!("Screenshot error: {}", e)),
        Err(e) => return inner.finish(session, format!("Screenshot error: {}", e)),
    };

    // Analyzing: overlay comes back with progress text (exclusion is
    // re-asserted inside show) while the request runs.
    let entered = inner.advance(session, SessionState::Analyzing, |overlay| {
        overlay.show(PROCESSING_MESSAGE, true);
    });
    if !entered {
        return;
    }

    let text = match inner.analyzer.analyze(payload).await {
        Ok(text) => text,
        Err(e) => e.to_string(),
    };
    inner.finish(session, text);
}
