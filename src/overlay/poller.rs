//! Foreground-window poller — defensive re-assertion loop.
//!
//! Certain capture tools invalidate the exclusion attribute when they
//! re-query window state. Every 200 ms this loop reads the foreground
//! window title, and if a known capture tool looks active while the
//! overlay is visible, re-asserts exclusion. The eager assertion on each
//! visibility transition in `Overlay::show` remains the primary mechanism;
//! this is the backstop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::Overlay;

/// Trade-off between CPU cost and re-assertion latency, not a hard
/// requirement of the design.
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Window/process names of known screen-capture tools, matched
/// case-insensitively as title substrings and as exact window lookups.
pub const CAPTURE_TOOL_NAMES: &[&str] = &[
    "SnippingTool",
    "ScreenClippingHost",
    "SnipIt",
    "Snip & Sketch",
];

/// Read-only view of foreground-window state.
///
/// The production implementation queries the OS; tests script it.
pub trait ForegroundInspector: Send + Sync {
    /// Title of the current foreground window, if any.
    fn foreground_title(&self) -> Option<String>;

    /// Whether any top-level window with exactly this title exists.
    fn window_with_title_exists(&self, title: &str) -> bool;
}

/// Handle to the running poll loop.
pub struct ForegroundPoller {
    shutdown: Arc<AtomicBool>,
    handle: tokio::task::JoinHandle<()>,
}

impl ForegroundPoller {
    /// Start polling. The task runs for the lifetime of the process and
    /// never terminates on a transient failure; only the shutdown flag
    /// stops it.
    pub fn spawn(inspector: Arc<dyn ForegroundInspector>, overlay: Arc<Overlay>) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(POLL_INTERVAL);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                tick(inspector.as_ref(), &overlay);
            }
            log::debug!("[POLLER] loop stopped");
        });

        log::info!(
            "[POLLER] watching for {} capture tools every {:?}",
            CAPTURE_TOOL_NAMES.len(),
            POLL_INTERVAL
        );

        Self { shutdown, handle }
    }

    /// Stop the loop, waiting at most one second for it to wind down.
    /// The poller must never hold up process teardown.
    pub async fn shutdown(self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if tokio::time::timeout(Duration::from_secs(1), self.handle)
            .await
            .is_err()
        {
            log::debug!("[POLLER] did not stop within 1s, abandoning");
        }
    }
}

/// One poll iteration. Infallible: inspector reads return options/bools,
/// and the guard swallows affinity failures, so nothing here can take the
/// loop down.
fn tick(inspector: &dyn ForegroundInspector, overlay: &Overlay) {
    if !overlay.is_visible() {
        return;
    }
    if capture_tool_active(inspector) {
        overlay.guard().exclude();
    }
}

fn capture_tool_active(inspector: &dyn ForegroundInspector) -> bool {
    let title = inspector
        .foreground_title()
        .unwrap_or_default()
        .to_lowercase();

    CAPTURE_TOOL_NAMES.iter().any(|tool| {
        title.contains(&tool.to_lowercase()) || inspector.window_with_title_exists(tool)
    })
}
