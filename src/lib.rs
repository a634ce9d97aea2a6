//! screen-veil — capture-hidden screen analysis.
//!
//! A background utility with one trick: its response window is flagged
//! with the OS capture-exclusion attribute, so screen recorders and
//! sharing pipelines never see it while the physical display does.
//! Pressing the global hotkey snapshots the primary display (with the
//! overlay hidden so it never appears in its own input), sends the image
//! to a vision-capable inference endpoint, and shows the returned text in
//! the excluded window.
//!
//! Module map:
//! - `orchestrator` — the capture/analyze state machine (the core)
//! - `overlay` — overlay state, the capture-affinity guard, and the
//!   foreground re-assertion poller
//! - `capture` — primary-display snapshot and PNG/base64 encoding
//! - `llm` — the remote analysis client
//! - `hotkey` — global hotkey registration lifecycle
//! - `config` — environment-derived settings
//! - `platform` — the Win32 window, message loop, and OS bindings

pub mod capture;
pub mod config;
pub mod hotkey;
pub mod llm;
pub mod orchestrator;
pub mod overlay;
pub mod platform;
