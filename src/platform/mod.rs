//! Platform backends.
//!
//! The capture-exclusion attribute, global hotkeys, and foreground-window
//! inspection are OS primitives; only the Win32 implementation exists
//! today. Everything above this module talks to traits
//! (`OverlayBackend`, `HotkeyBackend`, `ForegroundInspector`), so the
//! core builds and tests on any platform.

#[cfg(target_os = "windows")]
pub mod windows;
