//! Screen capture domain — public API.
//!
//! This module owns everything between "take a snapshot of the display"
//! and "hand the analysis client a transport-ready payload". External code
//! should only use the items exported here.

mod encode;
mod screenshot;

pub use encode::ImagePayload;
pub use screenshot::{capture_primary_monitor, PrimaryDisplaySource};

/// A source of full-screen snapshots.
///
/// The production implementation reads the primary display; tests substitute
/// canned frames or scripted failures. `capture` is synchronous and may
/// block for tens of milliseconds — callers on an async runtime should go
/// through `spawn_blocking`.
pub trait FrameSource: Send + Sync {
    fn capture(&self) -> Result<ImagePayload, CaptureError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Failed to enumerate monitors: {0}")]
    MonitorEnumeration(String),

    #[error("No primary monitor found")]
    NoPrimaryMonitor,

    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),

    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),
}
