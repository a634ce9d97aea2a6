//! Full-screen capture using the `xcap` crate.
//!
//! This is the infrastructure layer — it talks to the OS display surface.
//! The orchestrator guarantees the overlay is hidden before calling in,
//! so the overlay never appears in its own input image.

use image::DynamicImage;
use xcap::Monitor;

use super::{CaptureError, FrameSource, ImagePayload};

/// Captures the primary display via `xcap`.
pub struct PrimaryDisplaySource;

impl FrameSource for PrimaryDisplaySource {
    fn capture(&self) -> Result<ImagePayload, CaptureError> {
        let image = capture_primary_monitor()?;
        ImagePayload::from_image(&image)
    }
}

/// Snapshot the primary monitor's current pixel contents at full resolution.
///
/// If no monitor reports itself as primary, falls back to the first one
/// enumerated rather than failing the whole cycle.
pub fn capture_primary_monitor() -> Result<DynamicImage, CaptureError> {
    let monitors =
        Monitor::all().map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))?;

    let primary = monitors
        .into_iter()
        .find(|m| m.is_primary().unwrap_or(false))
        .or_else(|| {
            let all = Monitor::all().ok()?;
            all.into_iter().next()
        })
        .ok_or(CaptureError::NoPrimaryMonitor)?;

    let image = primary
        .capture_image()
        .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;

    Ok(DynamicImage::ImageRgba8(image))
}
