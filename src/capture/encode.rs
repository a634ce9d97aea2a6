//! Pure image encoding — functional core.
//!
//! This module has zero infrastructure dependencies.
//! It takes pixel data in, returns transport-ready bytes out.

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use super::CaptureError;

/// One screenshot, PNG-encoded, ready for transport.
///
/// Produced once per capture cycle and consumed exactly once by the
/// analysis client (methods that build the request take `self` by value
/// downstream, the buffer itself never mutates).
#[derive(Debug, Clone)]
pub struct ImagePayload {
    png: Vec<u8>,
}

impl ImagePayload {
    /// Encode a captured frame as PNG.
    pub fn from_image(image: &DynamicImage) -> Result<Self, CaptureError> {
        let mut png: Vec<u8> = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| CaptureError::EncodingFailed(e.to_string()))?;
        Ok(Self { png })
    }

    /// Wrap bytes that are already PNG-encoded (tests, canned fixtures).
    pub fn from_png_bytes(png: Vec<u8>) -> Self {
        Self { png }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.png
    }

    /// Base64 of the PNG bytes, no URI prefix.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.png)
    }

    /// `data:` URI suitable for embedding in an `image_url` request part.
    pub fn to_data_uri(&self) -> String {
        format!("data:image/png;base64,{}", self.to_base64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn test_image() -> DynamicImage {
        let mut img = RgbaImage::new(8, 8);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = Rgba([x as u8 * 30, y as u8 * 30, (x + y) as u8, 255]);
        }
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn payload_starts_with_png_magic() {
        let payload = ImagePayload::from_image(&test_image()).unwrap();
        assert_eq!(&payload.as_bytes()[..4], &[0x89, 0x50, 0x4E, 0x47]);
    }

    #[test]
    fn base64_png_round_trip_preserves_pixels() {
        let original = test_image();
        let payload = ImagePayload::from_image(&original).unwrap();

        let decoded_bytes = STANDARD.decode(payload.to_base64()).unwrap();
        let decoded = image::load_from_memory(&decoded_bytes).unwrap();

        assert_eq!(decoded.to_rgba8().as_raw(), original.to_rgba8().as_raw());
    }

    #[test]
    fn data_uri_has_png_prefix() {
        let payload = ImagePayload::from_image(&test_image()).unwrap();
        let uri = payload.to_data_uri();
        assert!(uri.starts_with("data:image/png;base64,"));
        assert!(uri.len() > "data:image/png;base64,".len());
    }
}
