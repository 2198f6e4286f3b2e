//! Still-image encoding for captured frames — functional core.
//!
//! Pixel data in, PNG bytes out. No filesystem, no OS calls.

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::DynamicImage;

/// Encodes a grabbed screen image as PNG.
///
/// Uses the encoder's default compression with adaptive filtering, which
/// keeps full-screen frames small without blowing the capture period.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, FrameEncodeError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(FrameEncodeError::ZeroDimension);
    }

    let mut png_bytes: Vec<u8> = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut png_bytes, CompressionType::Default, FilterType::Adaptive);
    image
        .write_with_encoder(encoder)
        .map_err(|e| FrameEncodeError::EncodingFailed(e.to_string()))?;

    Ok(png_bytes)
}

#[derive(Debug, thiserror::Error)]
pub enum FrameEncodeError {
    #[error("Captured image has zero width or height")]
    ZeroDimension,

    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    #[test]
    fn encodes_png_with_magic_bytes() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(64, 48));
        let bytes = encode_png(&img).unwrap();
        // PNG magic bytes
        assert_eq!(&bytes[..4], &[0x89, 0x50, 0x4E, 0x47]);
    }

    #[test]
    fn encoded_frame_decodes_to_same_pixels() {
        let mut rgba = RgbaImage::new(8, 4);
        rgba.put_pixel(3, 2, Rgba([10, 20, 30, 255]));
        let bytes = encode_png(&DynamicImage::ImageRgba8(rgba)).unwrap();

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (8, 4));
        assert_eq!(decoded.get_pixel(3, 2), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn zero_dimension_fails() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(0, 10));
        let result = encode_png(&img);
        assert!(matches!(result, Err(FrameEncodeError::ZeroDimension)));
    }
}
