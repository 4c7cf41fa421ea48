use std::io::Cursor;

use base64::{engine::general_purpose, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use crate::errors::Result;

/// A normalized image ready for preview and transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

impl EncodedImage {
    /// Wire form expected by the grading server.
    pub fn data_uri(&self) -> String {
        format!(
            "data:image/jpeg;base64,{}",
            general_purpose::STANDARD.encode(&self.jpeg)
        )
    }
}

/// Bound an acquired image for transmission.
///
/// If the source is wider than `max_width` it is scaled down to `max_width`
/// with the aspect ratio preserved; otherwise dimensions are unchanged.
/// The result is always re-encoded as JPEG at `quality`.
pub fn normalize(bytes: &[u8], max_width: u32, quality: u8) -> Result<EncodedImage> {
    let decoded = image::load_from_memory(bytes)?;
    encode_bounded(&decoded, max_width, quality)
}

/// Same contract as [`normalize`] for an already-decoded image, used by the
/// camera capture path to avoid a decode round trip.
pub fn encode_bounded(
    decoded: &image::DynamicImage,
    max_width: u32,
    quality: u8,
) -> Result<EncodedImage> {
    let (src_width, src_height) = (decoded.width(), decoded.height());

    let (width, height) = if src_width > max_width {
        let scaled = (src_height as f64 * max_width as f64 / src_width as f64).round() as u32;
        (max_width, scaled.max(1))
    } else {
        (src_width, src_height)
    };

    // JPEG has no alpha channel, so flatten before encoding
    let rgb = if (width, height) == (src_width, src_height) {
        decoded.to_rgb8()
    } else {
        decoded
            .resize_exact(width, height, FilterType::Lanczos3)
            .to_rgb8()
    };

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(Cursor::new(&mut jpeg), quality).encode_image(&rgb)?;

    Ok(EncodedImage {
        width,
        height,
        jpeg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([120, 80, 40]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_wide_image_is_scaled_to_max_width() {
        let result = normalize(&png_bytes(3000, 2000), 1920, 80).unwrap();
        assert_eq!(result.width, 1920);
        assert_eq!(result.height, 1280);

        // The encoded payload really has the new dimensions
        let reloaded = image::load_from_memory(&result.jpeg).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (1920, 1280));
    }

    #[test]
    fn test_aspect_ratio_is_preserved_within_rounding() {
        let result = normalize(&png_bytes(2531, 1333), 1920, 80).unwrap();
        assert_eq!(result.width, 1920);
        let expected = 1333.0 * 1920.0 / 2531.0;
        assert!((result.height as f64 - expected).abs() <= 1.0);
    }

    #[test]
    fn test_image_at_or_under_max_width_keeps_dimensions() {
        let at_limit = normalize(&png_bytes(1920, 1080), 1920, 80).unwrap();
        assert_eq!((at_limit.width, at_limit.height), (1920, 1080));

        let small = normalize(&png_bytes(640, 480), 1920, 80).unwrap();
        assert_eq!((small.width, small.height), (640, 480));
    }

    #[test]
    fn test_output_is_always_jpeg() {
        let result = normalize(&png_bytes(100, 100), 1920, 80).unwrap();
        // JPEG SOI marker
        assert_eq!(&result.jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        assert!(normalize(b"definitely not an image", 1920, 80).is_err());
    }

    #[test]
    fn test_data_uri_prefix() {
        let result = normalize(&png_bytes(10, 10), 1920, 80).unwrap();
        assert!(result.data_uri().starts_with("data:image/jpeg;base64,"));
    }
}
