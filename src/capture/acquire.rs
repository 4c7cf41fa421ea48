//! Input acquisition: the file half of the capture pipeline.
//!
//! Each acquisition is one asynchronous task with a single completion point:
//! read the file, decode + normalize off the UI thread, hand the result back
//! to the update loop.

use std::path::{Path, PathBuf};

use tokio::task;

use crate::capture::normalize::{normalize, EncodedImage};
use crate::errors::{AppError, Result};

/// Read an image file from disk and normalize it for transmission.
pub async fn acquire_from_path(path: PathBuf, max_width: u32, quality: u8) -> Result<EncodedImage> {
    let bytes = tokio::fs::read(&path).await?;

    // Decode and re-encode are CPU-bound
    task::spawn_blocking(move || normalize(&bytes, max_width, quality))
        .await
        .map_err(|e| AppError::Capture(format!("Acquisition task failed: {e}")))?
}

/// Whether a dropped path looks like an image file.
/// Non-image drops are silently ignored by the caller.
pub fn is_image_path(path: &Path) -> bool {
    image::ImageFormat::from_path(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_image_paths_are_recognized_by_extension() {
        assert!(is_image_path(Path::new("scan.jpg")));
        assert!(is_image_path(Path::new("scan.JPEG")));
        assert!(is_image_path(Path::new("scan.png")));
        assert!(!is_image_path(Path::new("notes.pdf")));
        assert!(!is_image_path(Path::new("answers.txt")));
        assert!(!is_image_path(Path::new("no_extension")));
    }

    #[tokio::test]
    async fn test_acquire_missing_file_is_an_error() {
        let result =
            acquire_from_path(PathBuf::from("/nonexistent/answer.png"), 1920, 80).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_acquire_normalizes_file_contents() {
        let dir = std::env::temp_dir();
        let path = dir.join("snapgrade_acquire_test.png");
        RgbImage::from_pixel(2400, 1200, Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let result = acquire_from_path(path.clone(), 1920, 80).await.unwrap();
        assert_eq!((result.width, result.height), (1920, 960));

        let _ = std::fs::remove_file(path);
    }
}
