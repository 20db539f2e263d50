//! Image differencing - capability layer
//!
//! Isolates the region a student added on top of an original document image.
//! Pure image transforms; no grading semantics. Consumed by the orchestrator
//! for math_solution items only.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageFormat};
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult, ImageError};

/// Diff image plus the fraction of changed area
#[derive(Debug, Clone)]
pub struct DiffExtraction {
    pub image: DynamicImage,
    /// Changed pixels / total pixels, in [0, 1]
    pub diff_percentage: f64,
}

/// Extracts the student's added work by differencing an original and a
/// submitted image of the same document.
pub struct ImageDiffExtractor {
    /// Per-pixel luma difference counted as "changed" (0-255)
    pixel_threshold: u8,
    /// Margin added around the changed bounding box before cropping
    crop_margin: u32,
}

impl ImageDiffExtractor {
    pub fn new(config: &Config) -> Self {
        Self {
            pixel_threshold: config.diff_pixel_threshold,
            crop_margin: config.diff_crop_margin,
        }
    }

    /// Extract the cropped solution area from an image pair
    pub fn extract(
        &self,
        original: &DynamicImage,
        submitted: &DynamicImage,
    ) -> AppResult<DynamicImage> {
        Ok(self.extract_with_metadata(original, submitted)?.image)
    }

    /// Extract the cropped solution area along with the changed-area ratio.
    ///
    /// The caller is responsible for any resampling; images of different
    /// dimensions are rejected rather than silently distorted. When nothing
    /// changed, the full submitted image is returned as the solution area -
    /// the student may have worked outside any anticipated region.
    pub fn extract_with_metadata(
        &self,
        original: &DynamicImage,
        submitted: &DynamicImage,
    ) -> AppResult<DiffExtraction> {
        if original.dimensions() != submitted.dimensions() {
            return Err(AppError::image_mismatch(
                original.dimensions(),
                submitted.dimensions(),
            ));
        }

        let (width, height) = original.dimensions();
        let original_luma = original.to_luma8();
        let submitted_luma = submitted.to_luma8();

        // Changed-region bounding box over the per-pixel absolute difference
        let mut changed: u64 = 0;
        let mut min_x = width;
        let mut min_y = height;
        let mut max_x = 0u32;
        let mut max_y = 0u32;

        for y in 0..height {
            for x in 0..width {
                let a = original_luma.get_pixel(x, y).0[0];
                let b = submitted_luma.get_pixel(x, y).0[0];
                if a.abs_diff(b) > self.pixel_threshold {
                    changed += 1;
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }

        let total = u64::from(width) * u64::from(height);
        let diff_percentage = if total == 0 {
            0.0
        } else {
            changed as f64 / total as f64
        };

        if changed == 0 {
            debug!("no changed region found, returning full submitted image");
            return Ok(DiffExtraction {
                image: submitted.clone(),
                diff_percentage,
            });
        }

        let x0 = min_x.saturating_sub(self.crop_margin);
        let y0 = min_y.saturating_sub(self.crop_margin);
        let x1 = (max_x + self.crop_margin + 1).min(width);
        let y1 = (max_y + self.crop_margin + 1).min(height);

        debug!(
            "changed region {}x{} at ({}, {}), diff {:.2}%",
            x1 - x0,
            y1 - y0,
            x0,
            y0,
            diff_percentage * 100.0
        );

        Ok(DiffExtraction {
            image: submitted.crop_imm(x0, y0, x1 - x0, y1 - y0),
            diff_percentage,
        })
    }
}

/// Decode an image from an in-memory buffer (PNG, JPEG, ...)
pub fn decode_image(bytes: &[u8]) -> AppResult<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| {
        AppError::Image(ImageError::DecodeFailed {
            source: Box::new(e),
        })
    })
}

/// Encode an image as PNG bytes
pub fn encode_png(image: &DynamicImage) -> AppResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| {
            AppError::Image(ImageError::EncodeFailed {
                source: Box::new(e),
            })
        })?;
    Ok(bytes)
}
