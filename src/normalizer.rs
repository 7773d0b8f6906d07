//! Page image normalization.
//!
//! Every page image found below a directory is decoded, flattened to a color
//! model the lossy encoder accepts, downsampled when taller than the configured
//! maximum, and rewritten in place as JPEG at the configured quality. The file
//! keeps its original name and extension.

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use log::debug;

use crate::collector::Collector;
use crate::error::{Error, Result};
use crate::types::{NormalizeOptions, PageOrder};

/// Recompresses and resizes page images according to [`NormalizeOptions`].
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    options: NormalizeOptions,
}

impl Normalizer {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// Normalizes every page image below `directory`.
    ///
    /// The first image that fails to decode or encode aborts the run; no
    /// image is skipped.
    ///
    /// # Returns
    ///
    /// * `Result<usize>` - Number of images rewritten
    pub fn normalize_directory(&self, directory: &Path) -> Result<usize> {
        self.options.validate()?;

        let pages = Collector::new(directory, PageOrder::PerDirectory).collect_pages()?;
        for page in &pages {
            self.normalize_image(page)?;
        }
        Ok(pages.len())
    }

    /// Normalizes a single image file in place.
    pub fn normalize_image(&self, path: &Path) -> Result<()> {
        let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        let (width, height) = (image.width(), image.height());

        let mut image = Self::flatten_color(image);
        if let Some((new_width, new_height)) =
            Self::target_dimensions(width, height, self.options.max_height)
        {
            debug!(
                "Resizing {} from {}x{} to {}x{}",
                path.display(),
                width,
                height,
                new_width,
                new_height
            );
            image = image.resize_exact(new_width, new_height, FilterType::Lanczos3);
        }

        let bytes = Self::encode_lossy(&image, self.options.quality)?;
        std::fs::write(path, bytes).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to rewrite image '{}': {}", path.display(), e),
            ))
        })?;
        Ok(())
    }

    /// Converts an image to a color model JPEG can store.
    ///
    /// Indexed PNGs are expanded by the decoder, so they arrive here as RGB or
    /// RGBA and always leave as 8-bit RGB. Alpha is dropped. Grayscale stays
    /// 8-bit grayscale.
    pub fn flatten_color(image: DynamicImage) -> DynamicImage {
        match image {
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => image,
            DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_) => DynamicImage::ImageLuma8(image.to_luma8()),
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        }
    }

    /// Computes the downsampled size for an image, or `None` when it already fits.
    ///
    /// The height becomes exactly `max_height`; the width is scaled by the
    /// same factor and rounded, never below one pixel.
    pub fn target_dimensions(width: u32, height: u32, max_height: u32) -> Option<(u32, u32)> {
        if height <= max_height {
            return None;
        }
        let scale = max_height as f64 / height as f64;
        let new_width = (width as f64 * scale).round() as u32;
        Some((new_width.max(1), max_height))
    }

    /// Encodes an image as JPEG at the given quality.
    pub fn encode_lossy(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
        image.write_with_encoder(encoder)?;
        Ok(buffer)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizeOptions::default())
    }
}
