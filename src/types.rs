//! Core data types, enums, and reports for the cbz2epub conversion library.
//!
//! This module defines the fundamental data structures used throughout the crate:
//! - Normalization parameters (`NormalizeOptions`)
//! - Static package metadata (`EbookMetadata`)
//! - Policies for page ordering and batch failures (`PageOrder`, `FailurePolicy`)
//! - Batch traversal and outcome types (`ArchiveGroup`, `BatchReport`, `ArchiveFailure`)
//! - File classification helpers for archives and page images

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Extensions (lowercase) of files treated as page images.
pub const PAGE_IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Extension (lowercase) of files treated as comic-book archives.
pub const ARCHIVE_EXTENSION: &str = "cbz";

/// Parameters controlling how page images are recompressed.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalizeOptions {
    /// Lossy encoding quality, 1-100.
    pub quality: u8,
    /// Images taller than this are downsampled to exactly this height.
    pub max_height: u32,
}

impl NormalizeOptions {
    pub const DEFAULT_QUALITY: u8 = 80;
    pub const DEFAULT_MAX_HEIGHT: u32 = 1024;

    /// Checks that the options describe an encodable target.
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.quality) {
            return Err(Error::Other(format!(
                "Quality must be between 1 and 100, got {}",
                self.quality
            )));
        }
        if self.max_height == 0 {
            return Err(Error::Other("Max height must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            quality: Self::DEFAULT_QUALITY,
            max_height: Self::DEFAULT_MAX_HEIGHT,
        }
    }
}

/// Metadata embedded into every generated package.
///
/// These values are static; nothing is derived from the archive being converted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EbookMetadata {
    pub identifier: String,
    pub title: String,
    pub language: String,
    pub author: String,
}

impl Default for EbookMetadata {
    fn default() -> Self {
        Self {
            identifier: "id123456".to_string(),
            title: "Converted Images".to_string(),
            language: "en".to_string(),
            author: "Author".to_string(),
        }
    }
}

/// How page images found in an extracted archive are ordered.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PageOrder {
    /// Depth-first walk; each directory's files are sorted by name and come
    /// before its subdirectories, which are visited in name order.
    #[default]
    PerDirectory,
    /// All qualifying images sorted by their full path relative to the root.
    Global,
}

/// What the batch driver does when one archive fails.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FailurePolicy {
    /// Record the failure, keep converting the remaining archives.
    #[default]
    Isolate,
    /// Abort the whole batch on the first failing archive.
    FailFast,
}

/// Specifies the intended entry point of a conversion.
/// Used by `ConverterConfig::preflight_check` to tailor validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionMode {
    /// Walk `input_path` and convert every archive found.
    Batch,
    /// Convert a single archive handed in by the caller.
    SingleArchive,
}

/// All archives found directly inside one directory of the input tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveGroup {
    /// Directory path relative to the input root (empty for the root itself).
    pub relative_dir: PathBuf,
    /// Archive paths, sorted by file name.
    pub archives: Vec<PathBuf>,
}

/// A single archive that could not be converted.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ArchiveFailure {
    pub archive: PathBuf,
    pub message: String,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BatchReport {
    /// Output files written, in processing order.
    pub converted: Vec<PathBuf>,
    /// Archives that failed under `FailurePolicy::Isolate`.
    pub failures: Vec<ArchiveFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Returns the lowercase extension of `path`, if it is valid UTF-8.
fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Whether `path` names a page image (case-insensitive png/jpg/jpeg).
pub fn is_page_image(path: &Path) -> bool {
    lowercase_extension(path)
        .is_some_and(|ext| PAGE_IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether `path` names a comic-book archive (case-insensitive `.cbz`).
pub fn is_archive(path: &Path) -> bool {
    lowercase_extension(path).is_some_and(|ext| ext == ARCHIVE_EXTENSION)
}

/// Utility function: Determines file type and MIME type from a file path
///
/// # Returns
///
/// * `Ok((&str, &str))` - A tuple containing (file extension, MIME type)
/// * `Err(Error)` - An error if the file format is unsupported
pub fn get_file_info(image_path: &Path) -> Result<(&'static str, &'static str)> {
    match lowercase_extension(image_path).as_deref() {
        Some("jpg") | Some("jpeg") => Ok(("jpg", "image/jpeg")),
        Some("png") => Ok(("png", "image/png")),
        other => Err(Error::Unsupported(format!("Image format {:#?}", other))),
    }
}

/// Media type for an image payload, sniffed from its bytes.
///
/// Normalized pages keep their original extension but carry lossy-encoded
/// bytes, so the content wins over the file name. Falls back to the
/// extension when the bytes are not recognised.
pub fn media_type_for(image_path: &Path, bytes: &[u8]) -> Result<&'static str> {
    match image::guess_format(bytes) {
        Ok(format) => Ok(format.to_mime_type()),
        Err(_) => get_file_info(image_path).map(|(_, mime)| mime),
    }
}
