//! Generator module provides the trait and implementation for output packages.
//!
//! A generator receives page images one at a time, in reading order, and
//! writes a single output file when saved.

use crate::error::Result;
use crate::types::EbookMetadata;
use async_trait::async_trait;
use std::path::Path;

pub mod epub;

/// Common interface for output package generators.
#[async_trait]
pub trait Generator {
    /// Creates a new generator that will write to `output_file` on save.
    ///
    /// Nothing is written to disk until [`Generator::save`] is called.
    fn new(output_file: &Path) -> Result<Self>
    where
        Self: Sized;

    /// Sets the package-level metadata (identifier, title, language, author).
    fn set_metadata(&mut self, metadata: &EbookMetadata) -> Result<&mut Self>
    where
        Self: Sized;

    /// Appends a page to the document, after every page added so far.
    ///
    /// # Parameters
    /// * `image_path` - Path to the image file to add as a page
    ///
    /// # Returns
    /// * `Result<&mut Self>` - Self reference for method chaining, or an error if failed
    async fn add_page(&mut self, image_path: &Path) -> Result<&mut Self>
    where
        Self: Sized;

    /// Finalizes the document and writes it to the output file.
    ///
    /// Either the complete file is written or nothing is; an existing file at
    /// the output path is replaced.
    async fn save(self) -> Result<()>;
}
