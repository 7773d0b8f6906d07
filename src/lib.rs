//! cbz2epub - Comic Archive to EPUB Conversion Library
//!
//! This crate converts comic-book archives (ZIP files of page images, `.cbz`)
//! into minimal reflowable EPUB packages with one image per chapter. Pages are
//! recompressed to JPEG and downsampled to a maximum height on the way.
//!
//! # Getting Started
//!
//! Configure a conversion with [`ConverterConfig::builder`], then run it over
//! a whole directory tree with `convert_folder`. The output tree mirrors the
//! input tree: `in/seriesA/vol1.cbz` becomes `out/seriesA/vol1.epub`.
//!
//! ```rust,no_run
//! use cbz2epub::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> cbz2epub::error::Result<()> {
//!     let config = ConverterConfig::builder()
//!         .input_path(PathBuf::from("./comics"))
//!         .output_path(PathBuf::from("./ebooks"))
//!         .quality(80u8)
//!         .max_height(1024u32)
//!         .failure_policy(FailurePolicy::Isolate)
//!         .build()?;
//!
//!     // Optional: validate paths before any archive is touched
//!     config.preflight_check(ConversionMode::Batch)?;
//!
//!     let report = config.convert_folder().await?;
//!     for failure in &report.failures {
//!         eprintln!("{}: {}", failure.archive.display(), failure.message);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The pipeline stages are usable on their own: [`collector::Collector`] for
//! enumeration, [`normalizer::Normalizer`] for image recompression and
//! [`generator::epub::EPub`] for package assembly.

pub mod collector;
pub mod converter;
pub mod error;
pub mod generator;
pub mod normalizer;
pub mod types;

pub use converter::ConverterConfig;
pub use converter::ConverterConfigBuilder;

pub use types::{
    ArchiveFailure, ArchiveGroup, BatchReport, ConversionMode, EbookMetadata, FailurePolicy,
    NormalizeOptions, PageOrder,
};

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and traits, allowing you to
/// import everything you need with a single `use cbz2epub::prelude::*;` statement.
pub mod prelude {
    pub use super::{
        ArchiveFailure, ArchiveGroup, BatchReport, ConversionMode, ConverterConfig,
        ConverterConfigBuilder, EbookMetadata, FailurePolicy, NormalizeOptions, PageOrder, error,
        generator, types,
    };
    pub use crate::collector::Collector;
    pub use crate::generator::Generator;
    pub use crate::normalizer::Normalizer;
    pub use std::path::{Path, PathBuf};
}
