use std::fs::File;
use std::path::{Path, PathBuf};

use log::{debug, error, info};
use tokio::fs;
use tokio::task::spawn_blocking;
use zip::ZipArchive;

use crate::collector::Collector;
use crate::error::{Error, Result};
use crate::generator::{Generator, epub::EPub};
use crate::normalizer::Normalizer;
use crate::types::{
    ArchiveFailure, BatchReport, ConversionMode, EbookMetadata, FailurePolicy, NormalizeOptions,
    PageOrder,
};

/// Configuration of a CBZ to EPUB conversion, built declaratively using the builder pattern.
///
/// Once configured, it can run either entry point:
///
/// - [`convert_folder`](ConverterConfig::convert_folder): walk `input_path` and convert every archive
/// - [`convert_archive`](ConverterConfig::convert_archive): convert one archive
///
/// Archives are converted one after another; each one is extracted to its own
/// scratch directory, which is removed when the conversion ends, whether it
/// succeeded or not.
///
/// ```rust,no_run
/// # use cbz2epub::prelude::*;
/// # async fn run() -> cbz2epub::error::Result<()> {
/// let config = ConverterConfig::builder()
///     .input_path("./comics")
///     .output_path("./ebooks")
///     .quality(75u8)
///     .max_height(1600u32)
///     .build()?;
///
/// let report = config.convert_folder().await?;
/// println!("{} converted, {} failed", report.converted.len(), report.failures.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, derive_builder::Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ConverterConfig {
    /// Root directory scanned for `.cbz` archives.
    ///
    /// Required for [`convert_folder`](ConverterConfig::convert_folder).
    #[builder(default)]
    pub input_path: PathBuf,

    /// Root directory the output tree is mirrored into.
    #[builder(default)]
    pub output_path: PathBuf,

    /// Lossy re-encode quality (1-100).
    #[builder(default = "NormalizeOptions::DEFAULT_QUALITY")]
    pub quality: u8,

    /// Pages taller than this are downsampled to exactly this height.
    #[builder(default = "NormalizeOptions::DEFAULT_MAX_HEIGHT")]
    pub max_height: u32,

    /// Reading order of pages found in nested folders of an archive.
    #[builder(default)]
    pub page_order: PageOrder,

    /// Whether one failing archive aborts the batch.
    #[builder(default)]
    pub failure_policy: FailurePolicy,

    /// Metadata written into every generated package.
    #[builder(default)]
    pub metadata: EbookMetadata,

    /// Extension given to generated files, without the leading dot.
    #[builder(default = "\"epub\".to_string()")]
    pub output_extension: String,

    /// Directory in which per-archive scratch directories are created.
    ///
    /// Defaults to the system temporary directory.
    #[builder(default, setter(into, strip_option))]
    pub scratch_path: Option<PathBuf>,
}

impl ConverterConfig {
    /// Creates a new builder for configuring `ConverterConfig`.
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder::default()
    }

    /// The normalization parameters handed to the image normalizer.
    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            quality: self.quality,
            max_height: self.max_height,
        }
    }

    /// Performs validation checks on the configuration for a specific entry point.
    ///
    /// # Arguments
    ///
    /// * `mode` - The intended entry point:
    ///   - [`ConversionMode::Batch`]: `input_path` must be an existing directory
    ///   - [`ConversionMode::SingleArchive`]: only the output settings are checked
    ///
    /// # Returns
    ///
    /// * `Ok(&self)` - Configuration is valid for the specified mode
    /// * `Err(Error)` - Configuration has validation errors
    pub fn preflight_check(&self, mode: ConversionMode) -> Result<&Self> {
        self.normalize_options().validate()?;
        if self.output_path.as_os_str().is_empty() {
            return Err(Error::Other("Output path is required".to_string()));
        }

        match mode {
            ConversionMode::Batch => {
                if self.input_path.as_os_str().is_empty() {
                    return Err(Error::Other(
                        "`input_path` must be set for batch conversion.".to_string(),
                    ));
                }
                if !self.input_path.exists() {
                    return Err(Error::NotFound(format!(
                        "Input path does not exist: {:?}",
                        self.input_path
                    )));
                }
                if !self.input_path.is_dir() {
                    return Err(Error::InvalidPath(
                        self.input_path.clone(),
                        "Input path is not a directory.".to_string(),
                    ));
                }
            }
            ConversionMode::SingleArchive => {}
        }

        Ok(self)
    }

    /// Computes where the package for `archive` is written.
    ///
    /// The result is `output_path / relative_dir / <archive stem>.<output_extension>`.
    pub fn output_file_for(&self, archive: &Path, relative_dir: &Path) -> Result<PathBuf> {
        let stem = archive.file_stem().ok_or_else(|| {
            Error::InvalidPath(archive.to_path_buf(), "Archive has no file name".to_string())
        })?;

        let mut file_name = stem.to_os_string();
        file_name.push(".");
        file_name.push(&self.output_extension);

        Ok(self.output_path.join(relative_dir).join(file_name))
    }

    /// Converts every archive below `input_path`, one at a time.
    ///
    /// Directories are visited in name order and only directories holding at
    /// least one archive get an output directory. With
    /// [`FailurePolicy::FailFast`] the first failure is returned as the error;
    /// with [`FailurePolicy::Isolate`] failures are logged, collected in the
    /// report, and the batch carries on.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchReport)` - Converted outputs and isolated failures
    /// * `Err(Error)` - Invalid configuration, unreadable input tree, or a fail-fast archive error
    pub async fn convert_folder(&self) -> Result<BatchReport> {
        self.preflight_check(ConversionMode::Batch)?;

        let input_path = self.input_path.clone();
        let groups = spawn_blocking(move || {
            Collector::new(&input_path, PageOrder::default()).collect_archive_groups()
        })
        .await??;

        let mut report = BatchReport::default();
        for group in &groups {
            let label = if group.relative_dir.as_os_str().is_empty() {
                ".".to_string()
            } else {
                group.relative_dir.display().to_string()
            };
            let total = group.archives.len();

            for (index, archive) in group.archives.iter().enumerate() {
                info!(
                    "Processing CBZ files in {} [{}/{}]: {}",
                    label,
                    index + 1,
                    total,
                    archive.display()
                );

                match self.convert_archive(archive, &group.relative_dir).await {
                    Ok(output) => report.converted.push(output),
                    Err(e) if self.failure_policy == FailurePolicy::FailFast => return Err(e),
                    Err(e) => {
                        error!("{}", e);
                        report.failures.push(ArchiveFailure {
                            archive: archive.clone(),
                            message: e.to_string(),
                        });
                    }
                }
            }
        }

        Ok(report)
    }

    /// Converts a single archive into a package under `output_path`.
    ///
    /// # Arguments
    ///
    /// * `archive` - Path to the `.cbz` file
    /// * `relative_dir` - Directory of the archive relative to the input root;
    ///   mirrored below `output_path`
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Path of the written package
    /// * `Err(Error::Archive)` - The failure, tagged with the archive path
    pub async fn convert_archive(&self, archive: &Path, relative_dir: &Path) -> Result<PathBuf> {
        self.preflight_check(ConversionMode::SingleArchive)?;
        self.perform_conversion(archive, relative_dir)
            .await
            .map_err(|e| e.for_archive(archive))
    }

    async fn perform_conversion(&self, archive: &Path, relative_dir: &Path) -> Result<PathBuf> {
        // Removed on drop, including every early return below.
        let mut scratch_builder = tempfile::Builder::new();
        scratch_builder.prefix("cbz2epub-");
        let scratch = match &self.scratch_path {
            Some(directory) => scratch_builder.tempdir_in(directory)?,
            None => scratch_builder.tempdir()?,
        };
        let scratch_root = scratch.path().to_path_buf();

        let archive_path = archive.to_path_buf();
        let root = scratch_root.clone();
        let entries = spawn_blocking(move || Self::extract_archive(&archive_path, &root)).await??;
        debug!(
            "Extracted {} entries from {} into {}",
            entries,
            archive.display(),
            scratch_root.display()
        );

        let normalizer = Normalizer::new(self.normalize_options());
        let root = scratch_root.clone();
        let normalized =
            spawn_blocking(move || normalizer.normalize_directory(&root)).await??;
        debug!("Normalized {} images", normalized);

        let page_order = self.page_order;
        let root = scratch_root.clone();
        let pages =
            spawn_blocking(move || Collector::new(&root, page_order).collect_pages()).await??;
        if pages.is_empty() {
            return Err(Error::NotFound(format!(
                "No page images in archive '{}'",
                archive.display()
            )));
        }

        let output_file = self.output_file_for(archive, relative_dir)?;
        if let Some(parent) = output_file.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut generator = EPub::new(&output_file)?;
        generator.set_metadata(&self.metadata)?;
        for page in &pages {
            generator.add_page(page).await?;
        }
        generator.save().await?;

        info!("Created {}", output_file.display());
        Ok(output_file)
    }

    /// Extracts every entry of a ZIP archive below `destination`.
    ///
    /// # Returns
    ///
    /// * `Result<usize>` - Number of entries in the archive
    pub fn extract_archive(archive: &Path, destination: &Path) -> Result<usize> {
        let file = File::open(archive).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open archive '{}': {}", archive.display(), e),
            ))
        })?;
        let mut zip = ZipArchive::new(file)?;
        zip.extract(destination)?;
        Ok(zip.len())
    }
}

impl ConverterConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(quality) = self.quality {
            if !(1..=100).contains(&quality) {
                return Err(format!("Quality must be between 1 and 100, got {}", quality));
            }
        }
        if let Some(0) = self.max_height {
            return Err("Max height must be at least 1".to_string());
        }
        if let Some(extension) = &self.output_extension {
            if extension.is_empty() || extension.starts_with('.') {
                return Err(format!("Invalid output extension: {:?}", extension));
            }
        }
        Ok(())
    }
}
