use std::collections::HashSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::types::{EbookMetadata, media_type_for};
use async_trait::async_trait;
use epub_builder::{EpubBuilder, EpubContent, EpubVersion, ZipLibrary};
use memmap2::MmapOptions;
use tempfile::NamedTempFile;
use tokio::task::spawn_blocking;

/// Escapes text for use inside XHTML element content and attribute values.
fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Generates the XHTML chapter wrapping a single image.
///
/// # Arguments
///
/// * `image_source` - Name of the image resource, relative to the chapter
/// * `page_title` - Title and alt text for the page
/// * `language` - Language tag of the document
fn generate_xhtml(image_source: &str, page_title: &str, language: &str) -> String {
    const TEMPLATE: &str = include_str!("../../templates/Page.xhtml");
    TEMPLATE
        .replace("%lang%", &escape_xml(language))
        .replace("%title%", &escape_xml(page_title))
        .replace("%src%", &escape_xml(&urlencoding::encode(image_source)))
        .replace("%alt%", &escape_xml(page_title))
}

/// A generator for EPUB packages holding one image per chapter.
///
/// Every page becomes an image resource keyed by its file name plus a chapter
/// document embedding it. All chapters are in the spine in the order they were
/// added; the table of contents lists every chapter except the first.
pub struct EPub {
    epub: EpubBuilder<ZipLibrary>,
    output_path: PathBuf,
    language: String,
    page_count: usize,
    resource_names: HashSet<String>,
}

impl EPub {
    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Reserves a unique resource name for `file_name`.
    ///
    /// Pages from different folders of an archive may share a file name; later
    /// ones get a `-N` suffix before the extension.
    fn reserve_resource_name(&mut self, file_name: &str) -> String {
        if self.resource_names.insert(file_name.to_string()) {
            return file_name.to_string();
        }

        let path = Path::new(file_name);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path.extension().map(|e| e.to_string_lossy().to_string());

        let mut suffix = 2;
        loop {
            let candidate = match &extension {
                Some(ext) => format!("{}-{}.{}", stem, suffix, ext),
                None => format!("{}-{}", stem, suffix),
            };
            if self.resource_names.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Adds an image resource using memory mapping to avoid copying large files.
    ///
    /// # Arguments
    ///
    /// * `resource_path` - Path of the resource inside the package
    /// * `image_path` - Path to the image file on the filesystem
    pub async fn add_resource_mmap(
        &mut self,
        resource_path: &str,
        image_path: &Path,
    ) -> Result<&mut Self> {
        let file = tokio::fs::File::open(image_path).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to open image file '{}': {}",
                    image_path.display(),
                    e
                ),
            ))
        })?;

        let file_std = file.into_std().await;
        let mmap = spawn_blocking(move || unsafe { MmapOptions::new().map(&file_std) })
            .await
            .map_err(|e| Error::AsyncTaskError(e.to_string()))??;

        let mime = media_type_for(image_path, &mmap[..])?;
        self.epub
            .add_resource(resource_path, Cursor::new(&mmap[..]), mime)?;

        Ok(self)
    }
}

#[async_trait]
impl Generator for EPub {
    fn new(output_file: &Path) -> Result<Self> {
        let mut epub = EpubBuilder::new(ZipLibrary::new()?)?;

        epub.epub_version(EpubVersion::V30);
        epub.stylesheet(include_bytes!("../../templates/Page.css").as_slice())?;

        Ok(EPub {
            epub,
            output_path: output_file.to_path_buf(),
            language: EbookMetadata::default().language,
            page_count: 0,
            resource_names: HashSet::new(),
        })
    }

    fn set_metadata(&mut self, metadata: &EbookMetadata) -> Result<&mut Self> {
        self.epub.metadata("title", metadata.title.as_str())?;
        self.epub.metadata("author", metadata.author.as_str())?;
        self.epub.set_lang(metadata.language.as_str());
        self.epub.set_uuid(uuid::Uuid::new_v5(
            &uuid::Uuid::NAMESPACE_OID,
            metadata.identifier.as_bytes(),
        ));
        self.language = metadata.language.clone();
        Ok(self)
    }

    async fn add_page(&mut self, image_path: &Path) -> Result<&mut Self> {
        let file_name = image_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| {
                Error::InvalidPath(image_path.to_path_buf(), "Path has no file name".to_string())
            })?;

        let resource_name = self.reserve_resource_name(&file_name);
        self.add_resource_mmap(&resource_name, image_path).await?;

        let xhtml = generate_xhtml(&resource_name, &resource_name, &self.language);
        let chapter = EpubContent::new(format!("{}.xhtml", resource_name), xhtml.as_bytes());
        // Untitled content stays in the spine but is left out of the table of contents.
        let chapter = if self.page_count == 0 {
            chapter
        } else {
            chapter.title(resource_name.as_str())
        };
        self.epub.add_content(chapter)?;

        self.page_count += 1;
        Ok(self)
    }

    async fn save(mut self) -> Result<()> {
        let directory = match self.output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        // Generate next to the destination, then rename over it.
        let mut staging = NamedTempFile::new_in(&directory).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create EPUB file in '{}': {}",
                    directory.display(),
                    e
                ),
            ))
        })?;

        self.epub.generate(staging.as_file_mut())?;
        staging.persist(&self.output_path)?;
        Ok(())
    }
}
