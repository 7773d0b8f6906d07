//! Filesystem enumeration for the conversion pipeline.
//!
//! This module finds the two kinds of inputs the pipeline works on: comic-book
//! archives in the batch input tree, grouped by the directory that holds them,
//! and page images inside an extracted archive, in reading order.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};
use crate::types::{ArchiveGroup, PageOrder, is_archive, is_page_image};

/// Directory created by macOS archivers next to the real content.
const MACOS_METADATA_DIR: &str = "__MACOSX";

/// Enumerates archives and page images below a base directory.
#[derive(Debug)]
pub struct Collector<'a> {
    base_directory: &'a Path,
    page_order: PageOrder,
}

impl<'a> Collector<'a> {
    /// Creates a new Collector rooted at `base_directory`.
    ///
    /// # Arguments
    ///
    /// * `base_directory` - Root of the tree to enumerate
    /// * `page_order` - Ordering policy used by [`Collector::collect_pages`]
    pub fn new(base_directory: &'a Path, page_order: PageOrder) -> Self {
        Self {
            base_directory,
            page_order,
        }
    }

    /// Collects archives below the base directory, one group per directory.
    ///
    /// Directories without archives produce no group. Groups come in walk
    /// order (name order, depth-first) and the root, when it holds archives,
    /// is reported with an empty relative path.
    ///
    /// # Returns
    ///
    /// * `Result<Vec<ArchiveGroup>>` - Non-empty groups of archive paths
    pub fn collect_archive_groups(&self) -> Result<Vec<ArchiveGroup>> {
        let mut groups: Vec<ArchiveGroup> = Vec::new();

        for entry in self.walker(false) {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() || !is_archive(path) {
                continue;
            }

            let relative_dir = self.relative_parent(path)?;
            // Files of one directory are yielded contiguously, before its subdirectories.
            match groups.last_mut() {
                Some(group) if group.relative_dir == relative_dir => {
                    group.archives.push(entry.into_path())
                }
                _ => groups.push(ArchiveGroup {
                    relative_dir,
                    archives: vec![entry.into_path()],
                }),
            }
        }

        Ok(groups)
    }

    /// Collects page images below the base directory in reading order.
    ///
    /// Hidden files and `__MACOSX` folders are never pages and are skipped.
    ///
    /// # Returns
    ///
    /// * `Result<Vec<PathBuf>>` - Page image paths ordered per the configured [`PageOrder`]
    pub fn collect_pages(&self) -> Result<Vec<PathBuf>> {
        let mut pages = Vec::new();

        for entry in self.walker(true) {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && is_page_image(path) {
                pages.push(entry.into_path());
            }
        }

        if self.page_order == PageOrder::Global {
            pages.sort();
        }

        Ok(pages)
    }

    /// Builds a deterministic walker: within every directory, files sorted
    /// by name come first, then subdirectories sorted by name.
    fn walker(&self, skip_ignored: bool) -> impl Iterator<Item = walkdir::Result<DirEntry>> {
        WalkDir::new(self.base_directory)
            .sort_by(Self::files_first_by_name)
            .into_iter()
            // The root itself may be a hidden scratch directory and is always kept.
            .filter_entry(move |e| !skip_ignored || e.depth() == 0 || !Self::is_ignored(e.path()))
    }

    fn files_first_by_name(a: &DirEntry, b: &DirEntry) -> Ordering {
        a.file_type()
            .is_dir()
            .cmp(&b.file_type().is_dir())
            .then_with(|| a.file_name().cmp(b.file_name()))
    }

    /// Checks if an entry is a hidden file or platform metadata folder.
    pub fn is_ignored(path: &Path) -> bool {
        path.file_name()
            .map(|name| {
                let name = name.to_string_lossy();
                name.starts_with('.') || name == MACOS_METADATA_DIR
            })
            .unwrap_or(false)
    }

    fn relative_parent(&self, path: &Path) -> Result<PathBuf> {
        let parent = path.parent().unwrap_or(self.base_directory);
        parent
            .strip_prefix(self.base_directory)
            .map(Path::to_path_buf)
            .map_err(|e| {
                Error::InvalidPath(
                    path.to_path_buf(),
                    format!("Not below the input root: {}", e),
                )
            })
    }
}
