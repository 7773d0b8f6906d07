//! Common test utilities and constants for the cbz2epub crate.
//!
//! Provides functions for setting up test directories, writing dummy images
//! and archives, and reading generated EPUB packages back.

use image::{ImageFormat, Rgb, RgbImage};
use rand::{Rng, distributions::Alphanumeric};
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

#[allow(dead_code)]
pub const TEST_TMP_DIR: &str = "tests/tmp";
#[allow(dead_code)]
pub const LONG_TEST_TIMEOUT: Duration = Duration::from_secs(120);
#[allow(dead_code)]
pub const PALETTE_PNG: &[u8] = include_bytes!("fixtures/palette.png");

/// Directories used by one test: input tree, output tree and scratch root.
#[allow(dead_code)]
pub struct TestDirs {
    pub test_dir: PathBuf,
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    pub scratch_dir: PathBuf,
}

/// Creates a clean, uniquely named test directory with source, target and
/// scratch subdirectories.
#[allow(dead_code)]
pub fn setup_test_dirs(sub_path: &str) -> TestDirs {
    let rand_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let test_dir = PathBuf::from(TEST_TMP_DIR).join(format!("{}-{}", sub_path, rand_string));
    if test_dir.exists() {
        std::fs::remove_dir_all(&test_dir).unwrap();
    }
    let source_dir = test_dir.join("source");
    let target_dir = test_dir.join("target");
    let scratch_dir = test_dir.join("scratch");

    for dir in [&source_dir, &target_dir, &scratch_dir] {
        std::fs::create_dir_all(dir).unwrap();
    }

    TestDirs {
        test_dir,
        source_dir,
        target_dir,
        scratch_dir,
    }
}

/// Encodes a textured image of the given size in `format`.
#[allow(dead_code)]
pub fn image_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

#[allow(dead_code)]
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    image_bytes(width, height, ImageFormat::Jpeg)
}

#[allow(dead_code)]
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    image_bytes(width, height, ImageFormat::Png)
}

/// Writes a CBZ archive with the given `(entry name, bytes)` pairs, in order.
#[allow(dead_code)]
pub fn create_cbz(path: &Path, entries: &[(&str, Vec<u8>)]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let file = std::fs::File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (name, bytes) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap();
}

/// Writes a CBZ archive with one small JPEG page per name.
#[allow(dead_code)]
pub fn create_simple_cbz(path: &Path, page_names: &[&str]) {
    let entries: Vec<(&str, Vec<u8>)> = page_names
        .iter()
        .map(|name| (*name, jpeg_bytes(40, 60)))
        .collect();
    create_cbz(path, &entries);
}

/// Checks if a ZIP file exists and contains at least one entry.
#[allow(dead_code)]
pub fn assert_valid_zip_file(path: &Path) {
    assert!(path.exists(), "Output ZIP file does not exist: {:?}", path);
    assert!(path.is_file(), "Output ZIP path is not a file: {:?}", path);

    let file = std::fs::File::open(path).unwrap();
    let zip = zip::ZipArchive::new(file).unwrap();
    assert!(zip.len() > 0, "Output ZIP file is empty: {:?}", path);
}

/// Reads the entry whose name equals `suffix` or ends with `/suffix`.
#[allow(dead_code)]
pub fn read_epub_entry(epub: &Path, suffix: &str) -> Vec<u8> {
    let file = std::fs::File::open(epub).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let name = archive
        .file_names()
        .find(|n| *n == suffix || n.ends_with(&format!("/{}", suffix)))
        .map(str::to_string)
        .unwrap_or_else(|| panic!("No entry {} in {:?}", suffix, epub));
    let mut entry = archive.by_name(&name).unwrap();
    let mut content = Vec::new();
    entry.read_to_end(&mut content).unwrap();
    content
}

#[allow(dead_code)]
pub fn read_epub_text(epub: &Path, suffix: &str) -> String {
    String::from_utf8(read_epub_entry(epub, suffix)).unwrap()
}

/// Extracts the value of attribute `name` from a single XML tag.
fn attribute(tag: &str, name: &str) -> Option<String> {
    let needle = format!(" {}=\"", name);
    let start = tag.find(&needle)? + needle.len();
    let end = tag[start..].find('"')? + start;
    Some(tag[start..end].to_string())
}

/// Chapter documents in spine order, as manifest hrefs.
#[allow(dead_code)]
pub fn spine_chapters(epub: &Path) -> Vec<String> {
    let opf = read_epub_text(epub, "content.opf");

    let mut hrefs_by_id = HashMap::new();
    let mut spine_ids = Vec::new();
    for tag in opf.split('<') {
        if tag.starts_with("item ") {
            if let (Some(id), Some(href)) = (attribute(tag, "id"), attribute(tag, "href")) {
                hrefs_by_id.insert(id, href);
            }
        } else if tag.starts_with("itemref ") {
            if let Some(idref) = attribute(tag, "idref") {
                spine_ids.push(idref);
            }
        }
    }

    spine_ids
        .iter()
        .filter_map(|id| hrefs_by_id.get(id).cloned())
        .filter(|href| href.ends_with(".xhtml") && href != "nav.xhtml" && href != "toc.xhtml")
        .collect()
}

/// Number of entries in the NCX table of contents.
#[allow(dead_code)]
pub fn toc_entry_count(epub: &Path) -> usize {
    read_epub_text(epub, "toc.ncx").matches("<navPoint").count()
}

/// Number of entries directly inside `dir`.
#[allow(dead_code)]
pub fn entry_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
