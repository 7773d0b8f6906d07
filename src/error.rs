//! Custom error types and result handling for cbz2epub operations.
//!
//! Every fallible operation in the crate returns a [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. Failures that happen while converting one
//! archive are wrapped in [`Error::Archive`] so the batch driver can tell the
//! operator which input was responsible.
//!
use std::path::PathBuf;

/// Type alias for Results with cbz2epub errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all conversion operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O errors from the standard library
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Image decoding or encoding errors
    #[error(transparent)]
    Image(#[from] image::ImageError),
    /// EPUB generation errors
    #[error(transparent)]
    Epub(#[from] epub_builder::Error),
    /// ZIP archive read errors (corrupt or missing archive structure)
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    /// Directory traversal errors
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),
    /// Failure to move a finished package into its final location
    #[error(transparent)]
    Persist(#[from] tempfile::PersistError),
    /// Async task join errors
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    ConverterBuilder(#[from] crate::converter::ConverterConfigBuilderError),
    /// Error for invalid file or directory paths
    #[error("The given path '{0:?}' is invalid: {1}")]
    InvalidPath(PathBuf, String),
    /// Error for failed asynchronous tasks
    #[error("Asynchronous task failed: {0}")]
    AsyncTaskError(String),
    /// Error for unsupported operations or formats (e.g., unknown image extension)
    #[error("Unsupported: {0}")]
    Unsupported(String),
    /// Error for resources that couldn't be found (e.g., input directory)
    #[error("Not found: {0}")]
    NotFound(String),
    /// A conversion failure attributed to a specific archive
    #[error("Failed to convert '{}': {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
    /// Other errors that don't fit into specific categories
    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Attaches the archive that was being converted when `self` occurred.
    pub fn for_archive(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Error::Archive { .. } => self,
            other => Error::Archive {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }
}

impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error::Other(error.to_string())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}
