//! Platform capabilities the persistence tiers call into.
//!
//! Each one is a narrow trait so the tier dispatcher never knows whether it
//! is talking to a native bridge, the desktop implementations in
//! [`device`](super::device), or a recording mock. Failures come back as
//! [`Fault`] values, whatever shape the collaborator produced.

use crate::fault::Fault;
use serde::Serialize;
use std::path::PathBuf;

/// What a gallery plugin reports after a save attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryOutcome {
    pub success: bool,
    pub message: Option<String>,
}

impl GalleryOutcome {
    pub fn saved(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

pub trait Gallery {
    /// Save a base64-encoded image into the device gallery.
    fn save_to_gallery(&self, base64_data: &str, file_name: &str)
    -> Result<GalleryOutcome, Fault>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Directory {
    /// Shared storage visible to other apps (pictures live here).
    ExternalStorage,
    /// The app's documents directory.
    Documents,
    /// The app's cache directory; contents may be evicted.
    Cache,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    /// Path relative to `directory`.
    pub path: String,
    /// File contents, base64-encoded.
    pub data: String,
    pub directory: Directory,
    /// Create missing parent directories.
    pub recursive: bool,
}

/// Reference to a written file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub uri: String,
    pub path: PathBuf,
}

impl FileRef {
    pub fn from_path(path: PathBuf) -> Self {
        Self {
            uri: format!("file://{}", path.display()),
            path,
        }
    }
}

pub trait Filesystem {
    /// Whether writes can be attempted at all.
    fn is_available(&self) -> bool;

    fn write_file(&self, request: &WriteRequest) -> Result<FileRef, Fault>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRequest {
    pub title: String,
    pub text: String,
    /// A file reference or a data URL.
    pub url: String,
    pub dialog_title: Option<String>,
}

pub trait Share {
    fn share(&self, request: &ShareRequest) -> Result<(), Fault>;
}

pub trait Download {
    /// Hand `bytes` to the user as a file called `file_name`. Returns where
    /// it landed.
    fn download(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, Fault>;
}

impl<T: Gallery + ?Sized> Gallery for &T {
    fn save_to_gallery(
        &self,
        base64_data: &str,
        file_name: &str,
    ) -> Result<GalleryOutcome, Fault> {
        (**self).save_to_gallery(base64_data, file_name)
    }
}

impl<T: Download + ?Sized> Download for &T {
    fn download(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, Fault> {
        (**self).download(file_name, bytes)
    }
}
