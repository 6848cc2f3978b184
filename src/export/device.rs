//! The capabilities an export runs against, and the desktop implementations
//! shipped with the binary.
//!
//! | Capability | Desktop implementation |
//! |---|---|
//! | Gallery | [`WebGallery`]: downloads, like the plugin's web fallback |
//! | Filesystem | [`LocalFilesystem`]: home, documents, and cache dirs from `dirs` |
//! | Share | [`SystemShare`]: opens the file with the system handler |
//! | Download | [`FileDownload`]: staged temp file renamed into the download dir |

use super::capability::{
    Directory, Download, FileRef, Filesystem, Gallery, GalleryOutcome, Share, ShareRequest,
    WriteRequest,
};
use super::platform::Platform;
use crate::config::ExportConfig;
use crate::fault::{Fault, normalize_error};
use base64::{Engine as _, engine::general_purpose};
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

/// Everything the persistence tiers may call, borrowed for one export.
pub struct Device<'a> {
    pub platform: Platform,
    /// Subfolder under the pictures and documents roots.
    pub app_folder: String,
    pub gallery: Option<&'a dyn Gallery>,
    pub filesystem: Option<&'a dyn Filesystem>,
    pub share: Option<&'a dyn Share>,
    pub download: &'a dyn Download,
}

impl<'a> Device<'a> {
    pub fn new(platform: Platform, download: &'a dyn Download) -> Self {
        Self {
            platform,
            app_folder: ExportConfig::default().app_folder,
            gallery: None,
            filesystem: None,
            share: None,
            download,
        }
    }

    pub fn with_gallery(mut self, gallery: &'a dyn Gallery) -> Self {
        self.gallery = Some(gallery);
        self
    }

    pub fn with_filesystem(mut self, filesystem: &'a dyn Filesystem) -> Self {
        self.filesystem = Some(filesystem);
        self
    }

    pub fn with_share(mut self, share: &'a dyn Share) -> Self {
        self.share = Some(share);
        self
    }

    pub fn with_app_folder(mut self, folder: impl Into<String>) -> Self {
        self.app_folder = folder.into();
        self
    }

    /// The filesystem capability probe. A missing capability is unavailable.
    pub fn filesystem_available(&self) -> bool {
        self.filesystem.is_some_and(|fs| fs.is_available())
    }
}

/// Owns the desktop capabilities so a [`Device`] can borrow them.
pub struct DesktopCapabilities {
    pub app_folder: String,
    pub gallery: WebGallery<FileDownload>,
    pub filesystem: LocalFilesystem,
    pub share: SystemShare,
    pub download: FileDownload,
}

impl DesktopCapabilities {
    pub fn from_config(config: &ExportConfig) -> Self {
        let download = FileDownload::from_config(config.download_dir.as_deref());
        let filesystem = if config.filesystem {
            LocalFilesystem::from_system()
        } else {
            LocalFilesystem::disabled()
        };
        Self {
            app_folder: config.app_folder.clone(),
            gallery: WebGallery::new(download.clone()),
            filesystem,
            share: SystemShare,
            download,
        }
    }

    pub fn device(&self, platform: Platform) -> Device<'_> {
        let device = Device::new(platform, &self.download)
            .with_app_folder(self.app_folder.clone())
            .with_filesystem(&self.filesystem)
            .with_share(&self.share);
        if platform.is_android() {
            device.with_gallery(&self.gallery)
        } else {
            device
        }
    }
}

// =============================================================================
// Download
// =============================================================================

/// Writes into a download directory. The file is staged under a temporary
/// name first and renamed into place, so a failed write never leaves a
/// partial file under the final name.
#[derive(Debug, Clone)]
pub struct FileDownload {
    dir: PathBuf,
}

impl FileDownload {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Configured directory, else the user's download directory, else the
    /// current directory.
    pub fn from_config(download_dir: Option<&Path>) -> Self {
        let dir = download_dir
            .map(Path::to_path_buf)
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Download for FileDownload {
    fn download(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, Fault> {
        if !is_plain_file_name(file_name) {
            return Err(Fault::message(format!("Invalid download name: {file_name}")));
        }
        fs::create_dir_all(&self.dir)?;
        let mut staged = tempfile::NamedTempFile::new_in(&self.dir)?;
        staged.write_all(bytes)?;
        let target = self.dir.join(file_name);
        staged.persist(&target).map_err(|e| Fault::error(e.error))?;
        Ok(target)
    }
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

// =============================================================================
// Gallery
// =============================================================================

/// Gallery substitute for shells without the native plugin: the image is
/// downloaded instead, and the outcome reported the way the plugin would.
#[derive(Debug, Clone)]
pub struct WebGallery<D> {
    download: D,
}

impl<D: Download> WebGallery<D> {
    pub fn new(download: D) -> Self {
        Self { download }
    }
}

impl<D: Download> Gallery for WebGallery<D> {
    fn save_to_gallery(
        &self,
        base64_data: &str,
        file_name: &str,
    ) -> Result<GalleryOutcome, Fault> {
        let bytes = match general_purpose::STANDARD.decode(base64_data) {
            Ok(bytes) => bytes,
            Err(e) => return Ok(GalleryOutcome::rejected(e.to_string())),
        };
        Ok(match self.download.download(file_name, &bytes) {
            Ok(_) => GalleryOutcome::saved("Image downloaded"),
            Err(fault) => GalleryOutcome::rejected(normalize_error(&fault, "Download failed")),
        })
    }
}

// =============================================================================
// Filesystem
// =============================================================================

/// Native directory writes rooted at the platform's user directories.
///
/// External storage maps to the home directory, so
/// `Pictures/{app_folder}/…` lands in the user's pictures folder.
#[derive(Debug, Clone, Default)]
pub struct LocalFilesystem {
    external: Option<PathBuf>,
    documents: Option<PathBuf>,
    cache: Option<PathBuf>,
}

impl LocalFilesystem {
    pub fn from_system() -> Self {
        Self {
            external: dirs::home_dir(),
            documents: dirs::document_dir(),
            cache: dirs::cache_dir().map(|d| d.join("photo-frame")),
        }
    }

    pub fn with_roots(external: PathBuf, documents: PathBuf, cache: PathBuf) -> Self {
        Self {
            external: Some(external),
            documents: Some(documents),
            cache: Some(cache),
        }
    }

    /// No roots at all; the capability probe fails.
    pub fn disabled() -> Self {
        Self::default()
    }

    fn root(&self, directory: Directory) -> Option<&Path> {
        match directory {
            Directory::ExternalStorage => self.external.as_deref(),
            Directory::Documents => self.documents.as_deref(),
            Directory::Cache => self.cache.as_deref(),
        }
    }
}

impl Filesystem for LocalFilesystem {
    fn is_available(&self) -> bool {
        self.external.is_some() || self.documents.is_some() || self.cache.is_some()
    }

    fn write_file(&self, request: &WriteRequest) -> Result<FileRef, Fault> {
        let root = self.root(request.directory).ok_or_else(|| {
            Fault::message(format!("No {:?} directory on this system", request.directory))
        })?;
        let relative = Path::new(&request.path);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(Fault::message(format!("Invalid path: {}", request.path)));
        }

        let bytes = general_purpose::STANDARD
            .decode(&request.data)
            .map_err(Fault::error)?;
        let target = root.join(relative);
        if let Some(parent) = target.parent() {
            if request.recursive {
                fs::create_dir_all(parent)?;
            } else if !parent.is_dir() {
                return Err(Fault::message(format!(
                    "Directory does not exist: {}",
                    parent.display()
                )));
            }
        }
        fs::write(&target, bytes)?;
        Ok(FileRef::from_path(target))
    }
}

// =============================================================================
// Share
// =============================================================================

/// Hands a file to the system's default handler. There is no share sheet
/// for raw image data on the desktop, so data URLs are refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemShare;

impl Share for SystemShare {
    fn share(&self, request: &ShareRequest) -> Result<(), Fault> {
        if request.url.starts_with("data:") {
            return Err(Fault::message(
                "Sharing image data directly is not supported on this system",
            ));
        }
        let target = request.url.strip_prefix("file://").unwrap_or(&request.url);
        log::debug!("Opening {target} ({})", request.title);
        open::that(target).map_err(Fault::from)
    }
}
