//! Editing session: the photo, its metadata, and the caption being built.
//!
//! A session holds at most one photo at a time. Uploading replaces the photo,
//! the metadata, and every caption line that was derived from metadata;
//! colors, padding and toggles carry over.
//!
//! Derived lines (device, system, lens) are suggestions. Once the user edits
//! one, automatic derivation leaves it alone until the next upload. Lines
//! set in the configured caption defaults are pinned the same way for the
//! whole session.

use crate::caption::{CaptionConfig, CaptionField};
use crate::diagnostics;
use crate::metadata::{ImageMetadata, MetadataSource};
use crate::notice::Notice;
use serde_json::json;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub const NO_METADATA_NOTICE: &str = "No EXIF data found in this image.";
pub const METADATA_FAILED_NOTICE: &str = "Failed to load image metadata.";

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{} is not an image ({mime})", path.display())]
    NotAnImage { path: PathBuf, mime: String },
}

/// An uploaded photo, held in memory.
#[derive(Debug, Clone)]
pub struct Photo {
    pub file_name: String,
    pub mime: String,
    pub bytes: Arc<Vec<u8>>,
}

impl Photo {
    /// Read a file, accepting it only if it is an image.
    ///
    /// The MIME type is guessed from the extension; files whose extension
    /// says nothing are sniffed from their leading bytes.
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let guessed = mime_guess::from_path(path).first();
        if let Some(mime) = &guessed {
            if mime.type_() != mime_guess::mime::IMAGE {
                return Err(UploadError::NotAnImage {
                    path: path.to_path_buf(),
                    mime: mime.essence_str().to_string(),
                });
            }
        }

        let bytes = std::fs::read(path)?;
        let mime = match guessed {
            Some(mime) => mime.essence_str().to_string(),
            None => image::guess_format(&bytes)
                .map(|f| f.to_mime_type().to_string())
                .map_err(|_| UploadError::NotAnImage {
                    path: path.to_path_buf(),
                    mime: "application/octet-stream".to_string(),
                })?,
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            file_name,
            mime,
            bytes: Arc::new(bytes),
        })
    }
}

pub struct Session<S> {
    source: S,
    caption: CaptionConfig,
    photo: Option<Photo>,
    metadata: ImageMetadata,
    pinned: HashSet<CaptionField>,
    edited: HashSet<CaptionField>,
}

impl<S: MetadataSource> Session<S> {
    /// Start a session. Non-empty derived lines in `defaults` are pinned.
    pub fn new(source: S, defaults: CaptionConfig) -> Self {
        let pinned = CaptionField::DERIVED
            .into_iter()
            .filter(|f| !defaults.text(*f).trim().is_empty())
            .collect();
        Self {
            source,
            caption: defaults,
            photo: None,
            metadata: ImageMetadata::default(),
            pinned,
            edited: HashSet::new(),
        }
    }

    pub fn caption(&self) -> &CaptionConfig {
        &self.caption
    }

    /// Styling access (colors, padding, toggles). Text lines should go
    /// through [`Session::edit`] so derivation knows to leave them alone.
    pub fn caption_mut(&mut self) -> &mut CaptionConfig {
        &mut self.caption
    }

    pub fn metadata(&self) -> &ImageMetadata {
        &self.metadata
    }

    pub fn photo(&self) -> Option<&Photo> {
        self.photo.as_ref()
    }

    pub fn is_edited(&self, field: CaptionField) -> bool {
        self.edited.contains(&field)
    }

    /// Read `path` and upload it.
    pub fn upload_file(&mut self, path: &Path) -> Result<Vec<Notice>, UploadError> {
        let photo = Photo::from_path(path)?;
        Ok(self.upload(photo))
    }

    /// Replace the current photo and everything derived from it.
    ///
    /// Never fails: missing metadata is an informational notice, unreadable
    /// metadata an error notice, and in both cases the photo is kept with
    /// empty metadata.
    pub fn upload(&mut self, photo: Photo) -> Vec<Notice> {
        diagnostics::record(
            diagnostics::Level::Info,
            "Upload",
            format!("Loading {}", photo.file_name),
            Some(json!({"mime": photo.mime, "bytes": photo.bytes.len()})),
        );

        let mut notices = Vec::new();
        self.metadata = match self.source.read_tags(&photo.bytes) {
            Ok(Some(tags)) => {
                diagnostics::record(
                    diagnostics::Level::Debug,
                    "Upload",
                    "Parsed EXIF",
                    serde_json::to_value(&tags).ok(),
                );
                ImageMetadata::from_tags(&tags)
            }
            Ok(None) => {
                diagnostics::info("Upload", "No EXIF data found");
                notices.push(Notice::info(NO_METADATA_NOTICE));
                ImageMetadata::default()
            }
            Err(e) => {
                diagnostics::error("Upload", format!("Error parsing image: {e}"));
                notices.push(Notice::error(METADATA_FAILED_NOTICE));
                ImageMetadata::default()
            }
        };
        self.photo = Some(photo);

        self.edited.clear();
        for field in CaptionField::DERIVED {
            if !self.pinned.contains(&field) {
                self.caption.text_mut(field).clear();
            }
        }
        self.apply_suggestions();
        notices
    }

    /// Fill derived lines from metadata, skipping pinned and edited ones.
    pub fn apply_suggestions(&mut self) {
        let suggestions = [
            (CaptionField::Device, self.metadata.device_name()),
            (CaptionField::System, self.metadata.software.clone()),
            (CaptionField::Lens, self.metadata.lens_model.clone()),
        ];
        for (field, value) in suggestions {
            if self.pinned.contains(&field) || self.edited.contains(&field) {
                continue;
            }
            *self.caption.text_mut(field) = value.unwrap_or_default();
        }
    }

    /// A user edit of a caption line. Takes precedence over derivation for
    /// the rest of this upload.
    pub fn edit(&mut self, field: CaptionField, value: impl Into<String>) {
        *self.caption.text_mut(field) = value.into();
        self.edited.insert(field);
    }
}
