//! Recording mocks for every capability trait.
//!
//! Each mock records what it was asked to do and answers with a fixed
//! outcome. Uses Mutex (not RefCell) so the mocks stay `Sync`.

use super::capability::{
    Directory, Download, FileRef, Filesystem, Gallery, GalleryOutcome, Share, ShareRequest,
    WriteRequest,
};
use crate::fault::Fault;
use std::path::PathBuf;
use std::sync::Mutex;

/// A fresh copy of `fault` for every call. Boxed errors are replayed as
/// their message.
fn replay(fault: &Fault) -> Fault {
    match fault {
        Fault::Message(text) => Fault::Message(text.clone()),
        Fault::Error(err) => Fault::Message(err.to_string()),
        Fault::Event { kind } => Fault::Event { kind: kind.clone() },
        Fault::Payload(value) => Fault::Payload(value.clone()),
    }
}

// =============================================================================
// Download
// =============================================================================

pub struct RecordingDownload {
    failure: Option<Fault>,
    calls: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingDownload {
    pub fn succeeding() -> Self {
        Self {
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(fault: Fault) -> Self {
        Self {
            failure: Some(fault),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(file_name, bytes)` per call.
    pub fn calls(&self) -> Vec<(String, Vec<u8>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Download for RecordingDownload {
    fn download(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, Fault> {
        self.calls
            .lock()
            .unwrap()
            .push((file_name.to_string(), bytes.to_vec()));
        match &self.failure {
            Some(fault) => Err(replay(fault)),
            None => Ok(PathBuf::from("/downloads").join(file_name)),
        }
    }
}

// =============================================================================
// Gallery
// =============================================================================

enum GalleryAnswer {
    Saved,
    Rejected(Option<String>),
    Fails(Fault),
}

pub struct RecordingGallery {
    answer: GalleryAnswer,
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingGallery {
    fn answering(answer: GalleryAnswer) -> Self {
        Self {
            answer,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::answering(GalleryAnswer::Saved)
    }

    /// Reports `success: false` with an optional message.
    pub fn rejecting(message: Option<&str>) -> Self {
        Self::answering(GalleryAnswer::Rejected(message.map(str::to_string)))
    }

    pub fn failing(fault: Fault) -> Self {
        Self::answering(GalleryAnswer::Fails(fault))
    }

    /// `(base64_data, file_name)` per call.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Gallery for RecordingGallery {
    fn save_to_gallery(
        &self,
        base64_data: &str,
        file_name: &str,
    ) -> Result<GalleryOutcome, Fault> {
        self.calls
            .lock()
            .unwrap()
            .push((base64_data.to_string(), file_name.to_string()));
        match &self.answer {
            GalleryAnswer::Saved => Ok(GalleryOutcome::saved("Saved")),
            GalleryAnswer::Rejected(message) => Ok(GalleryOutcome {
                success: false,
                message: message.clone(),
            }),
            GalleryAnswer::Fails(fault) => Err(replay(fault)),
        }
    }
}

// =============================================================================
// Filesystem
// =============================================================================

pub struct RecordingFilesystem {
    available: bool,
    failing: Vec<Directory>,
    failure: Fault,
    probes: Mutex<usize>,
    writes: Mutex<Vec<WriteRequest>>,
}

impl RecordingFilesystem {
    fn build(available: bool, failing: &[Directory], failure: Fault) -> Self {
        Self {
            available,
            failing: failing.to_vec(),
            failure,
            probes: Mutex::new(0),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::build(true, &[], Fault::message("unused"))
    }

    /// The probe reports no filesystem.
    pub fn unavailable() -> Self {
        Self::build(false, &[], Fault::message("unavailable"))
    }

    /// Writes into the listed directories fail.
    pub fn failing_on(directories: &[Directory]) -> Self {
        Self::build(true, directories, Fault::message("write failed"))
    }

    /// Every write fails with `fault`.
    pub fn failing_with(fault: Fault) -> Self {
        Self::build(
            true,
            &[
                Directory::ExternalStorage,
                Directory::Documents,
                Directory::Cache,
            ],
            fault,
        )
    }

    pub fn writes(&self) -> Vec<WriteRequest> {
        self.writes.lock().unwrap().clone()
    }

    pub fn probes(&self) -> usize {
        *self.probes.lock().unwrap()
    }
}

impl Filesystem for RecordingFilesystem {
    fn is_available(&self) -> bool {
        *self.probes.lock().unwrap() += 1;
        self.available
    }

    fn write_file(&self, request: &WriteRequest) -> Result<FileRef, Fault> {
        self.writes.lock().unwrap().push(request.clone());
        if self.failing.contains(&request.directory) {
            return Err(replay(&self.failure));
        }
        let root = match request.directory {
            Directory::ExternalStorage => "/external",
            Directory::Documents => "/documents",
            Directory::Cache => "/cache",
        };
        Ok(FileRef::from_path(PathBuf::from(root).join(&request.path)))
    }
}

// =============================================================================
// Share
// =============================================================================

pub struct RecordingShare {
    failure: Option<Fault>,
    requests: Mutex<Vec<ShareRequest>>,
}

impl RecordingShare {
    pub fn succeeding() -> Self {
        Self {
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(fault: Fault) -> Self {
        Self {
            failure: Some(fault),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ShareRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Share for RecordingShare {
    fn share(&self, request: &ShareRequest) -> Result<(), Fault> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.failure {
            Some(fault) => Err(replay(fault)),
            None => Ok(()),
        }
    }
}
