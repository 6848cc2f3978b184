//! Persistence tiers: the ordered fallback chain a rasterized frame goes
//! through until one strategy saves it.
//!
//! ```text
//! Web ───────────────────────────────────────────────► Download
//! Android ──► Gallery ──fail──────────────────────────► Download
//! iOS/Desktop ──probe fails───────────────────────────► Download
//! iOS/Desktop ──► ExternalStorage ─► Documents ─► CacheAndShare ─► ShareInline
//! ```
//!
//! [`plan`] produces the sequence for a platform; [`persist`] walks it once,
//! stopping at the first success. Each tier runs at most once. Every failure
//! is turned into text by [`normalize_error`] before it is logged or shown.
//!
//! The last tier of every plan is terminal: its failure ends the export with
//! an error. Android never reaches the filesystem tiers; the others never
//! reach the gallery.

use super::capability::{Directory, FileRef, ShareRequest, WriteRequest};
use super::device::Device;
use super::pipeline::ExportResult;
use super::platform::Platform;
use crate::diagnostics::{self, Level};
use crate::fault::{Fault, normalize_error};
use base64::{Engine as _, engine::general_purpose};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Gallery plugin (Android).
    Gallery,
    /// `Pictures/{app_folder}/{name}` in shared storage.
    ExternalStorage,
    /// `{app_folder}/{name}` in the app's documents directory.
    Documents,
    /// `{name}` in the app cache, then offered to the share sheet.
    CacheAndShare,
    /// The encoded image itself handed to the share sheet.
    ShareInline,
    /// Browser-style download.
    Download,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Gallery => "gallery",
            Tier::ExternalStorage => "external_storage",
            Tier::Documents => "documents",
            Tier::CacheAndShare => "cache_and_share",
            Tier::ShareInline => "share_inline",
            Tier::Download => "download",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// User-facing messages
pub const SAVED_TO_GALLERY: &str = "Photo saved to gallery!";
pub const SAVED_TO_DOCUMENTS: &str = "Photo saved to documents folder!";
pub const SAVED_TO_CACHE: &str = "Photo saved (app cache)!";
pub const CHOOSE_LOCATION: &str = "Choose where to save!";
pub const SAVED_TO_DOWNLOADS: &str = "Photo saved! Check your downloads folder";
pub const SAVE_FAILED: &str = "Save failed, please try again";

// Share sheet texts
pub const SHARE_TITLE: &str = "Save photo";
pub const SHARE_TEXT: &str = "Photo Frame photo";
pub const SHARE_DIALOG_TITLE: &str = "Save photo to gallery";

/// Ordered tiers for `platform`.
///
/// `probe` reports whether native filesystem writes are available. It is
/// only called for native platforms other than Android.
pub fn plan(platform: Platform, probe: impl FnOnce() -> bool) -> Vec<Tier> {
    if !platform.is_native() {
        return vec![Tier::Download];
    }
    if platform.is_android() {
        return vec![Tier::Gallery, Tier::Download];
    }
    if !probe() {
        return vec![Tier::Download];
    }
    vec![
        Tier::ExternalStorage,
        Tier::Documents,
        Tier::CacheAndShare,
        Tier::ShareInline,
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Saved,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierAttempt {
    pub tier: Tier,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

impl TierAttempt {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Saved)
    }
}

/// The image in every encoding a tier might want.
struct Payload<'a> {
    file_name: &'a str,
    bytes: &'a [u8],
    base64: String,
}

impl Payload<'_> {
    fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", self.base64)
    }
}

struct Saved {
    message: &'static str,
    location: Option<PathBuf>,
}

/// Walk the tier plan for `device` until one tier saves `png`.
pub fn persist(device: &Device<'_>, png: &[u8], file_name: &str) -> ExportResult {
    let tiers = plan(device.platform, || device.filesystem_available());
    diagnostics::info(
        "Export",
        format!(
            "Persisting {file_name} on {}: {}",
            device.platform,
            tiers.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(" → ")
        ),
    );

    let payload = Payload {
        file_name,
        bytes: png,
        base64: general_purpose::STANDARD.encode(png),
    };
    let mut attempts = Vec::with_capacity(tiers.len());
    let mut last_error: Option<String> = None;

    for &tier in &tiers {
        match run_tier(tier, device, &payload, last_error.as_deref()) {
            Ok(saved) => {
                attempts.push(TierAttempt {
                    tier,
                    outcome: AttemptOutcome::Saved,
                });
                diagnostics::info("Export", format!("Saved via {tier}: {}", saved.message));
                return ExportResult {
                    success: true,
                    message: saved.message.to_string(),
                    tier: Some(tier),
                    attempts,
                    location: saved.location,
                };
            }
            Err(error) => {
                diagnostics::record(
                    Level::Error,
                    "Export",
                    format!("{tier} failed: {error}"),
                    Some(json!({ "tier": tier.as_str(), "error": error })),
                );
                attempts.push(TierAttempt {
                    tier,
                    outcome: AttemptOutcome::Failed {
                        error: error.clone(),
                    },
                });
                last_error = Some(error);
            }
        }
    }

    let last = tiers.last().copied().unwrap_or(Tier::Download);
    let error = last_error.unwrap_or_default();
    ExportResult {
        success: false,
        message: terminal_message(device.platform, last, &error),
        tier: Some(last),
        attempts,
        location: None,
    }
}

/// The error shown when the final tier of a plan fails.
fn terminal_message(platform: Platform, tier: Tier, error: &str) -> String {
    match tier {
        Tier::ShareInline => {
            format!("Save failed: {error}. Please check storage permission settings.")
        }
        Tier::Download if platform == Platform::Web => error.to_string(),
        _ => SAVE_FAILED.to_string(),
    }
}

fn run_tier(
    tier: Tier,
    device: &Device<'_>,
    payload: &Payload<'_>,
    carried_error: Option<&str>,
) -> Result<Saved, String> {
    diagnostics::debug("Export", format!("Trying {tier}"));
    match tier {
        Tier::Gallery => save_to_gallery(device, payload),
        Tier::ExternalStorage => {
            let path = format!("Pictures/{}/{}", device.app_folder, payload.file_name);
            let file = write(device, payload, path, Directory::ExternalStorage)
                .map_err(|f| normalize_error(&f, "External storage failed"))?;
            Ok(Saved {
                message: SAVED_TO_GALLERY,
                location: Some(file.path),
            })
        }
        Tier::Documents => {
            let path = format!("{}/{}", device.app_folder, payload.file_name);
            let file = write(device, payload, path, Directory::Documents)
                .map_err(|f| normalize_error(&f, "Documents directory failed"))?;
            Ok(Saved {
                message: SAVED_TO_DOCUMENTS,
                location: Some(file.path),
            })
        }
        Tier::CacheAndShare => {
            let file = write(device, payload, payload.file_name.to_string(), Directory::Cache)
                .map_err(|f| normalize_error(&f, "Unknown error"))?;
            let request = ShareRequest {
                title: SHARE_TITLE.to_string(),
                text: SHARE_TEXT.to_string(),
                url: file.uri.clone(),
                dialog_title: Some(SHARE_DIALOG_TITLE.to_string()),
            };
            // The file exists either way; a failed share still counts
            let message = match share(device, &request) {
                Ok(()) => CHOOSE_LOCATION,
                Err(fault) => {
                    let reason = normalize_error(&fault, "Share unavailable");
                    diagnostics::info("Export", format!("Share failed, file kept in cache: {reason}"));
                    SAVED_TO_CACHE
                }
            };
            Ok(Saved {
                message,
                location: Some(file.path),
            })
        }
        Tier::ShareInline => {
            let request = ShareRequest {
                title: SHARE_TITLE.to_string(),
                text: SHARE_TEXT.to_string(),
                url: payload.data_url(),
                dialog_title: None,
            };
            share(device, &request)
                .map_err(|f| normalize_error(&f, carried_error.unwrap_or("Unknown error")))?;
            Ok(Saved {
                message: CHOOSE_LOCATION,
                location: None,
            })
        }
        Tier::Download => {
            let path = device
                .download
                .download(payload.file_name, payload.bytes)
                .map_err(|f| normalize_error(&f, "Download failed"))?;
            Ok(Saved {
                message: SAVED_TO_DOWNLOADS,
                location: Some(path),
            })
        }
    }
}

fn save_to_gallery(device: &Device<'_>, payload: &Payload<'_>) -> Result<Saved, String> {
    let Some(gallery) = device.gallery else {
        return Err("Gallery plugin not available".to_string());
    };
    match gallery.save_to_gallery(&payload.base64, payload.file_name) {
        Ok(outcome) if outcome.success => Ok(Saved {
            message: SAVED_TO_GALLERY,
            location: None,
        }),
        Ok(outcome) => Err(outcome
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "Save failed".to_string())),
        Err(fault) => Err(normalize_error(&fault, "Save failed")),
    }
}

fn write(
    device: &Device<'_>,
    payload: &Payload<'_>,
    path: String,
    directory: Directory,
) -> Result<FileRef, Fault> {
    let Some(filesystem) = device.filesystem else {
        return Err(Fault::message("Filesystem not available"));
    };
    filesystem.write_file(&WriteRequest {
        path,
        data: payload.base64.clone(),
        directory,
        recursive: true,
    })
}

fn share(device: &Device<'_>, request: &ShareRequest) -> Result<(), Fault> {
    match device.share {
        Some(share) => share.share(request),
        None => Err(Fault::message("Share not available")),
    }
}
