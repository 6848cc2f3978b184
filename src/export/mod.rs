//! Export pipeline: settle images, rasterize, then persist through the
//! platform's tier chain.
//!
//! ```text
//! Composition ──► settle_images ──► Rasterizer ──► persist ──► ExportResult
//!                  (3 s / image)     (PNG bytes)    (tiers)
//! ```
//!
//! The module is split into:
//! - **Platform**: where the app runs ([`Platform`])
//! - **Capability**: traits for gallery, filesystem, share, download
//! - **Tiers**: [`plan`] and the [`persist`] dispatcher
//! - **Pipeline**: [`export`] and [`ExportResult`]
//! - **Device**: the capability bundle, plus desktop implementations

pub mod capability;
pub mod device;
pub mod pipeline;
pub mod platform;
pub mod tiers;

#[cfg(test)]
pub mod testing;

pub use capability::{
    Directory, Download, FileRef, Filesystem, Gallery, GalleryOutcome, Share, ShareRequest,
    WriteRequest,
};
pub use device::{DesktopCapabilities, Device, FileDownload, LocalFilesystem, SystemShare, WebGallery};
pub use pipeline::{ExportResult, export, load_policy, raster_options};
pub use platform::Platform;
pub use tiers::{AttemptOutcome, Tier, TierAttempt, persist, plan};

/// `photo-frame-{millis}.png`
pub fn file_name_for_image(now_millis: i64) -> String {
    format!("photo-frame-{now_millis}.png")
}

/// `photo-frame-logs-{millis}.json`
pub fn file_name_for_logs(now_millis: i64) -> String {
    format!("photo-frame-logs-{now_millis}.json")
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
