//! One export, end to end: image wait → rasterize → persistence tiers.
//!
//! Stages run strictly in order. A rasterization failure ends the export
//! with an error and no tier is attempted; after that, [`persist`] owns the
//! outcome.

use super::device::Device;
use super::file_name_for_image;
use super::tiers::{Tier, TierAttempt, persist};
use crate::compose::{
    Composition, LoadPolicy, PixelRatio, RasterOptions, Rasterizer, settle_images,
};
use crate::config::ExportConfig;
use crate::diagnostics;
use crate::fault::normalize_error;
use crate::notice::Notice;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Shown when rasterization fails without a readable reason.
pub const RASTER_FAILED: &str = "Image generation failed, please try again";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportResult {
    pub success: bool,
    /// Human-readable outcome, ready for a notice.
    pub message: String,
    /// The tier the export ended at; `None` when rasterization failed.
    pub tier: Option<Tier>,
    pub attempts: Vec<TierAttempt>,
    /// Where the image was saved, when the tier knows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,
}

impl ExportResult {
    pub fn notice(&self) -> Notice {
        if self.success {
            Notice::success(&self.message)
        } else {
            Notice::error(&self.message)
        }
    }
}

/// Load policy from `[export]` settings.
pub fn load_policy(config: &ExportConfig) -> LoadPolicy {
    LoadPolicy {
        timeout: Duration::from_millis(config.image_timeout_ms),
        inline_grace: Duration::from_millis(config.inline_grace_ms),
    }
}

/// Rasterizer options from `[export]` settings.
pub fn raster_options(config: &ExportConfig) -> RasterOptions {
    RasterOptions {
        pixel_ratio: PixelRatio::new(config.pixel_ratio),
        ..RasterOptions::default()
    }
}

/// Export `composition` through `device`.
///
/// `now_millis` names the file (`photo-frame-{now_millis}.png`); the same
/// name is used by every tier of this export.
pub fn export(
    composition: &mut Composition,
    rasterizer: &dyn Rasterizer,
    device: &Device<'_>,
    policy: &LoadPolicy,
    options: &RasterOptions,
    now_millis: i64,
) -> ExportResult {
    diagnostics::info("Export", "Starting export");

    let report = settle_images(composition, policy);
    if report.failed + report.timed_out > 0 {
        diagnostics::warn(
            "Export",
            format!(
                "{} image(s) did not load; continuing",
                report.failed + report.timed_out
            ),
        );
    }

    let png = match rasterizer.rasterize(composition, options) {
        Ok(png) => png,
        Err(fault) => {
            let message = normalize_error(&fault, RASTER_FAILED);
            diagnostics::error("Export", format!("Rasterization failed: {message}"));
            return ExportResult {
                success: false,
                message,
                tier: None,
                attempts: Vec::new(),
                location: None,
            };
        }
    };
    diagnostics::debug("Export", format!("Rasterized {} bytes", png.len()));

    persist(device, &png, &file_name_for_image(now_millis))
}
