//! Image wait stage: settle every photo in a composition before rasterizing.
//!
//! File-backed photos are decoded on worker threads, all started together,
//! each with its own [`LoadPolicy::timeout`]. A photo that fails to decode or
//! misses its deadline is settled as failed/timed-out. Neither stops the
//! export; the rasterizer decides what to paint in its place.
//!
//! In-memory photos skip load tracking: they are decoded in place and the
//! stage waits out one [`LoadPolicy::inline_grace`], counted from the start
//! of the stage so it overlaps the file waits.
//!
//! Every exit path drops the worker's channel. A decoder that finishes after
//! its deadline finds the receiver gone and its result is discarded.

use super::node::{Composition, ImageSource, LoadState};
use super::options::LoadPolicy;
use crate::diagnostics;
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettleReport {
    pub loaded: usize,
    pub failed: usize,
    pub timed_out: usize,
    /// Photos that were already settled before this call.
    pub skipped: usize,
}

impl SettleReport {
    pub fn total(&self) -> usize {
        self.loaded + self.failed + self.timed_out + self.skipped
    }
}

type DecodeResult = Result<DynamicImage, String>;

fn decode_file(path: PathBuf) -> DecodeResult {
    image::ImageReader::open(&path)
        .map_err(|e| format!("{}: {e}", path.display()))?
        .with_guessed_format()
        .map_err(|e| format!("{}: {e}", path.display()))?
        .decode()
        .map_err(|e| format!("Failed to decode {}: {e}", path.display()))
}

fn decode_inline(bytes: &[u8]) -> DecodeResult {
    image::load_from_memory(bytes).map_err(|e| format!("Failed to decode inline image: {e}"))
}

/// Settle every pending photo in `composition`.
pub fn settle_images(composition: &mut Composition, policy: &LoadPolicy) -> SettleReport {
    settle_with(composition, policy, decode_file)
}

/// [`settle_images`] with the file decoder supplied by the caller.
fn settle_with<F>(composition: &mut Composition, policy: &LoadPolicy, decode: F) -> SettleReport
where
    F: Fn(PathBuf) -> DecodeResult + Copy + Send + 'static,
{
    let mut report = SettleReport::default();
    let mut waiting = Vec::new();
    let mut any_inline = false;
    let started = Instant::now();

    for photo in composition.photos_mut() {
        if photo.state.is_settled() {
            report.skipped += 1;
            continue;
        }
        match &photo.source {
            ImageSource::Inline { bytes, .. } => {
                any_inline = true;
                photo.state = settle(decode_inline(bytes), &mut report);
            }
            ImageSource::File(path) => {
                let (tx, rx) = mpsc::channel::<DecodeResult>();
                let path = path.clone();
                std::thread::spawn(move || {
                    // Receiver may be gone after a timeout
                    let _ = tx.send(decode(path));
                });
                waiting.push((photo, rx));
            }
        }
    }

    let deadline = started + policy.timeout;
    for (photo, rx) in waiting {
        let remaining = deadline.saturating_duration_since(Instant::now());
        photo.state = match rx.recv_timeout(remaining) {
            Ok(result) => settle(result, &mut report),
            Err(RecvTimeoutError::Timeout) => {
                diagnostics::warn(
                    "Export",
                    format!("Image load timeout: {}", photo.source.describe()),
                );
                report.timed_out += 1;
                LoadState::TimedOut
            }
            Err(RecvTimeoutError::Disconnected) => {
                report.failed += 1;
                LoadState::Failed("decoder exited without a result".to_string())
            }
        };
        // rx dropped here
    }

    // The grace runs alongside the file waits, not after them
    let grace_left = policy.inline_grace.saturating_sub(started.elapsed());
    if any_inline && !grace_left.is_zero() {
        std::thread::sleep(grace_left);
    }

    diagnostics::debug(
        "Export",
        format!(
            "Images settled: {} loaded, {} failed, {} timed out",
            report.loaded, report.failed, report.timed_out
        ),
    );
    report
}

fn settle(result: DecodeResult, report: &mut SettleReport) -> LoadState {
    match result {
        Ok(img) => {
            report.loaded += 1;
            LoadState::Loaded(Arc::new(img))
        }
        Err(reason) => {
            diagnostics::error("Export", format!("Image load error: {reason}"));
            report.failed += 1;
            LoadState::Failed(reason)
        }
    }
}
