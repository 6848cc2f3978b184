//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Metadata
//!
//! ```text
//! Metadata
//!     Device: Apple iPhone 15 Pro
//!     Captured: 2024-05-01 09:30:00
//!     Lens: iPhone 15 Pro back camera 6.86mm f/1.78
//!     Specs: 24mm  f/1.8  1/125  ISO 100
//! ```
//!
//! ## Export
//!
//! ```text
//! Export
//!     001 external_storage: failed (permission denied)
//!     002 documents: saved
//!     Saved: /home/me/Documents/PhotoFrame/photo-frame-1700000000000.png
//! ok: Photo saved to documents folder!
//! ```
//!
//! ## Logs
//!
//! ```text
//! Logs (1 entry)
//!     Categories: Export, Upload
//! [2024-05-01T09:30:00+00:00] [WARN] [Export] external_storage failed: permission denied
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns lines) for testability and a
//! `print_*` wrapper that writes to stdout. Format functions are pure: no
//! I/O, no side effects.

use crate::caption::CaptionConfig;
use crate::diagnostics::LogEntry;
use crate::export::{AttemptOutcome, ExportResult};
use crate::metadata::{ImageMetadata, tech_specs};
use crate::notice::{Notice, NoticeLevel};

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `    Label: value`, skipped when the value is blank.
fn field_line(label: &str, value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| format!("{}{}: {}", indent(1), label, v))
}

// ============================================================================
// Metadata
// ============================================================================

pub fn format_metadata(metadata: &ImageMetadata) -> Vec<String> {
    let mut lines = vec!["Metadata".to_string()];
    if metadata.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
        return lines;
    }

    let device = metadata.device_name();
    let captured = metadata.captured_at.map(|t| t.to_string());
    let specs = tech_specs(metadata).join("  ");
    lines.extend(
        [
            field_line("Device", device.as_deref()),
            field_line("Captured", captured.as_deref()),
            field_line("Lens", metadata.lens_model.as_deref()),
            field_line("Software", metadata.software.as_deref()),
            field_line("Specs", Some(&specs)),
        ]
        .into_iter()
        .flatten(),
    );
    lines
}

pub fn print_metadata(metadata: &ImageMetadata) {
    for line in format_metadata(metadata) {
        println!("{}", line);
    }
}

// ============================================================================
// Caption
// ============================================================================

pub fn format_caption(caption: &CaptionConfig) -> Vec<String> {
    let mut lines = vec!["Caption".to_string()];
    lines.extend(
        [
            field_line("Device", Some(&caption.device)),
            field_line("System", Some(&caption.system)),
            field_line("Lens", Some(&caption.lens)),
            field_line("Photographer", Some(&caption.photographer)),
        ]
        .into_iter()
        .flatten(),
    );

    let theme = caption
        .active_theme()
        .map(|t| format!("{t:?}").to_lowercase())
        .unwrap_or_else(|| caption.background.clone());
    let mut style = vec![theme, format!("padding {}px", caption.padding)];
    if caption.shadow {
        style.push("shadow".to_string());
    }
    if caption.border {
        style.push("border".to_string());
    }
    style.push(format!("aspect {}", caption.aspect_ratio));
    lines.push(format!("{}Style: {}", indent(1), style.join(", ")));

    let hidden: Vec<&str> = [
        (!caption.show_device, "device"),
        (!caption.show_lens, "lens"),
        (!caption.show_tech_specs, "specs"),
    ]
    .into_iter()
    .filter_map(|(hidden, name)| hidden.then_some(name))
    .collect();
    if !hidden.is_empty() {
        lines.push(format!("{}Hidden: {}", indent(1), hidden.join(", ")));
    }
    lines
}

pub fn print_caption(caption: &CaptionConfig) {
    for line in format_caption(caption) {
        println!("{}", line);
    }
}

// ============================================================================
// Notices and export results
// ============================================================================

pub fn format_notice(notice: &Notice) -> String {
    let prefix = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "ok",
        NoticeLevel::Error => "error",
    };
    format!("{prefix}: {}", notice.text)
}

/// Errors go to stderr, everything else to stdout.
pub fn print_notice(notice: &Notice) {
    if notice.is_error() {
        eprintln!("{}", format_notice(notice));
    } else {
        println!("{}", format_notice(notice));
    }
}

pub fn format_export_result(result: &ExportResult) -> Vec<String> {
    let mut lines = vec!["Export".to_string()];
    if result.tier.is_none() {
        lines.push(format!("{}rasterize: failed", indent(1)));
    }
    for (i, attempt) in result.attempts.iter().enumerate() {
        let status = match &attempt.outcome {
            AttemptOutcome::Saved => "saved".to_string(),
            AttemptOutcome::Failed { error } => format!("failed ({error})"),
        };
        lines.push(format!(
            "{}{} {}: {}",
            indent(1),
            format_index(i + 1),
            attempt.tier,
            status
        ));
    }
    if let Some(location) = &result.location {
        lines.push(format!("{}Saved: {}", indent(1), location.display()));
    }
    lines.push(format_notice(&result.notice()));
    lines
}

pub fn print_export_result(result: &ExportResult) {
    let lines = format_export_result(result);
    let Some((last, body)) = lines.split_last() else {
        return;
    };
    for line in body {
        println!("{}", line);
    }
    if result.success {
        println!("{}", last);
    } else {
        eprintln!("{}", last);
    }
}

// ============================================================================
// Logs
// ============================================================================

pub fn format_log_entry(entry: &LogEntry) -> String {
    let mut line = format!(
        "[{}] [{}] [{}] {}",
        entry.timestamp.to_rfc3339(),
        entry.level.as_str(),
        entry.category,
        entry.message
    );
    if let Some(data) = &entry.data {
        line.push(' ');
        line.push_str(&data.to_string());
    }
    line
}

pub fn format_logs(entries: &[LogEntry]) -> Vec<String> {
    entries.iter().map(format_log_entry).collect()
}

/// Header with the entry count and the categories present in the buffer,
/// then one line per entry.
pub fn format_log_listing(entries: &[LogEntry], categories: &[String]) -> Vec<String> {
    let noun = if entries.len() == 1 { "entry" } else { "entries" };
    let mut lines = vec![format!("Logs ({} {noun})", entries.len())];
    if !categories.is_empty() {
        lines.push(format!("{}Categories: {}", indent(1), categories.join(", ")));
    }
    lines.extend(format_logs(entries));
    lines
}

pub fn print_log_listing(entries: &[LogEntry], categories: &[String]) {
    for line in format_log_listing(entries, categories) {
        println!("{}", line);
    }
}
