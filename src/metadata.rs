//! Camera metadata extraction and normalization.
//!
//! Extraction is split in two:
//!
//! - A [`MetadataSource`] turns raw file bytes into a [`TagMap`]: recognized
//!   tag names (`Make`, `Model`, `FNumber`, …) mapped to values, or `None`
//!   when the file carries no tags at all. [`ExifSource`] is the shipped
//!   implementation, backed by `kamadak-exif`.
//! - [`ImageMetadata::from_tags`] normalizes a tag map into typed, optional
//!   fields. Anything missing or malformed is simply absent; nothing here is
//!   an error.
//!
//! ## Device name derivation
//!
//! Cameras disagree on whether `Model` repeats the manufacturer. Apple writes
//! `Make = "Apple"`, `Model = "iPhone 15 Pro"`; Canon writes `Make = "Canon"`,
//! `Model = "Canon EOS R5"`. [`derive_device_name`] prefixes the make only
//! when the model does not already contain it (case-insensitively), so both
//! come out right.
//!
//! ## Tech specs
//!
//! The caption's spec row is built by [`tech_specs`]: focal length, aperture,
//! shutter speed and ISO, in that order, skipping whatever is absent.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Metadata parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single tag value as reported by a metadata source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Number(f64),
    Text(String),
}

impl TagValue {
    fn as_text(&self) -> Option<String> {
        match self {
            TagValue::Text(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            TagValue::Number(n) => Some(n.to_string()),
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            TagValue::Number(n) => Some(*n),
            TagValue::Text(s) => s.trim().parse().ok(),
        }
        .filter(|n: &f64| n.is_finite())
    }
}

/// Recognized tag names mapped to their values.
pub type TagMap = BTreeMap<String, TagValue>;

/// An EXIF-equivalent capability: raw file bytes in, tags out.
pub trait MetadataSource {
    /// Read the tags embedded in `bytes`. `Ok(None)` means the file carries
    /// no recognizable tags, which is an expected outcome.
    fn read_tags(&self, bytes: &[u8]) -> Result<Option<TagMap>, MetadataError>;
}

/// Normalized capture metadata. Every field is optional; a missing field is
/// simply not displayed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub make: Option<String>,
    pub model: Option<String>,
    pub captured_at: Option<NaiveDateTime>,
    /// Seconds; sub-second exposures are fractions (1/125 → 0.008).
    pub exposure_time: Option<f64>,
    pub f_number: Option<f64>,
    pub iso: Option<u32>,
    /// Millimetres.
    pub focal_length: Option<f64>,
    pub lens_model: Option<String>,
    pub software: Option<String>,
}

impl ImageMetadata {
    pub fn from_tags(tags: &TagMap) -> Self {
        let text = |name: &str| tags.get(name).and_then(TagValue::as_text);
        let positive = |name: &str| {
            tags.get(name)
                .and_then(TagValue::as_number)
                .filter(|n| *n > 0.0)
        };

        Self {
            make: text("Make"),
            model: text("Model"),
            captured_at: text("DateTimeOriginal").and_then(|s| parse_exif_datetime(&s)),
            exposure_time: positive("ExposureTime"),
            f_number: positive("FNumber"),
            iso: positive("ISO").map(|n| n.round() as u32),
            focal_length: positive("FocalLength"),
            lens_model: text("LensModel"),
            software: text("Software"),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Suggested device line for the caption.
    pub fn device_name(&self) -> Option<String> {
        derive_device_name(self.make.as_deref(), self.model.as_deref())
    }
}

/// `model`, or `"{make} {model}"` when `make` is non-empty and not already a
/// case-insensitive substring of `model`.
pub fn derive_device_name(make: Option<&str>, model: Option<&str>) -> Option<String> {
    let make = make.map(str::trim).filter(|m| !m.is_empty());
    let model = model.map(str::trim).unwrap_or_default();

    let name = match make {
        Some(make) if !model.to_lowercase().contains(&make.to_lowercase()) => {
            format!("{make} {model}").trim_end().to_string()
        }
        _ => model.to_string(),
    };
    Some(name).filter(|n| !n.is_empty())
}

/// EXIF `DateTimeOriginal` is `YYYY:MM:DD HH:MM:SS`; ISO-style dashes are
/// accepted too since some writers use them.
fn parse_exif_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim().trim_matches('"');
    ["%Y:%m:%d %H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

// =============================================================================
// Formatting
// =============================================================================

/// `1/125` below one second, `2s` / `2.5s` otherwise.
pub fn format_shutter_speed(seconds: f64) -> Option<String> {
    if !(seconds.is_finite() && seconds > 0.0) {
        return None;
    }
    if seconds >= 1.0 {
        Some(format!("{seconds}s"))
    } else {
        Some(format!("1/{}", (1.0 / seconds).round() as u64))
    }
}

pub fn format_focal_length(mm: f64) -> String {
    format!("{}mm", mm.round() as u64)
}

pub fn format_aperture(f_number: f64) -> String {
    format!("f/{f_number}")
}

pub fn format_iso(iso: u32) -> String {
    format!("ISO {iso}")
}

/// The caption's tech-spec row: focal length, aperture, shutter, ISO.
pub fn tech_specs(metadata: &ImageMetadata) -> Vec<String> {
    [
        metadata.focal_length.map(format_focal_length),
        metadata.f_number.map(format_aperture),
        metadata.exposure_time.and_then(format_shutter_speed),
        metadata.iso.map(format_iso),
    ]
    .into_iter()
    .flatten()
    .collect()
}

// =============================================================================
// kamadak-exif source
// =============================================================================

/// Reads EXIF from JPEG, TIFF, HEIF, PNG and WebP containers.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifSource;

impl ExifSource {
    pub fn new() -> Self {
        Self
    }
}

const TEXT_TAGS: &[(&str, exif::Tag)] = &[
    ("Make", exif::Tag::Make),
    ("Model", exif::Tag::Model),
    ("DateTimeOriginal", exif::Tag::DateTimeOriginal),
    ("LensModel", exif::Tag::LensModel),
    ("Software", exif::Tag::Software),
];

const NUMBER_TAGS: &[(&str, exif::Tag)] = &[
    ("ExposureTime", exif::Tag::ExposureTime),
    ("FNumber", exif::Tag::FNumber),
    ("ISO", exif::Tag::PhotographicSensitivity),
    ("FocalLength", exif::Tag::FocalLength),
];

impl MetadataSource for ExifSource {
    fn read_tags(&self, bytes: &[u8]) -> Result<Option<TagMap>, MetadataError> {
        let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => return Ok(None),
            // Formats kamadak-exif does not know carry no tags it can read
            Err(exif::Error::NotSupported(_)) => return Ok(None),
            Err(e) => return Err(MetadataError::Parse(e.to_string())),
        };

        let mut tags = TagMap::new();
        for (name, tag) in TEXT_TAGS {
            if let Some(text) = exif
                .get_field(*tag, exif::In::PRIMARY)
                .and_then(|f| ascii_value(&f.value))
            {
                tags.insert(name.to_string(), TagValue::Text(text));
            }
        }
        for (name, tag) in NUMBER_TAGS {
            if let Some(n) = exif
                .get_field(*tag, exif::In::PRIMARY)
                .and_then(|f| numeric_value(&f.value))
            {
                tags.insert(name.to_string(), TagValue::Number(n));
            }
        }

        Ok(Some(tags).filter(|t| !t.is_empty()))
    }
}

fn ascii_value(value: &exif::Value) -> Option<String> {
    match value {
        exif::Value::Ascii(parts) => parts.first().map(|raw| {
            String::from_utf8_lossy(raw)
                .trim_end_matches('\0')
                .trim()
                .to_string()
        }),
        _ => None,
    }
    .filter(|s| !s.is_empty())
}

fn numeric_value(value: &exif::Value) -> Option<f64> {
    match value {
        exif::Value::Rational(v) if !v.is_empty() => Some(v[0].to_f64()),
        exif::Value::SRational(v) if !v.is_empty() => Some(v[0].to_f64()),
        other => other.get_uint(0).map(f64::from),
    }
    .filter(|n| n.is_finite())
}
