//! Application configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [caption]
//! background = "#fbfbf9"    # Frame background
//! text_color = "#292524"    # Caption text
//! padding = 24              # Frame padding in px (0-100)
//! shadow = true
//! border = false
//! aspect_ratio = "auto"     # "auto", "1:1", "4:5", "9:16", ...
//! show_tech_specs = true
//! show_device = true
//! show_lens = true
//! photographer = ""         # "Captured by ..." credit line
//!
//! [render]
//! # font = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"
//! max_photo_edge = 1600     # Longest photo edge in logical px
//!
//! [export]
//! app_folder = "PhotoFrame" # Subfolder under Pictures/ and Documents/
//! pixel_ratio = 2.0         # Output density multiplier
//! image_timeout_ms = 3000   # Per-image load timeout
//! inline_grace_ms = 100     # Settle delay for in-memory images
//! filesystem = true         # Offer native directory writes
//! # download_dir = "~/Downloads"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::caption::{CaptionConfig, MAX_PADDING, parse_hex_color};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Application configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Initial caption state for every upload.
    pub caption: CaptionConfig,
    /// Frame rendering settings.
    pub render: RenderConfig,
    /// Export and persistence settings.
    pub export: ExportConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("caption.background", &self.caption.background),
            ("caption.text_color", &self.caption.text_color),
        ] {
            if parse_hex_color(value).is_none() {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a #rgb or #rrggbb color, got '{value}'"
                )));
            }
        }
        if self.caption.padding > MAX_PADDING {
            return Err(ConfigError::Validation(format!(
                "caption.padding must be 0-{MAX_PADDING}"
            )));
        }
        if !(0.5..=4.0).contains(&self.export.pixel_ratio) {
            return Err(ConfigError::Validation(
                "export.pixel_ratio must be between 0.5 and 4".into(),
            ));
        }
        if self.render.max_photo_edge < 64 {
            return Err(ConfigError::Validation(
                "render.max_photo_edge must be at least 64".into(),
            ));
        }
        if self.export.app_folder.trim().is_empty()
            || self.export.app_folder.contains(['/', '\\'])
        {
            return Err(ConfigError::Validation(
                "export.app_folder must be a single non-empty folder name".into(),
            ));
        }
        Ok(())
    }
}

/// Frame rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// TrueType/OpenType font for the caption. When absent, a list of
    /// common system font locations is searched.
    pub font: Option<PathBuf>,
    /// Longest edge of the photo inside the frame, in logical pixels,
    /// before the pixel ratio is applied.
    pub max_photo_edge: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font: None,
            max_photo_edge: 1600,
        }
    }
}

/// Export and persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Subfolder created under the pictures and documents directories.
    pub app_folder: String,
    /// Output pixel density multiplier.
    pub pixel_ratio: f32,
    /// How long to wait for a file-backed image to load.
    pub image_timeout_ms: u64,
    /// Grace delay granted to in-memory images instead of load tracking.
    pub inline_grace_ms: u64,
    /// Where the download tier writes. Defaults to the user's download
    /// directory, then the current directory.
    pub download_dir: Option<PathBuf>,
    /// Whether native directory writes are offered at all. Turning this off
    /// makes the capability probe fail, sending exports to the download tier.
    pub filesystem: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            app_folder: "PhotoFrame".to_string(),
            pixel_ratio: 2.0,
            image_timeout_ms: 3000,
            inline_grace_ms: 100,
            download_dir: None,
            filesystem: true,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a `config.toml` file.
///
/// `None` or a missing file yields the validated stock defaults. A file that
/// exists but is not valid TOML, or holds unknown keys, is an error.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let overlay = match path {
        Some(p) if p.exists() => {
            let content = fs::read_to_string(p)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        _ => None,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Photo Frame Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Caption: initial frame styling for every photo
# ---------------------------------------------------------------------------
[caption]
# Frame background and caption text colors (#rgb or #rrggbb).
# Presets: classic #fbfbf9/#292524, white #ffffff/#000000,
#          dark #1c1917/#fafaf9, stone #e7e5e4/#44403c
background = "#fbfbf9"
text_color = "#292524"

# Space between the frame edge and the photo, in pixels (0-100).
padding = 24

# Soft drop shadow around the frame.
shadow = true

# Thin rule around the photo in the text color.
border = false

# Frame aspect ratio: "auto" hugs the content, or "W:H" such as
# "1:1", "4:5" or "9:16".
aspect_ratio = "auto"

# Which caption rows to show. Device, system and lens lines are pre-filled
# from the photo's EXIF data and can be overridden on the command line.
show_tech_specs = true
show_device = true
show_lens = true

# Fixed caption text. Leave empty to use what the photo reports.
device = ""
system = ""
lens = ""

# Adds a "Captured by ..." line when set.
photographer = ""

# ---------------------------------------------------------------------------
# Rendering
# ---------------------------------------------------------------------------
[render]
# Font for caption text. When unset, common system fonts are tried.
# font = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"

# Longest photo edge inside the frame, in logical pixels.
max_photo_edge = 1600

# ---------------------------------------------------------------------------
# Export
# ---------------------------------------------------------------------------
[export]
# Folder created under Pictures/ and Documents/ for saved frames.
app_folder = "PhotoFrame"

# Output pixel density (2.0 renders at twice the logical size).
pixel_ratio = 2.0

# How long to wait for each file-backed image before rendering without it.
image_timeout_ms = 3000

# Settle delay for images already held in memory.
inline_grace_ms = 100

# Offer native directory writes. When false, frames go straight to the
# download directory.
filesystem = true

# Where downloads land. Defaults to the user's download directory.
# download_dir = "/home/me/Downloads"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::AspectRatio;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.export.pixel_ratio, 2.0);
        assert_eq!(config.export.image_timeout_ms, 3000);
        assert_eq!(config.export.app_folder, "PhotoFrame");
        assert_eq!(config.caption.padding, 24);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[caption]
background = "#1c1917"
padding = 40
"##;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.caption.background, "#1c1917");
        assert_eq!(config.caption.padding, 40);
        // Defaults preserved
        assert_eq!(config.caption.text_color, "#292524");
        assert!(config.caption.shadow);
        assert_eq!(config.render.max_photo_edge, 1600);
    }

    #[test]
    fn unknown_keys_rejected() {
        let toml = r##"
[caption]
backgroud = "#ffffff"
"##;
        let result: Result<AppConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(Some(&tmp.path().join("config.toml"))).unwrap();
        assert_eq!(config.caption.background, "#fbfbf9");

        let config = load_config(None).unwrap();
        assert_eq!(config.export.inline_grace_ms, 100);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r##"
[caption]
photographer = "Ansel"
aspect_ratio = "4:5"

[export]
filesystem = false
"##,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.caption.photographer, "Ansel");
        assert_eq!(config.caption.aspect_ratio, AspectRatio::PORTRAIT);
        assert!(!config.export.filesystem);
        assert_eq!(config.export.app_folder, "PhotoFrame");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();
        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn validation_rejects_bad_color() {
        let overlay: toml::Value = toml::from_str(
            r#"
[caption]
background = "cream"
"#,
        )
        .unwrap();
        assert!(matches!(
            resolve_config(Some(overlay)),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn validation_rejects_padding_out_of_range() {
        let mut config = AppConfig::default();
        config.caption.padding = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_nested_app_folder() {
        let mut config = AppConfig::default();
        config.export.app_folder = "Photo/Frame".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_extreme_pixel_ratio() {
        let mut config = AppConfig::default();
        config.export.pixel_ratio = 10.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_deep_nested() {
        let base: toml::Value = toml::from_str(
            r#"
[caption]
padding = 24
shadow = true
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[caption]
shadow = false
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["caption"]["padding"].as_integer(), Some(24));
        assert_eq!(merged["caption"]["shadow"].as_bool(), Some(false));
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: AppConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = AppConfig::default();
        assert_eq!(config.caption, defaults.caption);
        assert_eq!(config.export.pixel_ratio, defaults.export.pixel_ratio);
        assert_eq!(config.render.max_photo_edge, defaults.render.max_photo_edge);
        config.validate().unwrap();
    }
}
