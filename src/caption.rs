//! Caption presentation state.
//!
//! [`CaptionConfig`] is everything the user can tweak about the frame: colors,
//! padding, toggles and the free-text lines. It starts from defaults (or the
//! `[caption]` table of `config.toml`), gets pre-filled from metadata on
//! upload, and is then edited freely. It never points back at the metadata
//! it was pre-filled from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Highest padding the frame accepts, in logical pixels.
pub const MAX_PADDING: u32 = 100;

/// Largest side accepted in a `W:H` aspect ratio.
pub const MAX_RATIO_SIDE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionConfig {
    /// Frame background (`#rgb` or `#rrggbb`).
    pub background: String,
    /// Caption text color.
    pub text_color: String,
    /// Space between the frame edge and its content, 0–100 px.
    pub padding: u32,
    pub shadow: bool,
    /// Thin rule around the photo in the text color.
    pub border: bool,
    /// Target frame aspect ratio; `auto` hugs the content.
    pub aspect_ratio: AspectRatio,
    pub show_tech_specs: bool,
    pub show_device: bool,
    pub show_lens: bool,
    pub device: String,
    /// Firmware / software line shown under the device name.
    pub system: String,
    pub lens: String,
    pub photographer: String,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        let classic = Theme::Classic.colors();
        Self {
            background: classic.background.to_string(),
            text_color: classic.text.to_string(),
            padding: 24,
            shadow: true,
            border: false,
            aspect_ratio: AspectRatio::Auto,
            show_tech_specs: true,
            show_device: true,
            show_lens: true,
            device: String::new(),
            system: String::new(),
            lens: String::new(),
            photographer: String::new(),
        }
    }
}

impl CaptionConfig {
    /// Apply a preset's background and text colors.
    pub fn apply_theme(&mut self, theme: Theme) {
        let colors = theme.colors();
        self.background = colors.background.to_string();
        self.text_color = colors.text.to_string();
    }

    /// Set padding, clamped to `0..=MAX_PADDING`.
    pub fn set_padding(&mut self, padding: u32) {
        self.padding = padding.min(MAX_PADDING);
    }

    /// The preset whose background matches, if any.
    pub fn active_theme(&self) -> Option<Theme> {
        Theme::ALL
            .into_iter()
            .find(|t| t.colors().background.eq_ignore_ascii_case(&self.background))
    }

    pub fn text(&self, field: CaptionField) -> &str {
        match field {
            CaptionField::Device => &self.device,
            CaptionField::System => &self.system,
            CaptionField::Lens => &self.lens,
            CaptionField::Photographer => &self.photographer,
        }
    }

    pub fn text_mut(&mut self, field: CaptionField) -> &mut String {
        match field {
            CaptionField::Device => &mut self.device,
            CaptionField::System => &mut self.system,
            CaptionField::Lens => &mut self.lens,
            CaptionField::Photographer => &mut self.photographer,
        }
    }
}

/// The free-text caption lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptionField {
    Device,
    System,
    Lens,
    Photographer,
}

impl CaptionField {
    /// Lines that upload pre-fills from metadata.
    pub const DERIVED: [CaptionField; 3] =
        [CaptionField::Device, CaptionField::System, CaptionField::Lens];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeColors {
    pub background: &'static str,
    pub text: &'static str,
}

/// Built-in color presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Theme {
    Classic,
    White,
    Dark,
    Stone,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Classic, Theme::White, Theme::Dark, Theme::Stone];

    pub fn colors(self) -> ThemeColors {
        match self {
            Theme::Classic => ThemeColors {
                background: "#fbfbf9",
                text: "#292524",
            },
            Theme::White => ThemeColors {
                background: "#ffffff",
                text: "#000000",
            },
            Theme::Dark => ThemeColors {
                background: "#1c1917",
                text: "#fafaf9",
            },
            Theme::Stone => ThemeColors {
                background: "#e7e5e4",
                text: "#44403c",
            },
        }
    }
}

/// Frame aspect ratio: `auto` or `W:H`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AspectRatio {
    #[default]
    Auto,
    Ratio(u32, u32),
}

impl AspectRatio {
    pub const SQUARE: AspectRatio = AspectRatio::Ratio(1, 1);
    pub const PORTRAIT: AspectRatio = AspectRatio::Ratio(4, 5);
    pub const STORY: AspectRatio = AspectRatio::Ratio(9, 16);
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AspectRatio::Auto => f.write_str("auto"),
            AspectRatio::Ratio(w, h) => write!(f, "{w}:{h}"),
        }
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(AspectRatio::Auto);
        }
        let (w, h) = s
            .split_once(':')
            .ok_or_else(|| format!("aspect ratio '{s}' must be 'auto' or 'W:H'"))?;
        let w: u32 = w
            .trim()
            .parse()
            .map_err(|_| format!("aspect ratio '{s}' has a non-numeric width"))?;
        let h: u32 = h
            .trim()
            .parse()
            .map_err(|_| format!("aspect ratio '{s}' has a non-numeric height"))?;
        if w == 0 || h == 0 {
            return Err(format!("aspect ratio '{s}' values must be non-zero"));
        }
        if w > MAX_RATIO_SIDE || h > MAX_RATIO_SIDE {
            return Err(format!(
                "aspect ratio '{s}' values must be at most {MAX_RATIO_SIDE}"
            ));
        }
        Ok(AspectRatio::Ratio(w, h))
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(value: AspectRatio) -> Self {
        value.to_string()
    }
}

/// Parse `#rgb` or `#rrggbb` (leading `#` optional) into RGB bytes.
pub fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    let hex = value.trim().trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 17;
            }
            Some(rgb)
        }
        6 => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some([channel(0)?, channel(2)?, channel(4)?])
        }
        _ => None,
    }
}
