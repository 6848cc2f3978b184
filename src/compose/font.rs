//! Caption font loading.
//!
//! An explicitly configured font must load; a broken path is a config error.
//! Without one, a short list of common system font locations is tried and
//! the first that parses wins. Finding nothing is not an error: the frame
//! still renders, just without caption text.

use ab_glyph::FontVec;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("IO error reading font {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid font file: {0}")]
    Invalid(PathBuf),
}

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

pub fn load_font_file(path: &Path) -> Result<FontVec, FontError> {
    let data = std::fs::read(path).map_err(|source| FontError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    FontVec::try_from_vec(data).map_err(|_| FontError::Invalid(path.to_path_buf()))
}

/// Load the configured font, or search the usual system locations.
pub fn load_font(explicit: Option<&Path>) -> Result<Option<FontVec>, FontError> {
    if let Some(path) = explicit {
        return load_font_file(path).map(Some);
    }
    for candidate in SYSTEM_FONTS {
        let path = Path::new(candidate);
        if !path.is_file() {
            continue;
        }
        match load_font_file(path) {
            Ok(font) => {
                log::debug!("Using caption font {}", path.display());
                return Ok(Some(font));
            }
            Err(e) => log::debug!("Skipping font: {e}"),
        }
    }
    Ok(None)
}
