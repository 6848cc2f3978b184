//! Pure dimension math for frame layout.
//!
//! No pixels are touched here; the renderer measures its nodes, then asks
//! these functions where things go.

use crate::caption::AspectRatio;

/// Scale `(width, height)` down so the longer edge is at most `max_edge`,
/// preserving the aspect ratio. Never upscales; never returns a zero side.
pub fn fit_within(dims: (u32, u32), max_edge: u32) -> (u32, u32) {
    let (w, h) = dims;
    let longest = w.max(h);
    if longest <= max_edge || longest == 0 {
        return (w.max(1), h.max(1));
    }
    let scale = max_edge as f64 / longest as f64;
    (
        ((w as f64 * scale).round() as u32).max(1),
        ((h as f64 * scale).round() as u32).max(1),
    )
}

/// Grow `(width, height)` along one axis until it matches `aspect`.
///
/// Too short for the ratio → taller; too tall → wider. Content is never
/// cropped.
pub fn fit_aspect(dims: (u32, u32), aspect: AspectRatio) -> (u32, u32) {
    let (w, h) = dims;
    match aspect {
        AspectRatio::Auto => (w, h),
        AspectRatio::Ratio(rw, rh) => {
            let target_h = (w as f64 * rh as f64 / rw as f64).round() as u32;
            if h <= target_h {
                (w, target_h)
            } else {
                let target_w = (h as f64 * rw as f64 / rh as f64).round() as u32;
                (target_w, h)
            }
        }
    }
}

/// Offset that centers `inner` within `outer`.
pub fn center(outer: u32, inner: u32) -> u32 {
    outer.saturating_sub(inner) / 2
}

/// Card layout in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardBox {
    pub width: u32,
    pub height: u32,
    /// Content origin inside the card.
    pub content_x: u32,
    pub content_y: u32,
    /// Width available to content.
    pub content_width: u32,
}

/// Place content of the given size in a card.
pub fn card_box(
    content: (u32, u32),
    padding: u32,
    min_width: u32,
    aspect: AspectRatio,
) -> CardBox {
    let (content_w, content_h) = content;
    let natural = (
        content_w.saturating_add(padding.saturating_mul(2)).max(min_width),
        content_h.saturating_add(padding.saturating_mul(2)),
    );
    let (width, height) = fit_aspect(natural, aspect);
    let content_width = width - 2 * padding.min(width / 2);
    CardBox {
        width,
        height,
        content_x: padding.min(width / 2),
        content_y: center(height, content_h),
        content_width,
    }
}

/// Space reserved around the card for its drop shadow.
pub const SHADOW_MARGIN: u32 = 32;
/// Downward offset of the shadow.
pub const SHADOW_OFFSET: u32 = 10;
/// Shadow blur radius.
pub const SHADOW_BLUR: u32 = 22;

/// Shadow alpha (0–1) at a pixel, given the card rectangle shifted by
/// [`SHADOW_OFFSET`]. Fades linearly over [`SHADOW_BLUR`] from the edge.
pub fn shadow_alpha(px: f32, py: f32, rect: (f32, f32, f32, f32), blur: f32, peak: f32) -> f32 {
    let (x0, y0, x1, y1) = rect;
    let dx = (x0 - px).max(px - x1).max(0.0);
    let dy = (y0 - py).max(py - y1).max(0.0);
    let distance = (dx * dx + dy * dy).sqrt();
    if distance >= blur {
        0.0
    } else {
        peak * (1.0 - distance / blur).powi(2)
    }
}
