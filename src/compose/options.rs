//! What a rasterizer is asked to do.
//!
//! - [`PixelRatio`] — output density multiplier (0.5–4, default 2). Clamped on construction.
//! - [`RasterOptions`] — cache busting, pixel ratio, tolerance for images that
//!   never loaded, and the node filter.
//! - [`LoadPolicy`] — how long the image wait stage grants each image.

use super::node::Node;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRatio(f32);

impl PixelRatio {
    pub fn new(value: f32) -> Self {
        if value.is_finite() {
            Self(value.clamp(0.5, 4.0))
        } else {
            Self::default()
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Scale a logical length to device pixels.
    pub fn scale(self, logical: f32) -> f32 {
        logical * self.0
    }

    pub fn scale_px(self, logical: u32) -> u32 {
        (logical as f32 * self.0).round() as u32
    }
}

impl Default for PixelRatio {
    fn default() -> Self {
        Self(2.0)
    }
}

/// Keeps every node that paints something.
pub fn visual_only(node: &Node) -> bool {
    node.is_visual()
}

#[derive(Debug, Clone, Copy)]
pub struct RasterOptions {
    /// Bypass the resampled-photo cache: no lookup and nothing kept.
    pub cache_bust: bool,
    pub pixel_ratio: PixelRatio,
    /// Paint a placeholder for photos that failed or timed out instead of
    /// failing the whole rasterization.
    pub allow_unloaded: bool,
    /// Nodes for which this returns false are skipped entirely.
    pub filter: fn(&Node) -> bool,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            cache_bust: true,
            pixel_ratio: PixelRatio::default(),
            allow_unloaded: true,
            filter: visual_only,
        }
    }
}

impl RasterOptions {
    pub fn with_pixel_ratio(mut self, ratio: f32) -> Self {
        self.pixel_ratio = PixelRatio::new(ratio);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadPolicy {
    /// Per-image limit for file-backed sources.
    pub timeout: Duration,
    /// Fixed delay granted to in-memory sources.
    pub inline_grace: Duration,
}

impl Default for LoadPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(3000),
            inline_grace: Duration::from_millis(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_ratio_clamps() {
        assert_eq!(PixelRatio::new(0.1).value(), 0.5);
        assert_eq!(PixelRatio::new(3.0).value(), 3.0);
        assert_eq!(PixelRatio::new(12.0).value(), 4.0);
        assert_eq!(PixelRatio::new(f32::NAN).value(), 2.0);
    }

    #[test]
    fn pixel_ratio_scales() {
        let ratio = PixelRatio::default();
        assert_eq!(ratio.scale_px(320), 640);
        assert_eq!(ratio.scale(1.5), 3.0);
    }

    #[test]
    fn default_options() {
        let opts = RasterOptions::default();
        assert!(opts.cache_bust);
        assert!(opts.allow_unloaded);
        assert_eq!(opts.pixel_ratio.value(), 2.0);
        assert!(!(opts.filter)(&Node::annotation("k", "v")));
    }

    #[test]
    fn default_load_policy() {
        let policy = LoadPolicy::default();
        assert_eq!(policy.timeout, Duration::from_secs(3));
        assert_eq!(policy.inline_grace, Duration::from_millis(100));
    }
}
