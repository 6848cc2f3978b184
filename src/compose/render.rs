//! Pure Rust frame rasterizer.
//!
//! ## Crate mapping
//!
//! | Step | Crate / function |
//! |---|---|
//! | Photo resample | `image::imageops::resize` with `Lanczos3` |
//! | Photo placement | `image::imageops::overlay` |
//! | Caption glyphs | `ab_glyph` outlines, coverage blended with `Pixel::blend` |
//! | Resample cache key | `sha2` over the photo source and target size |
//! | Encode | `RgbaImage::write_to` as PNG |
//!
//! Rendering is two passes over the visual tree, both in device pixels
//! (logical size × pixel ratio): measure every visible node, then place the
//! card and draw top to bottom, centering each node in its parent.

use super::font::{FontError, load_font};
use super::geometry::{
    SHADOW_BLUR, SHADOW_MARGIN, SHADOW_OFFSET, card_box, fit_within, shadow_alpha,
};
use super::node::{Composition, ImageSource, LoadState, Node, PhotoNode, Rgb, TextStyle};
use super::options::{PixelRatio, RasterOptions};
use super::raster::Rasterizer;
use crate::config::RenderConfig;
use crate::diagnostics;
use crate::fault::Fault;
use ab_glyph::{Font, FontVec, PxScale, ScaleFont, point};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Pixel, Rgba, RgbaImage};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Photo did not load: {0}")]
    Unloaded(String),
    #[error("Frame too large: {width}x{height}")]
    TooLarge { width: u64, height: u64 },
    #[error("PNG encode failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Logical size of the stand-in painted for a photo that never loaded.
const PLACEHOLDER_SIZE: (u32, u32) = (480, 360);
const PLACEHOLDER_COLOR: Rgb = [0xd6, 0xd3, 0xd1];
/// Border ring around the photo, logical px.
const BORDER_WIDTH: u32 = 4;
const BORDER_OPACITY: f32 = 0.9;
const SHADOW_PEAK: f32 = 0.18;
/// Advance per character, in ems, when no font is available.
const FALLBACK_ADVANCE: f32 = 0.6;
const MAX_CANVAS_SIDE: u32 = 16_384;
/// Resampled photos kept for reuse; the map is emptied when full.
const MAX_CACHED_PHOTOS: usize = 4;

pub struct FrameRasterizer {
    font: Option<FontVec>,
    max_photo_edge: u32,
    /// Resampled photos keyed by [`cache_key`].
    cache: Mutex<HashMap<String, Arc<RgbaImage>>>,
}

impl FrameRasterizer {
    pub fn new(font: Option<FontVec>, max_photo_edge: u32) -> Self {
        Self {
            font,
            max_photo_edge,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &RenderConfig) -> Result<Self, FontError> {
        let font = load_font(config.font.as_deref())?;
        if font.is_none() {
            diagnostics::warn("Export", "No caption font found; caption text will be omitted");
        }
        Ok(Self::new(font, config.max_photo_edge))
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Number of resampled photos held for reuse.
    pub fn cached_photos(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Render to an RGBA canvas without encoding.
    pub fn render(
        &self,
        composition: &Composition,
        options: &RasterOptions,
    ) -> Result<RgbaImage, RenderError> {
        let ratio = options.pixel_ratio;
        let card = &composition.card;

        let measured = self.measure(&card.content, options)?;
        let content = measured
            .as_ref()
            .map_or((0, 0), |m| (m.width.ceil() as u32, m.height.ceil() as u32));
        let layout = card_box(
            content,
            ratio.scale_px(card.padding),
            ratio.scale_px(card.min_width),
            card.aspect,
        );

        let margin = if card.shadow {
            ratio.scale_px(SHADOW_MARGIN)
        } else {
            0
        };
        let width = u64::from(layout.width) + 2 * u64::from(margin);
        let height = u64::from(layout.height) + 2 * u64::from(margin);
        if width > u64::from(MAX_CANVAS_SIDE) || height > u64::from(MAX_CANVAS_SIDE) {
            return Err(RenderError::TooLarge { width, height });
        }
        // Both sides fit MAX_CANVAS_SIDE from here on
        let (width, height) = (width as u32, height as u32);

        if self.font.is_none() && !composition.visible_text().is_empty() {
            diagnostics::warn("Export", "No caption font available; caption text omitted");
        }

        let mut canvas = RgbaImage::new(width, height);
        let left = margin as f32;
        let top = margin as f32;
        let card_w = layout.width as f32;
        let card_h = layout.height as f32;

        if card.shadow {
            paint_shadow(&mut canvas, (left, top, left + card_w, top + card_h), ratio);
        }
        fill_rect(&mut canvas, left, top, card_w, card_h, card.background, 1.0);

        if let Some(m) = &measured {
            let x = left + layout.content_x as f32 + (layout.content_width as f32 - m.width) / 2.0;
            let y = top + layout.content_y as f32;
            self.draw(&mut canvas, m, x, y, options)?;
        }

        diagnostics::debug(
            "Export",
            format!("Rasterized {width}x{height} frame at {}x", ratio.value()),
        );
        Ok(canvas)
    }

    // =========================================================================
    // Measure
    // =========================================================================

    fn measure<'a>(
        &self,
        node: &'a Node,
        options: &RasterOptions,
    ) -> Result<Option<Measured<'a>>, RenderError> {
        if !(options.filter)(node) {
            return Ok(None);
        }
        let ratio = options.pixel_ratio;
        let (width, height, children) = match node {
            Node::Stack { gap, children } => {
                let mut measured = Vec::new();
                for child in children {
                    if let Some(m) = self.measure(child, options)? {
                        measured.push(m);
                    }
                }
                if measured.is_empty() {
                    return Ok(None);
                }
                let gaps = ratio.scale(*gap as f32) * (measured.len() - 1) as f32;
                let width = measured.iter().map(|m| m.width).fold(0.0, f32::max);
                let height = measured.iter().map(|m| m.height).sum::<f32>() + gaps;
                (width, height, measured)
            }
            Node::Photo(photo) => {
                let (w, h) = self.photo_size(photo, options)?;
                let ring = border_inset(photo, ratio) * 2.0;
                (w as f32 + ring, h as f32 + ring, Vec::new())
            }
            Node::Text(text) => {
                if text.content.is_empty() {
                    return Ok(None);
                }
                let content = text.style.transform(&text.content);
                (
                    self.text_width(&content, &text.style, ratio),
                    ratio.scale(text.style.line_height()),
                    Vec::new(),
                )
            }
            Node::Divider { width, margin, .. } => (
                ratio.scale(*width as f32),
                ratio.scale((1 + 2 * margin) as f32),
                Vec::new(),
            ),
            Node::Row { items, style, gap } => {
                if items.is_empty() {
                    return Ok(None);
                }
                let text: f32 = items
                    .iter()
                    .map(|item| self.text_width(&style.transform(item), style, ratio))
                    .sum();
                let gaps = ratio.scale(*gap as f32) * (items.len() - 1) as f32;
                (text + gaps, ratio.scale(style.line_height()), Vec::new())
            }
            Node::Annotation { .. } => return Ok(None),
        };
        Ok(Some(Measured {
            node,
            width,
            height,
            children,
        }))
    }

    /// Device-pixel size of the photo itself, border excluded.
    fn photo_size(
        &self,
        photo: &PhotoNode,
        options: &RasterOptions,
    ) -> Result<(u32, u32), RenderError> {
        let natural = match &photo.state {
            LoadState::Loaded(img) => (img.width(), img.height()),
            _ if options.allow_unloaded => PLACEHOLDER_SIZE,
            _ => return Err(RenderError::Unloaded(photo.source.describe())),
        };
        let (w, h) = fit_within(natural, self.max_photo_edge);
        let ratio = options.pixel_ratio;
        Ok((ratio.scale_px(w), ratio.scale_px(h)))
    }

    fn text_width(&self, content: &str, style: &TextStyle, ratio: PixelRatio) -> f32 {
        let count = content.chars().count();
        if count == 0 {
            return 0.0;
        }
        let size = ratio.scale(style.size);
        let glyphs = match &self.font {
            Some(font) => {
                let scaled = font.as_scaled(PxScale::from(size));
                let mut width = 0.0;
                let mut prev = None;
                for c in content.chars() {
                    let id = scaled.glyph_id(c);
                    if let Some(p) = prev {
                        width += scaled.kern(p, id);
                    }
                    width += scaled.h_advance(id);
                    prev = Some(id);
                }
                width
            }
            None => count as f32 * size * FALLBACK_ADVANCE,
        };
        glyphs + style.tracking * size * (count - 1) as f32
    }

    // =========================================================================
    // Draw
    // =========================================================================

    fn draw(
        &self,
        canvas: &mut RgbaImage,
        m: &Measured<'_>,
        x: f32,
        y: f32,
        options: &RasterOptions,
    ) -> Result<(), RenderError> {
        let ratio = options.pixel_ratio;
        match m.node {
            Node::Stack { gap, .. } => {
                let mut cursor = y;
                for child in &m.children {
                    let cx = x + (m.width - child.width) / 2.0;
                    self.draw(canvas, child, cx, cursor, options)?;
                    cursor += child.height + ratio.scale(*gap as f32);
                }
            }
            Node::Photo(photo) => self.draw_photo(canvas, photo, x, y, options)?,
            Node::Text(text) => {
                let content = text.style.transform(&text.content);
                self.draw_text(canvas, &content, &text.style, x, y, ratio);
            }
            Node::Divider {
                color,
                width,
                opacity,
                margin,
            } => {
                let thickness = ratio.scale(1.0).max(1.0);
                fill_rect(
                    canvas,
                    x,
                    y + ratio.scale(*margin as f32),
                    ratio.scale(*width as f32),
                    thickness,
                    *color,
                    *opacity,
                );
            }
            Node::Row { items, style, gap } => {
                let mut cursor = x;
                for item in items {
                    let content = style.transform(item);
                    self.draw_text(canvas, &content, style, cursor, y, ratio);
                    cursor += self.text_width(&content, style, ratio) + ratio.scale(*gap as f32);
                }
            }
            Node::Annotation { .. } => {}
        }
        Ok(())
    }

    fn draw_photo(
        &self,
        canvas: &mut RgbaImage,
        photo: &PhotoNode,
        x: f32,
        y: f32,
        options: &RasterOptions,
    ) -> Result<(), RenderError> {
        let (w, h) = self.photo_size(photo, options)?;
        let inset = border_inset(photo, options.pixel_ratio);
        if let Some(color) = photo.border {
            fill_rect(
                canvas,
                x,
                y,
                w as f32 + 2.0 * inset,
                h as f32 + 2.0 * inset,
                color,
                BORDER_OPACITY,
            );
        }

        let px = x + inset;
        let py = y + inset;
        match &photo.state {
            LoadState::Loaded(img) => {
                let resized = self.resampled(&photo.source, img, (w, h), options.cache_bust);
                imageops::overlay(canvas, &*resized, px.round() as i64, py.round() as i64);
            }
            _ => {
                diagnostics::warn(
                    "Export",
                    format!("Painting placeholder for {}", photo.source.describe()),
                );
                fill_rect(canvas, px, py, w as f32, h as f32, PLACEHOLDER_COLOR, 1.0);
            }
        }
        Ok(())
    }

    /// Resample a photo to `size`, reusing an earlier result unless
    /// `cache_bust` is set. A busted render bypasses the cache entirely.
    fn resampled(
        &self,
        source: &ImageSource,
        img: &DynamicImage,
        size: (u32, u32),
        cache_bust: bool,
    ) -> Arc<RgbaImage> {
        let resize = || {
            Arc::new(imageops::resize(
                &img.to_rgba8(),
                size.0,
                size.1,
                FilterType::Lanczos3,
            ))
        };
        let key = cache_key(source, size);
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if cache_bust {
            // A busted render must not leave a stale copy behind either
            cache.remove(&key);
            return resize();
        }
        if let Some(hit) = cache.get(&key) {
            return Arc::clone(hit);
        }
        let resized = resize();
        if cache.len() >= MAX_CACHED_PHOTOS {
            cache.clear();
        }
        cache.insert(key, Arc::clone(&resized));
        resized
    }

    fn draw_text(
        &self,
        canvas: &mut RgbaImage,
        content: &str,
        style: &TextStyle,
        x: f32,
        y: f32,
        ratio: PixelRatio,
    ) {
        let Some(font) = &self.font else {
            return;
        };
        let size = ratio.scale(style.size);
        let scale = PxScale::from(size);
        let scaled = font.as_scaled(scale);
        let line = ratio.scale(style.line_height());
        let baseline = y + (line - (scaled.ascent() - scaled.descent())) / 2.0 + scaled.ascent();
        let tracking = style.tracking * size;

        let mut caret = x;
        let mut prev = None;
        for c in content.chars() {
            let id = scaled.glyph_id(c);
            if let Some(p) = prev {
                caret += scaled.kern(p, id);
            }
            let glyph = id.with_scale_and_position(scale, point(caret, baseline));
            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    blend_pixel(
                        canvas,
                        bounds.min.x as i64 + gx as i64,
                        bounds.min.y as i64 + gy as i64,
                        style.color,
                        coverage * style.opacity,
                    );
                });
            }
            caret += scaled.h_advance(id) + tracking;
            prev = Some(id);
        }
    }
}

impl Rasterizer for FrameRasterizer {
    fn rasterize(
        &self,
        composition: &Composition,
        options: &RasterOptions,
    ) -> Result<Vec<u8>, Fault> {
        let canvas = self.render(composition, options).map_err(Fault::error)?;
        let mut bytes = Vec::new();
        canvas
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| Fault::error(RenderError::Encode(e)))?;
        Ok(bytes)
    }
}

/// A node with its device-pixel size, children measured recursively.
struct Measured<'a> {
    node: &'a Node,
    width: f32,
    height: f32,
    children: Vec<Measured<'a>>,
}

fn border_inset(photo: &PhotoNode, ratio: PixelRatio) -> f32 {
    if photo.border.is_some() {
        ratio.scale(BORDER_WIDTH as f32)
    } else {
        0.0
    }
}

/// SHA-256 of the photo's identity plus target size, as a hex string.
///
/// Inline photos hash their bytes; file photos hash their path.
fn cache_key(source: &ImageSource, size: (u32, u32)) -> String {
    let mut hasher = Sha256::new();
    match source {
        ImageSource::Inline { bytes, .. } => {
            hasher.update(b"inline\0");
            hasher.update(bytes.as_slice());
        }
        ImageSource::File(path) => {
            hasher.update(b"file\0");
            hasher.update(path.to_string_lossy().as_bytes());
        }
    }
    hasher.update(size.0.to_le_bytes());
    hasher.update(size.1.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

fn blend_pixel(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgb, alpha: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    if a == 0 {
        return;
    }
    canvas
        .get_pixel_mut(x as u32, y as u32)
        .blend(&Rgba([color[0], color[1], color[2], a]));
}

fn fill_rect(canvas: &mut RgbaImage, x: f32, y: f32, w: f32, h: f32, color: Rgb, alpha: f32) {
    let x0 = x.round().max(0.0) as u32;
    let y0 = y.round().max(0.0) as u32;
    let x1 = ((x + w).round().max(0.0) as u32).min(canvas.width());
    let y1 = ((y + h).round().max(0.0) as u32).min(canvas.height());
    for py in y0..y1 {
        for px in x0..x1 {
            blend_pixel(canvas, px as i64, py as i64, color, alpha);
        }
    }
}

fn paint_shadow(canvas: &mut RgbaImage, card: (f32, f32, f32, f32), ratio: PixelRatio) {
    let offset = ratio.scale(SHADOW_OFFSET as f32);
    let blur = ratio.scale(SHADOW_BLUR as f32);
    let rect = (card.0, card.1 + offset, card.2, card.3 + offset);
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let alpha = shadow_alpha(x as f32 + 0.5, y as f32 + 0.5, rect, blur, SHADOW_PEAK);
        if alpha > 0.0 {
            pixel.blend(&Rgba([0, 0, 0, (alpha * 255.0).round() as u8]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::{AspectRatio, CaptionConfig};
    use crate::compose::layout::build_composition;
    use crate::metadata::ImageMetadata;

    fn photo_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba([200, 40, 40, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    /// Caption with every row hidden, so only the photo is laid out.
    fn bare_caption() -> CaptionConfig {
        CaptionConfig {
            shadow: false,
            show_device: false,
            show_lens: false,
            show_tech_specs: false,
            ..CaptionConfig::default()
        }
    }

    fn loaded(caption: &CaptionConfig, w: u32, h: u32) -> Composition {
        let bytes = Arc::new(photo_bytes(w, h));
        let img = image::load_from_memory(&bytes).unwrap();
        let mut comp = build_composition(
            caption,
            &ImageMetadata::default(),
            ImageSource::Inline {
                mime: "image/png".into(),
                bytes,
            },
            "photo.png",
        );
        comp.photos_mut()[0].state = LoadState::Loaded(Arc::new(img));
        comp
    }

    fn options(ratio: f32) -> RasterOptions {
        RasterOptions::default().with_pixel_ratio(ratio)
    }

    #[test]
    fn card_size_at_unit_ratio() {
        let raster = FrameRasterizer::new(None, 1600);
        let canvas = raster
            .render(&loaded(&bare_caption(), 100, 80), &options(1.0))
            .unwrap();
        // 100 + 2*24 is below the 320 minimum width
        assert_eq!(canvas.dimensions(), (320, 128));
    }

    #[test]
    fn pixel_ratio_scales_everything() {
        let raster = FrameRasterizer::new(None, 1600);
        let canvas = raster
            .render(&loaded(&bare_caption(), 100, 80), &options(2.0))
            .unwrap();
        assert_eq!(canvas.dimensions(), (640, 256));
    }

    #[test]
    fn photo_is_centered_on_background() {
        let raster = FrameRasterizer::new(None, 1600);
        let canvas = raster
            .render(&loaded(&bare_caption(), 100, 80), &options(1.0))
            .unwrap();
        assert_eq!(canvas.get_pixel(0, 0).0, [0xfb, 0xfb, 0xf9, 255]);
        assert_eq!(canvas.get_pixel(160, 64).0, [200, 40, 40, 255]);
        // Photo spans x 110..210
        assert_eq!(canvas.get_pixel(100, 64).0, [0xfb, 0xfb, 0xf9, 255]);
    }

    #[test]
    fn shadow_reserves_transparent_margin() {
        let caption = CaptionConfig {
            shadow: true,
            ..bare_caption()
        };
        let raster = FrameRasterizer::new(None, 1600);
        let canvas = raster
            .render(&loaded(&caption, 100, 80), &options(1.0))
            .unwrap();
        assert_eq!(canvas.dimensions(), (320 + 64, 128 + 64));
        assert_eq!(canvas.get_pixel(0, 0).0[3], 0);
        // Just below the card the shadow is visible
        let below = canvas.get_pixel(192, 32 + 128 + 4);
        assert!(below.0[3] > 0);
    }

    #[test]
    fn aspect_ratio_applies_to_card() {
        let caption = CaptionConfig {
            aspect_ratio: AspectRatio::SQUARE,
            ..bare_caption()
        };
        let raster = FrameRasterizer::new(None, 1600);
        let canvas = raster
            .render(&loaded(&caption, 400, 200), &options(1.0))
            .unwrap();
        assert_eq!(canvas.dimensions(), (448, 448));
    }

    #[test]
    fn large_photos_are_capped() {
        let raster = FrameRasterizer::new(None, 200);
        let canvas = raster
            .render(&loaded(&bare_caption(), 800, 400), &options(1.0))
            .unwrap();
        // 200x100 photo + padding, then the min width
        assert_eq!(canvas.dimensions(), (320, 148));
    }

    #[test]
    fn border_adds_ring_around_photo() {
        let caption = CaptionConfig {
            border: true,
            ..bare_caption()
        };
        let raster = FrameRasterizer::new(None, 1600);
        let canvas = raster
            .render(&loaded(&caption, 100, 80), &options(1.0))
            .unwrap();
        assert_eq!(canvas.dimensions(), (320, 136));
    }

    #[test]
    fn unloaded_photo_gets_placeholder() {
        let mut comp = loaded(&bare_caption(), 10, 10);
        comp.photos_mut()[0].state = LoadState::TimedOut;
        let raster = FrameRasterizer::new(None, 1600);
        let canvas = raster.render(&comp, &options(1.0)).unwrap();
        assert_eq!(canvas.dimensions(), (528, 408));
        assert_eq!(canvas.get_pixel(264, 204).0, [0xd6, 0xd3, 0xd1, 255]);
    }

    #[test]
    fn unloaded_photo_fails_when_not_tolerated() {
        let mut comp = loaded(&bare_caption(), 10, 10);
        comp.photos_mut()[0].state = LoadState::Failed("boom".into());
        let opts = RasterOptions {
            allow_unloaded: false,
            ..options(1.0)
        };
        let raster = FrameRasterizer::new(None, 1600);
        assert!(matches!(
            raster.render(&comp, &opts),
            Err(RenderError::Unloaded(_))
        ));
    }

    #[test]
    fn filter_skips_nodes() {
        fn no_photos(node: &Node) -> bool {
            node.is_visual() && !matches!(node, Node::Photo(_))
        }
        let opts = RasterOptions {
            filter: no_photos,
            ..options(1.0)
        };
        let raster = FrameRasterizer::new(None, 1600);
        let canvas = raster
            .render(&loaded(&bare_caption(), 100, 80), &opts)
            .unwrap();
        assert_eq!(canvas.dimensions(), (320, 48));
    }

    #[test]
    fn caption_rows_add_height_without_font() {
        let caption = CaptionConfig {
            device: "X100V".into(),
            show_device: true,
            ..bare_caption()
        };
        let raster = FrameRasterizer::new(None, 1600);
        let canvas = raster
            .render(&loaded(&caption, 100, 80), &options(1.0))
            .unwrap();
        // photo 80 + gap 24 + 20px line (28)
        assert_eq!(canvas.dimensions(), (320, 48 + 80 + 24 + 28));
    }

    #[test]
    fn resample_cache_reuses_unless_busted() {
        let raster = FrameRasterizer::new(None, 1600);
        let comp = loaded(&bare_caption(), 30, 20);
        let reuse = RasterOptions {
            cache_bust: false,
            ..options(1.0)
        };
        raster.render(&comp, &reuse).unwrap();
        raster.render(&comp, &reuse).unwrap();
        assert_eq!(raster.cached_photos(), 1);

        let reuse_2x = RasterOptions {
            cache_bust: false,
            ..options(2.0)
        };
        raster.render(&comp, &reuse_2x).unwrap();
        assert_eq!(raster.cached_photos(), 2);
    }

    #[test]
    fn default_options_keep_nothing_in_cache() {
        let raster = FrameRasterizer::new(None, 1600);
        for side in 20..25 {
            raster
                .rasterize(&loaded(&bare_caption(), side, side), &RasterOptions::default())
                .unwrap();
        }
        assert_eq!(raster.cached_photos(), 0);
    }

    #[test]
    fn busting_drops_the_cached_copy() {
        let raster = FrameRasterizer::new(None, 1600);
        let comp = loaded(&bare_caption(), 30, 20);
        let reuse = RasterOptions {
            cache_bust: false,
            ..options(1.0)
        };
        raster.render(&comp, &reuse).unwrap();
        assert_eq!(raster.cached_photos(), 1);
        raster.render(&comp, &options(1.0)).unwrap();
        assert_eq!(raster.cached_photos(), 0);
    }

    #[test]
    fn cache_stays_bounded_across_many_photos() {
        let raster = FrameRasterizer::new(None, 1600);
        let reuse = RasterOptions {
            cache_bust: false,
            ..options(1.0)
        };
        for side in 10..20 {
            raster
                .render(&loaded(&bare_caption(), side, side), &reuse)
                .unwrap();
            assert!(raster.cached_photos() <= MAX_CACHED_PHOTOS);
        }
    }

    #[test]
    fn extreme_aspect_ratio_is_rejected_not_panicking() {
        let caption = CaptionConfig {
            aspect_ratio: AspectRatio::Ratio(1, 2_000_000_000),
            shadow: true,
            ..bare_caption()
        };
        let raster = FrameRasterizer::new(None, 1600);
        let comp = loaded(&caption, 64, 48);

        let err = raster.render(&comp, &options(2.0)).unwrap_err();
        assert!(matches!(err, RenderError::TooLarge { .. }));
        assert!(raster.rasterize(&comp, &options(2.0)).is_err());
    }

    #[test]
    fn rasterize_encodes_png() {
        let raster = FrameRasterizer::new(None, 1600);
        let bytes = raster
            .rasterize(&loaded(&bare_caption(), 40, 30), &options(1.0))
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 78));
    }

    #[test]
    fn cache_key_depends_on_size_and_source() {
        let a = ImageSource::File("/a.jpg".into());
        let b = ImageSource::File("/b.jpg".into());
        assert_eq!(cache_key(&a, (10, 10)), cache_key(&a, (10, 10)));
        assert_ne!(cache_key(&a, (10, 10)), cache_key(&a, (20, 10)));
        assert_ne!(cache_key(&a, (10, 10)), cache_key(&b, (10, 10)));
        assert_eq!(cache_key(&a, (1, 1)).len(), 64);
    }
}
