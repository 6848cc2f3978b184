//! Frame composition and rasterization.
//!
//! | Stage | Module |
//! |---|---|
//! | Build the visual tree | [`layout`] |
//! | Settle photo loads | [`preload`] |
//! | Rasterize to PNG | [`raster`] trait, [`render`] implementation |
//!
//! The module is split into:
//! - **Node**: the visual tree ([`Composition`], [`Node`])
//! - **Geometry**: pure dimension math (unit testable)
//! - **Options**: what a rasterizer is asked to do
//! - **Render**: [`FrameRasterizer`], pure Rust via `image` + `ab_glyph`

pub mod font;
pub mod geometry;
pub mod layout;
pub mod node;
pub mod options;
pub mod preload;
pub mod raster;
pub mod render;

pub use font::FontError;
pub use layout::build_composition;
pub use node::{Composition, ImageSource, LoadState, Node, PhotoNode};
pub use options::{LoadPolicy, PixelRatio, RasterOptions, visual_only};
pub use preload::{SettleReport, settle_images};
pub use raster::Rasterizer;
pub use render::{FrameRasterizer, RenderError};
