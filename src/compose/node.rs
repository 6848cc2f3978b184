//! The visual tree handed to a rasterizer.
//!
//! A [`Composition`] is a [`Card`] (background, padding, shadow, aspect) whose
//! content is a tree of [`Node`]s laid out top to bottom. Everything is
//! measured in logical pixels; the rasterizer multiplies by the pixel ratio.

use crate::caption::AspectRatio;
use image::DynamicImage;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub type Rgb = [u8; 3];

#[derive(Debug, Clone)]
pub struct Composition {
    pub card: Card,
}

#[derive(Debug, Clone)]
pub struct Card {
    pub background: Rgb,
    pub padding: u32,
    pub shadow: bool,
    pub aspect: AspectRatio,
    /// Narrowest the card may be, padding included.
    pub min_width: u32,
    pub content: Node,
}

#[derive(Debug, Clone)]
pub enum Node {
    /// Children stacked vertically, centered, `gap` apart.
    Stack { gap: u32, children: Vec<Node> },
    Photo(PhotoNode),
    Text(TextNode),
    /// A short centered rule.
    Divider {
        color: Rgb,
        width: u32,
        opacity: f32,
        margin: u32,
    },
    /// Items on one centered line, `gap` apart.
    Row {
        items: Vec<String>,
        style: TextStyle,
        gap: u32,
    },
    /// Descriptive data carried with the tree that is never painted.
    Annotation { key: String, value: String },
}

impl Node {
    pub fn is_visual(&self) -> bool {
        !matches!(self, Node::Annotation { .. })
    }

    pub fn stack(gap: u32, children: Vec<Node>) -> Self {
        Node::Stack { gap, children }
    }

    pub fn text(content: impl Into<String>, style: TextStyle) -> Self {
        Node::Text(TextNode {
            content: content.into(),
            style,
        })
    }

    pub fn annotation(key: impl Into<String>, value: impl Into<String>) -> Self {
        Node::Annotation {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Composition {
    /// Every photo node, in paint order.
    pub fn photos(&self) -> Vec<&PhotoNode> {
        fn walk<'a>(node: &'a Node, out: &mut Vec<&'a PhotoNode>) {
            match node {
                Node::Photo(photo) => out.push(photo),
                Node::Stack { children, .. } => children.iter().for_each(|c| walk(c, out)),
                _ => {}
            }
        }
        let mut out = Vec::new();
        walk(&self.card.content, &mut out);
        out
    }

    pub fn photos_mut(&mut self) -> Vec<&mut PhotoNode> {
        fn walk<'a>(node: &'a mut Node, out: &mut Vec<&'a mut PhotoNode>) {
            match node {
                Node::Photo(photo) => out.push(photo),
                Node::Stack { children, .. } => {
                    for child in children {
                        walk(child, out);
                    }
                }
                _ => {}
            }
        }
        let mut out = Vec::new();
        walk(&mut self.card.content, &mut out);
        out
    }

    /// Every text string that would be painted, in paint order.
    pub fn visible_text(&self) -> Vec<String> {
        fn walk(node: &Node, out: &mut Vec<String>) {
            match node {
                Node::Text(text) => out.push(text.content.clone()),
                Node::Row { items, .. } => out.extend(items.iter().cloned()),
                Node::Stack { children, .. } => children.iter().for_each(|c| walk(c, out)),
                _ => {}
            }
        }
        let mut out = Vec::new();
        walk(&self.card.content, &mut out);
        out
    }
}

#[derive(Debug, Clone)]
pub struct PhotoNode {
    pub source: ImageSource,
    /// Border color; the border sits 4px outside the photo.
    pub border: Option<Rgb>,
    pub state: LoadState,
}

impl PhotoNode {
    pub fn new(source: ImageSource) -> Self {
        Self {
            source,
            border: None,
            state: LoadState::Pending,
        }
    }
}

#[derive(Clone)]
pub enum ImageSource {
    /// Bytes already in memory (an uploaded photo).
    Inline { mime: String, bytes: Arc<Vec<u8>> },
    File(PathBuf),
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Inline { mime, bytes } => {
                write!(f, "Inline({mime}, {} bytes)", bytes.len())
            }
            ImageSource::File(path) => write!(f, "File({})", path.display()),
        }
    }
}

impl ImageSource {
    pub fn is_inline(&self) -> bool {
        matches!(self, ImageSource::Inline { .. })
    }

    /// Short label for logs.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Inline { mime, bytes } => format!("inline {mime} ({} bytes)", bytes.len()),
            ImageSource::File(path) => path.display().to_string(),
        }
    }
}

#[derive(Clone, Default)]
pub enum LoadState {
    #[default]
    Pending,
    Loaded(Arc<DynamicImage>),
    Failed(String),
    TimedOut,
}

impl fmt::Debug for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadState::Pending => f.write_str("Pending"),
            LoadState::Loaded(img) => write!(f, "Loaded({}x{})", img.width(), img.height()),
            LoadState::Failed(reason) => write!(f, "Failed({reason})"),
            LoadState::TimedOut => f.write_str("TimedOut"),
        }
    }
}

impl LoadState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, LoadState::Pending)
    }

    pub fn image(&self) -> Option<&Arc<DynamicImage>> {
        match self {
            LoadState::Loaded(img) => Some(img),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextNode {
    pub content: String,
    pub style: TextStyle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Font size in logical pixels.
    pub size: f32,
    pub color: Rgb,
    pub opacity: f32,
    pub uppercase: bool,
    /// Extra space after each glyph, in ems.
    pub tracking: f32,
}

impl TextStyle {
    pub fn new(size: f32, color: Rgb) -> Self {
        Self {
            size,
            color,
            opacity: 1.0,
            uppercase: false,
            tracking: 0.0,
        }
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn uppercase(mut self) -> Self {
        self.uppercase = true;
        self
    }

    pub fn tracking(mut self, ems: f32) -> Self {
        self.tracking = ems;
        self
    }

    /// Line box height.
    pub fn line_height(&self) -> f32 {
        (self.size * 1.4).ceil()
    }

    /// The string as it will be painted.
    pub fn transform(&self, content: &str) -> String {
        if self.uppercase {
            content.to_uppercase()
        } else {
            content.to_string()
        }
    }
}
