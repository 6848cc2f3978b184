//! Builds the frame's visual tree from caption state and metadata.
//!
//! ```text
//! Card (background, padding, shadow, aspect)
//! └── Stack gap 24
//!     ├── Photo (optional border)
//!     └── Stack gap 16                    caption
//!         ├── Stack gap 4                 if show_device or system text
//!         │   ├── DEVICE                  20px, uppercase, wide tracking
//!         │   └── SYSTEM                  14px, 60%
//!         ├── Divider                     if the block above and (lens or specs) are shown
//!         ├── Lens                        16px, 80%, if show_lens and lens text
//!         ├── 24MM  F/1.8  1/125  ISO 100 14px, 60%, if show_tech_specs
//!         └── Captured by …               12px, 40%, if photographer
//! ```
//!
//! The tree also carries non-visual annotations (source file, capture
//! date) that rasterizers filter out.

use super::node::{Card, Composition, ImageSource, Node, PhotoNode, Rgb, TextStyle};
use crate::caption::{CaptionConfig, parse_hex_color};
use crate::metadata::{ImageMetadata, tech_specs};

/// Narrowest frame, padding included.
pub const MIN_CARD_WIDTH: u32 = 320;
/// Space between the photo and the caption.
pub const PHOTO_GAP: u32 = 24;
/// Space between caption rows.
pub const ROW_GAP: u32 = 16;

const FALLBACK_BACKGROUND: Rgb = [0xfb, 0xfb, 0xf9];
const FALLBACK_TEXT: Rgb = [0x29, 0x25, 0x24];

pub fn build_composition(
    caption: &CaptionConfig,
    metadata: &ImageMetadata,
    photo: ImageSource,
    source_name: &str,
) -> Composition {
    let background = parse_hex_color(&caption.background).unwrap_or(FALLBACK_BACKGROUND);
    let ink = parse_hex_color(&caption.text_color).unwrap_or(FALLBACK_TEXT);

    let mut photo = PhotoNode::new(photo);
    if caption.border {
        photo.border = Some(ink);
    }

    let mut children = vec![
        Node::annotation("source", source_name),
        Node::Photo(photo),
        Node::stack(ROW_GAP, caption_rows(caption, metadata, ink)),
    ];
    if let Some(captured) = metadata.captured_at {
        children.push(Node::annotation("captured", captured.to_string()));
    }

    Composition {
        card: Card {
            background,
            padding: caption.padding,
            shadow: caption.shadow,
            aspect: caption.aspect_ratio,
            min_width: MIN_CARD_WIDTH,
            content: Node::stack(PHOTO_GAP, children),
        },
    }
}

fn caption_rows(caption: &CaptionConfig, metadata: &ImageMetadata, ink: Rgb) -> Vec<Node> {
    let mut rows = Vec::new();
    let device = caption.device.trim();
    let system = caption.system.trim();
    let lens = caption.lens.trim();
    let photographer = caption.photographer.trim();

    let heading_block = caption.show_device || !system.is_empty();
    if heading_block {
        let mut block = Vec::new();
        if caption.show_device && !device.is_empty() {
            block.push(Node::text(
                device,
                TextStyle::new(20.0, ink).uppercase().tracking(0.1),
            ));
        }
        if !system.is_empty() {
            block.push(Node::text(
                system,
                TextStyle::new(14.0, ink).opacity(0.6).uppercase().tracking(0.1),
            ));
        }
        rows.push(Node::stack(4, block));
    }

    if heading_block && (caption.show_lens || caption.show_tech_specs) {
        rows.push(Node::Divider {
            color: ink,
            width: 32,
            opacity: 0.3,
            margin: 4,
        });
    }

    if caption.show_lens && !lens.is_empty() {
        rows.push(Node::text(lens, TextStyle::new(16.0, ink).opacity(0.8)));
    }

    if caption.show_tech_specs {
        rows.push(Node::Row {
            items: tech_specs(metadata),
            style: TextStyle::new(14.0, ink).opacity(0.6).uppercase().tracking(0.05),
            gap: 16,
        });
    }

    if !photographer.is_empty() {
        rows.push(Node::text(
            format!("Captured by {photographer}"),
            TextStyle::new(12.0, ink).opacity(0.4),
        ));
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::AspectRatio;
    use std::sync::Arc;

    fn inline() -> ImageSource {
        ImageSource::Inline {
            mime: "image/jpeg".into(),
            bytes: Arc::new(vec![1, 2, 3]),
        }
    }

    fn iphone() -> ImageMetadata {
        ImageMetadata {
            make: Some("Apple".into()),
            model: Some("iPhone 15 Pro".into()),
            f_number: Some(1.8),
            iso: Some(100),
            focal_length: Some(24.0),
            ..Default::default()
        }
    }

    fn count_dividers(node: &Node) -> usize {
        match node {
            Node::Divider { .. } => 1,
            Node::Stack { children, .. } => children.iter().map(count_dividers).sum(),
            _ => 0,
        }
    }

    #[test]
    fn full_caption_in_order() {
        let caption = CaptionConfig {
            device: "iPhone 15 Pro".into(),
            system: "iOS 17.1".into(),
            lens: "Main camera".into(),
            photographer: "Dorothea".into(),
            ..CaptionConfig::default()
        };
        let comp = build_composition(&caption, &iphone(), inline(), "IMG_1.jpg");

        assert_eq!(
            comp.visible_text(),
            vec![
                "iPhone 15 Pro",
                "iOS 17.1",
                "Main camera",
                "24mm",
                "f/1.8",
                "ISO 100",
                "Captured by Dorothea"
            ]
        );
        assert_eq!(count_dividers(&comp.card.content), 1);
        assert_eq!(comp.photos().len(), 1);
    }

    #[test]
    fn card_style_follows_caption() {
        let caption = CaptionConfig {
            padding: 40,
            shadow: false,
            aspect_ratio: AspectRatio::SQUARE,
            background: "#1c1917".into(),
            ..CaptionConfig::default()
        };
        let comp = build_composition(&caption, &ImageMetadata::default(), inline(), "a.jpg");
        assert_eq!(comp.card.padding, 40);
        assert!(!comp.card.shadow);
        assert_eq!(comp.card.aspect, AspectRatio::SQUARE);
        assert_eq!(comp.card.background, [0x1c, 0x19, 0x17]);
        assert_eq!(comp.card.min_width, MIN_CARD_WIDTH);
    }

    #[test]
    fn hidden_rows_are_omitted() {
        let caption = CaptionConfig {
            device: "X100V".into(),
            lens: "23mm".into(),
            show_device: false,
            show_lens: false,
            show_tech_specs: false,
            ..CaptionConfig::default()
        };
        let comp = build_composition(&caption, &iphone(), inline(), "a.jpg");
        assert!(comp.visible_text().is_empty());
        assert_eq!(count_dividers(&comp.card.content), 0);
    }

    #[test]
    fn system_line_shows_even_when_device_hidden() {
        let caption = CaptionConfig {
            device: "X100V".into(),
            system: "Firmware 2.0".into(),
            show_device: false,
            ..CaptionConfig::default()
        };
        let comp = build_composition(&caption, &ImageMetadata::default(), inline(), "a.jpg");
        let text = comp.visible_text();
        assert!(!text.contains(&"X100V".to_string()));
        assert!(text.contains(&"Firmware 2.0".to_string()));
    }

    #[test]
    fn border_uses_text_color() {
        let caption = CaptionConfig {
            border: true,
            ..CaptionConfig::default()
        };
        let comp = build_composition(&caption, &ImageMetadata::default(), inline(), "a.jpg");
        assert_eq!(comp.photos()[0].border, Some([0x29, 0x25, 0x24]));
    }

    #[test]
    fn annotations_are_not_visual() {
        let meta = ImageMetadata {
            captured_at: chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
                .and_then(|d| d.and_hms_opt(9, 30, 0)),
            ..Default::default()
        };
        let comp = build_composition(&CaptionConfig::default(), &meta, inline(), "a.jpg");
        let Node::Stack { children, .. } = &comp.card.content else {
            panic!("card content should be a stack");
        };
        let annotations: Vec<&Node> = children.iter().filter(|n| !n.is_visual()).collect();
        assert_eq!(annotations.len(), 2);
    }
}
