//! Rasterizer trait: turns a settled [`Composition`] into PNG bytes.
//!
//! The production implementation is
//! [`FrameRasterizer`](super::render::FrameRasterizer). The export pipeline
//! only sees this trait, so tests swap in [`tests::MockRasterizer`].

use super::node::Composition;
use super::options::RasterOptions;
use crate::fault::Fault;

pub trait Rasterizer: Sync {
    /// Render the composition to an encoded PNG.
    fn rasterize(&self, composition: &Composition, options: &RasterOptions)
    -> Result<Vec<u8>, Fault>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// PNG signature followed by filler. Enough for code that only moves
    /// bytes around; not decodable.
    pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nmock-frame";

    /// Records every call; returns fixed bytes or a fixed failure.
    pub struct MockRasterizer {
        result: Result<Vec<u8>, String>,
        pub calls: Mutex<Vec<RecordedRaster>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedRaster {
        pub pixel_ratio: f32,
        pub cache_bust: bool,
        pub allow_unloaded: bool,
        pub visible_text: Vec<String>,
    }

    impl MockRasterizer {
        pub fn returning(bytes: &[u8]) -> Self {
            Self {
                result: Ok(bytes.to_vec()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                result: Err(message.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn get_calls(&self) -> Vec<RecordedRaster> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Rasterizer for MockRasterizer {
        fn rasterize(
            &self,
            composition: &Composition,
            options: &RasterOptions,
        ) -> Result<Vec<u8>, Fault> {
            self.calls.lock().unwrap().push(RecordedRaster {
                pixel_ratio: options.pixel_ratio.value(),
                cache_bust: options.cache_bust,
                allow_unloaded: options.allow_unloaded,
                visible_text: composition.visible_text(),
            });
            self.result.clone().map_err(Fault::message)
        }
    }

    #[test]
    fn mock_records_options() {
        use crate::caption::CaptionConfig;
        use crate::compose::layout::build_composition;
        use crate::compose::node::ImageSource;
        use crate::metadata::ImageMetadata;

        let caption = CaptionConfig {
            device: "X100V".into(),
            ..CaptionConfig::default()
        };
        let comp = build_composition(
            &caption,
            &ImageMetadata::default(),
            ImageSource::File("/tmp/a.jpg".into()),
            "a.jpg",
        );
        let raster = MockRasterizer::returning(FAKE_PNG);
        let bytes = raster
            .rasterize(&comp, &RasterOptions::default().with_pixel_ratio(3.0))
            .unwrap();

        assert_eq!(bytes, FAKE_PNG);
        let calls = raster.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].pixel_ratio, 3.0);
        assert_eq!(calls[0].visible_text, vec!["X100V"]);
    }

    #[test]
    fn failing_mock_returns_fault() {
        use crate::fault::normalize_error;
        let comp = crate::compose::layout::build_composition(
            &crate::caption::CaptionConfig::default(),
            &crate::metadata::ImageMetadata::default(),
            crate::compose::node::ImageSource::File("/tmp/a.jpg".into()),
            "a.jpg",
        );
        let raster = MockRasterizer::failing("canvas exploded");
        let err = raster
            .rasterize(&comp, &RasterOptions::default())
            .unwrap_err();
        assert_eq!(normalize_error(&err, "fallback"), "canvas exploded");
    }
}
