// src/crawl/types.rs
//! Optional capability ports. Absence is decided when the crawler is built;
//! the pipeline simply skips the step.

use anyhow::Result;
use async_trait::async_trait;
use image::{DynamicImage, RgbaImage};

/// Strips the background of a decoded image before classification.
pub trait BackgroundRemover: Send + Sync {
    fn remove_background(&self, image: DynamicImage) -> Result<DynamicImage>;
}

/// Rasterizes SVG markup. Without one, SVG candidates are dropped.
pub trait SvgRasterizer: Send + Sync {
    fn rasterize(&self, svg: &[u8]) -> Result<DynamicImage>;
}

/// OCR: the text rendered in a logo, if any.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &RgbaImage) -> Result<Option<String>>;
}

/// Whether a social profile (e.g. a Twitter account) references the domain.
#[async_trait]
pub trait SocialProfileLookup: Send + Sync {
    async fn has_matching_profile(&self, domain: &str) -> Result<bool>;
}

/// Persists the processed PNG of a surviving candidate and returns its public URL.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn store(&self, image_hash: &str, png: &[u8]) -> Result<String>;
}

/// Keys near-white pixels to transparent. Good enough for logos on light
/// backdrops; photos are left mostly untouched because few pixels qualify.
#[derive(Debug, Clone, Copy)]
pub struct LightBackdropRemover {
    /// Minimum value of every RGB channel for a pixel to count as backdrop.
    pub threshold: u8,
}

impl Default for LightBackdropRemover {
    fn default() -> Self {
        Self { threshold: 245 }
    }
}

impl BackgroundRemover for LightBackdropRemover {
    fn remove_background(&self, image: DynamicImage) -> Result<DynamicImage> {
        let mut rgba = image.into_rgba8();
        for p in rgba.pixels_mut() {
            let [r, g, b, _] = p.0;
            if r >= self.threshold && g >= self.threshold && b >= self.threshold {
                p.0[3] = 0;
            }
        }
        Ok(DynamicImage::ImageRgba8(rgba))
    }
}
