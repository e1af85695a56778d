// src/crawl/image.rs
//! Image decoding, probing and re-encoding for the vision classifier.

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat, RgbaImage};
use sha2::{Digest, Sha256};
use std::io::Cursor;

use crate::analyze::metadata::{extract_metadata, MetadataEntries};

/// Longest side of the thumbnail kept for visual analysis.
const ANALYSIS_EDGE: u32 = 256;

/// Container format of a fetched image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Svg,
    Png,
    Jpeg,
    Gif,
    Webp,
    Ico,
    Bmp,
    Other,
}

impl ImageKind {
    /// Vector and lossless-with-alpha formats are what logos usually ship as.
    pub fn is_logo_friendly(self) -> bool {
        matches!(self, ImageKind::Svg | ImageKind::Png)
    }

    fn from_format(f: ImageFormat) -> Self {
        match f {
            ImageFormat::Png => ImageKind::Png,
            ImageFormat::Jpeg => ImageKind::Jpeg,
            ImageFormat::Gif => ImageKind::Gif,
            ImageFormat::WebP => ImageKind::Webp,
            ImageFormat::Ico => ImageKind::Ico,
            ImageFormat::Bmp => ImageKind::Bmp,
            _ => ImageKind::Other,
        }
    }
}

/// Whether the payload is SVG markup (by content, falling back to the URL).
pub fn looks_like_svg(bytes: &[u8], image_url: &str) -> bool {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]).to_lowercase();
    let head = head.trim_start();
    if head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg")) {
        return true;
    }
    let path = image_url.split(['?', '#']).next().unwrap_or_default();
    path.to_lowercase().ends_with(".svg") && head.starts_with('<')
}

/// Decoded image plus the facts the analyzers need.
#[derive(Debug, Clone)]
pub struct ImageProbe {
    pub kind: ImageKind,
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    pub metadata: MetadataEntries,
    /// Downscaled RGBA copy for visual analysis.
    pub thumbnail: RgbaImage,
}

impl ImageProbe {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Decode raster bytes (or an already rasterized SVG) into an image and probe.
pub fn probe(bytes: &[u8], kind_hint: Option<ImageKind>, raster: DynamicImage) -> ImageProbe {
    let kind = kind_hint.unwrap_or_else(|| {
        image::guess_format(bytes)
            .map(ImageKind::from_format)
            .unwrap_or(ImageKind::Other)
    });
    let is_svg = kind == ImageKind::Svg;
    ImageProbe {
        kind,
        width: raster.width(),
        height: raster.height(),
        has_alpha: raster.color().has_alpha(),
        metadata: extract_metadata(bytes, is_svg),
        thumbnail: raster
            .thumbnail(ANALYSIS_EDGE, ANALYSIS_EDGE)
            .to_rgba8(),
    }
}

pub fn decode_raster(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).context("decoding image bytes")
}

pub fn meets_min_size(img: &DynamicImage, min_width: u32, min_height: u32) -> bool {
    img.width() >= min_width && img.height() >= min_height
}

/// Re-encode as PNG and base64 it for the classifier payload.
pub fn png_base64(img: &DynamicImage) -> Result<(Vec<u8>, String)> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .context("encoding png")?;
    let b64 = STANDARD.encode(&buf);
    Ok((buf, b64))
}

/// SHA-256 over dimensions and RGBA pixels, so re-encodings of one picture share a key.
pub fn content_hash(img: &DynamicImage) -> String {
    let rgba = img.to_rgba8();
    let mut hasher = Sha256::new();
    hasher.update(rgba.width().to_be_bytes());
    hasher.update(rgba.height().to_be_bytes());
    hasher.update(rgba.as_raw());
    hex::encode(hasher.finalize())
}

/// Decode a `data:` URI payload (base64 or percent-free plain text).
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| anyhow!("not a data uri"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| anyhow!("data uri without payload"))?;
    if meta.ends_with(";base64") {
        STANDARD
            .decode(payload.trim())
            .context("decoding base64 data uri")
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid(w: u32, h: u32, alpha: u8) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, alpha])))
    }

    #[test]
    fn svg_sniffing_uses_content_first() {
        assert!(looks_like_svg(b"<svg xmlns='x'></svg>", "https://a.com/x.png"));
        assert!(looks_like_svg(b"  <?xml version='1.0'?><svg/>", "https://a.com/x"));
        assert!(!looks_like_svg(b"\x89PNG\r\n", "https://a.com/logo.svg"));
    }

    #[test]
    fn png_round_trip_probe_keeps_dimensions_and_alpha() {
        let img = solid(120, 60, 0);
        let (png, b64) = png_base64(&img).unwrap();
        assert!(!b64.is_empty());
        let decoded = decode_raster(&png).unwrap();
        let p = probe(&png, None, decoded);
        assert_eq!(p.kind, ImageKind::Png);
        assert_eq!((p.width, p.height), (120, 60));
        assert!(p.has_alpha);
        assert_eq!(p.area(), 7200);
    }

    #[test]
    fn content_hash_ignores_container_but_not_pixels() {
        let a = solid(40, 40, 255);
        let (png, _) = png_base64(&a).unwrap();
        let b = decode_raster(&png).unwrap();
        assert_eq!(content_hash(&a), content_hash(&b));
        assert_ne!(content_hash(&a), content_hash(&solid(40, 41, 255)));
    }

    #[test]
    fn size_filter_and_data_uri() {
        assert!(!meets_min_size(&solid(31, 100, 255), 32, 32));
        assert!(meets_min_size(&solid(32, 32, 255), 32, 32));
        assert_eq!(decode_data_uri("data:text/plain,abc").unwrap(), b"abc");
        assert_eq!(decode_data_uri("data:image/png;base64,AAEC").unwrap(), vec![0, 1, 2]);
        assert!(decode_data_uri("https://x").is_err());
    }
}
