// src/analyze/visual.rs
//! Visual characteristics of the decoded image and the design-element traits
//! the classifier uses to spot chrome icons.

use image::{GrayImage, Luma, RgbaImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::edges::canny;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use super::html::links_to_site_root;
use super::technical::file_name;
use super::{bool_score, zeroed};
use crate::candidate::{DesignTraits, ElementContext, SubScores};
use crate::crawl::image::ImageProbe;

pub const VISUAL_KEYS: [&str; 4] = [
    "text_presence_score",
    "color_palette_score",
    "geometric_score",
    "whitespace_score",
];

const MAX_DOMINANT_COLORS: usize = 5;
/// Share of opaque pixels a quantized color needs to count as dominant.
const DOMINANT_SHARE: f32 = 0.02;
const MAX_SIMPLE_CONTOURS: usize = 20;
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;
const WHITE_LEVEL: u8 = 240;
const ICON_MAX_EDGE: u32 = 64;

static RE_ICON: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bicons?\b").expect("icon regex"));
static RE_UI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(arrow|chevron|hamburger|menu|close|search|caret|button|spinner|cart)s?\b")
        .expect("ui regex")
});

/// Grayscale composited over white, so transparent backgrounds read as white.
fn gray_over_white(img: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, a] = img.get_pixel(x, y).0;
        let luma = (299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000;
        Luma([((luma * a as u32 + 255 * (255 - a as u32)) / 255) as u8])
    })
}

/// Number of quantized colors holding at least `DOMINANT_SHARE` of the opaque pixels.
pub fn dominant_color_count(img: &RgbaImage) -> usize {
    let mut buckets: HashMap<u16, u32> = HashMap::new();
    let mut opaque = 0u32;
    for p in img.pixels() {
        let [r, g, b, a] = p.0;
        if a < 128 {
            continue;
        }
        opaque += 1;
        let key = ((r as u16 >> 5) << 6) | ((g as u16 >> 5) << 3) | (b as u16 >> 5);
        *buckets.entry(key).or_default() += 1;
    }
    if opaque == 0 {
        return 0;
    }
    let min = (opaque as f32 * DOMINANT_SHARE).max(1.0);
    buckets.values().filter(|n| **n as f32 >= min).count()
}

/// Outermost contours of the Canny edge map.
pub fn contour_count(gray: &GrayImage) -> usize {
    if gray.width() < 3 || gray.height() < 3 {
        return 0;
    }
    let edges = canny(gray, CANNY_LOW, CANNY_HIGH);
    find_contours::<i32>(&edges)
        .iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .count()
}

pub fn visual(thumbnail: Option<&RgbaImage>, logo_text: Option<&str>) -> SubScores {
    let mut s = zeroed(&VISUAL_KEYS);

    s.insert(
        "text_presence_score".into(),
        bool_score(logo_text.is_some_and(|t| !t.trim().is_empty())),
    );

    let Some(img) = thumbnail else {
        return s;
    };
    if img.width() == 0 || img.height() == 0 {
        return s;
    }

    let colors = dominant_color_count(img);
    s.insert(
        "color_palette_score".into(),
        bool_score(colors > 0 && colors <= MAX_DOMINANT_COLORS),
    );

    let gray = gray_over_white(img);
    s.insert(
        "geometric_score".into(),
        bool_score(contour_count(&gray) < MAX_SIMPLE_CONTOURS),
    );

    let white = gray.iter().filter(|v| **v > WHITE_LEVEL).count();
    s.insert("whitespace_score".into(), white as f32 / gray.len() as f32);
    s
}

/// Flags for classifier rule 3 (icons, UI controls, navigation imagery).
pub fn design_traits(
    probe: Option<&ImageProbe>,
    ctx: &ElementContext,
    image_url: &str,
    description: &str,
    page_url: &str,
) -> DesignTraits {
    let small_square = probe.is_some_and(|p| {
        let ratio = p.width as f32 / p.height.max(1) as f32;
        p.width.max(p.height) <= ICON_MAX_EDGE && (0.75..=1.33).contains(&ratio)
    });

    let markup = format!(
        "{} {} {} {}",
        file_name(image_url).replace(['-', '_', '.'], " "),
        ctx.class.replace(['-', '_'], " "),
        ctx.alt,
        description
    );

    let is_navigation_element = ctx.in_nav
        && ctx
            .link_href
            .as_deref()
            .is_some_and(|href| !links_to_site_root(href, page_url));

    DesignTraits {
        is_icon: small_square || RE_ICON.is_match(description),
        is_ui_element: RE_UI.is_match(&markup),
        is_navigation_element,
    }
}
