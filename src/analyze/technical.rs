// src/analyze/technical.rs
//! Technical image properties: format, file name, aspect ratio, transparency, area.

use url::Url;

use super::{bool_score, zeroed};
use crate::candidate::SubScores;
use crate::crawl::image::ImageProbe;

pub const TECHNICAL_KEYS: [&str; 5] = [
    "aspect_ratio_score",
    "transparency_score",
    "format_score",
    "filename_score",
    "size_score",
];

const FILENAME_TERMS: [&str; 3] = ["logo", "brand", "icon"];

/// Last path segment of the image URL, lowercased.
pub fn file_name(image_url: &str) -> String {
    Url::parse(image_url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut s| s.next_back().map(str::to_string))
        })
        .unwrap_or_default()
        .to_lowercase()
}

pub fn technical(image_url: &str, probe: Option<&ImageProbe>) -> SubScores {
    let mut s = zeroed(&TECHNICAL_KEYS);

    let name = file_name(image_url);
    s.insert(
        "filename_score".into(),
        bool_score(FILENAME_TERMS.iter().any(|t| name.contains(t))),
    );

    let Some(p) = probe else {
        return s;
    };

    s.insert(
        "format_score".into(),
        if p.kind.is_logo_friendly() { 1.0 } else { 0.5 },
    );

    if p.height > 0 {
        let ratio = p.width as f32 / p.height as f32;
        s.insert("aspect_ratio_score".into(), bool_score((0.5..=2.0).contains(&ratio)));
    }

    s.insert("transparency_score".into(), bool_score(p.has_alpha));
    s.insert(
        "size_score".into(),
        bool_score((5_000..=100_000).contains(&p.area())),
    );
    s
}
