// src/analyze/consistency.rs
//! Multi-page consistency. Runs only after traversal finished, over the full
//! inventory of image observations (a frozen slice, never a live view) and the
//! list of visited pages, including pages that carried no image at all.

use std::collections::HashSet;

use super::{bool_score, zeroed};
use crate::candidate::SubScores;

pub const CONSISTENCY_KEYS: [&str; 4] = [
    "appearance_score",
    "position_consistency_score",
    "size_consistency_score",
    "template_score",
];

/// One sighting of an image on one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageObservation {
    pub image_url: String,
    pub page_url: String,
    /// Structural path of the element the image was found on.
    pub position: String,
    /// Declared `WxH`, or `auto` when the markup does not say.
    pub size: String,
    pub in_template: bool,
}

pub fn multi_page_consistency(
    image_url: &str,
    inventory: &[ImageObservation],
    visited: &[String],
) -> SubScores {
    let mut s = zeroed(&CONSISTENCY_KEYS);

    let pages: HashSet<&str> = visited
        .iter()
        .map(String::as_str)
        .chain(inventory.iter().map(|o| o.page_url.as_str()))
        .collect();
    let mine: Vec<&ImageObservation> = inventory
        .iter()
        .filter(|o| o.image_url == image_url)
        .collect();
    if pages.is_empty() || mine.is_empty() {
        return s;
    }

    let pages_with_image: HashSet<&str> = mine.iter().map(|o| o.page_url.as_str()).collect();
    s.insert(
        "appearance_score".into(),
        pages_with_image.len() as f32 / pages.len() as f32,
    );

    let positions: HashSet<&str> = mine.iter().map(|o| o.position.as_str()).collect();
    s.insert("position_consistency_score".into(), bool_score(positions.len() == 1));

    let sizes: HashSet<&str> = mine.iter().map(|o| o.size.as_str()).collect();
    s.insert("size_consistency_score".into(), bool_score(sizes.len() == 1));

    s.insert(
        "template_score".into(),
        bool_score(mine.iter().all(|o| o.in_template)),
    );
    s
}
