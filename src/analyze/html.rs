// src/analyze/html.rs
//! HTML-context and structural-position signals, computed from the element
//! snapshot taken at discovery time.

use url::Url;

use super::{bool_score, zeroed};
use crate::candidate::{ElementContext, SubScores};

/// Terms that mark logo markup in class/id/alt/title and nearby text.
pub const LOGO_TERMS: [&str; 5] = ["logo", "brand", "site-logo", "company-logo", "header-logo"];

pub const HTML_CONTEXT_KEYS: [&str; 4] = [
    "class_score",
    "alt_text_score",
    "homepage_link_score",
    "brand_proximity_score",
];

pub const STRUCTURAL_KEYS: [&str; 3] = ["dom_depth_score", "position_score", "consistency_score"];

/// Inline-style fragments that pin an element to the page chrome.
const POSITION_HINTS: [&str; 3] = ["top", "left:0", "margin-left:auto"];

fn has_logo_term(haystack: &str) -> bool {
    let h = haystack.to_lowercase();
    LOGO_TERMS.iter().any(|t| h.contains(t))
}

/// True when `href` resolves to the site root (`/` or `/home`) on the page's host.
pub fn links_to_site_root(href: &str, page_url: &str) -> bool {
    let Ok(base) = Url::parse(page_url) else {
        return false;
    };
    let Ok(target) = base.join(href.trim()) else {
        return false;
    };
    target.host_str() == base.host_str()
        && matches!(target.path().trim_end_matches('/'), "" | "/home")
}

pub fn html_context(ctx: &ElementContext, page_url: &str) -> SubScores {
    let mut s = zeroed(&HTML_CONTEXT_KEYS);
    if !ctx.is_attached() {
        return s;
    }

    s.insert(
        "class_score".into(),
        bool_score(has_logo_term(&ctx.class) || has_logo_term(&ctx.id)),
    );
    s.insert(
        "alt_text_score".into(),
        bool_score(has_logo_term(&ctx.alt) || has_logo_term(&ctx.title)),
    );
    s.insert(
        "homepage_link_score".into(),
        bool_score(
            ctx.link_href
                .as_deref()
                .is_some_and(|href| links_to_site_root(href, page_url)),
        ),
    );
    s.insert(
        "brand_proximity_score".into(),
        bool_score(has_logo_term(&ctx.preceding_text.concat())),
    );
    s
}

/// Structural signals; `all_paths` is the complete inventory of element paths
/// observed during the crawl (one per observation, not per distinct image).
pub fn structural_position(ctx: &ElementContext, all_paths: &[String]) -> SubScores {
    let mut s = zeroed(&STRUCTURAL_KEYS);
    if !ctx.is_attached() {
        return s;
    }

    s.insert("dom_depth_score".into(), 1.0 / (1.0 + ctx.depth() as f32));

    let positioned = ctx.parent_style().is_some_and(|style| {
        let compact: String = style
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        POSITION_HINTS.iter().any(|h| compact.contains(h))
    });
    s.insert("position_score".into(), bool_score(positioned));

    if !all_paths.is_empty() {
        let path = ctx.path();
        let matching = all_paths.iter().filter(|p| **p == path).count();
        s.insert(
            "consistency_score".into(),
            matching as f32 / all_paths.len() as f32,
        );
    }
    s
}
