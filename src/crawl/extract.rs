// src/crawl/extract.rs
//! Single-pass HTML scan of one page.
//!
//! Collects, in document order:
//! - image candidates: `<img src|data-src>`, `<svg><image href>`, inline `<svg>`,
//!   CSS `background(-image): url(..)` in `style` attributes and `<style>` blocks, `data:` URIs
//! - a snapshot of the element each image was found on (`ElementContext`)
//! - every image occurrence (for multi-page consistency)
//! - same-host links for traversal

use std::collections::{HashSet, VecDeque};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use sha2::{Digest, Sha256};
use url::Url;

use crate::analyze::ImageObservation;
use crate::candidate::{Ancestor, ElementContext};

/// Text nodes remembered before each element (brand proximity).
pub const PRECEDING_TEXT_NODES: usize = 5;

const HEADER_TAGS: [&str; 2] = ["header", "nav"];
const HEADER_IDS: [&str; 2] = ["header", "nav"];
const HEADER_CLASSES: [&str; 5] = ["header", "nav", "navbar", "site-header", "main-header"];
const HEADER_ROLES: [&str; 2] = ["banner", "navigation"];
const FOOTER_CLASSES: [&str; 2] = ["footer", "site-footer"];

static RE_CSS_BACKGROUND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)background(?:-image)?\s*:[^;{}]*?url\(([^)]*)\)").expect("css background regex")
});

/// How the image bytes are obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Remote,
    DataUri,
    /// Inline `<svg>` markup.
    InlineSvg(String),
}

#[derive(Debug, Clone)]
pub struct DiscoveredImage {
    /// Identity: normalized absolute URL, the `data:` URI, or `inline-svg:<hash>`.
    pub image_url: String,
    pub page_url: String,
    pub source: ImageSource,
    pub context: ElementContext,
    pub is_header: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PageScan {
    pub page_url: String,
    /// First occurrence of each image on the page.
    pub images: Vec<DiscoveredImage>,
    /// Every occurrence, duplicates included.
    pub observations: Vec<ImageObservation>,
    pub links: Vec<String>,
}

/// Absolute http(s) URL without fragment, or `None` for anchors, scripts, mail links.
pub fn normalize_url(base: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }
    let mut u = base.join(raw).ok()?;
    if !matches!(u.scheme(), "http" | "https") {
        return None;
    }
    u.set_fragment(None);
    Some(u.into())
}

fn image_ref(base: &Url, raw: &str) -> Option<(String, ImageSource)> {
    let raw = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if raw.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("data:")) {
        return Some((raw.to_string(), ImageSource::DataUri));
    }
    normalize_url(base, raw).map(|u| (u, ImageSource::Remote))
}

pub fn inline_svg_id(markup: &str) -> String {
    let digest = Sha256::digest(markup.as_bytes());
    format!("inline-svg:{}", hex::encode(&digest[..8]))
}

/// `url(..)` targets of background declarations in a CSS fragment.
pub fn css_background_urls(css: &str) -> Vec<String> {
    RE_CSS_BACKGROUND
        .captures_iter(css)
        .map(|c| c[1].trim().trim_matches(|c| c == '"' || c == '\'').trim().to_string())
        .filter(|u| !u.is_empty())
        .collect()
}

fn has_token(value: Option<&str>, tokens: &[&str]) -> bool {
    value.is_some_and(|v| {
        v.split_whitespace()
            .any(|t| tokens.iter().any(|k| t.eq_ignore_ascii_case(k)))
    })
}

fn is_header_landmark(el: &scraper::node::Element) -> bool {
    HEADER_TAGS.contains(&el.name())
        || el.id().is_some_and(|id| HEADER_IDS.iter().any(|h| id.eq_ignore_ascii_case(h)))
        || el
            .classes()
            .any(|c| HEADER_CLASSES.iter().any(|h| c.eq_ignore_ascii_case(h)))
        || has_token(el.attr("role"), &HEADER_ROLES)
}

fn is_nav(el: &scraper::node::Element) -> bool {
    el.name() == "nav"
        || el.id().is_some_and(|id| id.eq_ignore_ascii_case("nav"))
        || el
            .classes()
            .any(|c| c.eq_ignore_ascii_case("nav") || c.eq_ignore_ascii_case("navbar"))
        || has_token(el.attr("role"), &["navigation"])
}

fn is_footer(el: &scraper::node::Element) -> bool {
    el.name() == "footer"
        || el
            .classes()
            .any(|c| FOOTER_CLASSES.iter().any(|f| c.eq_ignore_ascii_case(f)))
        || has_token(el.attr("role"), &["contentinfo"])
}

fn sibling_index(el: ElementRef<'_>) -> usize {
    let name = el.value().name();
    el.prev_siblings()
        .filter_map(ElementRef::wrap)
        .filter(|s| s.value().name() == name)
        .count()
}

fn parse_dimension(v: Option<&str>) -> Option<u32> {
    v?.trim().trim_end_matches("px").trim().parse().ok()
}

/// Snapshot of `el` and its ancestors; returns the context and the header flag.
fn element_context(el: ElementRef<'_>, recent: &VecDeque<String>) -> (ElementContext, bool) {
    let mut chain: Vec<ElementRef<'_>> = el.ancestors().filter_map(ElementRef::wrap).collect();
    chain.reverse();

    let ancestors = chain
        .iter()
        .map(|a| Ancestor {
            name: a.value().name().to_string(),
            index: sibling_index(*a),
            style: a.value().attr("style").map(str::to_string),
        })
        .collect();

    let with_self = || chain.iter().copied().chain(std::iter::once(el));
    let is_header = with_self().any(|e| is_header_landmark(e.value()));
    let in_nav = with_self().any(|e| is_nav(e.value()));
    let in_template = is_header || with_self().any(|e| is_footer(e.value()));

    let link_href = with_self()
        .rev()
        .find(|e| e.value().name() == "a" && e.value().attr("href").is_some())
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string);

    let v = el.value();
    let declared_size = parse_dimension(v.attr("width")).zip(parse_dimension(v.attr("height")));

    let ctx = ElementContext {
        tag: v.name().to_string(),
        class: v.attr("class").unwrap_or_default().to_string(),
        id: v.id().unwrap_or_default().to_string(),
        alt: v.attr("alt").unwrap_or_default().to_string(),
        title: v.attr("title").unwrap_or_default().to_string(),
        ancestors,
        link_href,
        preceding_text: recent.iter().cloned().collect(),
        declared_size,
        in_nav,
        in_template,
    };
    (ctx, is_header)
}

fn is_raw_text_parent(parent: Option<ElementRef<'_>>) -> bool {
    parent.is_some_and(|p| matches!(p.value().name(), "script" | "style" | "noscript" | "template"))
}

fn inside_svg(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| a.value().name() == "svg")
}

/// `href` / `xlink:href` of an SVG `<image>`.
fn svg_image_href<'a>(el: ElementRef<'a>) -> Option<&'a str> {
    el.value()
        .attrs()
        .find(|(name, _)| *name == "href" || name.ends_with(":href"))
        .map(|(_, v)| v)
}

struct Collector<'p> {
    base: &'p Url,
    scan: PageScan,
    seen_images: HashSet<String>,
    seen_links: HashSet<String>,
}

impl Collector<'_> {
    fn record(&mut self, image_url: String, source: ImageSource, context: ElementContext, is_header: bool) {
        let size = context
            .declared_size
            .map(|(w, h)| format!("{w}x{h}"))
            .unwrap_or_else(|| "auto".to_string());
        self.scan.observations.push(ImageObservation {
            image_url: image_url.clone(),
            page_url: self.scan.page_url.clone(),
            position: context.path(),
            size,
            in_template: context.in_template,
        });
        if self.seen_images.insert(image_url.clone()) {
            self.scan.images.push(DiscoveredImage {
                image_url,
                page_url: self.scan.page_url.clone(),
                source,
                context,
                is_header,
            });
        }
    }

    fn record_ref(&mut self, raw: &str, context: &ElementContext, is_header: bool) {
        if let Some((url, source)) = image_ref(self.base, raw) {
            self.record(url, source, context.clone(), is_header);
        }
    }

    fn link(&mut self, raw: &str) {
        if let Some(u) = normalize_url(self.base, raw) {
            let same_host = Url::parse(&u)
                .ok()
                .is_some_and(|t| t.host_str() == self.base.host_str());
            if same_host && self.seen_links.insert(u.clone()) {
                self.scan.links.push(u);
            }
        }
    }
}

pub fn scan_page(page_url: &str, html: &str) -> Result<PageScan> {
    let base = Url::parse(page_url).with_context(|| format!("invalid page url {page_url}"))?;
    let doc = Html::parse_document(html);

    let mut c = Collector {
        base: &base,
        scan: PageScan {
            page_url: page_url.to_string(),
            ..Default::default()
        },
        seen_images: HashSet::new(),
        seen_links: HashSet::new(),
    };
    let mut recent: VecDeque<String> = VecDeque::with_capacity(PRECEDING_TEXT_NODES);

    for node in doc.tree.root().descendants() {
        if let Some(text) = node.value().as_text() {
            let t = text.trim();
            if !t.is_empty() && !is_raw_text_parent(node.parent().and_then(ElementRef::wrap)) {
                recent.push_front(t.to_string());
                recent.truncate(PRECEDING_TEXT_NODES);
            }
            continue;
        }
        let Some(el) = ElementRef::wrap(node) else {
            continue;
        };
        let v = el.value();

        match v.name() {
            "img" => {
                let (ctx, is_header) = element_context(el, &recent);
                for attr in ["src", "data-src"] {
                    if let Some(raw) = v.attr(attr) {
                        c.record_ref(raw, &ctx, is_header);
                    }
                }
            }
            "image" if inside_svg(el) => {
                if let Some(raw) = svg_image_href(el) {
                    let (ctx, is_header) = element_context(el, &recent);
                    c.record_ref(raw, &ctx, is_header);
                }
            }
            "svg" if !inside_svg(el) => {
                let markup = el.html();
                let (ctx, is_header) = element_context(el, &recent);
                c.record(inline_svg_id(&markup), ImageSource::InlineSvg(markup), ctx, is_header);
            }
            "style" => {
                let css: String = el.text().collect();
                for raw in css_background_urls(&css) {
                    // Stylesheet rules are not attached to one element.
                    c.record_ref(&raw, &ElementContext::default(), false);
                }
            }
            "a" => {
                if let Some(href) = v.attr("href") {
                    c.link(href);
                }
            }
            _ => {}
        }

        if let Some(style) = v.attr("style") {
            let urls = css_background_urls(style);
            if !urls.is_empty() {
                let (ctx, is_header) = element_context(el, &recent);
                for raw in urls {
                    c.record_ref(&raw, &ctx, is_header);
                }
            }
        }
    }

    Ok(c.scan)
}
