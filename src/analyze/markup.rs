// src/analyze/markup.rs
//! URL-semantics, social-media and schema/SEO markup signals.
//!
//! Social and schema signals depend on the page, not on the image, so the
//! crawler computes them once per page (or once per site for social) and
//! attaches the same mapping to every candidate from there.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use super::{bool_score, zeroed};
use crate::candidate::SubScores;

pub const URL_KEYS: [&str; 3] = ["path_score", "cdn_score", "versioning_score"];
pub const SOCIAL_KEYS: [&str; 3] = ["twitter_match_score", "og_image_score", "favicon_score"];
pub const SCHEMA_KEYS: [&str; 3] = ["schema_score", "json_ld_score", "meta_score"];

const PATH_TERMS: [&str; 4] = ["logo", "brand", "header", "site-id"];
const CDN_FRAGMENTS: [&str; 5] = ["assets", "static", "media", "images", "cdn"];

static RE_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"v\d+|version-\d+").expect("version regex"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static SEL_SOCIAL_IMAGE: Lazy<Selector> =
    Lazy::new(|| selector(r#"meta[property="og:image"], meta[name="twitter:image"]"#));
static SEL_FAVICON: Lazy<Selector> = Lazy::new(|| selector(r#"link[rel~="icon"]"#));
static SEL_JSON_LD: Lazy<Selector> =
    Lazy::new(|| selector(r#"script[type="application/ld+json"]"#));
static SEL_ITEMTYPE: Lazy<Selector> = Lazy::new(|| selector(r#"[itemtype*="schema.org"]"#));
static SEL_META: Lazy<Selector> = Lazy::new(|| selector("meta"));

pub fn url_semantics(image_url: &str) -> SubScores {
    let mut s = zeroed(&URL_KEYS);
    let Ok(url) = Url::parse(image_url) else {
        return s;
    };
    let path = url.path().to_lowercase();
    let host = url.host_str().unwrap_or_default().to_lowercase();

    s.insert(
        "path_score".into(),
        bool_score(PATH_TERMS.iter().any(|t| path.contains(t))),
    );
    s.insert(
        "cdn_score".into(),
        bool_score(CDN_FRAGMENTS.iter().any(|f| host.contains(f) || path.contains(f))),
    );
    s.insert("versioning_score".into(), bool_score(RE_VERSION.is_match(&path)));
    s
}

/// Social presence of the site. `home_html` is the site's root page (if it was
/// fetched); `profile_match` is the answer of the optional profile lookup.
pub fn social_media(home_html: Option<&str>, profile_match: bool) -> SubScores {
    let mut s = zeroed(&SOCIAL_KEYS);
    s.insert("twitter_match_score".into(), bool_score(profile_match));

    let Some(html) = home_html else {
        return s;
    };
    let doc = Html::parse_document(html);
    s.insert(
        "og_image_score".into(),
        bool_score(doc.select(&SEL_SOCIAL_IMAGE).next().is_some()),
    );
    s.insert(
        "favicon_score".into(),
        bool_score(doc.select(&SEL_FAVICON).next().is_some()),
    );
    s
}

fn json_ld_mentions_logo(raw: &str) -> bool {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(v @ serde_json::Value::Object(_)) | Ok(v @ serde_json::Value::Array(_)) => {
            v.to_string().contains("logo")
        }
        _ => false,
    }
}

pub fn schema_markup(html: &str) -> SubScores {
    let mut s = zeroed(&SCHEMA_KEYS);
    let doc = Html::parse_document(html);

    let json_ld = doc
        .select(&SEL_JSON_LD)
        .any(|el| json_ld_mentions_logo(&el.text().collect::<String>()));
    s.insert("json_ld_score".into(), bool_score(json_ld));

    let schema = doc
        .select(&SEL_ITEMTYPE)
        .any(|el| el.html().contains("logo"));
    s.insert("schema_score".into(), bool_score(schema));

    let meta = doc.select(&SEL_META).any(|el| {
        let tag = el.html();
        tag.contains("logo") || tag.contains("brand")
    });
    s.insert("meta_score".into(), bool_score(meta));
    s
}
