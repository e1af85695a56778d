// src/candidate.rs
//! Logo candidate model shared by the crawler, the analyzers and the ranker.
//!
//! A candidate is born when a distinct image URL is discovered, gets its
//! confidence/description from the vision classifier, one signal category per
//! analyzer call, and finally a rank score and a classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named sub-scores of one signal category, each in [0,1].
pub type SubScores = BTreeMap<String, f32>;

/// Per-category sub-score mappings of one candidate.
pub type SignalScores = BTreeMap<SignalCategory, SubScores>;

/// Clamp into [0,1]; NaN collapses to 0.
pub fn clamp01(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// The nine evidence sources a candidate is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    HtmlContext,
    StructuralPosition,
    Technical,
    Visual,
    MultiPageConsistency,
    UrlSemantics,
    Metadata,
    SocialMedia,
    SchemaMarkup,
}

impl SignalCategory {
    pub const ALL: [SignalCategory; 9] = [
        SignalCategory::HtmlContext,
        SignalCategory::StructuralPosition,
        SignalCategory::Technical,
        SignalCategory::Visual,
        SignalCategory::MultiPageConsistency,
        SignalCategory::UrlSemantics,
        SignalCategory::Metadata,
        SignalCategory::SocialMedia,
        SignalCategory::SchemaMarkup,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SignalCategory::HtmlContext => "html_context",
            SignalCategory::StructuralPosition => "structural_position",
            SignalCategory::Technical => "technical",
            SignalCategory::Visual => "visual",
            SignalCategory::MultiPageConsistency => "multi_page_consistency",
            SignalCategory::UrlSemantics => "url_semantics",
            SignalCategory::Metadata => "metadata",
            SignalCategory::SocialMedia => "social_media",
            SignalCategory::SchemaMarkup => "schema_markup",
        }
    }

    /// Parse a category key; `multi_page` is accepted as the short weight-table name.
    pub fn from_key(key: &str) -> Option<Self> {
        let k = key.trim().to_ascii_lowercase();
        if k == "multi_page" {
            return Some(SignalCategory::MultiPageConsistency);
        }
        Self::ALL.into_iter().find(|c| c.key() == k)
    }
}

impl fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Discrete label used to filter partner badges and chrome icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Company,
    ThirdParty,
    DesignElement,
    #[default]
    Unknown,
}

/// One ancestor of the source element, outermost first in `ElementContext::ancestors`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ancestor {
    pub name: String,
    /// Position among same-named element siblings.
    pub index: usize,
    pub style: Option<String>,
}

/// Snapshot of the DOM element an image was discovered on, taken at discovery time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementContext {
    pub tag: String,
    pub class: String,
    pub id: String,
    pub alt: String,
    pub title: String,
    /// Element ancestors from the document root down to the direct parent.
    /// Empty for images that only appear in `<style>` blocks.
    pub ancestors: Vec<Ancestor>,
    /// `href` of the nearest enclosing `<a>`.
    pub link_href: Option<String>,
    /// Up to five non-empty text nodes preceding the element, nearest first.
    pub preceding_text: Vec<String>,
    /// Declared `width`/`height` attributes, if any.
    pub declared_size: Option<(u32, u32)>,
    pub in_nav: bool,
    /// Inside header, nav or footer chrome.
    pub in_template: bool,
}

impl ElementContext {
    /// Whether the element is attached to the DOM (false for `<style>`-only backgrounds).
    pub fn is_attached(&self) -> bool {
        !self.tag.is_empty()
    }

    /// Structural path of the element's ancestors, e.g. `html[0] > body[0] > header[0]`.
    pub fn path(&self) -> String {
        self.ancestors
            .iter()
            .map(|a| format!("{}[{}]", a.name, a.index))
            .collect::<Vec<_>>()
            .join(" > ")
    }

    /// Depth from the document node (the document itself counts as one ancestor).
    pub fn depth(&self) -> usize {
        self.ancestors.len() + 1
    }

    pub fn parent_style(&self) -> Option<&str> {
        self.ancestors.last().and_then(|a| a.style.as_deref())
    }
}

/// Flags derived from visual evidence that mark chrome rather than brand imagery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignTraits {
    pub is_icon: bool,
    pub is_ui_element: bool,
    pub is_navigation_element: bool,
}

impl DesignTraits {
    pub fn any(&self) -> bool {
        self.is_icon || self.is_ui_element || self.is_navigation_element
    }
}

/// One discovered image evaluated as a possible logo.
#[derive(Debug, Clone, Serialize)]
pub struct LogoCandidate {
    #[serde(rename = "url")]
    pub image_url: String,
    pub page_url: String,
    confidence: f32,
    pub description: String,
    pub image_hash: String,
    /// When the vision verdict behind this candidate was produced. A verdict
    /// served from the cache keeps its original time, so this plus the cache
    /// TTL is when the verdict stops being reused.
    pub timestamp: DateTime<Utc>,
    is_header: bool,
    pub(crate) rank_score: f32,
    #[serde(rename = "detection_scores")]
    pub signal_scores: SignalScores,
    pub classification: Classification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_url: Option<String>,
    #[serde(skip)]
    pub context: ElementContext,
    #[serde(skip)]
    pub traits: DesignTraits,
}

impl LogoCandidate {
    /// New candidate with the classifier verdict; `is_header` is fixed from here on.
    pub fn new(
        image_url: impl Into<String>,
        page_url: impl Into<String>,
        confidence: f32,
        description: impl Into<String>,
        is_header: bool,
    ) -> Self {
        Self {
            image_url: image_url.into(),
            page_url: page_url.into(),
            confidence: clamp01(confidence),
            description: description.into(),
            image_hash: String::new(),
            timestamp: Utc::now(),
            is_header,
            rank_score: 0.0,
            signal_scores: SignalScores::new(),
            classification: Classification::Unknown,
            logo_text: None,
            stored_url: None,
            context: ElementContext::default(),
            traits: DesignTraits::default(),
        }
    }

    pub fn with_image_hash(mut self, hash: impl Into<String>) -> Self {
        self.image_hash = hash.into();
        self
    }

    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = at;
        self
    }

    pub fn with_logo_text(mut self, text: impl Into<String>) -> Self {
        let t = text.into();
        self.logo_text = if t.trim().is_empty() { None } else { Some(t) };
        self
    }

    pub fn with_context(mut self, context: ElementContext) -> Self {
        self.context = context;
        self
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn is_header(&self) -> bool {
        self.is_header
    }

    pub fn rank_score(&self) -> f32 {
        self.rank_score
    }

    /// Store one analyzer's output; sub-scores are clamped into [0,1].
    pub fn insert_signal(&mut self, category: SignalCategory, scores: SubScores) {
        let clamped = scores.into_iter().map(|(k, v)| (k, clamp01(v))).collect();
        self.signal_scores.insert(category, clamped);
    }

    /// Text used for brand/domain matching: OCR text when available, else the description.
    pub fn match_text(&self) -> &str {
        match self.logo_text.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => &self.description,
        }
    }
}
