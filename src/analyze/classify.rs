// src/analyze/classify.rs
//! Candidate classifier: a first-match decision list.
//!
//! 1. in the header and the text names the brand        -> company
//! 2. the text names a known third-party brand          -> third_party
//! 3. visual traits mark an icon / UI / navigation item -> design_element
//! 4. otherwise                                         -> unknown

use super::rank::SiteIdentity;
use crate::candidate::{Classification, LogoCandidate};

/// Partner/platform brands whose badges commonly sit next to a company logo.
pub const THIRD_PARTY_BRANDS: [&str; 15] = [
    "google",
    "facebook",
    "twitter",
    "linkedin",
    "instagram",
    "youtube",
    "tiktok",
    "pinterest",
    "app store",
    "google play",
    "microsoft",
    "github",
    "paypal",
    "visa",
    "mastercard",
];

/// Lowercase words of `text`, space-separated and padded so that whole-word
/// containment is a plain substring test.
fn padded_words(text: &str) -> String {
    let words: Vec<String> = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    format!(" {} ", words.join(" "))
}

fn contains_term(padded_text: &str, term: &str) -> bool {
    let t = padded_words(term);
    !t.trim().is_empty() && padded_text.contains(&t)
}

#[derive(Debug, Clone)]
pub struct CandidateClassifier {
    brand: Option<String>,
    third_party: Vec<String>,
}

impl Default for CandidateClassifier {
    fn default() -> Self {
        Self::new(None)
    }
}

impl CandidateClassifier {
    /// `brand` is the expected company name; when absent the site name of each
    /// candidate's page stands in.
    pub fn new(brand: Option<String>) -> Self {
        Self {
            brand: brand.filter(|b| !b.trim().is_empty()),
            third_party: THIRD_PARTY_BRANDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_third_party<I, S>(mut self, brands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.third_party = brands.into_iter().map(Into::into).collect();
        self
    }

    fn names_brand(&self, candidate: &LogoCandidate, text: &str) -> bool {
        match &self.brand {
            Some(brand) => {
                contains_term(text, brand)
                    || text.split_whitespace().collect::<String>()
                        == padded_words(brand).split_whitespace().collect::<String>()
            }
            None => SiteIdentity::from_url(&candidate.page_url)
                .is_some_and(|site| site.matches(text)),
        }
    }

    pub fn classify(&self, candidate: &LogoCandidate) -> Classification {
        let raw = format!(
            "{} {}",
            candidate.logo_text.as_deref().unwrap_or_default(),
            candidate.description
        );
        let text = padded_words(&raw);

        if candidate.is_header() && self.names_brand(candidate, &text) {
            return Classification::Company;
        }
        if self.third_party.iter().any(|t| contains_term(&text, t)) {
            return Classification::ThirdParty;
        }
        if candidate.traits.any() {
            return Classification::DesignElement;
        }
        Classification::Unknown
    }

    /// Label every candidate in place.
    pub fn classify_all(&self, candidates: &mut [LogoCandidate]) {
        for c in candidates.iter_mut() {
            c.classification = self.classify(c);
        }
    }
}
