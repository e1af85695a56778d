// src/analyze/rank.rs
//! Ranker: one [0,1] scale, scored by one of two rules chosen per ranked set.
//!
//! ```text
//! evidence = confidence                              (no signal scores)
//!          = 0.5 * confidence + 0.5 * aggregate      (otherwise)
//!
//! no candidate names the site:
//!   score = min(1, evidence + 0.2 * is_header)
//!
//! some candidate names the site (logo text == domain label), disjoint tiers:
//!   header + domain   0.95 + 0.05 * evidence         [0.95, 1.00]
//!   header only       0.90 + 0.04 * evidence         [0.90, 0.94]
//!   domain only       0.85 + 0.04 * evidence         [0.85, 0.89]
//!   neither           0.84 * evidence                [0.00, 0.84]
//! ```
//!
//! Within a tier, evidence only breaks ties. Equal scores keep discovery order.

use url::Url;

use super::{aggregate, CategoryWeights};
use crate::candidate::{clamp01, LogoCandidate};

pub const HEADER_BOOST: f32 = 0.2;

/// Second-level labels that sit between the registrable name and a country TLD
/// (`acme.co.uk`, `acme.com.au`).
const SECOND_LEVEL: [&str; 7] = ["co", "com", "org", "net", "ac", "gov", "edu"];

fn alnum_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// The site's name as it would appear in a wordmark: the host minus `www.` and TLD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteIdentity {
    label: String,
}

impl SiteIdentity {
    pub fn from_host(host: &str) -> Self {
        let host = host.trim().trim_end_matches('.').to_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        let parts: Vec<&str> = host.split('.').filter(|p| !p.is_empty()).collect();
        let name = match parts.len() {
            0 => "",
            1 => parts[0],
            n if n >= 3 && parts[n - 1].len() == 2 && SECOND_LEVEL.contains(&parts[n - 2]) => {
                parts[n - 3]
            }
            n => parts[n - 2],
        };
        Self {
            label: name.chars().filter(|c| c.is_ascii_alphanumeric()).collect(),
        }
    }

    pub fn from_url(url: &str) -> Option<Self> {
        let u = Url::parse(url).ok()?;
        Some(Self::from_host(u.host_str()?))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether `text` names the site: one of its words is the label, or all of
    /// its words run together are (`"Acme Corp"` matches `acmecorp.com`).
    pub fn matches(&self, text: &str) -> bool {
        if self.label.is_empty() {
            return false;
        }
        let words = alnum_words(text);
        words.iter().any(|w| *w == self.label) || words.concat() == self.label
    }
}

/// Rank tier of a candidate while domain matching decides the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Plain,
    DomainOnly,
    HeaderOnly,
    HeaderAndDomain,
}

impl Tier {
    pub fn of(candidate: &LogoCandidate) -> Self {
        match (candidate.is_header(), LogoRanker::domain_match(candidate)) {
            (true, true) => Tier::HeaderAndDomain,
            (true, false) => Tier::HeaderOnly,
            (false, true) => Tier::DomainOnly,
            (false, false) => Tier::Plain,
        }
    }

    /// Lowest score of the tier and the share of the scale evidence can add on top.
    pub fn band(self) -> (f32, f32) {
        match self {
            Tier::HeaderAndDomain => (0.95, 0.05),
            Tier::HeaderOnly => (0.90, 0.04),
            Tier::DomainOnly => (0.85, 0.04),
            Tier::Plain => (0.0, 0.84),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogoRanker {
    weights: CategoryWeights,
}

impl LogoRanker {
    pub fn new(weights: CategoryWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &CategoryWeights {
        &self.weights
    }

    /// Whether the candidate's logo text names the site it was found on.
    pub fn domain_match(candidate: &LogoCandidate) -> bool {
        SiteIdentity::from_url(&candidate.page_url)
            .is_some_and(|site| site.matches(candidate.match_text()))
    }

    fn evidence(&self, candidate: &LogoCandidate) -> f32 {
        let confidence = clamp01(candidate.confidence());
        if candidate.signal_scores.is_empty() {
            confidence
        } else {
            0.5 * confidence + 0.5 * aggregate(&candidate.signal_scores, &self.weights)
        }
    }

    fn score(&self, candidate: &LogoCandidate, tiered: bool) -> f32 {
        let evidence = self.evidence(candidate);
        if tiered {
            let (floor, span) = Tier::of(candidate).band();
            return clamp01(floor + span * evidence);
        }
        let boost = if candidate.is_header() { HEADER_BOOST } else { 0.0 };
        clamp01(evidence + boost)
    }

    /// Score of a candidate ranked on its own: tiered when it names the site.
    pub fn rank_score(&self, candidate: &LogoCandidate) -> f32 {
        self.score(candidate, Self::domain_match(candidate))
    }

    /// Recompute every rank score and sort descending; equal scores keep input order.
    ///
    /// One candidate naming the site switches the whole set to tiered scoring.
    pub fn rank(&self, mut candidates: Vec<LogoCandidate>) -> Vec<LogoCandidate> {
        let tiered = candidates.iter().any(Self::domain_match);
        for c in candidates.iter_mut() {
            c.rank_score = self.score(c, tiered);
        }
        sort_by_rank(&mut candidates);
        candidates
    }

    pub fn top(&self, candidates: Vec<LogoCandidate>, n: usize) -> Vec<LogoCandidate> {
        let mut ranked = self.rank(candidates);
        ranked.truncate(n);
        ranked
    }

    /// Keep candidates whose confidence reaches `threshold` (0.0 keeps everything).
    pub fn filter_by_confidence(
        candidates: Vec<LogoCandidate>,
        threshold: f32,
    ) -> Vec<LogoCandidate> {
        candidates
            .into_iter()
            .filter(|c| c.confidence() >= threshold)
            .collect()
    }
}

/// Stable descending sort on the stored rank score.
pub(crate) fn sort_by_rank(candidates: &mut [LogoCandidate]) {
    candidates.sort_by(|a, b| b.rank_score.total_cmp(&a.rank_score));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_label_strips_www_and_tlds() {
        assert_eq!(SiteIdentity::from_host("www.acme.com").label(), "acme");
        assert_eq!(SiteIdentity::from_host("shop.acme.co.uk").label(), "acme");
        assert_eq!(SiteIdentity::from_host("my-brand.io").label(), "mybrand");
        assert_eq!(SiteIdentity::from_host("localhost").label(), "localhost");
    }

    #[test]
    fn matching_is_word_based() {
        let site = SiteIdentity::from_host("acme.com");
        assert!(site.matches("ACME"));
        assert!(site.matches("The ACME wordmark in blue"));
        assert!(!site.matches("Acmeville city seal"));
        assert!(SiteIdentity::from_host("acmecorp.com").matches("Acme Corp"));
        assert!(!SiteIdentity::from_host("").matches(""));
    }

    #[test]
    fn signals_blend_with_confidence() {
        use crate::candidate::{SignalCategory, SubScores};
        let ranker = LogoRanker::default();
        let mut c = LogoCandidate::new("https://x.org/a.png", "https://x.org/", 0.6, "badge", false);
        let all_ones: SubScores = [("k".to_string(), 1.0)].into_iter().collect();
        for cat in SignalCategory::ALL {
            c.insert_signal(cat, all_ones.clone());
        }
        // 0.5 * 0.6 + 0.5 * 1.0
        assert!((ranker.rank_score(&c) - 0.8).abs() < 1e-5);
    }

    #[test]
    fn non_header_domain_match_lands_in_its_tier() {
        let c = LogoCandidate::new("https://acme.com/f.png", "https://acme.com/about", 0.3, "ACME", false);
        assert_eq!(Tier::of(&c), Tier::DomainOnly);
        // 0.85 + 0.04 * 0.3
        assert!((LogoRanker::default().rank_score(&c) - 0.862).abs() < 1e-5);
    }

    #[test]
    fn tier_bands_are_disjoint_and_ordered() {
        let tiers = [Tier::Plain, Tier::DomainOnly, Tier::HeaderOnly, Tier::HeaderAndDomain];
        for pair in tiers.windows(2) {
            let (lo_floor, lo_span) = pair[0].band();
            let (hi_floor, _) = pair[1].band();
            assert!(pair[0] < pair[1]);
            assert!(lo_floor + lo_span < hi_floor, "{:?} overlaps {:?}", pair[0], pair[1]);
        }
        let (floor, span) = Tier::HeaderAndDomain.band();
        assert!((floor + span - 1.0).abs() < 1e-6);
    }
}
