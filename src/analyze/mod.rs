// src/analyze/mod.rs
//! Candidate scoring pipeline: the nine signal analyzers, the aggregator,
//! the classifier, the ranker and the vision/rerank clients built on chat completions.

pub mod chat;
pub mod classify;
pub mod consistency;
pub mod debug;
pub mod html;
pub mod markup;
pub mod metadata;
pub mod rank;
pub mod rerank;
pub mod scoring;
pub mod technical;
pub mod vision;
pub mod visual;
pub mod weights;

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::warn;

use crate::candidate::{SignalCategory, SubScores};

// Re-export convenient types.
pub use crate::analyze::chat::{AzureEndpoint, ChatClient, ChatCompletion, ChatMessage, OpenAiEndpoint};
pub use crate::analyze::classify::CandidateClassifier;
pub use crate::analyze::consistency::ImageObservation;
pub use crate::analyze::rank::{LogoRanker, SiteIdentity, Tier};
pub use crate::analyze::rerank::LlmReranker;
pub use crate::analyze::scoring::aggregate;
pub use crate::analyze::vision::{ChatVisionClassifier, VisionClassifier, VisionVerdict};
pub use crate::analyze::weights::CategoryWeights;

/// Mapping with every key present and set to 0.0.
pub(crate) fn zeroed(keys: &[&str]) -> SubScores {
    keys.iter().map(|k| (k.to_string(), 0.0)).collect()
}

pub(crate) fn bool_score(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// The fixed sub-score keys an analyzer of `category` produces.
pub fn category_keys(category: SignalCategory) -> &'static [&'static str] {
    match category {
        SignalCategory::HtmlContext => &html::HTML_CONTEXT_KEYS,
        SignalCategory::StructuralPosition => &html::STRUCTURAL_KEYS,
        SignalCategory::Technical => &technical::TECHNICAL_KEYS,
        SignalCategory::Visual => &visual::VISUAL_KEYS,
        SignalCategory::MultiPageConsistency => &consistency::CONSISTENCY_KEYS,
        SignalCategory::UrlSemantics => &markup::URL_KEYS,
        SignalCategory::Metadata => &metadata::METADATA_KEYS,
        SignalCategory::SocialMedia => &markup::SOCIAL_KEYS,
        SignalCategory::SchemaMarkup => &markup::SCHEMA_KEYS,
    }
}

/// Run one analyzer; a panic inside it degrades to the all-zero mapping for that
/// category instead of taking the candidate (or the crawl) down.
///
/// Returns the scores and whether they are degraded.
pub fn run_analyzer<F>(category: SignalCategory, f: F) -> (SubScores, bool)
where
    F: FnOnce() -> SubScores,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(scores) => (scores, false),
        Err(_) => {
            warn!(category = %category, "analyzer failed; using zero scores");
            (zeroed(category_keys(category)), true)
        }
    }
}
