// src/analyze/rerank.rs
//! Optional cross-candidate reranking by a chat model.
//!
//! - All candidates are described in one prompt (`Logo i` with location, confidence, description).
//! - The reply is split into `Logo i` sections and the first `score: X` of each section
//!   replaces that candidate's rank score (clamped into [0,1]).
//! - Candidates the reply does not mention keep their score.
//! - Transport failure, timeout, an empty reply or zero parsed scores fall back to the
//!   incoming order. Candidates are never dropped here.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use super::chat::{ChatCompletion, ChatMessage};
use super::rank::sort_by_rank;
use crate::candidate::{clamp01, LogoCandidate};

pub const RERANK_MAX_TOKENS: u32 = 500;

const SYSTEM_PROMPT: &str = "You are a logo ranking assistant. Analyze the provided logos and rank them \
based on their likelihood of being the main company logo. Consider:\n\
1. Location (header/nav logos are more likely)\n\
2. Confidence score\n\
3. Description (looking for company name, branding elements)\n\
4. Professional design indicators";

static RE_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\blogo\s*#?\s*(\d+)\b").expect("section regex"));
static RE_SCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)score\s*[:=]?\s*(\d*\.?\d+)").expect("score regex"));

/// Result of a rerank attempt; `fallback` carries the reason when the prior order was kept.
#[derive(Debug)]
pub struct RerankOutcome {
    pub candidates: Vec<LogoCandidate>,
    pub fallback: Option<String>,
}

pub fn rerank_prompt(candidates: &[LogoCandidate]) -> String {
    let entries: Vec<String> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let location = if c.is_header() {
                "header/navigation"
            } else {
                "main content"
            };
            format!(
                "Logo {}:\n- Location: {}\n- Confidence: {:.2}\n- Description: {}",
                i + 1,
                location,
                c.confidence(),
                c.description
            )
        })
        .collect();
    format!(
        "Rank these logos from most to least likely to be the main company logo. \
For each logo, provide a score from 0-1 and brief explanation:\n\n{}",
        entries.join("\n")
    )
}

/// 1-based logo number -> score, first occurrence wins.
pub fn parse_rerank_scores(reply: &str) -> HashMap<usize, f32> {
    let heads: Vec<(usize, usize, usize)> = RE_SECTION
        .captures_iter(reply)
        .filter_map(|c| {
            let m = c.get(0)?;
            let n = c[1].parse().ok()?;
            Some((n, m.start(), m.end()))
        })
        .collect();

    let mut out = HashMap::new();
    for (i, (n, _, body_start)) in heads.iter().enumerate() {
        let body_end = heads.get(i + 1).map(|h| h.1).unwrap_or(reply.len());
        let section = &reply[*body_start..body_end];
        if let Some(v) = RE_SCORE
            .captures(section)
            .and_then(|c| c[1].parse::<f32>().ok())
        {
            out.entry(*n).or_insert(clamp01(v));
        }
    }
    out
}

pub struct LlmReranker {
    chat: Arc<dyn ChatCompletion>,
    timeout: Duration,
}

impl LlmReranker {
    pub fn new(chat: Arc<dyn ChatCompletion>, timeout: Duration) -> Self {
        Self { chat, timeout }
    }

    async fn scores(&self, candidates: &[LogoCandidate]) -> Result<HashMap<usize, f32>> {
        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(rerank_prompt(candidates)),
        ];
        let reply = tokio::time::timeout(self.timeout, self.chat.complete(&messages, RERANK_MAX_TOKENS))
            .await
            .map_err(|_| anyhow!("rerank timed out after {:?}", self.timeout))??
            .ok_or_else(|| anyhow!("rerank reply had no content"))?;

        let scores = parse_rerank_scores(&reply);
        if !scores.keys().any(|n| (1..=candidates.len()).contains(n)) {
            bail!("rerank reply carried no usable scores");
        }
        Ok(scores)
    }

    /// Apply the model's scores and re-sort; on any failure return the input unchanged.
    pub async fn rerank(&self, mut candidates: Vec<LogoCandidate>) -> RerankOutcome {
        if candidates.len() < 2 {
            return RerankOutcome {
                candidates,
                fallback: None,
            };
        }
        match self.scores(&candidates).await {
            Ok(scores) => {
                for (i, c) in candidates.iter_mut().enumerate() {
                    if let Some(s) = scores.get(&(i + 1)) {
                        c.rank_score = *s;
                    }
                }
                sort_by_rank(&mut candidates);
                RerankOutcome {
                    candidates,
                    fallback: None,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "llm rerank failed; keeping prior order");
                RerankOutcome {
                    candidates,
                    fallback: Some(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Canned(Option<&'static str>);

    #[async_trait]
    impl ChatCompletion for Canned {
        async fn complete(&self, _m: &[ChatMessage], _t: u32) -> Result<Option<String>> {
            match self.0 {
                Some(s) => Ok(Some(s.to_string())),
                None => bail!("connection refused"),
            }
        }
        fn name(&self) -> &'static str {
            "canned"
        }
    }

    fn three() -> Vec<LogoCandidate> {
        ["a", "b", "c"]
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let mut c = LogoCandidate::new(*n, "https://x.com/", 0.5, *n, i == 0);
                c.rank_score = 0.9 - i as f32 * 0.1;
                c
            })
            .collect()
    }

    #[test]
    fn prompt_lists_every_logo() {
        let p = rerank_prompt(&three());
        assert!(p.contains("Logo 1:\n- Location: header/navigation\n- Confidence: 0.50\n- Description: a"));
        assert!(p.contains("Logo 3:\n- Location: main content"));
    }

    #[test]
    fn parses_sections_independently() {
        let reply = "Logo 1: weak, generic. \nLogo 2 - Score: 0.9 clear wordmark\nLogo #3: score 1.4";
        let s = parse_rerank_scores(reply);
        assert_eq!(s.get(&1), None);
        assert_eq!(s.get(&2), Some(&0.9));
        assert_eq!(s.get(&3), Some(&1.0));
    }

    #[tokio::test]
    async fn applies_scores_and_keeps_unmentioned() {
        let r = LlmReranker::new(Arc::new(Canned(Some("Logo 3: score 0.95"))), Duration::from_secs(1));
        let out = r.rerank(three()).await;
        assert!(out.fallback.is_none());
        let names: Vec<&str> = out.candidates.iter().map(|c| c.image_url.as_str()).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[tokio::test]
    async fn failures_fall_back_to_prior_order() {
        for chat in [Canned(None), Canned(Some("I cannot rank these."))] {
            let r = LlmReranker::new(Arc::new(chat), Duration::from_secs(1));
            let out = r.rerank(three()).await;
            assert!(out.fallback.is_some());
            let names: Vec<&str> = out.candidates.iter().map(|c| c.image_url.as_str()).collect();
            assert_eq!(names, ["a", "b", "c"]);
        }
    }
}
