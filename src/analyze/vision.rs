// src/analyze/vision.rs
//! Vision classifier: asks a chat model whether an image is a logo and parses the
//! loosely structured answer.
//!
//! Accepted reply shapes (tolerant, case-insensitive):
//! - `Confidence Score: 0.87\nDescription: ...`
//! - `Confidence: 0.9 ...`
//! - `0.9, This image ...` / `0.95 - The image ...` / `0.9`
//! - `null` => not a logo
//!
//! Anything else still yields a verdict with confidence 0.0 and the text as description.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::chat::{ChatCompletion, ChatMessage};
use crate::candidate::clamp01;

pub const VISION_MAX_TOKENS: u32 = 300;

const SYSTEM_PROMPT: &str = "You are a logo detection assistant. Analyze the image and determine if it's a logo. \
If it is, provide a confidence score (0-1) and description in this format: \
'Confidence Score: X.XX\nDescription: ...'. If not, return 'null'.";

const USER_PROMPT: &str = "Is this image a logo? If yes, provide a confidence score (0-1) and a brief \
description of what makes it a logo. Format your response as 'Confidence Score: X.XX\nDescription: ...'. \
If no, return null.";

static RE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d*\.?\d+)").expect("number regex"));

/// Tried in order against the whole lowercased reply.
static CONFIDENCE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"confidence score:\s*(\d*\.?\d+)",
        r"confidence:\s*(\d*\.?\d+)",
        r"^(\d*\.?\d+),\s*",
        r"^(\d*\.?\d+)\s*-\s*",
        r"^(\d*\.?\d+)$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("confidence regex"))
    .collect()
});

static RE_DESCRIPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)description:\s*(.*)").expect("description regex"));

/// The classifier's judgement on an image that it considers a logo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionVerdict {
    pub confidence: f32,
    pub description: String,
}

/// External logo/not-logo judgement.
///
/// `Ok(None)`: not a logo (explicit sentinel or unusable reply).
/// `Err(_)`: transport failure; the caller drops the candidate.
#[async_trait]
pub trait VisionClassifier: Send + Sync {
    async fn classify(&self, png_base64: &str) -> Result<Option<VisionVerdict>>;
}

fn is_confidence_line(line: &str) -> bool {
    let l = line.trim().to_lowercase();
    l.starts_with("confidence:") || l.starts_with("confidence score:")
}

pub fn extract_confidence(content: &str) -> f32 {
    for line in content.lines() {
        if !is_confidence_line(line) {
            continue;
        }
        if let Some(v) = RE_NUMBER
            .captures(&line.to_lowercase())
            .and_then(|c| c[1].parse::<f32>().ok())
        {
            return clamp01(v);
        }
    }

    let lower = content.trim().to_lowercase();
    for re in CONFIDENCE_PATTERNS.iter() {
        if let Some(v) = re.captures(&lower).and_then(|c| c[1].parse::<f32>().ok()) {
            return clamp01(v);
        }
    }
    0.0
}

pub fn extract_description(content: &str) -> String {
    if let Some(c) = RE_DESCRIPTION.captures(content) {
        return c[1].trim().to_string();
    }
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !is_confidence_line(l))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn is_null_sentinel(content: &str) -> bool {
    content
        .trim()
        .trim_matches(|c| matches!(c, '\'' | '"' | '.' | '`'))
        .eq_ignore_ascii_case("null")
}

/// Turn the model's reply into a verdict. `None` for a missing reply or the `null` sentinel.
pub fn parse_vision_reply(content: Option<&str>) -> Option<VisionVerdict> {
    let content = content?.trim();
    if content.is_empty() || is_null_sentinel(content) {
        return None;
    }
    Some(VisionVerdict {
        confidence: extract_confidence(content),
        description: extract_description(content),
    })
}

/// `VisionClassifier` over any chat backend (OpenAI or Azure).
pub struct ChatVisionClassifier {
    chat: Arc<dyn ChatCompletion>,
}

impl ChatVisionClassifier {
    pub fn new(chat: Arc<dyn ChatCompletion>) -> Self {
        Self { chat }
    }

    pub fn messages(png_base64: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user_with_png(USER_PROMPT, png_base64),
        ]
    }
}

#[async_trait]
impl VisionClassifier for ChatVisionClassifier {
    async fn classify(&self, png_base64: &str) -> Result<Option<VisionVerdict>> {
        let reply = self
            .chat
            .complete(&Self::messages(png_base64), VISION_MAX_TOKENS)
            .await?;
        Ok(parse_vision_reply(reply.as_deref()))
    }
}
