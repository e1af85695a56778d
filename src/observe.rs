// src/observe.rs
//! Structured crawl events. The pipeline reports what happens through a
//! `CrawlObserver`; presentation (logs, metrics, progress UIs) lives behind it.

use std::fmt;
use std::sync::Mutex;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::candidate::SignalCategory;

/// Why a discovered image did not become a ranked candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    FetchFailed,
    DecodeFailed,
    UnsupportedSvg,
    TooSmall,
    DuplicateImage,
    ClassifierFailed,
    ClassifierTimeout,
    NotALogo,
    BelowThreshold,
}

impl DropReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::FetchFailed => "fetch_failed",
            DropReason::DecodeFailed => "decode_failed",
            DropReason::UnsupportedSvg => "unsupported_svg",
            DropReason::TooSmall => "too_small",
            DropReason::DuplicateImage => "duplicate_image",
            DropReason::ClassifierFailed => "classifier_failed",
            DropReason::ClassifierTimeout => "classifier_timeout",
            DropReason::NotALogo => "not_a_logo",
            DropReason::BelowThreshold => "below_threshold",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    CrawlStarted { url: String, max_pages: usize },
    PageFetched { url: String, images: usize },
    PageFailed { url: String, error: String },
    CandidateDiscovered { image_url: String, page_url: String, is_header: bool },
    CandidateDropped { image_url: String, reason: DropReason, detail: Option<String> },
    LogoDetected { image_url: String, confidence: f32 },
    CacheHit { image_url: String },
    AnalyzerDegraded { image_url: String, category: SignalCategory, detail: String },
    RerankFallback { reason: String },
    CrawlFinished { url: String, pages: usize, logos: usize, elapsed_ms: u64 },
}

pub trait CrawlObserver: Send + Sync {
    fn on_event(&self, event: &CrawlEvent);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl CrawlObserver for NullObserver {
    fn on_event(&self, _event: &CrawlEvent) {}
}

/// Keeps every event; handy in tests and for batch drivers that summarize afterwards.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<CrawlEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<CrawlEvent> {
        match self.events.lock() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }
}

impl CrawlObserver for RecordingObserver {
    fn on_event(&self, event: &CrawlEvent) {
        match self.events.lock() {
            Ok(mut g) => g.push(event.clone()),
            Err(poison) => poison.into_inner().push(event.clone()),
        }
    }
}

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("crawl_pages_fetched_total", "Pages fetched and parsed.");
        describe_counter!("crawl_page_errors_total", "Page fetch/parse failures.");
        describe_counter!(
            "crawl_candidates_discovered_total",
            "Distinct image URLs discovered."
        );
        describe_counter!(
            "crawl_candidates_dropped_total",
            "Candidates dropped before ranking, by reason."
        );
        describe_counter!("crawl_logos_detected_total", "Candidates judged to be logos.");
        describe_counter!(
            "crawl_analyzer_degraded_total",
            "Analyzer runs that fell back to zero scores, by category."
        );
        describe_counter!(
            "crawl_rerank_fallback_total",
            "LLM rerank attempts that fell back to the prior order."
        );
        describe_histogram!("crawl_duration_ms", "Wall time of one crawl in milliseconds.");
    });
}

/// Default observer: tracing records plus Prometheus-style counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TracingObserver {
    pub fn new() -> Self {
        ensure_metrics_described();
        Self
    }
}

impl CrawlObserver for TracingObserver {
    fn on_event(&self, event: &CrawlEvent) {
        match event {
            CrawlEvent::CrawlStarted { url, max_pages } => {
                info!(%url, max_pages, "crawl started");
            }
            CrawlEvent::PageFetched { url, images } => {
                debug!(%url, images, "page fetched");
                counter!("crawl_pages_fetched_total").increment(1);
            }
            CrawlEvent::PageFailed { url, error } => {
                warn!(%url, %error, "page fetch failed");
                counter!("crawl_page_errors_total").increment(1);
            }
            CrawlEvent::CandidateDiscovered {
                image_url,
                page_url,
                is_header,
            } => {
                debug!(%image_url, %page_url, is_header, "candidate discovered");
                counter!("crawl_candidates_discovered_total").increment(1);
            }
            CrawlEvent::CandidateDropped {
                image_url,
                reason,
                detail,
            } => {
                match reason {
                    DropReason::FetchFailed
                    | DropReason::DecodeFailed
                    | DropReason::ClassifierFailed
                    | DropReason::ClassifierTimeout => {
                        warn!(%image_url, %reason, detail = detail.as_deref().unwrap_or(""), "candidate dropped");
                    }
                    _ => debug!(%image_url, %reason, "candidate dropped"),
                }
                counter!("crawl_candidates_dropped_total", "reason" => reason.as_str()).increment(1);
            }
            CrawlEvent::LogoDetected {
                image_url,
                confidence,
            } => {
                info!(%image_url, confidence, "logo detected");
                counter!("crawl_logos_detected_total").increment(1);
            }
            CrawlEvent::CacheHit { image_url } => {
                debug!(%image_url, "vision verdict served from cache");
            }
            CrawlEvent::AnalyzerDegraded {
                image_url,
                category,
                detail,
            } => {
                warn!(%image_url, %category, %detail, "analyzer degraded to zero scores");
                counter!("crawl_analyzer_degraded_total", "category" => category.key()).increment(1);
            }
            CrawlEvent::RerankFallback { reason } => {
                warn!(%reason, "rerank fell back to heuristic order");
                counter!("crawl_rerank_fallback_total").increment(1);
            }
            CrawlEvent::CrawlFinished {
                url,
                pages,
                logos,
                elapsed_ms,
            } => {
                info!(%url, pages, logos, elapsed_ms, "crawl finished");
                histogram!("crawl_duration_ms").record(*elapsed_ms as f64);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_observer_keeps_order() {
        let obs = RecordingObserver::default();
        obs.on_event(&CrawlEvent::RerankFallback { reason: "x".into() });
        obs.on_event(&CrawlEvent::CacheHit { image_url: "u".into() });
        let ev = obs.events();
        assert_eq!(ev.len(), 2);
        assert!(matches!(ev[0], CrawlEvent::RerankFallback { .. }));
    }

    #[test]
    fn tracing_observer_handles_every_event_without_recorder() {
        let obs = TracingObserver::new();
        obs.on_event(&CrawlEvent::CandidateDropped {
            image_url: "u".into(),
            reason: DropReason::TooSmall,
            detail: None,
        });
        obs.on_event(&CrawlEvent::CrawlFinished {
            url: "https://a.com".into(),
            pages: 1,
            logos: 0,
            elapsed_ms: 5,
        });
        assert_eq!(DropReason::NotALogo.to_string(), "not_a_logo");
    }
}
