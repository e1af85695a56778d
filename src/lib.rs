// src/lib.rs
// Public library surface for the service binary, the probe CLI and integration tests.

pub mod analyze;
pub mod api;
pub mod cache;
pub mod candidate;
pub mod config;
pub mod crawl;
pub mod metrics;
pub mod observe;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{aggregate, CandidateClassifier, CategoryWeights, LogoRanker};
pub use crate::api::{router, AppState};
pub use crate::candidate::{Classification, LogoCandidate, SignalCategory};
pub use crate::config::CrawlerConfig;
pub use crate::crawl::{CrawlReport, LogoCrawler};
pub use crate::observe::{CrawlEvent, CrawlObserver, DropReason};

use axum::Router;
use tracing::info;

/// Full application router from environment configuration.
///
/// Fails only on configuration errors (missing classifier credentials, bad weights).
/// `/metrics` is mounted when `METRICS_ROUTE=1`.
pub async fn app() -> anyhow::Result<Router> {
    let config = CrawlerConfig::from_env()?.validated()?;
    let metrics_route = std::env::var("METRICS_ROUTE").is_ok_and(|v| v == "1");
    let metrics = if metrics_route {
        Some(metrics::Metrics::init(config.cache_ttl_secs, config.max_pages)?)
    } else {
        None
    };

    info!(
        provider = ?config.provider,
        max_pages = config.max_pages,
        llm_rerank = config.llm_rerank,
        "logo crawler configured"
    );
    let crawler = LogoCrawler::from_config(config)?;
    let mut router = api::router(AppState::new(crawler));
    if let Some(m) = metrics {
        router = router.merge(m.router());
    }
    Ok(router)
}
