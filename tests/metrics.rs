// tests/metrics.rs
//
// /metrics exposition: static gauges from start-up and event counters emitted
// by the tracing observer. One test per process (the recorder is global).

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use logo_scout::observe::{CrawlEvent, CrawlObserver, DropReason, TracingObserver};

#[tokio::test]
async fn metrics_endpoint_contains_expected_series() {
    std::env::set_var("METRICS_ROUTE", "1");
    std::env::set_var("OPENAI_API_KEY", "sk-test-metrics");
    std::env::set_var("CRAWLER_CONFIG_PATH", "/nonexistent/crawler.toml");

    let app = logo_scout::app()
        .await
        .expect("app() should build Router in tests");

    let obs = TracingObserver::new();
    obs.on_event(&CrawlEvent::CandidateDropped {
        image_url: "https://acme.com/tiny.png".into(),
        reason: DropReason::TooSmall,
        detail: Some("8x8".into()),
    });
    obs.on_event(&CrawlEvent::PageFetched {
        url: "https://acme.com/".into(),
        images: 3,
    });

    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "crawl_cache_ttl_secs",
        "crawl_max_pages",
        "crawl_pages_fetched_total",
        "crawl_candidates_dropped_total{reason=\"too_small\"}",
    ] {
        assert!(text.contains(needle), "missing {needle} in:\n{text}");
    }
}
