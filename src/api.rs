// src/api.rs
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shuttle_axum::axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::analyze::debug;
use crate::candidate::LogoCandidate;
use crate::crawl::LogoCrawler;

#[derive(Clone)]
pub struct AppState {
    pub crawler: Arc<LogoCrawler>,
}

impl AppState {
    pub fn new(crawler: LogoCrawler) -> Self {
        Self {
            crawler: Arc::new(crawler),
        }
    }
}

/// Router used by the service binary and by the HTTP tests.
pub fn router(state: AppState) -> Router {
    let weights = *state.crawler.ranker().weights();
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/crawl", post(crawl))
        .with_state(state)
        .merge(debug::router(weights))
        .layer(CorsLayer::very_permissive())
}

#[derive(Debug, Deserialize)]
pub struct CrawlReq {
    pub url: String,
    #[serde(default)]
    pub max_pages: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CrawlResp {
    pub url: String,
    pub logos: Vec<LogoCandidate>,
    pub best: Option<LogoCandidate>,
}

#[derive(Debug, Serialize)]
struct ErrorResp {
    error: String,
}

async fn crawl(State(state): State<AppState>, Json(body): Json<CrawlReq>) -> Response {
    let max_pages = body
        .max_pages
        .unwrap_or(state.crawler.config().max_pages);

    match state.crawler.crawl_with(&body.url, max_pages).await {
        Ok(report) => {
            let best = report.best().cloned();
            Json(CrawlResp {
                url: report.url,
                logos: report.logos,
                best,
            })
            .into_response()
        }
        Err(e) => {
            warn!(url = %body.url, error = %format!("{e:#}"), "crawl rejected");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResp {
                    error: format!("{e:#}"),
                }),
            )
                .into_response()
        }
    }
}
