// src/crawl/mod.rs
//! Crawl pipeline.
//!
//! 1. breadth-first same-host page traversal (`max_pages`)
//! 2. candidate enumeration, de-duplicated by normalized image URL
//! 3. per candidate, concurrently: bytes -> decode/rasterize -> size filter ->
//!    optional background removal -> vision verdict (cached, bounded, timed out)
//!    -> per-candidate analyzers
//! 4. barrier: structural position and multi-page consistency over the
//!    complete observation inventory
//! 5. rank, classify, optional LLM rerank

pub mod extract;
pub mod fetch;
pub mod image;
pub mod types;

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use url::Url;

use crate::analyze::chat::build_chat_client;
use crate::analyze::consistency::multi_page_consistency;
use crate::analyze::html::{html_context, structural_position};
use crate::analyze::markup::{schema_markup, social_media, url_semantics};
use crate::analyze::metadata::metadata;
use crate::analyze::technical::technical;
use crate::analyze::visual::{design_traits, visual};
use crate::analyze::{
    run_analyzer, CandidateClassifier, ChatVisionClassifier, ImageObservation, LlmReranker,
    LogoRanker, VisionClassifier, VisionVerdict,
};
use crate::cache::TtlCache;
use crate::candidate::{LogoCandidate, SignalCategory, SubScores};
use crate::config::CrawlerConfig;
use crate::observe::{CrawlEvent, CrawlObserver, DropReason, TracingObserver};

use self::extract::{scan_page, DiscoveredImage, ImageSource, PageScan};
use self::fetch::{HttpFetcher, PageFetcher};
use self::image::{
    content_hash, decode_data_uri, decode_raster, looks_like_svg, meets_min_size, png_base64,
    probe, ImageKind,
};
use self::types::{
    BackgroundRemover, ImageStore, LightBackdropRemover, SocialProfileLookup, SvgRasterizer,
    TextRecognizer,
};

/// Ranked outcome of one crawl.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub url: String,
    /// Pages fetched and scanned, in visit order.
    pub pages: Vec<String>,
    /// Logos, best first.
    pub logos: Vec<LogoCandidate>,
}

impl CrawlReport {
    pub fn best(&self) -> Option<&LogoCandidate> {
        self.logos.first()
    }
}

/// Why one candidate left the pipeline early.
#[derive(Debug)]
struct Dropped {
    reason: DropReason,
    detail: Option<String>,
}

impl Dropped {
    fn new(reason: DropReason) -> Self {
        Self { reason, detail: None }
    }

    fn because(reason: DropReason, detail: impl ToString) -> Self {
        Self {
            reason,
            detail: Some(detail.to_string()),
        }
    }
}

/// A vision answer and the moment it was produced.
#[derive(Debug, Clone)]
struct CachedVerdict {
    verdict: Option<VisionVerdict>,
    at: DateTime<Utc>,
}

/// Signals computed once per page and shared by every candidate found on it.
struct PageSignals {
    social: (SubScores, bool),
    schema: HashMap<String, (SubScores, bool)>,
}

pub struct LogoCrawlerBuilder {
    config: CrawlerConfig,
    fetcher: Arc<dyn PageFetcher>,
    classifier: Arc<dyn VisionClassifier>,
    observer: Option<Arc<dyn CrawlObserver>>,
    reranker: Option<LlmReranker>,
    svg: Option<Arc<dyn SvgRasterizer>>,
    background: Option<Arc<dyn BackgroundRemover>>,
    ocr: Option<Arc<dyn TextRecognizer>>,
    social: Option<Arc<dyn SocialProfileLookup>>,
    store: Option<Arc<dyn ImageStore>>,
}

impl LogoCrawlerBuilder {
    pub fn observer(mut self, observer: Arc<dyn CrawlObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn reranker(mut self, reranker: LlmReranker) -> Self {
        self.reranker = Some(reranker);
        self
    }

    pub fn svg_rasterizer(mut self, svg: Arc<dyn SvgRasterizer>) -> Self {
        self.svg = Some(svg);
        self
    }

    pub fn background_remover(mut self, remover: Arc<dyn BackgroundRemover>) -> Self {
        self.background = Some(remover);
        self
    }

    pub fn text_recognizer(mut self, ocr: Arc<dyn TextRecognizer>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn social_lookup(mut self, social: Arc<dyn SocialProfileLookup>) -> Self {
        self.social = Some(social);
        self
    }

    pub fn image_store(mut self, store: Arc<dyn ImageStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> LogoCrawler {
        let cfg = self.config;
        let background = match self.background {
            Some(b) => Some(b),
            None if cfg.strip_background => {
                Some(Arc::new(LightBackdropRemover::default()) as Arc<dyn BackgroundRemover>)
            }
            None => None,
        };
        LogoCrawler {
            cache: TtlCache::new(Duration::from_secs(cfg.cache_ttl_secs), cfg.cache_capacity),
            permits: Semaphore::new(cfg.classifier_concurrency.max(1)),
            ranker: LogoRanker::new(cfg.weights),
            labeler: CandidateClassifier::new(cfg.brand.clone()),
            observer: self
                .observer
                .unwrap_or_else(|| Arc::new(TracingObserver::new())),
            fetcher: self.fetcher,
            classifier: self.classifier,
            reranker: self.reranker,
            svg: self.svg,
            background,
            ocr: self.ocr,
            social: self.social,
            store: self.store,
            config: cfg,
        }
    }
}

pub struct LogoCrawler {
    config: CrawlerConfig,
    fetcher: Arc<dyn PageFetcher>,
    classifier: Arc<dyn VisionClassifier>,
    observer: Arc<dyn CrawlObserver>,
    /// Vision verdicts by image hash; `None` (not a logo) is cached too.
    cache: TtlCache<CachedVerdict>,
    permits: Semaphore,
    ranker: LogoRanker,
    labeler: CandidateClassifier,
    reranker: Option<LlmReranker>,
    svg: Option<Arc<dyn SvgRasterizer>>,
    background: Option<Arc<dyn BackgroundRemover>>,
    ocr: Option<Arc<dyn TextRecognizer>>,
    social: Option<Arc<dyn SocialProfileLookup>>,
    store: Option<Arc<dyn ImageStore>>,
}

impl LogoCrawler {
    pub fn builder(
        config: CrawlerConfig,
        fetcher: Arc<dyn PageFetcher>,
        classifier: Arc<dyn VisionClassifier>,
    ) -> LogoCrawlerBuilder {
        LogoCrawlerBuilder {
            config,
            fetcher,
            classifier,
            observer: None,
            reranker: None,
            svg: None,
            background: None,
            ocr: None,
            social: None,
            store: None,
        }
    }

    /// HTTP fetcher plus the configured chat backend for classification (and rerank).
    pub fn from_config(config: CrawlerConfig) -> Result<Self> {
        let chat = build_chat_client(&config)?;
        let fetcher = HttpFetcher::new(
            Duration::from_secs(config.fetch_timeout_secs.max(1)),
            &config.user_agent,
        )?;
        let classifier = Arc::new(ChatVisionClassifier::new(chat.clone()));
        let rerank = config.llm_rerank;
        let timeout = Duration::from_secs(config.classifier_timeout_secs.max(1));

        let mut builder = Self::builder(config, Arc::new(fetcher), classifier);
        if rerank {
            builder = builder.reranker(LlmReranker::new(chat, timeout));
        }
        Ok(builder.build())
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    pub fn ranker(&self) -> &LogoRanker {
        &self.ranker
    }

    fn emit(&self, event: CrawlEvent) {
        self.observer.on_event(&event);
    }

    pub async fn crawl(&self, url: &str) -> Result<CrawlReport> {
        self.crawl_with(url, self.config.max_pages).await
    }

    /// Crawl from `url`, visiting at most `max_pages` pages (at least one).
    ///
    /// Only an unusable start URL is an error; every other failure degrades.
    pub async fn crawl_with(&self, url: &str, max_pages: usize) -> Result<CrawlReport> {
        let start = Url::parse(url.trim()).with_context(|| format!("invalid url {url:?}"))?;
        if !matches!(start.scheme(), "http" | "https") || start.host_str().is_none() {
            bail!("unsupported url {url:?}: expected an http(s) address");
        }
        let started = Instant::now();
        let max_pages = max_pages.max(1);
        self.emit(CrawlEvent::CrawlStarted {
            url: start.to_string(),
            max_pages,
        });

        let pages = self.visit(start.clone(), max_pages).await;

        let inventory: Vec<ImageObservation> = pages
            .iter()
            .flat_map(|(scan, _)| scan.observations.iter().cloned())
            .collect();

        let mut seen = HashSet::new();
        let mut discovered: Vec<DiscoveredImage> = Vec::new();
        for (scan, _) in &pages {
            for img in &scan.images {
                if seen.insert(img.image_url.clone()) {
                    self.emit(CrawlEvent::CandidateDiscovered {
                        image_url: img.image_url.clone(),
                        page_url: img.page_url.clone(),
                        is_header: img.is_header,
                    });
                    discovered.push(img.clone());
                }
            }
        }

        let signals = self.page_signals(&start, &pages).await;

        let results: Vec<(String, Result<LogoCandidate, Dropped>)> = stream::iter(discovered)
            .map(|d| {
                let signals = &signals;
                async move {
                    let url = d.image_url.clone();
                    (url, self.process(d, signals).await)
                }
            })
            .buffered(self.config.max_in_flight.max(1))
            .collect()
            .await;

        let mut hashes = HashSet::new();
        let mut kept = Vec::new();
        for (image_url, result) in results {
            let dropped = match result {
                Ok(c) if !hashes.insert(c.image_hash.clone()) => {
                    Dropped::because(DropReason::DuplicateImage, &c.image_hash)
                }
                Ok(c) if c.confidence() < self.config.confidence_threshold => {
                    Dropped::because(DropReason::BelowThreshold, c.confidence())
                }
                Ok(c) => {
                    kept.push(c);
                    continue;
                }
                Err(d) => d,
            };
            self.emit(CrawlEvent::CandidateDropped {
                image_url,
                reason: dropped.reason,
                detail: dropped.detail,
            });
        }

        // Barrier: the inventory is complete from here on.
        let visited: Vec<String> = pages.iter().map(|(scan, _)| scan.page_url.clone()).collect();
        let all_paths: Vec<String> = inventory.iter().map(|o| o.position.clone()).collect();
        for c in kept.iter_mut() {
            let structural = run_analyzer(SignalCategory::StructuralPosition, || {
                structural_position(&c.context, &all_paths)
            });
            self.apply(c, SignalCategory::StructuralPosition, structural);
            let consistency = run_analyzer(SignalCategory::MultiPageConsistency, || {
                multi_page_consistency(&c.image_url, &inventory, &visited)
            });
            self.apply(c, SignalCategory::MultiPageConsistency, consistency);
        }

        let mut logos = self.ranker.rank(kept);
        self.labeler.classify_all(&mut logos);

        if let Some(reranker) = &self.reranker {
            let outcome = reranker.rerank(logos).await;
            if let Some(reason) = outcome.fallback {
                self.emit(CrawlEvent::RerankFallback { reason });
            }
            logos = outcome.candidates;
        }

        self.emit(CrawlEvent::CrawlFinished {
            url: start.to_string(),
            pages: visited.len(),
            logos: logos.len(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        });

        Ok(CrawlReport {
            url: start.to_string(),
            pages: visited,
            logos,
        })
    }

    /// Breadth-first over same-host links. Returns each scanned page with its HTML.
    async fn visit(&self, start: Url, max_pages: usize) -> Vec<(PageScan, String)> {
        let mut queue = VecDeque::from([start.to_string()]);
        let mut visited: HashSet<String> = HashSet::new();
        let mut pages = Vec::new();

        while pages.len() < max_pages {
            let Some(next) = queue.pop_front() else { break };
            if !visited.insert(next.clone()) {
                continue;
            }
            let fetched = match self.fetcher.fetch(&next).await {
                Ok(f) => f,
                Err(e) => {
                    self.emit(CrawlEvent::PageFailed {
                        url: next,
                        error: format!("{e:#}"),
                    });
                    continue;
                }
            };
            if !fetched.is_html() {
                debug!(url = %next, content_type = ?fetched.content_type, "skipping non-html page");
                continue;
            }
            visited.insert(fetched.url.clone());

            let html = String::from_utf8_lossy(&fetched.body).into_owned();
            let scan = match scan_page(&fetched.url, &html) {
                Ok(s) => s,
                Err(e) => {
                    self.emit(CrawlEvent::PageFailed {
                        url: fetched.url,
                        error: format!("{e:#}"),
                    });
                    continue;
                }
            };
            self.emit(CrawlEvent::PageFetched {
                url: scan.page_url.clone(),
                images: scan.images.len(),
            });
            queue.extend(scan.links.iter().filter(|l| !visited.contains(*l)).cloned());
            pages.push((scan, html));
        }
        pages
    }

    async fn page_signals(&self, start: &Url, pages: &[(PageScan, String)]) -> PageSignals {
        let profile_match = match (&self.social, start.host_str()) {
            (Some(lookup), Some(host)) => match lookup.has_matching_profile(host).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(host, error = %format!("{e:#}"), "social profile lookup failed");
                    false
                }
            },
            _ => false,
        };
        let home = pages.first().map(|(_, html)| html.as_str());
        let social = run_analyzer(SignalCategory::SocialMedia, || {
            social_media(home, profile_match)
        });
        let schema = pages
            .iter()
            .map(|(scan, html)| {
                let scores = run_analyzer(SignalCategory::SchemaMarkup, || schema_markup(html));
                (scan.page_url.clone(), scores)
            })
            .collect();
        PageSignals { social, schema }
    }

    fn apply(&self, candidate: &mut LogoCandidate, category: SignalCategory, run: (SubScores, bool)) {
        let (scores, degraded) = run;
        if degraded {
            self.emit(CrawlEvent::AnalyzerDegraded {
                image_url: candidate.image_url.clone(),
                category,
                detail: "analyzer panicked".to_string(),
            });
        }
        candidate.insert_signal(category, scores);
    }

    async fn bytes_of(&self, d: &DiscoveredImage) -> Result<Vec<u8>, Dropped> {
        match &d.source {
            ImageSource::Remote => self
                .fetcher
                .fetch(&d.image_url)
                .await
                .map(|f| f.body)
                .map_err(|e| Dropped::because(DropReason::FetchFailed, format!("{e:#}"))),
            ImageSource::DataUri => decode_data_uri(&d.image_url)
                .map_err(|e| Dropped::because(DropReason::DecodeFailed, format!("{e:#}"))),
            ImageSource::InlineSvg(markup) => Ok(markup.clone().into_bytes()),
        }
    }

    /// Vision verdict for one processed image: cache, then a bounded, timed-out call.
    async fn verdict(
        &self,
        image_url: &str,
        hash: &str,
        png_base64: &str,
    ) -> Result<CachedVerdict, Dropped> {
        if let Some(cached) = self.cache.get(hash) {
            self.emit(CrawlEvent::CacheHit {
                image_url: image_url.to_string(),
            });
            return Ok(cached);
        }
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| Dropped::because(DropReason::ClassifierFailed, e))?;
        let limit = Duration::from_secs(self.config.classifier_timeout_secs.max(1));
        match tokio::time::timeout(limit, self.classifier.classify(png_base64)).await {
            Err(_) => Err(Dropped::because(
                DropReason::ClassifierTimeout,
                format!("no reply within {limit:?}"),
            )),
            Ok(Err(e)) => Err(Dropped::because(DropReason::ClassifierFailed, format!("{e:#}"))),
            Ok(Ok(verdict)) => {
                let fresh = CachedVerdict {
                    verdict,
                    at: Utc::now(),
                };
                self.cache.insert(hash, fresh.clone());
                Ok(fresh)
            }
        }
    }

    async fn process(&self, d: DiscoveredImage, signals: &PageSignals) -> Result<LogoCandidate, Dropped> {
        let bytes = self.bytes_of(&d).await?;

        let is_svg = matches!(d.source, ImageSource::InlineSvg(_)) || looks_like_svg(&bytes, &d.image_url);
        let decoded = if is_svg {
            let Some(rasterizer) = &self.svg else {
                return Err(Dropped::new(DropReason::UnsupportedSvg));
            };
            rasterizer.rasterize(&bytes)
        } else {
            decode_raster(&bytes)
        };
        let mut img = decoded.map_err(|e| Dropped::because(DropReason::DecodeFailed, format!("{e:#}")))?;

        if !meets_min_size(&img, self.config.min_width, self.config.min_height) {
            return Err(Dropped::because(
                DropReason::TooSmall,
                format!("{}x{}", img.width(), img.height()),
            ));
        }

        if let Some(remover) = &self.background {
            img = match remover.remove_background(img.clone()) {
                Ok(stripped) => stripped,
                Err(e) => {
                    warn!(image_url = %d.image_url, error = %format!("{e:#}"), "background removal failed; keeping original");
                    img
                }
            };
        }

        let hash = content_hash(&img);
        let (png, b64) = png_base64(&img).map_err(|e| Dropped::because(DropReason::DecodeFailed, format!("{e:#}")))?;

        let CachedVerdict { verdict, at } = self.verdict(&d.image_url, &hash, &b64).await?;
        let verdict = verdict.ok_or_else(|| Dropped::new(DropReason::NotALogo))?;

        let logo_text = match &self.ocr {
            Some(ocr) => ocr.recognize(&img.to_rgba8()).unwrap_or_else(|e| {
                warn!(image_url = %d.image_url, error = %format!("{e:#}"), "text recognition failed");
                None
            }),
            None => None,
        };

        let kind_hint = is_svg.then_some(ImageKind::Svg);
        let probed = probe(&bytes, kind_hint, img);

        let mut c = LogoCandidate::new(
            d.image_url.clone(),
            d.page_url.clone(),
            verdict.confidence,
            verdict.description,
            d.is_header,
        )
        .with_image_hash(hash.clone())
        .with_timestamp(at)
        .with_context(d.context);
        if let Some(text) = logo_text {
            c = c.with_logo_text(text);
        }
        self.emit(CrawlEvent::LogoDetected {
            image_url: c.image_url.clone(),
            confidence: c.confidence(),
        });

        let html = run_analyzer(SignalCategory::HtmlContext, || html_context(&c.context, &c.page_url));
        self.apply(&mut c, SignalCategory::HtmlContext, html);
        let tech = run_analyzer(SignalCategory::Technical, || technical(&c.image_url, Some(&probed)));
        self.apply(&mut c, SignalCategory::Technical, tech);
        let vis = run_analyzer(SignalCategory::Visual, || {
            visual(Some(&probed.thumbnail), c.logo_text.as_deref())
        });
        self.apply(&mut c, SignalCategory::Visual, vis);
        let url = run_analyzer(SignalCategory::UrlSemantics, || url_semantics(&c.image_url));
        self.apply(&mut c, SignalCategory::UrlSemantics, url);
        let meta = run_analyzer(SignalCategory::Metadata, || metadata(&probed.metadata));
        self.apply(&mut c, SignalCategory::Metadata, meta);
        self.apply(&mut c, SignalCategory::SocialMedia, signals.social.clone());
        if let Some(schema) = signals.schema.get(&c.page_url) {
            self.apply(&mut c, SignalCategory::SchemaMarkup, schema.clone());
        }

        c.traits = design_traits(
            Some(&probed),
            &c.context,
            &c.image_url,
            &c.description,
            &c.page_url,
        );

        if let Some(store) = &self.store {
            match store.store(&hash, &png).await {
                Ok(public) => c.stored_url = Some(public),
                Err(e) => warn!(image_url = %c.image_url, error = %format!("{e:#}"), "image store failed"),
            }
        }
        Ok(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::fetch::Fetched;
    use crate::observe::RecordingObserver;
    use async_trait::async_trait;
    use ::image::{DynamicImage, Rgba, RgbaImage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Site(HashMap<String, (Option<&'static str>, Vec<u8>)>);

    #[async_trait]
    impl PageFetcher for Site {
        async fn fetch(&self, url: &str) -> Result<Fetched> {
            let (ct, body) = self
                .0
                .get(url)
                .ok_or_else(|| anyhow::anyhow!("404 {url}"))?;
            Ok(Fetched {
                url: url.to_string(),
                content_type: ct.map(str::to_string),
                body: body.clone(),
            })
        }
    }

    /// Every image is a logo at 0.8; counts calls.
    #[derive(Default)]
    struct Always {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl VisionClassifier for Always {
        async fn classify(&self, _png: &str) -> Result<Option<VisionVerdict>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(VisionVerdict {
                confidence: 0.8,
                description: "a logo".into(),
            }))
        }
    }

    fn png(w: u32, h: u32, shade: u8) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba([shade, 20, 20, 255]));
        png_base64(&DynamicImage::ImageRgba8(img)).unwrap().0
    }

    fn config() -> CrawlerConfig {
        CrawlerConfig {
            api_key: "test".into(),
            ..Default::default()
        }
    }

    fn site(pages: &[(&str, &str)], images: &[(&str, Vec<u8>)]) -> Arc<Site> {
        let mut m = HashMap::new();
        for (u, html) in pages {
            m.insert(u.to_string(), (Some("text/html"), html.as_bytes().to_vec()));
        }
        for (u, bytes) in images {
            m.insert(u.to_string(), (Some("image/png"), bytes.clone()));
        }
        Arc::new(Site(m))
    }

    #[tokio::test]
    async fn rejects_non_http_start_url() {
        let crawler = LogoCrawler::builder(config(), site(&[], &[]), Arc::new(Always::default()))
            .observer(Arc::new(RecordingObserver::default()))
            .build();
        assert!(crawler.crawl("ftp://acme.com/").await.is_err());
        assert!(crawler.crawl("not a url").await.is_err());
    }

    #[tokio::test]
    async fn drops_small_svg_and_identical_pixels() {
        let html = r#"<html><body>
            <header><img src="/logo.png"></header>
            <img src="/tiny.png">
            <img src="/copy.png">
            <svg width="10" height="10"><rect/></svg>
        </body></html>"#;
        let fetcher = site(
            &[("https://acme.com/", html)],
            &[
                ("https://acme.com/logo.png", png(64, 64, 200)),
                ("https://acme.com/tiny.png", png(8, 8, 200)),
                ("https://acme.com/copy.png", png(64, 64, 200)),
            ],
        );
        let obs = Arc::new(RecordingObserver::default());
        let vision = Arc::new(Always::default());
        let cfg = CrawlerConfig {
            max_in_flight: 1,
            ..config()
        };
        let crawler = LogoCrawler::builder(cfg, fetcher, vision.clone())
            .observer(obs.clone())
            .build();

        let report = crawler.crawl("https://acme.com/").await.unwrap();
        assert_eq!(report.logos.len(), 1);
        assert_eq!(report.best().unwrap().image_url, "https://acme.com/logo.png");
        // second identical image hits the cache
        assert_eq!(vision.calls.load(Ordering::SeqCst), 1);

        let reasons: Vec<DropReason> = obs
            .events()
            .into_iter()
            .filter_map(|e| match e {
                CrawlEvent::CandidateDropped { reason, .. } => Some(reason),
                _ => None,
            })
            .collect();
        assert!(reasons.contains(&DropReason::TooSmall));
        assert!(reasons.contains(&DropReason::DuplicateImage));
        assert!(reasons.contains(&DropReason::UnsupportedSvg));
    }

    #[tokio::test]
    async fn every_category_is_scored() {
        let html = r#"<html><body><header><a href="/"><img class="logo" src="/logo.png"></a></header></body></html>"#;
        let fetcher = site(
            &[("https://acme.com/", html)],
            &[("https://acme.com/logo.png", png(120, 40, 10))],
        );
        let crawler = LogoCrawler::builder(config(), fetcher, Arc::new(Always::default()))
            .observer(Arc::new(RecordingObserver::default()))
            .build();
        let report = crawler.crawl("https://acme.com/").await.unwrap();
        let logo = report.best().unwrap();
        for cat in SignalCategory::ALL {
            assert!(logo.signal_scores.contains_key(&cat), "{cat}");
        }
        assert!(logo.is_header());
        assert!((0.0..=1.0).contains(&logo.rank_score()));
    }

    #[tokio::test]
    async fn cached_verdict_keeps_its_timestamp() {
        let html = r#"<html><body><header><img src="/logo.png"></header></body></html>"#;
        let fetcher = site(
            &[("https://acme.com/", html)],
            &[("https://acme.com/logo.png", png(64, 64, 90))],
        );
        let vision = Arc::new(Always::default());
        let crawler = LogoCrawler::builder(config(), fetcher, vision.clone())
            .observer(Arc::new(RecordingObserver::default()))
            .build();

        let first = crawler.crawl("https://acme.com/").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = crawler.crawl("https://acme.com/").await.unwrap();

        assert_eq!(vision.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            first.best().unwrap().timestamp,
            second.best().unwrap().timestamp
        );
    }
}
