// tests/common/mod.rs
//
// In-memory site and scripted vision classifier shared by the crawl tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use logo_scout::analyze::vision::parse_vision_reply;
use logo_scout::analyze::{VisionClassifier, VisionVerdict};
use logo_scout::crawl::fetch::{Fetched, PageFetcher};
use logo_scout::CrawlerConfig;

pub const RED: [u8; 4] = [220, 20, 20, 255];
pub const GREEN: [u8; 4] = [20, 180, 20, 255];
pub const BLUE: [u8; 4] = [20, 20, 220, 255];
pub const GRAY: [u8; 4] = [120, 120, 120, 255];
pub const BLACK: [u8; 4] = [0, 0, 0, 255];

pub fn png(w: u32, h: u32, color: [u8; 4]) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba(color)));
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode png");
    buf
}

#[derive(Default)]
pub struct FakeSite {
    pages: HashMap<String, (Option<String>, Vec<u8>)>,
}

impl FakeSite {
    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages
            .insert(url.into(), (Some("text/html; charset=utf-8".into()), html.as_bytes().to_vec()));
        self
    }

    pub fn image(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.pages.insert(url.into(), (Some("image/png".into()), bytes));
        self
    }
}

#[async_trait]
impl PageFetcher for FakeSite {
    async fn fetch(&self, url: &str) -> Result<Fetched> {
        let (content_type, body) = self
            .pages
            .get(url)
            .ok_or_else(|| anyhow!("404 Not Found: {url}"))?;
        Ok(Fetched {
            url: url.to_string(),
            content_type: content_type.clone(),
            body: body.clone(),
        })
    }
}

/// Answers by the color of the image's first pixel, in the model's loose text format.
///
/// red: the site wordmark; green: a partner badge; blue: `null`; gray: no number at all;
/// black: transport error. Anything else sleeps past every timeout.
pub struct ColorVision;

#[async_trait]
impl VisionClassifier for ColorVision {
    async fn classify(&self, png_base64: &str) -> Result<Option<VisionVerdict>> {
        let bytes = STANDARD.decode(png_base64)?;
        let px = image::load_from_memory(&bytes)?.to_rgba8().get_pixel(0, 0).0;
        let reply = match px {
            RED => "Confidence Score: 0.80\nDescription: ACME wordmark in red",
            GREEN => "0.85 - Get it on Google Play badge",
            BLUE => "null",
            GRAY => "this has no numbers",
            BLACK => return Err(anyhow!("connection reset")),
            _ => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "0.5"
            }
        };
        Ok(parse_vision_reply(Some(reply)))
    }
}

pub const HOME: &str = r#"<!doctype html>
<html><head><title>Acme</title>
<script type="application/ld+json">{"@type":"Organization","logo":"https://acme.com/assets/logo.png"}</script>
</head><body>
  <header class="site-header">
    <a href="/"><img src="/assets/logo.png" class="logo" alt="Acme" width="48" height="48"></a>
    <nav><a href="/about">About</a></nav>
  </header>
  <main>
    <h2>Available on</h2>
    <img src="/img/badge.png" alt="store badge">
    <img src="/img/photo.png" alt="team photo">
    <img src="/img/odd.png">
  </main>
</body></html>"#;

pub const ABOUT: &str = r#"<!doctype html>
<html><body>
  <header class="site-header">
    <a href="/"><img src="/assets/logo.png" class="logo" alt="Acme" width="48" height="48"></a>
    <nav><a href="/">Home</a></nav>
  </header>
  <main><p>About us</p></main>
</body></html>"#;

pub fn acme_site() -> FakeSite {
    FakeSite::default()
        .page("https://acme.com/", HOME)
        .page("https://acme.com/about", ABOUT)
        .image("https://acme.com/assets/logo.png", png(48, 48, RED))
        .image("https://acme.com/img/badge.png", png(96, 48, GREEN))
        .image("https://acme.com/img/photo.png", png(64, 64, BLUE))
        .image("https://acme.com/img/odd.png", png(40, 40, GRAY))
}

pub fn test_config() -> CrawlerConfig {
    CrawlerConfig {
        api_key: "test-key".into(),
        classifier_timeout_secs: 1,
        ..Default::default()
    }
}

pub fn fetcher(site: FakeSite) -> Arc<dyn PageFetcher> {
    Arc::new(site)
}
