// src/crawl/fetch.rs
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

/// Upper bound on one page or image body.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Fetched {
    /// Final URL after redirects.
    pub url: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Fetched {
    /// No content type counts as HTML (lenient servers, test fakes).
    pub fn is_html(&self) -> bool {
        match self.content_type.as_deref() {
            None => true,
            Some(ct) => ct.to_ascii_lowercase().contains("html"),
        }
    }
}

/// Fetches pages and images. The HTTP implementation is `HttpFetcher`;
/// tests plug in in-memory sites.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Fetched>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()
            .context("building http fetcher")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Fetched> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;

        if resp
            .content_length()
            .is_some_and(|n| n as usize > MAX_BODY_BYTES)
        {
            bail!("{url}: body larger than {MAX_BODY_BYTES} bytes");
        }
        let final_url = resp.url().to_string();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp
            .bytes()
            .await
            .with_context(|| format!("reading body of {url}"))?;
        if body.len() > MAX_BODY_BYTES {
            bail!("{url}: body larger than {MAX_BODY_BYTES} bytes");
        }
        Ok(Fetched {
            url: final_url,
            content_type,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_detection_is_lenient() {
        let mut f = Fetched {
            url: "https://a.com/".into(),
            content_type: None,
            body: Vec::new(),
        };
        assert!(f.is_html());
        f.content_type = Some("text/HTML; charset=utf-8".into());
        assert!(f.is_html());
        f.content_type = Some("application/pdf".into());
        assert!(!f.is_html());
    }
}
