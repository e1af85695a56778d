// src/config/crawler.rs
use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, str::FromStr};

use crate::analyze::CategoryWeights;

pub const DEFAULT_CRAWLER_CONFIG_PATH: &str = "config/crawler.toml";
pub const ENV_CRAWLER_CONFIG_PATH: &str = "CRAWLER_CONFIG_PATH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisionProvider {
    #[default]
    #[serde(alias = "open_ai")]
    OpenAi,
    Azure,
}

impl VisionProvider {
    pub fn key_env(self) -> &'static str {
        match self {
            VisionProvider::OpenAi => "OPENAI_API_KEY",
            VisionProvider::Azure => "AZURE_OPENAI_API_KEY",
        }
    }
}

impl FromStr for VisionProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "open_ai" => Ok(VisionProvider::OpenAi),
            "azure" => Ok(VisionProvider::Azure),
            other => bail!("Unsupported vision provider: {other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub provider: VisionProvider,
    /// "ENV" (or empty) means: read from OPENAI_API_KEY / AZURE_OPENAI_API_KEY (by provider)
    pub api_key: String,
    pub openai_model: String,
    pub azure_endpoint: Option<String>,
    pub azure_deployment: String,
    pub api_version: String,

    pub min_width: u32,
    pub min_height: u32,
    /// Candidates below this confidence are dropped; 0.0 keeps everything.
    pub confidence_threshold: f32,

    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,

    pub max_pages: usize,
    /// Candidates processed concurrently (fetch, decode, classify, analyze).
    pub max_in_flight: usize,
    /// Concurrent vision classifier calls.
    pub classifier_concurrency: usize,
    pub classifier_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,

    /// Expected company name for classification; defaults to the site name.
    pub brand: Option<String>,
    pub llm_rerank: bool,
    pub strip_background: bool,

    pub weights: CategoryWeights,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            provider: VisionProvider::OpenAi,
            api_key: "ENV".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            azure_endpoint: None,
            azure_deployment: "gpt-4o-mini".to_string(),
            api_version: "2024-02-15-preview".to_string(),
            min_width: 32,
            min_height: 32,
            confidence_threshold: 0.0,
            cache_ttl_secs: 86_400,
            cache_capacity: 1024,
            max_pages: 10,
            max_in_flight: 8,
            classifier_concurrency: 4,
            classifier_timeout_secs: 30,
            fetch_timeout_secs: 30,
            user_agent: concat!("logo-scout/", env!("CARGO_PKG_VERSION")).to_string(),
            brand: None,
            llm_rerank: false,
            strip_background: false,
            weights: CategoryWeights::default(),
        }
    }
}

/// Parse an env var if it is set and non-empty.
fn env_parse<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("invalid {name}={v}: {e}")),
        _ => Ok(None),
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl CrawlerConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading crawler config {}", path.display()))?;
        let mut cfg: CrawlerConfig = toml::from_str(&data)
            .with_context(|| format!("parsing crawler config {}", path.display()))?;
        cfg.apply_env()?;
        Ok(cfg)
    }

    /// `$CRAWLER_CONFIG_PATH` or `config/crawler.toml` when present, else defaults;
    /// env overrides applied on top either way.
    pub fn from_env() -> anyhow::Result<Self> {
        let path = env::var(ENV_CRAWLER_CONFIG_PATH)
            .unwrap_or_else(|_| DEFAULT_CRAWLER_CONFIG_PATH.to_string());
        if Path::new(&path).exists() {
            return Self::load_from_file(path);
        }
        let mut cfg = Self::default();
        cfg.apply_env()?;
        Ok(cfg)
    }

    /// Apply env overrides and resolve the `"ENV"` api key placeholder.
    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Some(p) = env_parse::<VisionProvider>("VISION_PROVIDER")? {
            self.provider = p;
        }
        if let Some(v) = env_string("AZURE_OPENAI_ENDPOINT") {
            self.azure_endpoint = Some(v);
        }
        if let Some(v) = env_string("AZURE_OPENAI_DEPLOYMENT") {
            self.azure_deployment = v;
        }
        if let Some(v) = env_string("AZURE_API_VERSION") {
            self.api_version = v;
        }
        if let Some(v) = env_parse("MIN_IMAGE_WIDTH")? {
            self.min_width = v;
        }
        if let Some(v) = env_parse("MIN_IMAGE_HEIGHT")? {
            self.min_height = v;
        }
        if let Some(v) = env_parse("CONFIDENCE_THRESHOLD")? {
            self.confidence_threshold = v;
        }
        if let Some(v) = env_parse("CACHE_TTL_SECS")? {
            self.cache_ttl_secs = v;
        }
        if let Some(v) = env_parse("MAX_PAGES")? {
            self.max_pages = v;
        }
        if let Some(v) = env_string("BRAND_NAME") {
            self.brand = Some(v);
        }

        // Resolve api key if "ENV"
        if self.api_key.trim().is_empty() || self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = env_string(self.provider.key_env()).unwrap_or_default();
        }
        Ok(())
    }

    /// Start-up checks. Missing classifier credentials are the one fatal condition.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_key.trim().is_empty() {
            bail!("Missing {} env var (or api_key in config)", self.provider.key_env());
        }
        if self.provider == VisionProvider::Azure && self.azure_endpoint.is_none() {
            bail!("Missing AZURE_OPENAI_ENDPOINT for the azure provider");
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            bail!(
                "confidence_threshold must be within [0,1], got {}",
                self.confidence_threshold
            );
        }
        if self.max_pages == 0 {
            bail!("max_pages must be at least 1");
        }
        self.weights.validate()?;
        Ok(())
    }

    pub fn validated(self) -> anyhow::Result<Self> {
        self.validate()?;
        Ok(self)
    }
}
