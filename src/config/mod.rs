// src/config/mod.rs
pub mod crawler;

pub use crawler::{CrawlerConfig, VisionProvider, DEFAULT_CRAWLER_CONFIG_PATH, ENV_CRAWLER_CONFIG_PATH};
