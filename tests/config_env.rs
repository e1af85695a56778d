// tests/config_env.rs
//
// Crawler configuration: TOML file + env overrides + validation.
// Env-mutating tests run serially.

use std::io::Write;

use serial_test::serial;

use logo_scout::config::{VisionProvider, ENV_CRAWLER_CONFIG_PATH};
use logo_scout::CrawlerConfig;

const ENV_KEYS: &[&str] = &[
    ENV_CRAWLER_CONFIG_PATH,
    "OPENAI_API_KEY",
    "AZURE_OPENAI_API_KEY",
    "AZURE_OPENAI_ENDPOINT",
    "VISION_PROVIDER",
    "MAX_PAGES",
    "CONFIDENCE_THRESHOLD",
    "BRAND_NAME",
];

fn clear_env() {
    for k in ENV_KEYS {
        std::env::remove_var(k);
    }
}

fn write_toml(body: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().expect("tempfile");
    f.write_all(body.as_bytes()).expect("write config");
    f
}

#[test]
#[serial]
fn file_values_then_env_overrides() {
    clear_env();
    let f = write_toml(
        r#"
api_key = "ENV"
max_pages = 3
min_width = 64
brand = "Acme"

[weights]
html_context = 0.25
structural_position = 0.05
"#,
    );
    std::env::set_var("OPENAI_API_KEY", "sk-from-env");
    std::env::set_var("MAX_PAGES", "7");

    let cfg = CrawlerConfig::load_from_file(f.path()).expect("load");
    assert_eq!(cfg.api_key, "sk-from-env");
    assert_eq!(cfg.max_pages, 7);
    assert_eq!(cfg.min_width, 64);
    assert_eq!(cfg.min_height, 32);
    assert_eq!(cfg.brand.as_deref(), Some("Acme"));
    assert!((cfg.weights.html_context - 0.25).abs() < 1e-6);
    assert!(cfg.validate().is_ok());
    clear_env();
}

#[test]
#[serial]
fn from_env_reads_path_variable() {
    clear_env();
    let f = write_toml("provider = \"azure\"\napi_key = \"literal-key\"\n");
    std::env::set_var(ENV_CRAWLER_CONFIG_PATH, f.path());

    let cfg = CrawlerConfig::from_env().expect("from_env");
    assert_eq!(cfg.provider, VisionProvider::Azure);
    assert_eq!(cfg.api_key, "literal-key");
    // azure without an endpoint is a start-up error
    assert!(cfg.clone().validated().is_err());

    std::env::set_var("AZURE_OPENAI_ENDPOINT", "https://res.openai.azure.com");
    let cfg = CrawlerConfig::from_env().expect("from_env");
    assert!(cfg.validated().is_ok());
    clear_env();
}

#[test]
#[serial]
fn missing_key_is_fatal() {
    clear_env();
    std::env::set_var(ENV_CRAWLER_CONFIG_PATH, "/nonexistent/crawler.toml");
    let cfg = CrawlerConfig::from_env().expect("defaults");
    assert!(cfg.api_key.is_empty());
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("OPENAI_API_KEY"));
    clear_env();
}

#[test]
#[serial]
fn bad_env_values_are_reported() {
    clear_env();
    std::env::set_var(ENV_CRAWLER_CONFIG_PATH, "/nonexistent/crawler.toml");
    std::env::set_var("CONFIDENCE_THRESHOLD", "high");
    assert!(CrawlerConfig::from_env().is_err());
    std::env::set_var("CONFIDENCE_THRESHOLD", "0.4");
    std::env::set_var("VISION_PROVIDER", "openai");
    std::env::set_var("OPENAI_API_KEY", "k");
    let cfg = CrawlerConfig::from_env().unwrap();
    assert!((cfg.confidence_threshold - 0.4).abs() < 1e-6);
    clear_env();
}

#[test]
fn shipped_config_file_parses_and_validates_weights() {
    let cfg = CrawlerConfig::load_from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/config/crawler.toml"))
        .expect("shipped config");
    assert!(cfg.weights.validate().is_ok());
}
