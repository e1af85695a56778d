// src/analyze/chat.rs
//! Chat-completions transport shared by the vision classifier and the reranker.
//!
//! One client, two endpoint flavours: OpenAI (bearer auth, model in the body)
//! and Azure OpenAI (api-key header, deployment in the path, api-version query).

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::{CrawlerConfig, VisionProvider};

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// One chat message; `content` is either a string or an array of content parts.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: Value,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: Value::String(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: Value::String(text.into()),
        }
    }

    /// User turn with a prompt and a PNG passed inline as a `data:` URL.
    pub fn user_with_png(text: impl Into<String>, png_base64: &str) -> Self {
        Self {
            role: "user".into(),
            content: json!([
                { "type": "text", "text": text.into() },
                {
                    "type": "image_url",
                    "image_url": { "url": format!("data:image/png;base64,{png_base64}") }
                }
            ]),
        }
    }
}

/// A chat-completions backend.
///
/// `Ok(None)` means the reply did not carry `choices[0].message.content`
/// (a contract violation, not a transport error).
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<Option<String>>;
    fn name(&self) -> &'static str;
}

/// Endpoint and auth construction; everything else is shared by `ChatClient`.
pub trait ChatEndpoint: Send + Sync + 'static {
    fn url(&self) -> String;
    fn authorize(&self, req: RequestBuilder) -> RequestBuilder;
    /// Model name sent in the body (Azure encodes it in the deployment path).
    fn model(&self) -> Option<&str>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone)]
pub struct OpenAiEndpoint {
    pub api_key: String,
    pub model: String,
}

impl ChatEndpoint for OpenAiEndpoint {
    fn url(&self) -> String {
        OPENAI_CHAT_URL.to_string()
    }
    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(&self.api_key)
    }
    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }
    fn name(&self) -> &'static str {
        "openai"
    }
}

#[derive(Debug, Clone)]
pub struct AzureEndpoint {
    pub api_key: String,
    /// e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,
    pub deployment: String,
    pub api_version: String,
}

impl ChatEndpoint for AzureEndpoint {
    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("api-key", &self.api_key)
    }
    fn model(&self) -> Option<&str> {
        None
    }
    fn name(&self) -> &'static str {
        "azure"
    }
}

/// `reqwest`-backed chat client for any `ChatEndpoint`.
pub struct ChatClient<E: ChatEndpoint> {
    http: reqwest::Client,
    endpoint: E,
}

impl<E: ChatEndpoint> ChatClient<E> {
    pub fn new(endpoint: E, timeout: Duration, user_agent: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()
            .context("building chat http client")?;
        Ok(Self { http, endpoint })
    }

    pub fn request_body(&self, messages: &[ChatMessage], max_tokens: u32) -> Value {
        let mut body = json!({ "messages": messages, "max_tokens": max_tokens });
        if let Some(model) = self.endpoint.model() {
            body["model"] = Value::String(model.to_string());
        }
        body
    }
}

/// `choices[0].message.content` as a non-empty string.
pub fn first_choice_content(body: &Value) -> Option<String> {
    body.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

#[async_trait]
impl<E: ChatEndpoint> ChatCompletion for ChatClient<E> {
    async fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<Option<String>> {
        let req = self
            .endpoint
            .authorize(self.http.post(self.endpoint.url()))
            .json(&self.request_body(messages, max_tokens));

        let resp = req
            .send()
            .await
            .with_context(|| format!("{} chat request", self.endpoint.name()))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("{} chat api error ({status}): {text}", self.endpoint.name());
        }
        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("decoding {} chat response", self.endpoint.name()))?;
        Ok(first_choice_content(&body))
    }

    fn name(&self) -> &'static str {
        self.endpoint.name()
    }
}

/// Build the configured backend. Credentials must already be resolved (see `CrawlerConfig::validate`).
pub fn build_chat_client(cfg: &CrawlerConfig) -> Result<Arc<dyn ChatCompletion>> {
    let timeout = Duration::from_secs(cfg.classifier_timeout_secs.max(1));
    match cfg.provider {
        VisionProvider::OpenAi => {
            let endpoint = OpenAiEndpoint {
                api_key: cfg.api_key.clone(),
                model: cfg.openai_model.clone(),
            };
            Ok(Arc::new(ChatClient::new(endpoint, timeout, &cfg.user_agent)?))
        }
        VisionProvider::Azure => {
            let endpoint = AzureEndpoint {
                api_key: cfg.api_key.clone(),
                endpoint: cfg
                    .azure_endpoint
                    .clone()
                    .ok_or_else(|| anyhow!("azure provider needs azure_endpoint"))?,
                deployment: cfg.azure_deployment.clone(),
                api_version: cfg.api_version.clone(),
            };
            Ok(Arc::new(ChatClient::new(endpoint, timeout, &cfg.user_agent)?))
        }
    }
}
