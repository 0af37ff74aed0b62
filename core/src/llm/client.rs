use crate::{GridmindError, Result};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Model used when a request does not name one.
pub const DEFAULT_MODEL: &str = "mistralai/devstral-small:free";

/// Instruction sent with every completion request. The model is told to emit
/// nothing but the cell-map object itself.
const SYSTEM_INSTRUCTION: &str = "You are a spreadsheet assistant. \
    Output only a JSON object where keys are cell coordinates \
    (like c1r1 for column 1 row 1), and values are cell contents. \
    Example: {\"c1r1\": \"Math\", \"c1r2\": \"Science\"}. \
    Do not include explanations or markdown formatting. Just valid JSON.";

const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Configuration for LlmClient loaded from environment variables
#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    pub base_url: String, // e.g., https://openrouter.ai/api/v1
    pub api_key: String,
    pub request_timeout_ms: u64,
    /// Sent as the HTTP-Referer attribution header when present.
    pub http_referer: Option<String>,
    /// Sent as the X-Title attribution header.
    pub app_title: String,
}

impl LlmClientConfig {
    /// Reads the configuration from environment variables.
    ///
    /// Fails when OPENROUTER_API_KEY is unset or blank, so a misconfigured
    /// process refuses to start instead of failing on its first request.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                GridmindError::Config(format!("{API_KEY_ENV} environment variable is not set"))
            })?;

        Ok(Self {
            base_url: std::env::var("OPENROUTER_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "https://openrouter.ai/api/v1".to_string()),
            api_key,
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30_000),
            http_referer: std::env::var("GRIDMIND_HTTP_REFERER")
                .ok()
                .filter(|s| !s.is_empty()),
            app_title: "Gridmind".to_string(),
        })
    }
}

/// HTTP client for the OpenRouter chat-completions endpoint
#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    cfg: LlmClientConfig,
}

impl LlmClient {
    pub fn new(cfg: LlmClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .map_err(|e| GridmindError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, cfg })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(LlmClientConfig::from_env()?)
    }

    /// Requests a cell-map completion and returns the raw assistant text.
    ///
    /// Contract:
    /// - Input: user prompt + model identifier
    /// - Output: trimmed text of the first completion choice
    /// - Error: auth (401), upstream status, network, or missing content;
    ///   nothing is retried
    ///
    /// Parsing the text into a cell map is the caller's concern.
    pub async fn complete(&self, prompt: &str, model: &str) -> Result<String> {
        let url = format!(
            "{}/chat/completions",
            self.cfg.base_url.trim_end_matches('/')
        );
        debug!(target: "llm_client", %model, %prompt, "POST {} via Chat Completions", url);

        let body = json!({
            "model": model,
            "messages": [
                { "role": "system", "content": SYSTEM_INSTRUCTION },
                { "role": "user", "content": prompt },
            ],
        });

        let mut req = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .header("X-Title", &self.cfg.app_title)
            .bearer_auth(&self.cfg.api_key);
        if let Some(referer) = &self.cfg.http_referer {
            req = req.header("HTTP-Referer", referer);
        }

        let resp = req.json(&body).send().await.map_err(|e| {
            warn!(target: "llm_client", error = %e, "Chat Completions request failed");
            GridmindError::Network(e)
        })?;

        // A 401 is a credential problem, not a transient upstream failure;
        // keep it distinguishable from the generic status branch.
        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(GridmindError::AuthFailed);
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(target: "llm_client", %status, body = %body, "Chat Completions error");
            return Err(GridmindError::UpstreamStatus { status, body });
        }

        let val: Value = resp.json().await.map_err(|e| {
            warn!(target: "llm_client", error = %e, "Failed to parse Chat Completions JSON");
            GridmindError::MalformedResponse
        })?;
        let text = extract_message_content(&val).ok_or(GridmindError::MalformedResponse)?;
        debug!(target: "llm_client", content = %text, "Model raw response");
        Ok(text.trim().to_string())
    }
}

fn extract_message_content(v: &Value) -> Option<String> {
    v.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(|s| s.to_string())
}
