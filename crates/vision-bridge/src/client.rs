//! Remote vision-model invocation — a trait seam for test doubles plus the
//! DashScope Qwen-VL HTTP client.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::VisionConfig;
use crate::error::{Result, VisionError};
use crate::request::VisionPayload;

const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com";
const GENERATION_PATH: &str = "/api/v1/services/aigc/multimodal-generation/generation";

/// Fallback when the remote error payload carries no usable message.
const UNKNOWN_REMOTE_ERROR: &str = "unknown remote error";

/// Result of a successful analysis call.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Textual analysis produced by the remote model.
    pub text: String,
    /// Model identifier the call was issued with.
    pub model: String,
}

/// Backend performing the actual visual reasoning.
///
/// Tool handlers depend on `Arc<dyn VisionBackend>` so tests can replace
/// the remote service with a recording or failing double.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Single best-effort attempt; no retries, no backoff. Dropping the
    /// returned future abandons the outstanding network request.
    async fn invoke(&self, payload: VisionPayload) -> Result<Analysis>;
}

/// HTTP client for the DashScope multimodal generation endpoint.
pub struct QwenVlClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl QwenVlClient {
    pub fn new(config: &VisionConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

#[async_trait]
impl VisionBackend for QwenVlClient {
    async fn invoke(&self, payload: VisionPayload) -> Result<Analysis> {
        let model = payload.model.clone();
        tracing::debug!(model = %model, "Sending request to vision endpoint");

        let url = format!("{}{}", self.base_url, GENERATION_PATH);
        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(&body);
            tracing::error!("Vision endpoint returned status {status}: {message}");
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return Err(VisionError::Auth(message));
            }
            return Err(VisionError::Remote(format!(
                "status {}: {message}",
                status.as_u16()
            )));
        }

        let body = response.text().await.map_err(classify_send_error)?;
        let parsed: GenerationResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse vision response: {e}\nBody: {body}");
            VisionError::Remote(format!("unparseable response: {e}"))
        })?;

        let text = parsed
            .output
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content.into_text())
            .ok_or_else(|| {
                VisionError::Remote("response contained no analysis text".to_string())
            })?;

        tracing::info!(model = %model, "Vision analysis complete");
        Ok(Analysis { text, model })
    }
}

/// Map a network-level `reqwest` failure onto the transport error class.
fn classify_send_error(e: reqwest::Error) -> VisionError {
    if e.is_timeout() {
        VisionError::Transport(format!("request timed out: {e}"))
    } else if e.is_connect() {
        VisionError::Transport(format!("connection failed: {e}"))
    } else {
        VisionError::Transport(e.to_string())
    }
}

/// Normalize the remote error body into a single message string.
///
/// DashScope error payloads carry `message` and `code`; probe those in
/// order and fall back to a fixed string for anything unrecognizable.
fn extract_error_message(body: &str) -> String {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return UNKNOWN_REMOTE_ERROR.to_string(),
    };

    for key in ["message", "code"] {
        if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
            if !text.is_empty() {
                return text.to_string();
            }
        }
    }

    UNKNOWN_REMOTE_ERROR.to_string()
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    output: GenerationOutput,
}

#[derive(Debug, Deserialize)]
struct GenerationOutput {
    #[serde(default)]
    choices: Vec<GenerationChoice>,
}

#[derive(Debug, Deserialize)]
struct GenerationChoice {
    message: AnswerMessage,
}

#[derive(Debug, Deserialize)]
struct AnswerMessage {
    content: AnswerContent,
}

/// Qwen-VL answers arrive as a list of `{text}` parts; plain-text models
/// return a bare string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnswerContent {
    Text(String),
    Parts(Vec<AnswerPart>),
}

#[derive(Debug, Deserialize)]
struct AnswerPart {
    #[serde(default)]
    text: Option<String>,
}

impl AnswerContent {
    fn into_text(self) -> Option<String> {
        let text = match self {
            AnswerContent::Text(text) => text,
            AnswerContent::Parts(parts) => parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("\n"),
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
