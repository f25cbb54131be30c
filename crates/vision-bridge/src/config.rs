//! Process-wide configuration, fixed at startup.

use std::time::Duration;

use crate::error::{Result, VisionError};

/// Model used when no override is configured.
pub const DEFAULT_MODEL: &str = "qwen-vl-plus";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the remote vision backend.
///
/// Constructed once at process start and passed by reference into the
/// client — there is no hidden global state.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// Bearer credential for the remote service.
    pub api_key: String,
    /// Model name sent with every request.
    pub model: String,
    /// Base URL override; `None` uses the provider default.
    pub endpoint: Option<String>,
    /// Upper bound on a single remote call.
    pub timeout: Duration,
}

impl VisionConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read configuration from the environment.
    ///
    /// `DASHSCOPE_API_KEY` is required; `VISION_MODEL`, `VISION_ENDPOINT`,
    /// and `VISION_TIMEOUT_SECS` are optional overrides.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("DASHSCOPE_API_KEY").map_err(|_| {
            VisionError::Auth("DASHSCOPE_API_KEY environment variable is not set".to_string())
        })?;

        let mut config = Self::new(api_key);

        if let Ok(model) = std::env::var("VISION_MODEL") {
            if !model.is_empty() {
                config.model = model;
            }
        }
        if let Ok(endpoint) = std::env::var("VISION_ENDPOINT") {
            if !endpoint.is_empty() {
                config.endpoint = Some(endpoint);
            }
        }
        if let Some(secs) = std::env::var("VISION_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
