//! Shared server state handed to every tool invocation.

use std::sync::Arc;

use vision_bridge::{QwenVlClient, VisionBackend, VisionConfig};

/// Immutable state shared across tool calls. The backend is behind an
/// `Arc<dyn _>` so tests can substitute a recording implementation.
pub struct ServerState {
    pub backend: Arc<dyn VisionBackend>,
    pub model: String,
}

impl ServerState {
    pub fn from_config(config: &VisionConfig) -> Self {
        Self {
            backend: Arc::new(QwenVlClient::new(config)),
            model: config.model.clone(),
        }
    }

    pub fn with_backend(backend: Arc<dyn VisionBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }
}
