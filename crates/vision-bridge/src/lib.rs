//! VisionBridge core — image reference validation, request shaping, and
//! remote vision-model invocation.

pub mod client;
pub mod config;
pub mod error;
pub mod image;
pub mod request;

pub use client::{Analysis, QwenVlClient, VisionBackend};
pub use config::VisionConfig;
pub use error::{Result, VisionError};
pub use image::{ImageCheck, ImageSource};
pub use request::{AnalysisRequest, ConversationTurn, Role, VisionPayload, DEFAULT_QUERY};
