//! Request shaping — converts an analysis request plus a validated image
//! into the wire payload the remote vision API expects.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::image::ImageSource;

/// Query used when `analyze_image` callers do not supply one.
pub const DEFAULT_QUERY: &str = "请描述这张图片的内容";

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One turn of conversation history. An ordered sequence of turns forms
/// the context of a contextual analysis; insertion order is preserved
/// end-to-end into the built payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

/// The two request shapes accepted by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisRequest {
    Simple {
        query: String,
    },
    Contextual {
        context: Vec<ConversationTurn>,
        query: String,
    },
}

/// One item of multimodal message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentPart {
    Text { text: String },
    Image { image: String },
}

/// A single message in the remote API's schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageInput {
    pub messages: Vec<WireMessage>,
}

/// The complete payload sent to the multimodal generation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionPayload {
    pub model: String,
    pub input: MessageInput,
}

/// Build the wire payload for a request against a validated image.
///
/// `Simple` produces a single user message carrying the query and the
/// image. `Contextual` emits the context turns in their supplied order,
/// then a final user message carrying the query and the image. Local
/// images are embedded as data URLs; remote URLs pass through unchanged.
pub fn build(request: &AnalysisRequest, image: &ImageSource, model: &str) -> Result<VisionPayload> {
    let image_reference = image.to_remote_reference()?;

    let mut messages = Vec::new();
    let query = match request {
        AnalysisRequest::Simple { query } => query,
        AnalysisRequest::Contextual { context, query } => {
            for turn in context {
                messages.push(WireMessage {
                    role: turn.role,
                    content: vec![ContentPart::Text {
                        text: turn.content.clone(),
                    }],
                });
            }
            query
        }
    };

    messages.push(WireMessage {
        role: Role::User,
        content: vec![
            ContentPart::Text {
                text: query.clone(),
            },
            ContentPart::Image {
                image: image_reference,
            },
        ],
    });

    Ok(VisionPayload {
        model: model.to_string(),
        input: MessageInput { messages },
    })
}
