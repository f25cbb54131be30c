//! Tool: analyze_image_from_context — analyze an image with conversation
//! history carried into the request.

use serde::Deserialize;
use serde_json::{json, Value};

use vision_bridge::{image, request, AnalysisRequest, ConversationTurn};

use crate::state::ServerState;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct ContextParams {
    context: Vec<ConversationTurn>,
    image_path: String,
    query: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "analyze_image_from_context".to_string(),
        description: Some(
            "Analyze an image with prior conversation turns as context".to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "context": {
                    "type": "array",
                    "description": "Ordered conversation turns",
                    "items": {
                        "type": "object",
                        "properties": {
                            "role": {
                                "type": "string",
                                "enum": ["user", "assistant", "system"]
                            },
                            "content": { "type": "string" }
                        },
                        "required": ["role", "content"]
                    }
                },
                "image_path": {
                    "type": "string",
                    "description": "Local file path or http(s) URL of the image"
                },
                "query": {
                    "type": "string",
                    "description": "Question to ask about the image"
                }
            },
            "required": ["context", "image_path", "query"]
        }),
    }
}

pub async fn execute(args: Value, state: &ServerState) -> McpResult<ToolCallResult> {
    let params: ContextParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    tracing::info!(
        image_path = %params.image_path,
        turns = params.context.len(),
        "analyze_image_from_context"
    );

    let envelope = match analyze(&params, state).await {
        Ok(value) => value,
        Err(e) => json!({ "success": false, "error": e.to_string() }),
    };

    Ok(ToolCallResult::json(&envelope))
}

async fn analyze(params: &ContextParams, state: &ServerState) -> vision_bridge::Result<Value> {
    let source = image::resolve(&params.image_path)?;
    let payload = request::build(
        &AnalysisRequest::Contextual {
            context: params.context.clone(),
            query: params.query.clone(),
        },
        &source,
        &state.model,
    )?;
    let analysis = state.backend.invoke(payload).await?;

    Ok(json!({
        "success": true,
        "result": analysis.text,
        "image_path": params.image_path,
        "model": analysis.model,
    }))
}
