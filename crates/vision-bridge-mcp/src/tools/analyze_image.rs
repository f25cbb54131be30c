//! Tool: analyze_image — describe a single image with the remote vision model.

use serde::Deserialize;
use serde_json::{json, Value};

use vision_bridge::{image, request, AnalysisRequest, DEFAULT_QUERY};

use crate::state::ServerState;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct AnalyzeParams {
    image_path: String,
    #[serde(default)]
    query: Option<String>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "analyze_image".to_string(),
        description: Some(
            "Analyze an image (local path or URL) with the remote vision model".to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "image_path": {
                    "type": "string",
                    "description": "Local file path or http(s) URL of the image"
                },
                "query": {
                    "type": "string",
                    "description": "Question to ask about the image"
                }
            },
            "required": ["image_path"]
        }),
    }
}

pub async fn execute(args: Value, state: &ServerState) -> McpResult<ToolCallResult> {
    let params: AnalyzeParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let query = params.query.unwrap_or_else(|| DEFAULT_QUERY.to_string());
    tracing::info!(image_path = %params.image_path, "analyze_image");

    let envelope = match analyze(&params.image_path, query, state).await {
        Ok(value) => value,
        Err(e) => json!({ "success": false, "error": e.to_string() }),
    };

    Ok(ToolCallResult::json(&envelope))
}

async fn analyze(
    image_path: &str,
    query: String,
    state: &ServerState,
) -> vision_bridge::Result<Value> {
    let source = image::resolve(image_path)?;
    let payload = request::build(&AnalysisRequest::Simple { query }, &source, &state.model)?;
    let analysis = state.backend.invoke(payload).await?;

    Ok(json!({
        "success": true,
        "result": analysis.text,
        "image_path": image_path,
        "model": analysis.model,
    }))
}
