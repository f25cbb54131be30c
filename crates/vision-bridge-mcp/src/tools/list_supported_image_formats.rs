//! Tool: list_supported_image_formats — report the static format/size policy.

use serde_json::{json, Value};

use vision_bridge::image;

use crate::state::ServerState;
use crate::types::{McpResult, ToolCallResult, ToolDefinition};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "list_supported_image_formats".to_string(),
        description: Some("List supported image formats and the maximum file size".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
    }
}

pub async fn execute(_args: Value, _state: &ServerState) -> McpResult<ToolCallResult> {
    let (formats, max_size_mb) = image::format_policy();
    Ok(ToolCallResult::json(&json!({
        "success": true,
        "formats": formats,
        "max_size_mb": max_size_mb,
    })))
}
