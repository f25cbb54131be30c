//! Tool: check_image_file — validate an image reference without calling
//! the remote model.

use serde::Deserialize;
use serde_json::{json, Value};

use vision_bridge::{image, ImageCheck};

use crate::state::ServerState;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct CheckParams {
    image_path: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "check_image_file".to_string(),
        description: Some(
            "Check that an image reference exists and satisfies the format/size policy"
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "image_path": {
                    "type": "string",
                    "description": "Local file path or http(s) URL of the image"
                }
            },
            "required": ["image_path"]
        }),
    }
}

pub async fn execute(args: Value, _state: &ServerState) -> McpResult<ToolCallResult> {
    let params: CheckParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let envelope = match image::check(&params.image_path) {
        Ok(ImageCheck::Remote) => json!({
            "success": true,
            "image_path": params.image_path,
            "type": "url",
        }),
        Ok(ImageCheck::Local { size, format }) => json!({
            "success": true,
            "image_path": params.image_path,
            "size": size,
            "format": format,
        }),
        Err(e) => json!({ "success": false, "error": e.to_string() }),
    };

    Ok(ToolCallResult::json(&envelope))
}
