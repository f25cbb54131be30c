//! Tool registration and dispatch.

use serde_json::Value;

use crate::state::ServerState;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::{
    analyze_image, analyze_image_from_context, check_image_file, list_supported_image_formats,
};

pub struct ToolRegistry;

impl ToolRegistry {
    pub fn list_tools() -> Vec<ToolDefinition> {
        vec![
            analyze_image::definition(),
            analyze_image_from_context::definition(),
            check_image_file::definition(),
            list_supported_image_formats::definition(),
        ]
    }

    pub async fn call(
        name: &str,
        arguments: Option<Value>,
        state: &ServerState,
    ) -> McpResult<ToolCallResult> {
        let args = arguments.unwrap_or(Value::Object(serde_json::Map::new()));

        match name {
            "analyze_image" => analyze_image::execute(args, state).await,
            "analyze_image_from_context" => analyze_image_from_context::execute(args, state).await,
            "check_image_file" => check_image_file::execute(args, state).await,
            "list_supported_image_formats" => {
                list_supported_image_formats::execute(args, state).await
            }
            _ => Err(McpError::ToolNotFound(name.to_string())),
        }
    }
}
