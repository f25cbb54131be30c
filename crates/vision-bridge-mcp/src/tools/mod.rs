//! MCP tool implementations.

pub mod analyze_image;
pub mod analyze_image_from_context;
pub mod check_image_file;
pub mod list_supported_image_formats;
pub mod registry;

pub use registry::ToolRegistry;
