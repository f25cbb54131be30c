//! VisionBridge MCP Server — lets text-only LLMs delegate image
//! understanding to a remote vision model.

pub mod config;
pub mod protocol;
pub mod repl;
pub mod state;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::load_config;
pub use protocol::ProtocolHandler;
pub use state::ServerState;
pub use transport::StdioTransport;
