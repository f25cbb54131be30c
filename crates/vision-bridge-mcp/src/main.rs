//! VisionBridge MCP Server — entry point.

use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use vision_bridge_mcp::config::load_config;
use vision_bridge_mcp::protocol::ProtocolHandler;
use vision_bridge_mcp::state::ServerState;
use vision_bridge_mcp::tools::ToolRegistry;
use vision_bridge_mcp::transport::StdioTransport;

#[derive(Parser)]
#[command(
    name = "vision-bridge-mcp",
    about = "MCP server for VisionBridge — lets text-only LLMs delegate image understanding to a remote vision model",
    version
)]
struct Cli {
    /// Vision model name (default: qwen-vl-plus, or VISION_MODEL env var).
    #[arg(short, long)]
    model: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve {
        /// Vision model name.
        #[arg(short, long)]
        model: Option<String>,

        /// Log level (trace, debug, info, warn, error).
        #[arg(long)]
        log_level: Option<String>,
    },

    /// Print server capabilities as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   vision-bridge-mcp completions bash > ~/.local/share/bash-completion/completions/vision-bridge-mcp
    ///   vision-bridge-mcp completions zsh > ~/.zfunc/_vision-bridge-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },

    /// Launch interactive REPL mode.
    Repl,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve {
        model: None,
        log_level: None,
    }) {
        Commands::Serve {
            model,
            log_level: _,
        } => {
            let effective_model = model.or(cli.model);
            let config = load_config(effective_model.as_deref())?;
            tracing::info!("VisionBridge MCP server, model {}", config.model);
            let state = Arc::new(ServerState::from_config(&config));
            let handler = ProtocolHandler::new(state);
            let transport = StdioTransport::new(handler);
            transport.run().await?;
        }

        Commands::Info => {
            let capabilities = vision_bridge_mcp::types::InitializeResult::default_result();
            let tools = ToolRegistry::list_tools();
            let info = serde_json::json!({
                "server": capabilities.server_info,
                "protocol_version": capabilities.protocol_version,
                "capabilities": capabilities.capabilities,
                "tools": tools.iter().map(|t| &t.name).collect::<Vec<_>>(),
                "tool_count": tools.len(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(
                shell,
                &mut cmd,
                "vision-bridge-mcp",
                &mut std::io::stdout(),
            );
        }

        Commands::Repl => {
            vision_bridge_mcp::repl::run()?;
        }
    }

    Ok(())
}
