//! Product Search MCP Server
//!
//! A Model Context Protocol (MCP) server exposing product search tools
//! backed by the Search API.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use product_search_mcp::config::Config;
use product_search_mcp::mcp::http;
use product_search_mcp::mcp::server::McpServer;
use product_search_mcp::search::auth::TokenProvider;
use product_search_mcp::search::client::SearchGateway;

/// Product Search MCP Server
#[derive(Parser)]
#[command(name = "search-mcp-server")]
#[command(author, version, about = "Product Search MCP Server - A Model Context Protocol server for product search")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Transport to serve MCP on
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    transport: Transport,

    /// HTTP bind host (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// HTTP bind port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// HTTP path for MCP messages (overrides MESSAGE_PATH)
    #[arg(long)]
    message_path: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one token to verify the configured credentials
    CheckAuth,
}

#[derive(Clone, Copy, ValueEnum)]
enum Transport {
    Stdio,
    Http,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging; stdout belongs to the stdio transport
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(message_path) = cli.message_path {
        config.message_path = message_path;
    }

    let tokens = Arc::new(TokenProvider::from_config(&config));

    match cli.command {
        Some(Commands::CheckAuth) => {
            tokens
                .get_token(&config.client_id)
                .await
                .context("auth service check failed")?;
            eprintln!("Auth service verified successfully");
            Ok(())
        }
        None => run_server(config, tokens, cli.transport).await,
    }
}

async fn run_server(config: Config, tokens: Arc<TokenProvider>, transport: Transport) -> anyhow::Result<()> {
    tracing::info!("Server starting up");

    // Prefetch a token so the first search is fast; failure is not fatal
    match tokens.get_token(&config.client_id).await {
        Ok(_) => tracing::info!("Auth service verified successfully"),
        Err(e) => tracing::warn!("Auth service check failed: {}", e),
    }

    let gateway = Arc::new(SearchGateway::from_config(&config, tokens));
    let server = Arc::new(McpServer::new(gateway, &config));

    match transport {
        Transport::Stdio => server.run_stdio().await?,
        Transport::Http => http::serve(server, &config.bind_addr(), &config.message_path).await?,
    }

    tracing::info!("Server shutting down");
    Ok(())
}
