mod client;
mod server;

use anyhow::{Context, Result};
use clap::Parser;
use client::BridgeClient;
use rmcp::service::serve_server;
use rmcp::transport::stdio;
use server::GatewayServer;

#[derive(Parser, Debug)]
#[command(name = "scenebridge-gateway")]
#[command(about = "MCP gateway translating tool calls into scenebridge bridge requests")]
struct Cli {
    /// Bridge host to connect to
    #[arg(long)]
    host: Option<String>,

    /// Bridge port to connect to
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout is reserved exclusively for JSON-RPC frames; all logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let file_config = scenebridge_config::load_gateway_config_default()
        .context("failed to read gateway config file")?;

    let host = cli.host.unwrap_or_else(|| "127.0.0.1".to_string());
    let port = cli
        .port
        .or(file_config.mcp_service.default_port)
        .unwrap_or(scenebridge_config::BridgeConfig::DEFAULT_PORT);

    eprintln!("scenebridge-gateway: connecting to bridge at {host}:{port}");

    let client = BridgeClient::new(host, port);
    let gateway = GatewayServer::new(client);

    let transport = stdio();
    let running_service = serve_server(gateway, transport)
        .await
        .context("failed to start MCP stdio transport")?;

    tokio::signal::ctrl_c().await.ok();
    let _ = running_service.cancel().await;

    Ok(())
}
