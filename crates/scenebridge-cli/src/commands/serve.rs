use anyhow::{Context, Result};
use scenebridge_config::load_bridge_config;
use scenebridge_runtime::bridge::BridgeServer;
use scenebridge_runtime::host::InMemoryHost;
use tracing_subscriber::EnvFilter;

pub async fn execute(port_override: Option<u16>) -> Result<()> {
    let mut config = load_bridge_config().context("failed to read bridge configuration")?;
    if let Some(port) = port_override {
        config.port = port;
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.as_tracing_directive()))
        .init();

    println!("Starting scenebridge server...");
    println!("  Port: {}", config.port);
    println!("  Log level: {:?}", config.log_level);
    println!();

    let server = BridgeServer::bind(config.port, Box::new(InMemoryHost::new()))
        .await
        .with_context(|| format!("failed to bind 127.0.0.1:{}", config.port))?;

    println!("Listening on 127.0.0.1:{}", server.port());

    server.serve().await.context("server error")?;

    Ok(())
}
