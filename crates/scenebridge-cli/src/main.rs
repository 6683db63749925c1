mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "scenebridge")]
#[command(about = "Remote command-and-control bridge for an embedded 3D-content host", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge's framed TCP server
    Serve {
        /// Override the port from BLD_REMOTE_MCP_PORT / the default
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            commands::serve::execute(port).await?;
        }
    }

    Ok(())
}
