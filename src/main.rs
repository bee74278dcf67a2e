use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatehouse::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatehouse=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => commands::init().await,
        Commands::Serve { host, port } => commands::serve(&host, port).await,
        Commands::HashPassword { password } => commands::hash_password(&password).await,
        Commands::Users { format } => commands::users(format).await,
    }
}
