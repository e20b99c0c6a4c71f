use anyhow::Result;
use clap::Parser;
use parroter::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing for the CLI.
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("parroter completed successfully"),
        Err(e) => tracing::error!(error = %e, "parroter exited with error"),
    }
    result
}
