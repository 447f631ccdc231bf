//! ML Builder - Main Entry Point
//!
//! Pipeline server and offline runner.

use clap::Parser;
use ml_builder::cli::{cmd_profile, cmd_run, cmd_serve, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ml_builder=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port, host, upload_dir, models_dir }) => {
            cmd_serve(host, port, upload_dir, models_dir).await?;
        }
        Some(Commands::Run { dataset, steps, upload_dir, models_dir, json }) => {
            // Training is CPU-bound; keep it off the async workers
            tokio::task::spawn_blocking(move || cmd_run(&dataset, &steps, upload_dir, models_dir, json))
                .await??;
        }
        Some(Commands::Profile { data }) => {
            cmd_profile(&data)?;
        }
        None => {
            cmd_serve(None, None, None, None).await?;
        }
    }

    Ok(())
}
