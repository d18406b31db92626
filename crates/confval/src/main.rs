//! confval - typed configuration inspection tool

use anyhow::{Context, Result};
use clap::Parser;
use outbound::{BufferedSend, Outbound};
use std::env;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    if let Err(e) = dotenv::dotenv() {
        // Only warn if the error is not "file not found"
        if !e.to_string().contains("No such file or directory") {
            warn!("Could not load .env file: {}", e);
        }
    }

    let cli = Cli::parse();
    init_logging()?;

    let output = match cli.command {
        Commands::Get {
            file,
            key,
            type_tag,
            reveal,
        } => {
            let configuration = commands::load_configuration(&file)?;
            let mut text = commands::get(&configuration, &key, &type_tag, reveal)?;
            text.push('\n');
            text
        }
        Commands::Render { file, schema } => {
            let configuration = commands::load_configuration(&file)?;
            info!(path = %file.display(), entries = configuration.len(), "Rendering configuration");
            commands::render_all(&configuration, &schema)?
        }
        Commands::Plugins { dir, extension } => commands::plugins(&dir, &extension)?,
    };

    print(output).await.context("Failed to write output")
}

/// Write command output to stdout as a single buffered send
async fn print(text: String) -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    BufferedSend::new(text).write_to(&mut stdout).await?;
    stdout.flush().await
}

/// Initialize logging based on environment variables.
///
/// Log lines go to stderr so command output stays parseable.
fn init_logging() -> Result<()> {
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format.as_str() {
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()
                .context("Failed to initialize pretty logging")?;
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
                .context("Failed to initialize JSON logging")?;
        }
    }

    info!(level = %log_level, format = %log_format, "Logging initialized");
    Ok(())
}
