use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use capture_core::config::PluginConfig;
use capture_core::ScreenCapturePlugin;

mod channel;
mod oneshot;

#[cfg(test)]
mod test_support;

#[derive(Parser, Debug)]
#[command(name = "screen-capture")]
#[command(about = "Host harness for the screen region capture plugin")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(long, env = "SCREEN_CAPTURE_CONFIG_PATH", global = true)]
    config_path: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "SCREEN_CAPTURE_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Capture one screen region and print a summary
    Capture {
        /// Left edge in virtual-screen coordinates
        #[arg(long, allow_negative_numbers = true)]
        x: i32,
        /// Top edge in virtual-screen coordinates
        #[arg(long, allow_negative_numbers = true)]
        y: i32,
        #[arg(long, allow_negative_numbers = true)]
        width: i32,
        #[arg(long, allow_negative_numbers = true)]
        height: i32,
        /// Write the raw BGRX buffer to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Answer method calls read as JSON lines from stdin
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config_path.unwrap_or_else(PluginConfig::default_path);
    let config = PluginConfig::load_or_default(&config_path)?;

    // Initialize logging; stdout carries responses, so logs go to stderr
    let level = cli.log_level.as_deref().unwrap_or(config.log_level.as_str());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!(
        "screen-capture v{} starting (os={}, arch={})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH,
    );

    let plugin = ScreenCapturePlugin::from_platform(&config)
        .context("failed to initialize screen capture backend")?;

    match cli.command {
        Commands::Capture {
            x,
            y,
            width,
            height,
            output,
        } => {
            let summary = oneshot::run_capture(&plugin, x, y, width, height, output.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Commands::Serve => {
            info!("serving channel {} on stdio", config.channel_name);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            channel::serve(Arc::new(plugin), stdin, tokio::io::stdout()).await
        }
    }
}
