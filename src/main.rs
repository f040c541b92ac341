use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod display;
mod engine;
mod models;
mod prober;
mod utils;

use crate::cli::Cli;
use crate::config::MonitorConfig;
use crate::display::TerminalRenderer;
use crate::engine::Monitor;
use crate::prober::HostProber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    utils::setup_console();

    // stdout belongs to the status table
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::default().add_directive(Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .init();

    let config = MonitorConfig::from_args(cli.args).context("Invalid host list")?;
    let prober = HostProber::detect(config.probe_timeout);

    Monitor::new(config, prober, TerminalRenderer::stdout()).run().await;
    Ok(())
}
