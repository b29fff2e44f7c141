use anyhow::{Context, Result};
use asibar_common::observability::{LogConfig, filter_for_level, init_logging};
use asibar_config::{AppConfig, AsibarConfigLoader};
use clap::Parser;
use cli::{Cli, DEFAULT_CONFIG_FILE};
use run::{RunOutcome, run_once};
use wiring::{build_fetcher, build_publisher};
mod cli;
mod run;
mod wiring;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Config: file, then ASIBAR__* env, then the legacy variables.
    let loader = match &cli.config {
        Some(path) => AsibarConfigLoader::new().with_file(path, true),
        None => AsibarConfigLoader::new().with_file(DEFAULT_CONFIG_FILE, false),
    };
    let cfg: AppConfig = loader.load().context("loading configuration")?;

    // 2) Logging from the loaded config; RUST_LOG still wins.
    let log_file = init_logging(LogConfig {
        app_name: "asibar",
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: true,
        format: cfg.logging.format,
        default_filter: filter_for_level(cfg.logging.level).to_string(),
    })?;
    tracing::debug!(?log_file, config = ?cfg, "asibar.starting");

    // 3) Credentials are only needed when something will actually be posted.
    cfg.validate(!cli.dry_run).context("invalid configuration")?;

    let publisher = build_publisher(&cfg, cli.dry_run)?;
    let fetcher = build_fetcher(&cfg)?;

    match run_once(&fetcher, &publisher).await? {
        RunOutcome::Posted { receipt, .. } => {
            tracing::info!(id = %receipt.id, "Posted progress")
        }
        RunOutcome::PostFailed { .. } => tracing::warn!("Run finished without a post"),
    }
    Ok(())
}
