use clap::Parser;
use std::path::PathBuf;

/// Looked up in the working directory when `--config` is not given. Optional.
pub const DEFAULT_CONFIG_FILE: &str = "asibar.yaml";

#[derive(Parser, Debug)]
#[command(
    name = "asibar",
    version,
    about = "Post Turkey's second-dose vaccination progress to Twitter"
)]
pub struct Cli {
    #[arg(
        long,
        env = "ASIBAR_CONFIG",
        help = "YAML config file (must exist when given)"
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long,
        default_value_t = false,
        help = "Scrape and print the post instead of publishing it"
    )]
    pub dry_run: bool,
}
