use anyhow::Result;
use clap::Parser;
use reward_ranker::cli::{self, Cli};
use reward_ranker::config::AppConfig;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reward_ranker=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = AppConfig::load()?;
    cli::run(cli, &cfg)
}
