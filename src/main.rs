use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use qtree::cli::{self, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose; logs always go to stderr
    let default_level = if cli.verbose { "debug" } else { "warn" };
    Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    cli::run(cli)
}
