mod commands;
mod completions;
mod edit;
pub mod exit_codes;
pub mod output;

pub use commands::Cli;
pub use edit::{apply_intent, parse_script, EditIntent};

use anyhow::Result;

pub fn run(cli: Cli) -> Result<()> {
    commands::execute(cli)
}
