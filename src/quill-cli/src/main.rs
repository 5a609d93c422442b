//! Quill CLI - Main entry point.
//!
//! Renders a markdown file (or stdin) to stdout, then runs any captured
//! snippet blocks that were requested with `--run` or `--run-all`.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use quill_cli::{Cli, init_logging, run};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    let summary = run(&cli)?;
    tracing::debug!(?summary, "done");

    if summary.failures > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
