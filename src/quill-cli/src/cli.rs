//! Command-line arguments.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use quill_render::{RenderConfig, THEME_NAMES};

/// Default read size when streaming input.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Render markdown to the terminal and run captured snippets.
#[derive(Debug, Clone, Parser)]
#[command(name = "quill", version, about, long_about = None)]
pub struct Cli {
    /// Markdown file to render (reads stdin when omitted)
    pub file: Option<PathBuf>,

    /// Disable ANSI styling
    #[arg(long, conflicts_with = "color")]
    pub no_color: bool,

    /// Force ANSI styling, even when NO_COLOR is set
    #[arg(long)]
    pub color: bool,

    /// Do not capture executable code blocks
    #[arg(long)]
    pub no_exec: bool,

    /// Output width in columns
    #[arg(long, value_name = "N")]
    pub width: Option<usize>,

    /// Color theme
    #[arg(long, value_name = "NAME", value_parser = clap::builder::PossibleValuesParser::new(THEME_NAMES))]
    pub theme: Option<String>,

    /// TOML configuration file
    #[arg(long, value_name = "PATH", env = "QUILL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run a captured block after rendering (repeatable)
    #[arg(long = "run", value_name = "ID")]
    pub run: Vec<u64>,

    /// Run every captured block after rendering
    #[arg(long)]
    pub run_all: bool,

    /// Snippet timeout in milliseconds
    #[arg(long, value_name = "N")]
    pub timeout_ms: Option<u64>,

    /// Bytes read per chunk
    #[arg(long, value_name = "N", default_value_t = DEFAULT_CHUNK_SIZE, value_parser = parse_chunk_size)]
    pub chunk_size: usize,

    /// Print the captured blocks after rendering
    #[arg(long)]
    pub list_blocks: bool,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

fn parse_chunk_size(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("chunk size must be at least 1".to_string()),
        Ok(size) => Ok(size),
        Err(e) => Err(e.to_string()),
    }
}

impl Cli {
    /// Builds the renderer config: file (or defaults), then flag overrides.
    pub fn render_config(&self) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => RenderConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => RenderConfig::default(),
        };

        if self.no_color {
            config.use_color = false;
        } else if self.color {
            config.use_color = true;
        }
        if self.no_exec {
            config.enable_code_execution = false;
        }
        if let Some(width) = self.width {
            config.width = Some(width);
        }
        if let Some(theme) = &self.theme {
            config.theme = theme.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }

        config.validate().context("Invalid options")?;
        Ok(config)
    }

    /// Whether any block should run after rendering.
    pub fn wants_runs(&self) -> bool {
        self.run_all || !self.run.is_empty()
    }
}
