//! Quill CLI library.
//!
//! - `cli` - argument parsing and config overrides
//! - `logging` - subscriber setup
//! - `app` - streaming input through the renderer and running blocks

pub mod app;
pub mod cli;
pub mod logging;

pub use app::{RunSummary, describe_block, render_stream, run, select_blocks};
pub use cli::{Cli, DEFAULT_CHUNK_SIZE};
pub use logging::{filter_directive, init_logging};
