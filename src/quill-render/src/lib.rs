//! # Quill Render
//!
//! Streaming markdown rendering for terminal-like sinks.
//!
//! Text arrives in arbitrary fragments; every completed line is classified,
//! styled and handed to a [`Sink`] immediately. Fenced blocks tagged with an
//! executable language are captured and can be run later through a
//! [`quill_snippet::SnippetExecutor`], with their output rendered inline.
//!
//! ## Components
//!
//! - **Symbols / Math**: Unicode approximations of math commands, scripts
//!   and fractions.
//! - **Inline**: single-pass lexer for bold, italic, code, links,
//!   strikethrough and math.
//! - **Table**: grid layout under a width budget with a vertical-list
//!   fallback.
//! - **Renderer**: the streaming state machine and captured-block API.
//!
//! ```text
//! chunk ─► line reassembly ─► classify ─┬─► inline ────────┐
//!                                       ├─► table buffer ──┼─► sink
//!                                       └─► code buffer ───┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use quill_render::render_document;
//!
//! let text = render_document("# Hello\n\n| a | b |\n|---|---|\n| 1 | 2 |\n", false);
//! print!("{text}");
//! ```

pub mod ansi;
pub mod config;
pub mod document;
pub mod error;
pub mod inline;
pub mod math;
pub mod renderer;
pub mod sink;
pub mod symbols;
pub mod table;
pub mod theme;

pub use config::{FALLBACK_WIDTH, MIN_WIDTH, RenderConfig, color_allowed};
pub use document::render_document;
pub use error::{ConfigError, RenderError, Result};
pub use inline::{Inline, format_inline, parse_inline, plain_inline};
pub use math::format_math;
pub use renderer::{
    CapturedBlock, MAX_BLANK_RUN, Mode, OpenBlock, RenderSession, StreamRenderer, TableBuffer,
};
pub use sink::{Sink, WriterSink};
pub use table::TableStrategy;
pub use theme::{MarkdownTheme, THEME_NAMES};
