//! Streaming Renderer - Line-at-a-time markdown rendering into a sink.
//!
//! `StreamRenderer` accepts arbitrary fragments of a document, reassembles
//! complete lines, classifies each one and writes its styled rendering to a
//! [`Sink`] before returning. Nothing is ever returned as text.
//!
//! # Architecture
//!
//! - [`RenderSession`] holds the buffered partial line, the current mode
//!   (normal, code block or table), the blank-line counter and the captured
//!   blocks.
//! - Classification lives in `classify`, line construction in `handlers`,
//!   and tables are laid out by [`crate::table`] once the table closes.
//!
//! # Example
//!
//! ```rust,ignore
//! use quill_render::{RenderConfig, StreamRenderer};
//!
//! let mut renderer = StreamRenderer::with_sink(RenderConfig::default(), String::new());
//! renderer.write("# Hel")?;
//! renderer.write("lo\n```lua\n1+1\n```\n")?;
//! renderer.flush()?;
//! let output = renderer.into_sink();
//! ```

mod classify;
mod handlers;
mod state;


use std::io::Stdout;

use quill_snippet::{ExecutionResult, SnippetExecutor};
use ratatui::text::Line;
use tracing::debug;

use crate::ansi::line_to_string;
use crate::config::RenderConfig;
use crate::error::Result;
use crate::sink::{Sink, WriterSink};
use crate::table::{Table, parse_alignments, render_table, split_row, table_budget};
use crate::theme::MarkdownTheme;

use self::classify::{Block, classify, fence_tag};
pub use self::state::{CapturedBlock, Mode, OpenBlock, RenderSession, TableBuffer};

/// Longest run of blank lines emitted.
pub const MAX_BLANK_RUN: usize = 2;

/// Streaming markdown renderer writing to a sink.
pub struct StreamRenderer<S: Sink = WriterSink<Stdout>> {
    config: RenderConfig,
    theme: MarkdownTheme,
    width: usize,
    session: RenderSession,
    sink: S,
}

impl<S: Sink> std::fmt::Debug for StreamRenderer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamRenderer")
            .field("config", &self.config)
            .field("width", &self.width)
            .field("mode", &self.session.mode.name())
            .field("blocks", &self.session.blocks.len())
            .finish()
    }
}

impl StreamRenderer {
    /// Creates a renderer writing to stdout.
    pub fn new(config: RenderConfig) -> Self {
        Self::with_sink(config, WriterSink::stdout())
    }
}

impl<S: Sink> StreamRenderer<S> {
    /// Creates a renderer writing to `sink`.
    ///
    /// The width is resolved once, here.
    pub fn with_sink(config: RenderConfig, sink: S) -> Self {
        let theme = MarkdownTheme::from_name(&config.theme);
        let width = config.resolved_width();
        Self {
            config,
            theme,
            width,
            session: RenderSession::new(),
            sink,
        }
    }

    /// Replaces the theme resolved from the config.
    #[must_use]
    pub fn with_theme(mut self, theme: MarkdownTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn theme(&self) -> &MarkdownTheme {
        &self.theme
    }

    /// Output width in columns.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn session(&self) -> &RenderSession {
        &self.session
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    // ============================================================
    // Streaming
    // ============================================================

    /// Buffers a fragment and renders every line it completes.
    pub fn write(&mut self, chunk: &str) -> Result<()> {
        self.session.push_str(chunk);
        self.drain_lines()
    }

    /// Like [`write`](Self::write) for raw bytes.
    ///
    /// A UTF-8 sequence split across calls is held until it completes.
    pub fn write_bytes(&mut self, chunk: &[u8]) -> Result<()> {
        self.session.push_bytes(chunk);
        self.drain_lines()
    }

    /// Renders the partial last line and closes any open table or code block.
    ///
    /// Calling it again without new input emits nothing.
    pub fn flush(&mut self) -> Result<()> {
        self.session.drain_pending_bytes();
        if let Some(line) = self.session.take_partial() {
            self.process_line(&line)?;
        }
        match self.session.mode {
            Mode::Table => self.close_table(),
            Mode::CodeBlock(_) => self.close_code_block(),
            Mode::Normal => Ok(()),
        }
    }

    /// Drops buffered input and returns to normal mode without emitting.
    ///
    /// Captured blocks stay available.
    pub fn reset(&mut self) {
        self.session.reset();
    }

    fn drain_lines(&mut self) -> Result<()> {
        while let Some(line) = self.session.next_line() {
            self.process_line(&line)?;
        }
        Ok(())
    }

    fn process_line(&mut self, line: &str) -> Result<()> {
        if let Mode::CodeBlock(block) = &mut self.session.mode {
            if fence_tag(line).is_some() {
                return self.close_code_block();
            }
            block.body.push_str(line);
            block.body.push('\n');
            self.session.blank_run = 0;
            return self.emit(handlers::code_body(line, &self.theme));
        }

        let kind = classify(line);
        if self.session.mode == Mode::Table {
            match kind {
                Block::Separator => {
                    if self.session.table.alignments.is_empty() {
                        self.session.table.alignments = parse_alignments(line);
                    }
                    return Ok(());
                }
                Block::Fence(_) | Block::Blank => self.close_table()?,
                _ if line.contains('|') => {
                    self.session.table.rows.push(line.to_string());
                    return Ok(());
                }
                _ => self.close_table()?,
            }
        }
        self.render_block(kind, line)
    }

    fn render_block(&mut self, kind: Block<'_>, line: &str) -> Result<()> {
        if kind != Block::Blank {
            self.session.blank_run = 0;
        }
        let theme = &self.theme;
        let rendered = match kind {
            Block::Fence(tag) => return self.open_code_block(tag),
            Block::Separator => {
                self.session.mode = Mode::Table;
                self.session.table.alignments = parse_alignments(line);
                return Ok(());
            }
            Block::PipeRow => {
                self.session.mode = Mode::Table;
                self.session.table.rows.push(line.to_string());
                return Ok(());
            }
            Block::Blank => {
                self.session.blank_run += 1;
                if self.session.blank_run > MAX_BLANK_RUN {
                    return Ok(());
                }
                Line::default()
            }
            Block::Header { level, text } => handlers::header_line(level, text, theme),
            Block::Rule => handlers::rule_line(theme),
            Block::Blockquote { depth, text } => handlers::blockquote_line(depth, text, theme),
            Block::Task {
                indent,
                checked,
                text,
            } => handlers::task_line(indent, checked, text, theme),
            Block::Unordered { indent, text } => handlers::bullet_line(indent, text, theme),
            Block::Ordered {
                indent,
                marker,
                text,
            } => handlers::ordered_line(indent, marker, text, theme),
            Block::Paragraph(text) => handlers::paragraph_line(text, theme),
        };
        self.emit(rendered)
    }

    // ============================================================
    // Code blocks
    // ============================================================

    fn open_code_block(&mut self, tag: Option<&str>) -> Result<()> {
        let id = match tag {
            Some(tag) if self.config.enable_code_execution && self.config.is_executable_tag(tag) => {
                Some(self.session.reserve_id())
            }
            _ => None,
        };
        let header = handlers::code_header(tag, id, &self.theme);
        self.session.mode = Mode::CodeBlock(OpenBlock {
            tag: tag.map(str::to_string),
            id,
            body: String::new(),
        });
        self.emit(header)
    }

    /// Emits the footer and captures the block when it has an id and a body.
    fn close_code_block(&mut self) -> Result<()> {
        let Mode::CodeBlock(block) = std::mem::take(&mut self.session.mode) else {
            return Ok(());
        };
        self.emit(handlers::code_footer(&self.theme))?;

        let Some(id) = block.id else {
            return Ok(());
        };
        let source = block.body.trim();
        if source.is_empty() {
            return Ok(());
        }
        let tag = block.tag.unwrap_or_default();
        debug!(id, tag = %tag, bytes = source.len(), "captured code block");
        self.session.blocks.push(CapturedBlock {
            id,
            tag,
            source: source.to_string(),
            result: None,
        });
        self.emit(handlers::run_affordance(id, &self.theme))
    }

    // ============================================================
    // Tables
    // ============================================================

    fn close_table(&mut self) -> Result<()> {
        self.session.mode = Mode::Normal;
        let buffer = std::mem::take(&mut self.session.table);
        if buffer.is_empty() {
            return Ok(());
        }
        let rows: Vec<Vec<String>> = buffer.rows.iter().map(|r| split_row(r)).collect();
        let table = Table::from_rows(&rows, &buffer.alignments, &self.theme);
        let budget = table_budget(self.width);
        let (lines, strategy) = render_table(&table, budget, &self.theme);
        debug!(
            rows = table.rows.len(),
            columns = table.num_columns(),
            budget,
            strategy = strategy.as_str(),
            "rendered table"
        );
        self.session.blank_run = 0;
        for line in lines {
            self.emit(line)?;
        }
        Ok(())
    }

    // ============================================================
    // Captured blocks
    // ============================================================

    /// Captured blocks in id order.
    pub fn list_blocks(&self) -> &[CapturedBlock] {
        &self.session.blocks
    }

    pub fn get_block(&self, id: u64) -> Option<&CapturedBlock> {
        self.session.blocks.iter().find(|b| b.id == id)
    }

    /// Forgets all captured blocks. Ids are still never reused.
    pub fn clear_blocks(&mut self) {
        self.session.blocks.clear();
    }

    /// Runs a captured block and renders its output.
    ///
    /// The result replaces any earlier one stored on the block. Returns
    /// `Ok(None)`, emitting nothing, when no block has this id.
    pub fn run_block(
        &mut self,
        id: u64,
        executor: &SnippetExecutor,
    ) -> Result<Option<ExecutionResult>> {
        let Some(source) = self.get_block(id).map(|b| b.source.clone()) else {
            debug!(id, "run requested for unknown block");
            return Ok(None);
        };
        let result = executor.run(&source);
        if let Some(block) = self.session.block_mut(id) {
            block.result = Some(result.clone());
        }
        for line in handlers::execution_lines(&result, &self.theme) {
            self.emit(line)?;
        }
        Ok(Some(result))
    }

    // ============================================================
    // Emission
    // ============================================================

    /// Delivers one line, newline-terminated, in a single append.
    fn emit(&mut self, line: Line<'static>) -> Result<()> {
        let mut text = line_to_string(&line, self.config.use_color);
        text.push('\n');
        self.sink.append(&text)?;
        Ok(())
    }
}
