//! Streams input through the renderer and runs requested blocks.

use std::fs::File;
use std::io::{self, ErrorKind, Read, Write};

use anyhow::{Context, Result};
use quill_render::{CapturedBlock, Sink, StreamRenderer};
use quill_snippet::SnippetExecutor;
use tracing::{debug, warn};

use crate::cli::Cli;

/// What happened during one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub blocks: usize,
    pub runs: usize,
    pub failures: usize,
}

/// Runs the CLI against stdout.
pub fn run(cli: &Cli) -> Result<RunSummary> {
    let config = cli.render_config()?;
    let timeout_ms = config.timeout_ms;
    let mut renderer = StreamRenderer::new(config);

    match &cli.file {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            render_stream(file, &mut renderer, cli.chunk_size)?;
        }
        None => render_stream(io::stdin().lock(), &mut renderer, cli.chunk_size)?,
    }

    if cli.list_blocks {
        let mut stdout = io::stdout().lock();
        for block in renderer.list_blocks() {
            writeln!(stdout, "{}", describe_block(block))?;
        }
    }

    let ids = select_blocks(&cli.run, cli.run_all, renderer.list_blocks());
    let executor = SnippetExecutor::new().with_timeout_ms(timeout_ms);
    let mut summary = RunSummary {
        blocks: renderer.list_blocks().len(),
        ..RunSummary::default()
    };
    for id in ids {
        match renderer.run_block(id, &executor)? {
            Some(result) => {
                summary.runs += 1;
                if !result.success {
                    summary.failures += 1;
                }
            }
            None => {
                warn!(id, "no captured block with this id");
                eprintln!("quill: no captured block #{id}");
            }
        }
    }
    Ok(summary)
}

/// Feeds `reader` to the renderer in chunks of `chunk_size` bytes, then flushes.
pub fn render_stream<R: Read, S: Sink>(
    mut reader: R,
    renderer: &mut StreamRenderer<S>,
    chunk_size: usize,
) -> Result<()> {
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut total = 0usize;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("Failed to read input"),
        };
        total += n;
        renderer.write_bytes(&buf[..n])?;
    }
    renderer.flush()?;
    debug!(bytes = total, blocks = renderer.list_blocks().len(), "input rendered");
    Ok(())
}

/// Ids to run, in order, without duplicates.
///
/// `--run-all` runs every captured block; explicit ids are kept even when
/// unknown so they can be reported.
pub fn select_blocks(requested: &[u64], run_all: bool, blocks: &[CapturedBlock]) -> Vec<u64> {
    let mut ids: Vec<u64> = Vec::new();
    let candidates: Vec<u64> = if run_all {
        blocks.iter().map(|b| b.id).collect()
    } else {
        requested.to_vec()
    };
    for id in candidates {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// One-line summary for `--list-blocks`.
pub fn describe_block(block: &CapturedBlock) -> String {
    let first = block.source.lines().next().unwrap_or_default();
    let lines = block.source.lines().count();
    format!("#{} [{}] {} line(s): {}", block.id, block.tag, lines, first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quill_render::RenderConfig;

    fn renderer() -> StreamRenderer<String> {
        let config = RenderConfig::default().with_color(false).with_width(80);
        StreamRenderer::with_sink(config, String::new())
    }

    #[test]
    fn test_chunk_size_does_not_change_output() {
        let doc = "# Tïtle\n| a | b |\n|---|---|\n| → | ✓ |\n```lua\n1+1\n```\ntail";
        let mut whole = renderer();
        render_stream(doc.as_bytes(), &mut whole, 4096).unwrap();
        for size in 1..8 {
            let mut chunked = renderer();
            render_stream(doc.as_bytes(), &mut chunked, size).unwrap();
            assert_eq!(chunked.sink(), whole.sink(), "chunk size {size}");
        }
    }

    #[test]
    fn test_select_blocks() {
        let mut r = renderer();
        render_stream("```lua\n1\n```\n```lua\n2\n```\n".as_bytes(), &mut r, 16).unwrap();
        assert_eq!(select_blocks(&[], true, r.list_blocks()), vec![1, 2]);
        assert_eq!(select_blocks(&[2, 7, 2], false, r.list_blocks()), vec![2, 7]);
        assert!(select_blocks(&[], false, r.list_blocks()).is_empty());
    }

    #[test]
    fn test_describe_block() {
        let mut r = renderer();
        render_stream("```lua\nlocal x = 1\nreturn x\n```\n".as_bytes(), &mut r, 64).unwrap();
        assert_eq!(
            describe_block(&r.list_blocks()[0]),
            "#1 [lua] 2 line(s): local x = 1"
        );
    }
}
