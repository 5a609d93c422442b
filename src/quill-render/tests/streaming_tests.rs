//! End-to-end tests through the public API.

use std::io::Write;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use quill_render::{
    RenderConfig, StreamRenderer, format_inline, format_math, render_document,
};
use quill_snippet::SnippetExecutor;

fn plain_renderer() -> StreamRenderer<String> {
    let config = RenderConfig::default().with_color(false).with_width(80);
    StreamRenderer::with_sink(config, String::new())
}

#[test]
fn test_math_literals() {
    assert_eq!(format_math("\\alpha + \\beta"), "α + β");
    assert_eq!(format_math("\\zzz"), "\\zzz");
}

#[test]
fn test_inline_plain_mode() {
    assert_eq!(
        format_inline("**a** *b* `c` ~~d~~ [e](http://x.io)", false),
        "a b c d e (http://x.io)"
    );
}

#[test]
fn test_document_with_every_block_kind() {
    let doc = "\
# Report

> Summary with $x^2$

| Item | Count |
|------|------:|
| pens | 3 |

- [x] checked
1. first

```lua
return 40 + 2
```
";
    let expected = "\
Report

│ Summary with x²

┌──────┬───────┐
│ Item │ Count │
├──────┼───────┤
│ pens │     3 │
└──────┴───────┘

☑ checked
1. first

╭─ lua [#1]
│ return 40 + 2
╰─
  ▶ run block #1
";
    assert_eq!(render_document(doc, false), expected);
}

#[test]
fn test_capture_then_run() {
    let mut renderer = plain_renderer();
    renderer.write("```lua\n1+1\n```\n").unwrap();
    renderer.flush().unwrap();

    let block = renderer.get_block(1).unwrap();
    assert_eq!(block.source, "1+1");

    let result = renderer
        .run_block(1, &SnippetExecutor::new())
        .unwrap()
        .unwrap();
    let texts: Vec<&str> = result.records.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["→ 2"]);
}

#[test]
fn test_timeout_then_next_run_succeeds() {
    let mut renderer = plain_renderer();
    renderer
        .write("```lua\nwhile true do end\n```\n```lua\n2*21\n```\n")
        .unwrap();
    let executor = SnippetExecutor::new().with_timeout_ms(100);

    let started = Instant::now();
    let result = renderer.run_block(1, &executor).unwrap().unwrap();
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(!result.success);
    assert!(result.timed_out());
    assert!(
        renderer
            .sink()
            .contains("✖ TimeoutError: execution exceeded 100ms timeout\n  ✗ failed in ")
    );

    let next = renderer.run_block(2, &executor).unwrap().unwrap();
    assert!(next.success);
    assert_eq!(next.records[0].text, "→ 42");
}

#[test]
fn test_config_file_drives_renderer() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "use_color = false\nwidth = 40\nexecutable_tags = [\"moon\"]\ntheme = \"light\""
    )
    .unwrap();
    let config = RenderConfig::load(file.path()).unwrap();

    let mut renderer = StreamRenderer::with_sink(config, String::new());
    renderer
        .write("```moon\nx\n```\n```lua\ny\n```\n")
        .unwrap();
    assert_eq!(renderer.width(), 40);
    let tags: Vec<&str> = renderer.list_blocks().iter().map(|b| b.tag.as_str()).collect();
    assert_eq!(tags, vec!["moon"]);
}

#[test]
fn test_lines_arrive_through_closure_sink() {
    let mut lines = Vec::new();
    {
        let config = RenderConfig::default().with_color(false).with_width(80);
        let sink = |text: &str| -> std::io::Result<()> {
            lines.push(text.to_string());
            Ok(())
        };
        let mut renderer = StreamRenderer::with_sink(config, sink);
        renderer.write("a\nb").unwrap();
        renderer.flush().unwrap();
    }
    assert_eq!(lines, vec!["a\n", "b\n"]);
}
