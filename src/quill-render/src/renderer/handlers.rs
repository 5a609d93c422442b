//! Line builders for each block kind.

use quill_snippet::{ExecutionResult, OutputKind};
use ratatui::style::Style;
use ratatui::text::{Line, Span};

use crate::inline::render_inline;
use crate::theme::MarkdownTheme;

/// Width of a horizontal rule.
pub(crate) const RULE_WIDTH: usize = 40;

/// Bullet characters by depth level.
const BULLETS: [&str; 4] = ["•", "◦", "▪", "▸"];

/// Bullet for an indentation width, two spaces per level.
pub(crate) fn get_bullet(indent: usize) -> &'static str {
    BULLETS[(indent / 2) % BULLETS.len()]
}

// ============================================================
// Text blocks
// ============================================================

pub(crate) fn header_line(level: u8, text: &str, theme: &MarkdownTheme) -> Line<'static> {
    Line::from(render_inline(text, theme.header_style(level), theme))
}

pub(crate) fn rule_line(theme: &MarkdownTheme) -> Line<'static> {
    Line::from(Span::styled("─".repeat(RULE_WIDTH), theme.hr))
}

pub(crate) fn blockquote_line(depth: usize, text: &str, theme: &MarkdownTheme) -> Line<'static> {
    let mut spans = vec![Span::styled("│ ".repeat(depth), theme.blockquote_border)];
    spans.extend(render_inline(text, theme.blockquote_text, theme));
    Line::from(spans)
}

pub(crate) fn task_line(
    indent: usize,
    checked: bool,
    text: &str,
    theme: &MarkdownTheme,
) -> Line<'static> {
    let (glyph, style) = if checked {
        ("☑", theme.task_checked)
    } else {
        ("☐", theme.task_unchecked)
    };
    item_line(indent, Span::styled(glyph, style), text, theme)
}

pub(crate) fn bullet_line(indent: usize, text: &str, theme: &MarkdownTheme) -> Line<'static> {
    item_line(
        indent,
        Span::styled(get_bullet(indent), theme.list_bullet),
        text,
        theme,
    )
}

pub(crate) fn ordered_line(
    indent: usize,
    marker: &str,
    text: &str,
    theme: &MarkdownTheme,
) -> Line<'static> {
    item_line(
        indent,
        Span::styled(marker.to_string(), theme.list_number),
        text,
        theme,
    )
}

fn item_line(
    indent: usize,
    marker: Span<'static>,
    text: &str,
    theme: &MarkdownTheme,
) -> Line<'static> {
    let mut spans = Vec::with_capacity(4);
    if indent > 0 {
        spans.push(Span::raw(" ".repeat(indent)));
    }
    spans.push(marker);
    spans.push(Span::raw(" "));
    spans.extend(render_inline(text, theme.text, theme));
    Line::from(spans)
}

pub(crate) fn paragraph_line(text: &str, theme: &MarkdownTheme) -> Line<'static> {
    Line::from(render_inline(text, theme.text, theme))
}

// ============================================================
// Code blocks
// ============================================================

/// `╭─ <tag> [#id]`, with `code` standing in for a missing tag.
pub(crate) fn code_header(tag: Option<&str>, id: Option<u64>, theme: &MarkdownTheme) -> Line<'static> {
    let mut spans = vec![
        Span::styled("╭─ ", theme.code_block_border),
        Span::styled(tag.unwrap_or("code").to_string(), theme.code_lang_tag),
    ];
    if let Some(id) = id {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(format!("[#{id}]"), theme.code_block_id));
    }
    Line::from(spans)
}

/// A body line behind the gutter. Never inline-formatted.
pub(crate) fn code_body(line: &str, theme: &MarkdownTheme) -> Line<'static> {
    let mut spans = vec![Span::styled("│ ", theme.code_block_border)];
    if !line.is_empty() {
        spans.push(Span::styled(line.to_string(), theme.code_block_text));
    }
    Line::from(spans)
}

pub(crate) fn code_footer(theme: &MarkdownTheme) -> Line<'static> {
    Line::from(Span::styled("╰─", theme.code_block_border))
}

pub(crate) fn run_affordance(id: u64, theme: &MarkdownTheme) -> Line<'static> {
    Line::from(Span::styled(format!("  ▶ run block #{id}"), theme.run_affordance))
}

// ============================================================
// Execution output
// ============================================================

/// Records of a run followed by a status line.
///
/// Multi-line record text keeps its prefix on the first line and aligns
/// continuation lines under the text.
pub(crate) fn execution_lines(result: &ExecutionResult, theme: &MarkdownTheme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for record in &result.records {
        let (prefix, style) = record_style(record.kind, theme);
        let indent = " ".repeat(prefix.chars().count());
        for (n, text) in record.text.split('\n').enumerate() {
            let lead = if n == 0 { prefix.to_string() } else { indent.clone() };
            let mut spans = Vec::with_capacity(2);
            if !lead.is_empty() {
                spans.push(Span::styled(lead, style));
            }
            spans.push(Span::styled(text.to_string(), style));
            lines.push(Line::from(spans));
        }
    }

    let status = if result.success {
        Span::styled(
            format!("  ✓ completed in {}ms", result.duration_ms()),
            theme.status_ok,
        )
    } else {
        Span::styled(
            format!("  ✗ failed in {}ms", result.duration_ms()),
            theme.status_failed,
        )
    };
    lines.push(Line::from(status));
    lines
}

fn record_style(kind: OutputKind, theme: &MarkdownTheme) -> (&'static str, Style) {
    match kind {
        OutputKind::Log => ("", theme.output_log),
        OutputKind::Info => ("ℹ ", theme.output_info),
        OutputKind::Warn => ("⚠ ", theme.output_warn),
        OutputKind::Error => ("✖ ", theme.output_error),
        OutputKind::Result => ("", theme.output_result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi::plain_text;
    use pretty_assertions::assert_eq;
    use quill_snippet::OutputRecord;
    use std::time::Duration;

    fn theme() -> MarkdownTheme {
        MarkdownTheme::default()
    }

    #[test]
    fn test_bullets_cycle_by_depth() {
        assert_eq!(get_bullet(0), "•");
        assert_eq!(get_bullet(2), "◦");
        assert_eq!(get_bullet(4), "▪");
        assert_eq!(get_bullet(6), "▸");
        assert_eq!(get_bullet(8), "•");
    }

    #[test]
    fn test_list_lines_keep_indentation() {
        assert_eq!(plain_text(&bullet_line(2, "item", &theme())), "  ◦ item");
        assert_eq!(plain_text(&ordered_line(0, "7.", "seven", &theme())), "7. seven");
        assert_eq!(plain_text(&task_line(0, true, "**done**", &theme())), "☑ done");
        assert_eq!(plain_text(&task_line(0, false, "todo", &theme())), "☐ todo");
    }

    #[test]
    fn test_blockquote_prefix_per_level() {
        assert_eq!(plain_text(&blockquote_line(2, "q", &theme())), "│ │ q");
    }

    #[test]
    fn test_code_frame() {
        assert_eq!(plain_text(&code_header(Some("lua"), Some(3), &theme())), "╭─ lua [#3]");
        assert_eq!(plain_text(&code_header(None, None, &theme())), "╭─ code");
        assert_eq!(plain_text(&code_body("x = **1**", &theme())), "│ x = **1**");
        assert_eq!(plain_text(&code_footer(&theme())), "╰─");
        assert_eq!(plain_text(&run_affordance(3, &theme())), "  ▶ run block #3");
    }

    #[test]
    fn test_execution_lines() {
        let result = ExecutionResult::completed(
            vec![
                OutputRecord::log("plain"),
                OutputRecord::info("two\nlines"),
                OutputRecord::warn("careful"),
                OutputRecord::result("→ 2"),
            ],
            Duration::from_millis(12),
        );
        let lines: Vec<String> = execution_lines(&result, &theme()).iter().map(plain_text).collect();
        assert_eq!(
            lines,
            vec![
                "plain",
                "ℹ two",
                "  lines",
                "⚠ careful",
                "→ 2",
                "  ✓ completed in 12ms",
            ]
        );
    }

    #[test]
    fn test_failed_status() {
        let result = ExecutionResult::failed(
            Vec::new(),
            quill_snippet::ErrorCategory::Runtime,
            "boom",
            Duration::from_millis(3),
        );
        let lines: Vec<String> = execution_lines(&result, &theme()).iter().map(plain_text).collect();
        assert_eq!(lines, vec!["✖ RuntimeError: boom", "  ✗ failed in 3ms"]);
    }
}
