//! Grid and list rendering.

use ratatui::style::Style;
use ratatui::text::{Line, Span};

use super::layout::{Layout, compute_layout};
use super::types::{Alignment, CELL_PADDING, Table, TableCell, TableStrategy};
use super::wrap::wrap_spans;
use crate::ansi::spans_width;
use crate::inline::{plain_inline, render_inline};
use crate::theme::MarkdownTheme;

/// Longest divider between list records.
const LIST_DIVIDER_WIDTH: usize = 40;

const HORIZONTAL: char = '─';
const VERTICAL: char = '│';

/// Junction characters of one horizontal border.
struct Rule {
    left: char,
    cross: char,
    right: char,
}

const TOP: Rule = Rule {
    left: '┌',
    cross: '┬',
    right: '┐',
};
const MIDDLE: Rule = Rule {
    left: '├',
    cross: '┼',
    right: '┤',
};
const BOTTOM: Rule = Rule {
    left: '└',
    cross: '┴',
    right: '┘',
};

/// Renders a table within `budget` columns, choosing grid or list.
pub fn render_table(
    table: &Table,
    budget: usize,
    theme: &MarkdownTheme,
) -> (Vec<Line<'static>>, TableStrategy) {
    if table.is_empty() {
        return (Vec::new(), TableStrategy::Grid);
    }
    let layout = compute_layout(&table.natural_widths(), budget);
    let strategy = layout.strategy();
    let lines = match layout {
        Layout::Grid(widths) => render_grid(table, &widths, theme),
        Layout::List => render_list(table, budget, theme),
    };
    (lines, strategy)
}

/// Boxed grid. A header separator follows row 0 when there are more rows.
pub fn render_grid(table: &Table, widths: &[usize], theme: &MarkdownTheme) -> Vec<Line<'static>> {
    let border = theme.table_border;
    let mut lines = vec![rule_line(widths, &TOP, border)];
    for (index, row) in table.rows.iter().enumerate() {
        lines.extend(row_lines(row, widths, &table.alignments, border));
        if index == 0 && table.rows.len() > 1 {
            lines.push(rule_line(widths, &MIDDLE, border));
        }
    }
    lines.push(rule_line(widths, &BOTTOM, border));
    lines
}

fn rule_line(widths: &[usize], rule: &Rule, style: Style) -> Line<'static> {
    let segments: Vec<String> = widths
        .iter()
        .map(|w| HORIZONTAL.to_string().repeat(w + 2 * CELL_PADDING))
        .collect();
    let text = format!(
        "{}{}{}",
        rule.left,
        segments.join(&rule.cross.to_string()),
        rule.right
    );
    Line::from(Span::styled(text, style))
}

/// One row, expanded to as many sub-lines as its tallest cell.
fn row_lines(
    row: &[TableCell],
    widths: &[usize],
    alignments: &[Alignment],
    border: Style,
) -> Vec<Line<'static>> {
    let wrapped: Vec<Vec<Vec<Span<'static>>>> = row
        .iter()
        .zip(widths)
        .map(|(cell, width)| wrap_spans(&cell.spans, *width))
        .collect();
    let height = wrapped.iter().map(Vec::len).max().unwrap_or(1);

    (0..height)
        .map(|sub| {
            let mut spans = vec![Span::styled(VERTICAL.to_string(), border)];
            for (col, cell_lines) in wrapped.iter().enumerate() {
                let content = cell_lines.get(sub).cloned().unwrap_or_default();
                let slack = widths[col].saturating_sub(spans_width(&content));
                let (left, right) = match alignments.get(col).copied().unwrap_or_default() {
                    Alignment::Left => (0, slack),
                    Alignment::Right => (slack, 0),
                    Alignment::Center => (slack / 2, slack - slack / 2),
                };
                spans.push(Span::raw(" ".repeat(CELL_PADDING + left)));
                spans.extend(content);
                spans.push(Span::raw(" ".repeat(right + CELL_PADDING)));
                spans.push(Span::styled(VERTICAL.to_string(), border));
            }
            Line::from(spans)
        })
        .collect()
}

/// Vertical list: bold first cell, then `label: value` per non-empty cell.
///
/// Row 0 supplies labels; missing headers become `Column N`. A header-only
/// table is listed as a single record.
pub fn render_list(table: &Table, budget: usize, theme: &MarkdownTheme) -> Vec<Line<'static>> {
    let (headers, records): (&[TableCell], &[Vec<TableCell>]) = match table.rows.split_first() {
        Some((header, rest)) if !rest.is_empty() => (header.as_slice(), rest),
        _ => (&[], table.rows.as_slice()),
    };
    let divider = HORIZONTAL.to_string().repeat(budget.clamp(1, LIST_DIVIDER_WIDTH));

    let mut lines = Vec::new();
    for (n, record) in records.iter().enumerate() {
        if n > 0 {
            lines.push(Line::from(Span::styled(divider.clone(), theme.table_border)));
        }
        let Some((title, fields)) = record.split_first() else {
            continue;
        };
        lines.push(Line::from(render_inline(
            &title.raw,
            theme.table_cell_text.patch(theme.bold),
            theme,
        )));
        for (offset, cell) in fields.iter().enumerate() {
            if cell.is_blank() {
                continue;
            }
            let col = offset + 1;
            let label = headers
                .get(col)
                .map(|h| plain_inline(&h.raw))
                .filter(|h| !h.is_empty())
                .unwrap_or_else(|| format!("Column {}", col + 1));
            let mut spans = vec![
                Span::raw("  "),
                Span::styled(format!("{label}:"), theme.table_label),
                Span::raw(" "),
            ];
            spans.extend(cell.spans.iter().cloned());
            lines.push(Line::from(spans));
        }
    }
    lines
}
