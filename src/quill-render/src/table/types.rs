//! Core table types.

use ratatui::style::Style;
use ratatui::text::Span;
use unicode_width::UnicodeWidthStr;

use crate::inline::render_inline;
use crate::theme::MarkdownTheme;

/// Minimum natural column width.
pub(crate) const MIN_COLUMN_WIDTH: usize = 3;

/// Columns are never clamped below this (or their natural width if smaller).
pub(crate) const MIN_WRAP_WIDTH: usize = 15;

/// Padding on each side of cell content.
pub(crate) const CELL_PADDING: usize = 1;

/// Upper bound of the table width budget.
pub const MAX_TABLE_WIDTH: usize = 120;

/// Columns reserved from the output width.
pub const TABLE_MARGIN: usize = 4;

/// Width budget for tables at the given output width.
pub fn table_budget(width: usize) -> usize {
    width.saturating_sub(TABLE_MARGIN).min(MAX_TABLE_WIDTH)
}

/// Column alignment, read from the separator row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// How a table was rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStrategy {
    /// Boxed grid with wrapped cells
    Grid,
    /// One record per data row, `label: value` lines
    List,
}

impl TableStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::List => "list",
        }
    }
}

/// A cell: raw markup plus its inline-formatted spans.
#[derive(Debug, Clone)]
pub struct TableCell {
    pub raw: String,
    pub spans: Vec<Span<'static>>,
}

impl TableCell {
    pub fn new(raw: &str, base: Style, theme: &MarkdownTheme) -> Self {
        Self {
            raw: raw.to_string(),
            spans: render_inline(raw, base, theme),
        }
    }

    /// Display width of the formatted content.
    pub fn width(&self) -> usize {
        self.spans.iter().map(|s| s.content.width()).sum()
    }

    pub fn is_blank(&self) -> bool {
        self.raw.trim().is_empty()
    }
}

/// Parsed table: row 0 is the header.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub rows: Vec<Vec<TableCell>>,
    pub alignments: Vec<Alignment>,
}

impl Table {
    /// Builds a table from split rows, padding ragged rows with empty cells.
    pub fn from_rows(
        rows: &[Vec<String>],
        alignments: &[Alignment],
        theme: &MarkdownTheme,
    ) -> Self {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        let rows = rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let base = if index == 0 {
                    theme.table_header_text
                } else {
                    theme.table_cell_text
                };
                (0..columns)
                    .map(|col| {
                        let raw = row.get(col).map(String::as_str).unwrap_or("");
                        TableCell::new(raw, base, theme)
                    })
                    .collect()
            })
            .collect();

        let mut alignments = alignments.to_vec();
        alignments.resize(columns, Alignment::default());
        Self { rows, alignments }
    }

    pub fn num_columns(&self) -> usize {
        self.alignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.num_columns() == 0
    }

    /// Widest formatted cell per column, at least [`MIN_COLUMN_WIDTH`].
    pub fn natural_widths(&self) -> Vec<usize> {
        (0..self.num_columns())
            .map(|col| {
                self.rows
                    .iter()
                    .map(|row| row[col].width())
                    .max()
                    .unwrap_or(0)
                    .max(MIN_COLUMN_WIDTH)
            })
            .collect()
    }
}

/// Total grid width for content widths: content, padding and borders.
pub fn grid_width(widths: &[usize]) -> usize {
    widths.iter().sum::<usize>() + (2 * CELL_PADDING + 1) * widths.len() + 1
}
