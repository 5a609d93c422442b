//! Tests for the table layout engine.

use pretty_assertions::assert_eq;
use unicode_width::UnicodeWidthStr;

use super::*;
use crate::ansi::plain_text;
use crate::theme::MarkdownTheme;

fn table(rows: &[&str]) -> Table {
    let split: Vec<Vec<String>> = rows.iter().map(|r| split_row(r)).collect();
    Table::from_rows(&split, &[], &MarkdownTheme::default())
}

fn rendered(rows: &[&str], budget: usize) -> (Vec<String>, TableStrategy) {
    let (lines, strategy) = render_table(&table(rows), budget, &MarkdownTheme::default());
    (lines.iter().map(plain_text).collect(), strategy)
}

mod parse_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_row_drops_outer_pipes() {
        assert_eq!(split_row("| a | b |"), vec!["a", "b"]);
        assert_eq!(split_row("a | b"), vec!["a", "b"]);
        assert_eq!(split_row("| a | |"), vec!["a", ""]);
    }

    #[test]
    fn test_escaped_pipe() {
        assert_eq!(split_row("| a \\| b | c |"), vec!["a | b", "c"]);
    }

    #[test]
    fn test_separator_detection() {
        assert!(is_separator("|---|---|"));
        assert!(is_separator(" | :--- | ---: | "));
        assert!(is_separator("---|---"));
        assert!(!is_separator("---"));
        assert!(!is_separator("| a | b |"));
        assert!(!is_separator("|  |"));
    }

    #[test]
    fn test_alignments() {
        assert_eq!(
            parse_alignments("|:--|:-:|--:|---|"),
            vec![
                Alignment::Left,
                Alignment::Center,
                Alignment::Right,
                Alignment::Left
            ]
        );
    }
}

mod layout_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fits_keeps_natural_widths() {
        assert_eq!(compute_layout(&[3, 5, 4], 76), Layout::Grid(vec![3, 5, 4]));
    }

    #[test]
    fn test_wide_table_with_many_columns_falls_back() {
        assert_eq!(compute_layout(&[3, 100, 4], 76), Layout::List);
    }

    #[test]
    fn test_two_columns_are_clamped_not_listed() {
        // cap = (40 - 7) / 2 = 16
        assert_eq!(compute_layout(&[10, 100], 40), Layout::Grid(vec![10, 16]));
    }

    #[test]
    fn test_clamp_never_below_wrap_minimum() {
        // cap = (20 - 7) / 2 = 6, but columns keep min(natural, 15)
        assert_eq!(compute_layout(&[30, 4], 20), Layout::Grid(vec![15, 4]));
    }

    #[test]
    fn test_table_budget() {
        assert_eq!(table_budget(80), 76);
        assert_eq!(table_budget(300), MAX_TABLE_WIDTH);
        assert_eq!(table_budget(2), 0);
    }
}

mod render_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_small_table_renders_as_grid() {
        let (lines, strategy) = rendered(&["| a | b | c |", "| 1 | 2 | 3 |"], 76);
        assert_eq!(strategy, TableStrategy::Grid);
        assert_eq!(
            lines,
            vec![
                "┌─────┬─────┬─────┐",
                "│ a   │ b   │ c   │",
                "├─────┼─────┼─────┤",
                "│ 1   │ 2   │ 3   │",
                "└─────┴─────┴─────┘",
            ]
        );
        assert!(lines.iter().all(|l| l.width() <= 76));
    }

    #[test]
    fn test_single_row_has_no_separator() {
        let (lines, _) = rendered(&["| only |"], 76);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let (lines, strategy) = rendered(&["| a | b |", "| 1 |"], 76);
        assert_eq!(strategy, TableStrategy::Grid);
        assert_eq!(lines[3], "│ 1   │     │");
    }

    #[test]
    fn test_cells_wrap_to_column_width() {
        let long = "word ".repeat(12);
        let row = format!("| k | {} |", long.trim());
        let (lines, strategy) = rendered(&["| key | value |", &row], 40);
        assert_eq!(strategy, TableStrategy::Grid);
        // Header, separator and borders plus a multi-line body row.
        assert!(lines.len() > 5);
        assert!(lines.iter().all(|l| l.width() <= 40), "{lines:#?}");
    }

    #[test]
    fn test_oversized_cell_switches_to_list_without_losing_data() {
        let long = "x".repeat(200);
        let row = format!("| alpha | 10 | {long} |");
        let (lines, strategy) = rendered(&["| Name | Size | Notes |", &row, "| beta | 12 | |"], 76);
        assert_eq!(strategy, TableStrategy::List);
        assert_eq!(lines[0], "alpha");
        assert_eq!(lines[1], "  Size: 10");
        assert_eq!(lines[2], format!("  Notes: {long}"));
        assert_eq!(lines[3], "─".repeat(40));
        assert_eq!(lines[4], "beta");
        assert_eq!(lines[5], "  Size: 12");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_list_labels_for_missing_headers() {
        let long = "y".repeat(100);
        let row = format!("| r | {long} | z | extra |");
        let (lines, strategy) = rendered(&["| A | | C |", &row], 76);
        assert_eq!(strategy, TableStrategy::List);
        assert_eq!(lines[1], format!("  Column 2: {long}"));
        assert_eq!(lines[2], "  C: z");
        assert_eq!(lines[3], "  Column 4: extra");
    }

    #[test]
    fn test_inline_markup_in_cells() {
        let (lines, _) = rendered(&["| **bold** | `code` |", "| x | y |"], 76);
        assert_eq!(lines[1], "│ bold │ code │");
    }

    #[test]
    fn test_alignment_applies_padding() {
        let rows: Vec<Vec<String>> = vec![split_row("| h | h |"), split_row("| a | b |")];
        let table = Table::from_rows(
            &rows,
            &[Alignment::Right, Alignment::Center],
            &MarkdownTheme::default(),
        );
        let lines: Vec<String> = render_grid(&table, &[5, 5], &MarkdownTheme::default())
            .iter()
            .map(plain_text)
            .collect();
        assert_eq!(lines[3], "│     a │   b   │");
    }
}
