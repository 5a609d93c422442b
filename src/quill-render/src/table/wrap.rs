//! Greedy word wrapping of styled spans.
//!
//! Words are never split: a word wider than the column gets a line of its
//! own and overflows it.

use ratatui::style::Style;
use ratatui::text::Span;
use unicode_width::UnicodeWidthStr;

/// A word made of one or more styled pieces.
struct Word {
    pieces: Vec<Span<'static>>,
    width: usize,
    /// Style of the whitespace that preceded it
    gap: Style,
}

/// Wraps spans to `width` columns. Always returns at least one line.
pub fn wrap_spans(spans: &[Span<'static>], width: usize) -> Vec<Vec<Span<'static>>> {
    let words = split_words(spans);
    let mut lines: Vec<Vec<Span<'static>>> = Vec::new();
    let mut line: Vec<Span<'static>> = Vec::new();
    let mut line_width = 0;

    for word in words {
        if line.is_empty() {
            line_width = word.width;
            line.extend(word.pieces);
        } else if line_width + 1 + word.width <= width {
            line.push(Span::styled(" ", word.gap));
            line_width += 1 + word.width;
            line.extend(word.pieces);
        } else {
            lines.push(std::mem::take(&mut line));
            line_width = word.width;
            line.extend(word.pieces);
        }
    }
    lines.push(line);
    lines
}

fn split_words(spans: &[Span<'static>]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current = Word {
        pieces: Vec::new(),
        width: 0,
        gap: Style::default(),
    };

    for span in spans {
        let mut piece = String::new();
        for c in span.content.chars() {
            if c.is_whitespace() {
                if !piece.is_empty() {
                    current.width += piece.width();
                    current.pieces.push(Span::styled(std::mem::take(&mut piece), span.style));
                }
                if !current.pieces.is_empty() {
                    words.push(std::mem::replace(
                        &mut current,
                        Word {
                            pieces: Vec::new(),
                            width: 0,
                            gap: span.style,
                        },
                    ));
                } else {
                    current.gap = span.style;
                }
            } else {
                piece.push(c);
            }
        }
        if !piece.is_empty() {
            current.width += piece.width();
            current.pieces.push(Span::styled(piece, span.style));
        }
    }
    if !current.pieces.is_empty() {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi::plain_text;
    use ratatui::text::Line;

    fn wrap_plain(text: &str, width: usize) -> Vec<String> {
        wrap_spans(&[Span::raw(text.to_string())], width)
            .into_iter()
            .map(|spans| plain_text(&Line::from(spans)))
            .collect()
    }

    #[test]
    fn test_greedy_wrap() {
        assert_eq!(
            wrap_plain("the quick brown fox jumps", 10),
            vec!["the quick", "brown fox", "jumps"]
        );
    }

    #[test]
    fn test_long_word_is_not_split() {
        assert_eq!(
            wrap_plain("a supercalifragilistic b", 5),
            vec!["a", "supercalifragilistic", "b"]
        );
    }

    #[test]
    fn test_empty_cell_has_one_line() {
        assert_eq!(wrap_plain("", 5), vec![""]);
    }

    #[test]
    fn test_word_across_styled_spans() {
        let spans = vec![
            Span::styled("ab".to_string(), Style::default().fg(ratatui::style::Color::Red)),
            Span::raw("cd ef".to_string()),
        ];
        let lines = wrap_spans(&spans, 4);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), 2);
    }
}
