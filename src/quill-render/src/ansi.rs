//! ANSI emission of styled lines.
//!
//! Every styled span is written as its SGR start sequence, the text, then a
//! full reset, so no style state survives past the span that set it.

use crossterm::Command;
use crossterm::style::{
    Attribute, Color as TermColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

/// The SGR reset sequence closing every styled span.
pub const RESET: &str = "\x1b[0m";

const MODIFIER_ATTRIBUTES: [(Modifier, Attribute); 9] = [
    (Modifier::BOLD, Attribute::Bold),
    (Modifier::DIM, Attribute::Dim),
    (Modifier::ITALIC, Attribute::Italic),
    (Modifier::UNDERLINED, Attribute::Underlined),
    (Modifier::SLOW_BLINK, Attribute::SlowBlink),
    (Modifier::RAPID_BLINK, Attribute::RapidBlink),
    (Modifier::REVERSED, Attribute::Reverse),
    (Modifier::HIDDEN, Attribute::Hidden),
    (Modifier::CROSSED_OUT, Attribute::CrossedOut),
];

/// Renders a line to text, with or without escape sequences.
pub fn line_to_string(line: &Line<'_>, use_color: bool) -> String {
    let mut out = String::new();
    for span in &line.spans {
        push_span(&mut out, span, line.style, use_color);
    }
    out
}

/// Renders spans to text, with or without escape sequences.
pub fn spans_to_string(spans: &[Span<'_>], use_color: bool) -> String {
    let mut out = String::new();
    for span in spans {
        push_span(&mut out, span, Style::default(), use_color);
    }
    out
}

/// Plain text of a line.
pub fn plain_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}

/// Display width of spans, ignoring styles.
pub fn spans_width(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|s| s.content.width()).sum()
}

fn push_span(out: &mut String, span: &Span<'_>, base: Style, use_color: bool) {
    if span.content.is_empty() {
        return;
    }
    let style = base.patch(span.style);
    if !use_color || is_plain(style) {
        out.push_str(&span.content);
        return;
    }
    write_style(out, style);
    out.push_str(&span.content);
    out.push_str(RESET);
}

fn is_plain(style: Style) -> bool {
    style.fg.is_none() && style.bg.is_none() && style.add_modifier.is_empty()
}

fn write_style(out: &mut String, style: Style) {
    // Writing into a String cannot fail.
    if let Some(fg) = style.fg {
        let _ = SetForegroundColor(term_color(fg)).write_ansi(out);
    }
    if let Some(bg) = style.bg {
        let _ = SetBackgroundColor(term_color(bg)).write_ansi(out);
    }
    for (modifier, attribute) in MODIFIER_ATTRIBUTES {
        if style.add_modifier.contains(modifier) {
            let _ = SetAttribute(attribute).write_ansi(out);
        }
    }
}

fn term_color(color: Color) -> TermColor {
    match color {
        Color::Reset => TermColor::Reset,
        Color::Black => TermColor::Black,
        Color::Red => TermColor::DarkRed,
        Color::Green => TermColor::DarkGreen,
        Color::Yellow => TermColor::DarkYellow,
        Color::Blue => TermColor::DarkBlue,
        Color::Magenta => TermColor::DarkMagenta,
        Color::Cyan => TermColor::DarkCyan,
        Color::Gray => TermColor::Grey,
        Color::DarkGray => TermColor::DarkGrey,
        Color::LightRed => TermColor::Red,
        Color::LightGreen => TermColor::Green,
        Color::LightYellow => TermColor::Yellow,
        Color::LightBlue => TermColor::Blue,
        Color::LightMagenta => TermColor::Magenta,
        Color::LightCyan => TermColor::Cyan,
        Color::White => TermColor::White,
        Color::Rgb(r, g, b) => TermColor::Rgb { r, g, b },
        Color::Indexed(i) => TermColor::AnsiValue(i),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_mode_emits_no_escapes() {
        let line = Line::from(vec![
            Span::styled("bold", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" text"),
        ]);
        assert_eq!(line_to_string(&line, false), "bold text");
    }

    #[test]
    fn test_styled_span_is_reset() {
        let line = Line::from(vec![
            Span::styled("b", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" rest"),
        ]);
        assert_eq!(line_to_string(&line, true), "\x1b[1mb\x1b[0m rest");
    }

    #[test]
    fn test_rgb_foreground() {
        let spans = [Span::styled("x", Style::default().fg(Color::Rgb(1, 2, 3)))];
        assert_eq!(spans_to_string(&spans, true), "\x1b[38;2;1;2;3mx\x1b[0m");
    }

    #[test]
    fn test_width_ignores_styles() {
        let spans = [Span::styled("héllo", Style::default().fg(Color::Red)), Span::raw("界")];
        assert_eq!(spans_width(&spans), 7);
    }
}
