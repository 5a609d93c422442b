//! Inline formatting.
//!
//! A single left-to-right lexer turns a line into a tree of [`Inline`]
//! nodes; rendering walks the tree with a style stack so every span carries
//! its fully resolved style. Closing-marker searches step over backtick code
//! spans, so markers inside code never pair with markers outside it.
//!
//! Recognized syntax:
//! - `**bold**` / `__bold__`
//! - `*italic*` / `_italic_` (underscores only at word boundaries)
//! - `` `code` `` (any backtick run length)
//! - `~~strikethrough~~`
//! - `[text](url)`
//! - `$math$`, `$$math$$`, `\(math\)`
//! - backslash escapes of ASCII punctuation

use ratatui::style::Style;
use ratatui::text::Span;

use crate::ansi;
use crate::math::format_math;
use crate::theme::MarkdownTheme;

/// A parsed inline element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Strike(Vec<Inline>),
    Code(String),
    /// Raw math source, converted when rendered
    Math(String),
    Link { label: Vec<Inline>, url: String },
}

/// Formats inline markup to a string.
///
/// With `style_enabled` the result carries ANSI styling from the default
/// theme; without it, markers are stripped and only the text remains
/// (links become `text (url)`, math is still converted).
pub fn format_inline(text: &str, style_enabled: bool) -> String {
    let spans = render_inline(text, Style::default(), &MarkdownTheme::default());
    ansi::spans_to_string(&spans, style_enabled)
}

/// Plain text of inline markup, markers stripped.
pub fn plain_inline(text: &str) -> String {
    format_inline(text, false)
}

/// Parses and renders inline markup over a base style.
pub fn render_inline(text: &str, base: Style, theme: &MarkdownTheme) -> Vec<Span<'static>> {
    let nodes = parse_inline(text);
    let mut stack = StyleStack::new(base);
    let mut spans = Vec::new();
    push_nodes(&nodes, &mut stack, theme, &mut spans);
    spans
}

/// Parses inline markup into a node tree.
pub fn parse_inline(text: &str) -> Vec<Inline> {
    let chars: Vec<char> = text.chars().collect();
    parse(&chars)
}

// ============================================================
// Rendering
// ============================================================

/// Styles of the enclosing elements, innermost last.
struct StyleStack {
    stack: Vec<Style>,
}

impl StyleStack {
    fn new(base: Style) -> Self {
        Self { stack: vec![base] }
    }

    fn current(&self) -> Style {
        self.stack.last().copied().unwrap_or_default()
    }

    fn push(&mut self, overlay: Style) {
        let style = self.current().patch(overlay);
        self.stack.push(style);
    }

    fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }
}

fn push_nodes(
    nodes: &[Inline],
    stack: &mut StyleStack,
    theme: &MarkdownTheme,
    out: &mut Vec<Span<'static>>,
) {
    for node in nodes {
        match node {
            Inline::Text(text) => out.push(Span::styled(text.clone(), stack.current())),
            Inline::Strong(children) => nested(children, theme.bold, stack, theme, out),
            Inline::Emphasis(children) => nested(children, theme.italic, stack, theme, out),
            Inline::Strike(children) => nested(children, theme.strikethrough, stack, theme, out),
            Inline::Code(code) => out.push(Span::styled(
                code.clone(),
                stack.current().patch(theme.code_inline),
            )),
            Inline::Math(source) => out.push(Span::styled(
                format_math(source),
                stack.current().patch(theme.math),
            )),
            Inline::Link { label, url } => {
                let start = out.len();
                nested(label, theme.link_text, stack, theme, out);
                let label_text: String = out[start..].iter().map(|s| s.content.as_ref()).collect();
                if label_text != *url {
                    out.push(Span::styled(
                        format!(" ({url})"),
                        stack.current().patch(theme.link_url),
                    ));
                }
            }
        }
    }
}

fn nested(
    children: &[Inline],
    overlay: Style,
    stack: &mut StyleStack,
    theme: &MarkdownTheme,
    out: &mut Vec<Span<'static>>,
) {
    stack.push(overlay);
    push_nodes(children, stack, theme, out);
    stack.pop();
}

// ============================================================
// Lexer
// ============================================================

fn parse(chars: &[char]) -> Vec<Inline> {
    let mut nodes = Vec::new();
    let mut text = String::new();
    let mut i = 0;

    while i < chars.len() {
        if let Some((node, next)) = construct_at(chars, i) {
            if !text.is_empty() {
                nodes.push(Inline::Text(std::mem::take(&mut text)));
            }
            nodes.push(node);
            i = next;
            continue;
        }
        if chars[i] == '\\' {
            if let Some(&escaped) = chars.get(i + 1) {
                if escaped.is_ascii_punctuation() {
                    text.push(escaped);
                    i += 2;
                    continue;
                }
            }
        }
        text.push(chars[i]);
        i += 1;
    }

    if !text.is_empty() {
        nodes.push(Inline::Text(text));
    }
    nodes
}

/// Tries to read one construct starting at `i`; returns it and the index
/// just past it.
fn construct_at(chars: &[char], i: usize) -> Option<(Inline, usize)> {
    match chars[i] {
        '\\' if chars.get(i + 1) == Some(&'(') => {
            let end = find_seq(chars, i + 2, &['\\', ')'])?;
            non_empty(&chars[i + 2..end])
                .map(|src| (Inline::Math(src.iter().collect()), end + 2))
        }
        '`' => {
            let span = code_span(chars, i)?;
            let code: String = chars[span.content.0..span.content.1].iter().collect();
            Some((Inline::Code(code), span.next))
        }
        '$' => dollar_math(chars, i),
        '*' | '_' => emphasis(chars, i),
        '~' if chars.get(i + 1) == Some(&'~') => {
            let end = find_closing(chars, i + 2, &['~', '~'])?;
            non_empty(&chars[i + 2..end]).map(|inner| (Inline::Strike(parse(inner)), end + 2))
        }
        '[' => link(chars, i),
        _ => None,
    }
}

fn non_empty(slice: &[char]) -> Option<&[char]> {
    (!slice.is_empty()).then_some(slice)
}

struct CodeSpan {
    content: (usize, usize),
    next: usize,
}

/// A backtick code span opened by the run at `i`, closed by a run of the
/// same length.
fn code_span(chars: &[char], i: usize) -> Option<CodeSpan> {
    let run = chars[i..].iter().take_while(|c| **c == '`').count();
    let mut j = i + run;
    while j < chars.len() {
        if chars[j] == '`' {
            let close = chars[j..].iter().take_while(|c| **c == '`').count();
            if close == run {
                return Some(CodeSpan {
                    content: (i + run, j),
                    next: j + run,
                });
            }
            j += close;
        } else {
            j += 1;
        }
    }
    None
}

fn starts_with(chars: &[char], at: usize, marker: &[char]) -> bool {
    chars.len() >= at + marker.len() && chars[at..at + marker.len()] == *marker
}

fn find_seq(chars: &[char], from: usize, marker: &[char]) -> Option<usize> {
    (from..chars.len()).find(|&j| starts_with(chars, j, marker))
}

/// Next occurrence of `marker` at or after `from`, stepping over code spans.
fn find_closing(chars: &[char], from: usize, marker: &[char]) -> Option<usize> {
    let mut j = from;
    while j < chars.len() {
        if chars[j] == '`' {
            match code_span(chars, j) {
                Some(span) => j = span.next,
                None => j += 1,
            }
            continue;
        }
        if starts_with(chars, j, marker) {
            return Some(j);
        }
        j += 1;
    }
    None
}

fn is_word_char(c: Option<&char>) -> bool {
    c.is_some_and(|c| c.is_alphanumeric())
}

fn emphasis(chars: &[char], i: usize) -> Option<(Inline, usize)> {
    let marker = chars[i];
    let underscore = marker == '_';
    if underscore && i > 0 && is_word_char(chars.get(i - 1)) {
        return None;
    }

    if chars.get(i + 1) == Some(&marker) {
        let double = [marker, marker];
        let end = find_closing(chars, i + 2, &double)?;
        if underscore && is_word_char(chars.get(end + 2)) {
            return None;
        }
        return non_empty(&chars[i + 2..end]).map(|inner| (Inline::Strong(parse(inner)), end + 2));
    }

    if chars.get(i + 1).is_none_or(|c| c.is_whitespace()) {
        return None;
    }
    let mut j = i + 1;
    loop {
        let found = find_closing(chars, j, &[marker])?;
        if chars.get(found + 1) == Some(&marker) {
            // Part of a nested strong marker.
            j = found + 2;
            continue;
        }
        let closes = !chars[found - 1].is_whitespace()
            && !(underscore && is_word_char(chars.get(found + 1)));
        if closes {
            return Some((Inline::Emphasis(parse(&chars[i + 1..found])), found + 1));
        }
        j = found + 1;
    }
}

fn dollar_math(chars: &[char], i: usize) -> Option<(Inline, usize)> {
    if chars.get(i + 1) == Some(&'$') {
        let end = find_seq(chars, i + 2, &['$', '$'])?;
        return non_empty(&chars[i + 2..end])
            .map(|src| (Inline::Math(src.iter().collect()), end + 2));
    }

    if chars.get(i + 1).is_none_or(|c| c.is_whitespace()) {
        return None;
    }
    let mut j = i + 1;
    while let Some(found) = find_seq(chars, j, &['$']) {
        let closes = !chars[found - 1].is_whitespace()
            && !chars.get(found + 1).is_some_and(|c| c.is_ascii_digit());
        if closes {
            return Some((Inline::Math(chars[i + 1..found].iter().collect()), found + 1));
        }
        j = found + 1;
    }
    None
}

fn link(chars: &[char], i: usize) -> Option<(Inline, usize)> {
    let mut depth = 0usize;
    let mut j = i;
    let close = loop {
        match chars.get(j)? {
            '`' => {
                j = code_span(chars, j).map_or(j + 1, |span| span.next);
                continue;
            }
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    break j;
                }
            }
            _ => {}
        }
        j += 1;
    };

    if chars.get(close + 1) != Some(&'(') {
        return None;
    }
    let mut parens = 0usize;
    let mut k = close + 1;
    let url_end = loop {
        match chars.get(k)? {
            '(' => parens += 1,
            ')' => {
                parens -= 1;
                if parens == 0 {
                    break k;
                }
            }
            _ => {}
        }
        k += 1;
    };

    let url: String = chars[close + 2..url_end].iter().collect();
    Some((
        Inline::Link {
            label: parse(&chars[i + 1..close]),
            url: url.trim().to_string(),
        },
        url_end + 1,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    #[test]
    fn test_plain_strips_markers() {
        assert_eq!(
            plain_inline("**bold** and *it* and `code` and ~~gone~~"),
            "bold and it and code and gone"
        );
    }

    #[test]
    fn test_plain_link() {
        assert_eq!(plain_inline("see [docs](https://x.dev)"), "see docs (https://x.dev)");
        assert_eq!(plain_inline("[https://x.dev](https://x.dev)"), "https://x.dev");
    }

    #[test]
    fn test_plain_converts_math() {
        assert_eq!(plain_inline("area $\\pi r^2$ ok"), "area π r² ok");
        assert_eq!(plain_inline("$$\\alpha$$ and \\(\\beta\\)"), "α and β");
    }

    #[test]
    fn test_dollar_guards() {
        assert_eq!(plain_inline("costs $5 or $10"), "costs $5 or $10");
        assert_eq!(plain_inline("$ x$"), "$ x$");
    }

    #[test]
    fn test_underscore_word_boundary() {
        assert_eq!(plain_inline("snake_case_name"), "snake_case_name");
        assert_eq!(plain_inline("an _emph_ word"), "an emph word");
        assert_eq!(
            plain_inline("foo__bar__baz is __strong__"),
            "foo__bar__baz is strong"
        );
    }

    #[test]
    fn test_markers_inside_code_never_pair() {
        assert_eq!(
            parse_inline("*a `b*` c*"),
            vec![Inline::Emphasis(vec![
                text("a "),
                Inline::Code("b*".to_string()),
                text(" c"),
            ])]
        );
        assert_eq!(plain_inline("`**not bold**`"), "**not bold**");
    }

    #[test]
    fn test_nested_strong_in_emphasis() {
        assert_eq!(
            parse_inline("*a **b** c*"),
            vec![Inline::Emphasis(vec![
                text("a "),
                Inline::Strong(vec![text("b")]),
                text(" c"),
            ])]
        );
    }

    #[test]
    fn test_unclosed_markers_stay_literal() {
        assert_eq!(plain_inline("2 * 3 * 4"), "2 * 3 * 4");
        assert_eq!(plain_inline("**open"), "**open");
        assert_eq!(plain_inline("[label] (x)"), "[label] (x)");
    }

    #[test]
    fn test_escapes() {
        assert_eq!(plain_inline("\\*not italic\\*"), "*not italic*");
    }

    #[test]
    fn test_double_backtick_code() {
        assert_eq!(
            parse_inline("``a ` b``"),
            vec![Inline::Code("a ` b".to_string())]
        );
    }

    #[test]
    fn test_styled_nesting_resets_every_span() {
        let out = format_inline("**bold `code` more** after", true);
        assert_eq!(out.matches(ansi::RESET).count(), 3);
        assert!(out.ends_with(&format!("{} after", ansi::RESET)));

        let theme = MarkdownTheme::default();
        let spans = render_inline("**bold `code` more**", Style::default(), &theme);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].style, theme.bold);
        assert_eq!(spans[1].style, theme.bold.patch(theme.code_inline));
        assert_eq!(spans[2].style, theme.bold);
    }
}
