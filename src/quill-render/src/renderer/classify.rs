//! Line classification.
//!
//! Each complete line maps to exactly one [`Block`]. The checks run from
//! highest to lowest precedence; whatever matches nothing is a paragraph.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::table::is_separator;

static HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").expect("Invalid header regex"));
static TASK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\s*)[-*+]\s+\[([ xX])\]\s*(.*)$").expect("Invalid task item regex")
});
static UNORDERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)[-*+]\s+(.*)$").expect("Invalid bullet regex"));
static ORDERED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\s*)(\d{1,9}[.)])\s+(.*)$").expect("Invalid ordered item regex")
});

/// What a single line is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Block<'a> {
    /// Code fence with its tag, if any
    Fence(Option<&'a str>),
    Separator,
    /// Line starting with `|`
    PipeRow,
    Blank,
    Header { level: u8, text: &'a str },
    Rule,
    Blockquote { depth: usize, text: &'a str },
    Task { indent: usize, checked: bool, text: &'a str },
    Unordered { indent: usize, text: &'a str },
    Ordered { indent: usize, marker: &'a str, text: &'a str },
    Paragraph(&'a str),
}

/// Classifies a line outside any code block.
pub(crate) fn classify(line: &str) -> Block<'_> {
    let block = classify_inner(line);
    trace!(?block, "classified line");
    block
}

fn classify_inner(line: &str) -> Block<'_> {
    if let Some(tag) = fence_tag(line) {
        return Block::Fence(tag);
    }
    if line.trim().is_empty() {
        return Block::Blank;
    }
    if is_separator(line) {
        return Block::Separator;
    }
    if line.trim_start().starts_with('|') {
        return Block::PipeRow;
    }
    if let Some(caps) = HEADER.captures(line) {
        let level = caps.get(1).map_or(1, |m| m.as_str().len()) as u8;
        let text = caps.get(2).map_or("", |m| m.as_str()).trim_end();
        return Block::Header { level, text };
    }
    if is_rule(line) {
        return Block::Rule;
    }
    if let Some((depth, text)) = blockquote(line) {
        return Block::Blockquote { depth, text };
    }
    if let Some(caps) = TASK.captures(line) {
        return Block::Task {
            indent: indent_width(caps.get(1).map_or("", |m| m.as_str())),
            checked: caps.get(2).is_some_and(|m| m.as_str() != " "),
            text: caps.get(3).map_or("", |m| m.as_str()),
        };
    }
    if let Some(caps) = UNORDERED.captures(line) {
        return Block::Unordered {
            indent: indent_width(caps.get(1).map_or("", |m| m.as_str())),
            text: caps.get(2).map_or("", |m| m.as_str()),
        };
    }
    if let Some(caps) = ORDERED.captures(line) {
        return Block::Ordered {
            indent: indent_width(caps.get(1).map_or("", |m| m.as_str())),
            marker: caps.get(2).map_or("", |m| m.as_str()),
            text: caps.get(3).map_or("", |m| m.as_str()),
        };
    }
    Block::Paragraph(line)
}

/// Returns `Some(tag)` for a fence line; the inner option is the tag.
pub(crate) fn fence_tag(line: &str) -> Option<Option<&str>> {
    let rest = line.trim_start().strip_prefix("```")?;
    let tag = rest.trim();
    if tag.contains('`') {
        return None;
    }
    Some(tag.split_whitespace().next())
}

/// Three or more of the same `-`, `*` or `_`, optionally spaced.
fn is_rule(line: &str) -> bool {
    let mut marks = line.chars().filter(|c| !c.is_whitespace());
    let Some(first) = marks.next() else {
        return false;
    };
    if !matches!(first, '-' | '*' | '_') {
        return false;
    }
    let mut count = 1;
    for c in marks {
        if c != first {
            return false;
        }
        count += 1;
    }
    count >= 3
}

/// Nesting depth and content of a `>` line. `> > x` and `>> x` both nest.
fn blockquote(line: &str) -> Option<(usize, &str)> {
    let mut rest = line.trim_start();
    let mut depth = 0;
    while let Some(inner) = rest.strip_prefix('>') {
        depth += 1;
        rest = inner.trim_start();
    }
    (depth > 0).then_some((depth, rest))
}

/// Leading whitespace width, tabs counting as four columns.
fn indent_width(indent: &str) -> usize {
    indent.chars().map(|c| if c == '\t' { 4 } else { 1 }).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fences() {
        assert_eq!(classify("```"), Block::Fence(None));
        assert_eq!(classify("```lua"), Block::Fence(Some("lua")));
        assert_eq!(classify("  ``` Lua extra"), Block::Fence(Some("Lua")));
        assert_eq!(classify("```a`b"), Block::Paragraph("```a`b"));
    }

    #[test]
    fn test_headers() {
        assert_eq!(classify("## Title"), Block::Header { level: 2, text: "Title" });
        assert_eq!(classify("###### six"), Block::Header { level: 6, text: "six" });
        assert_eq!(classify("####### seven"), Block::Paragraph("####### seven"));
        assert_eq!(classify("#hashtag"), Block::Paragraph("#hashtag"));
    }

    #[test]
    fn test_rules() {
        assert_eq!(classify("---"), Block::Rule);
        assert_eq!(classify("* * *"), Block::Rule);
        assert_eq!(classify("___"), Block::Rule);
        assert_eq!(classify("-*-"), Block::Paragraph("-*-"));
        assert_eq!(classify("--"), Block::Paragraph("--"));
    }

    #[test]
    fn test_tables_before_other_blocks() {
        assert_eq!(classify("|---|---|"), Block::Separator);
        assert_eq!(classify("--- | ---"), Block::Separator);
        assert_eq!(classify("| a | b |"), Block::PipeRow);
        assert_eq!(classify("a | b"), Block::Paragraph("a | b"));
    }

    #[test]
    fn test_blockquotes() {
        assert_eq!(classify("> quote"), Block::Blockquote { depth: 1, text: "quote" });
        assert_eq!(classify("> > deep"), Block::Blockquote { depth: 2, text: "deep" });
        assert_eq!(classify(">>x"), Block::Blockquote { depth: 2, text: "x" });
    }

    #[test]
    fn test_list_items() {
        assert_eq!(
            classify("- [x] done"),
            Block::Task { indent: 0, checked: true, text: "done" }
        );
        assert_eq!(
            classify("  * [ ] todo"),
            Block::Task { indent: 2, checked: false, text: "todo" }
        );
        assert_eq!(
            classify("    - nested"),
            Block::Unordered { indent: 4, text: "nested" }
        );
        assert_eq!(
            classify("12. twelfth"),
            Block::Ordered { indent: 0, marker: "12.", text: "twelfth" }
        );
        assert_eq!(
            classify("3) third"),
            Block::Ordered { indent: 0, marker: "3)", text: "third" }
        );
        assert_eq!(classify("-no space"), Block::Paragraph("-no space"));
    }

    #[test]
    fn test_blank() {
        assert_eq!(classify(""), Block::Blank);
        assert_eq!(classify("   \t"), Block::Blank);
    }
}
