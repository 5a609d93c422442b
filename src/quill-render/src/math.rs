//! Math formatter.
//!
//! Converts a math expression (delimiters already removed) into a Unicode
//! approximation. Passes run in a fixed order and each one only rewrites
//! syntax the earlier ones left behind:
//!
//! 1. `\frac{A}{B}` → `(A)/(B)`
//! 2. `^{..}` / `^x` → superscript, when every character maps
//! 3. `_{..}` / `_x` → subscript, same rule
//! 4. `\sqrt{A}` → `√(A)`, `\sqrt x` → `√x`
//! 5. named commands via [`symbols::command`](crate::symbols::command)
//! 6. residual braces stripped
//! 7. whitespace collapsed and trimmed
//!
//! Anything unmapped stays literal.

use crate::symbols;

/// Formats a math expression.
pub fn format_math(expr: &str) -> String {
    let text = rewrite_fracs(expr);
    let text = rewrite_scripts(&text, '^', symbols::superscript);
    let text = rewrite_scripts(&text, '_', symbols::subscript);
    let text = rewrite_sqrt(&text);
    let text = replace_commands(&text);
    let text: String = text.chars().filter(|c| *c != '{' && *c != '}').collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Content of a balanced `{...}` group starting at `start`, and the index
/// just past its closing brace.
fn brace_group(chars: &[char], start: usize) -> Option<(String, usize)> {
    if chars.get(start) != Some(&'{') {
        return None;
    }
    let mut depth = 0usize;
    for (offset, c) in chars[start..].iter().enumerate() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset;
                    return Some((chars[start + 1..end].iter().collect(), end + 1));
                }
            }
            _ => {}
        }
    }
    None
}

fn starts_with_at(chars: &[char], at: usize, needle: &str) -> bool {
    let mut i = at;
    for n in needle.chars() {
        if chars.get(i) != Some(&n) {
            return false;
        }
        i += 1;
    }
    true
}

/// Whether the command at `at` is exactly `name` (not a longer command).
fn command_at(chars: &[char], at: usize, name: &str) -> bool {
    starts_with_at(chars, at, name)
        && !chars
            .get(at + name.chars().count())
            .is_some_and(|c| c.is_ascii_alphabetic())
}

fn rewrite_fracs(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < chars.len() {
        if command_at(&chars, i, "\\frac") {
            let parts = brace_group(&chars, i + 5)
                .and_then(|(num, mid)| brace_group(&chars, mid).map(|(den, end)| (num, den, end)));
            if let Some((num, den, end)) = parts {
                out.push('(');
                out.push_str(&rewrite_fracs(&num));
                out.push_str(")/(");
                out.push_str(&rewrite_fracs(&den));
                out.push(')');
                i = end;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn rewrite_scripts(input: &str, marker: char, map: fn(char) -> Option<char>) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == marker {
            if let Some((group, end)) = brace_group(&chars, i + 1) {
                let mapped: Option<String> = group
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .map(map)
                    .collect();
                match mapped {
                    Some(mapped) if !mapped.is_empty() => out.push_str(&mapped),
                    _ => out.extend(&chars[i..end]),
                }
                i = end;
                continue;
            }
            if let Some(mapped) = chars.get(i + 1).copied().and_then(map) {
                out.push(mapped);
                i += 2;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn rewrite_sqrt(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < chars.len() {
        if command_at(&chars, i, "\\sqrt") {
            let mut j = i + 5;
            if let Some((radicand, end)) = brace_group(&chars, j) {
                out.push_str("√(");
                out.push_str(&rewrite_sqrt(&radicand));
                out.push(')');
                i = end;
                continue;
            }
            while chars.get(j).is_some_and(|c| c.is_whitespace()) {
                j += 1;
            }
            out.push('√');
            i = j;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn replace_commands(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' {
            let name: String = chars[i + 1..]
                .iter()
                .take_while(|c| c.is_ascii_alphabetic())
                .collect();
            if !name.is_empty() {
                match symbols::command(&name) {
                    Some(symbol) => out.push_str(symbol),
                    None => {
                        out.push('\\');
                        out.push_str(&name);
                    }
                }
                i += 1 + name.len();
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}
