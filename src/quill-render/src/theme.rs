//! Markdown theme.
//!
//! Styles for every element the renderer emits. Spans carry fully resolved
//! styles, so inline styles are patched over the block style they sit in.
//!
//! # Example
//!
//! ```rust,ignore
//! use quill_render::MarkdownTheme;
//! use ratatui::style::{Color, Modifier, Style};
//!
//! let theme = MarkdownTheme::from_name("light")
//!     .with_h1(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD));
//! ```

use ratatui::style::{Color, Modifier, Style};

/// Names accepted by [`MarkdownTheme::from_name`].
pub const THEME_NAMES: &[&str] = &["dark", "light"];

// ============================================================
// Dark palette
// ============================================================

const ACCENT: Color = Color::Rgb(0, 255, 163); // #00FFA3
const ACCENT_SOFT: Color = Color::Rgb(100, 255, 180); // #64FFB4
const ACCENT_DEEP: Color = Color::Rgb(0, 200, 130); // #00C882
const SURFACE: Color = Color::Rgb(27, 40, 56); // #1B2838
const TEXT: Color = Color::Rgb(255, 255, 255); // #FFFFFF
const TEXT_DIM: Color = Color::Rgb(130, 154, 177); // #829AB1
const TEXT_MUTED: Color = Color::Rgb(72, 101, 129); // #486581
const SUCCESS: Color = Color::Rgb(0, 245, 212); // #00F5D4
const WARNING: Color = Color::Rgb(255, 200, 87); // #FFC857
const ERROR: Color = Color::Rgb(255, 107, 107); // #FF6B6B
const INFO: Color = Color::Rgb(72, 202, 228); // #48CAE4
const HIGHLIGHT: Color = Color::Rgb(125, 249, 255); // #7DF9FF
const BORDER: Color = Color::Rgb(27, 73, 101); // #1B4965

/// Styles for rendered markdown and snippet output.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownTheme {
    // ============================================================
    // Headers (H1-H6)
    // ============================================================
    pub h1: Style,
    pub h2: Style,
    pub h3: Style,
    pub h4: Style,
    pub h5: Style,
    pub h6: Style,

    // ============================================================
    // Inline
    // ============================================================
    pub text: Style,
    pub bold: Style,
    pub italic: Style,
    pub strikethrough: Style,
    pub code_inline: Style,
    pub math: Style,
    pub link_text: Style,
    pub link_url: Style,

    // ============================================================
    // Blocks
    // ============================================================
    /// Box-drawing frame and gutter of code blocks
    pub code_block_border: Style,
    pub code_block_text: Style,
    pub code_lang_tag: Style,
    /// The `[#id]` marker on executable blocks
    pub code_block_id: Style,
    pub run_affordance: Style,
    pub blockquote_border: Style,
    pub blockquote_text: Style,
    pub list_bullet: Style,
    pub list_number: Style,
    pub task_checked: Style,
    pub task_unchecked: Style,
    pub hr: Style,

    // ============================================================
    // Tables
    // ============================================================
    pub table_border: Style,
    pub table_header_text: Style,
    pub table_cell_text: Style,
    /// Field labels in the list fallback
    pub table_label: Style,

    // ============================================================
    // Snippet output
    // ============================================================
    pub output_log: Style,
    pub output_info: Style,
    pub output_warn: Style,
    pub output_error: Style,
    pub output_result: Style,
    pub status_ok: Style,
    pub status_failed: Style,
}

impl MarkdownTheme {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Dark theme (the default).
    pub fn dark() -> Self {
        Self::default()
    }

    /// Light theme for bright terminal backgrounds.
    pub fn light() -> Self {
        let primary = Color::Rgb(0, 100, 70);
        let secondary = Color::Rgb(0, 80, 60);
        let ink = Color::Rgb(30, 30, 30);
        let grey = Color::Rgb(120, 120, 120);
        let rule = Color::Rgb(200, 200, 200);
        let link = Color::Rgb(50, 100, 200);
        Self {
            h1: Style::default()
                .fg(primary)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            h2: Style::default().fg(primary).add_modifier(Modifier::BOLD),
            h3: Style::default()
                .fg(secondary)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
            h4: Style::default().fg(secondary).add_modifier(Modifier::ITALIC),
            h5: Style::default()
                .fg(Color::Rgb(80, 80, 80))
                .add_modifier(Modifier::ITALIC),
            h6: Style::default().fg(grey).add_modifier(Modifier::ITALIC),
            text: Style::default().fg(ink),
            bold: Style::default().fg(primary).add_modifier(Modifier::BOLD),
            italic: Style::default().add_modifier(Modifier::ITALIC),
            strikethrough: Style::default()
                .fg(Color::Rgb(100, 100, 100))
                .add_modifier(Modifier::CROSSED_OUT),
            code_inline: Style::default()
                .fg(secondary)
                .bg(Color::Rgb(235, 235, 235)),
            math: Style::default().fg(Color::Rgb(120, 60, 160)),
            link_text: Style::default().fg(link).add_modifier(Modifier::UNDERLINED),
            link_url: Style::default().fg(grey),
            code_block_border: Style::default().fg(rule),
            code_block_text: Style::default().fg(ink),
            code_lang_tag: Style::default().fg(link).add_modifier(Modifier::ITALIC),
            code_block_id: Style::default().fg(primary).add_modifier(Modifier::BOLD),
            run_affordance: Style::default().fg(primary),
            blockquote_border: Style::default().fg(primary),
            blockquote_text: Style::default()
                .fg(Color::Rgb(80, 80, 80))
                .add_modifier(Modifier::ITALIC),
            list_bullet: Style::default().fg(primary),
            list_number: Style::default().fg(primary),
            task_checked: Style::default().fg(Color::Rgb(0, 150, 0)),
            task_unchecked: Style::default().fg(grey),
            hr: Style::default().fg(rule),
            table_border: Style::default().fg(primary),
            table_header_text: Style::default().fg(ink).add_modifier(Modifier::BOLD),
            table_cell_text: Style::default().fg(ink),
            table_label: Style::default().fg(grey).add_modifier(Modifier::BOLD),
            output_log: Style::default().fg(ink),
            output_info: Style::default().fg(link),
            output_warn: Style::default().fg(Color::Rgb(170, 110, 0)),
            output_error: Style::default().fg(Color::Rgb(190, 30, 30)),
            output_result: Style::default().fg(primary).add_modifier(Modifier::BOLD),
            status_ok: Style::default().fg(Color::Rgb(0, 150, 0)),
            status_failed: Style::default().fg(Color::Rgb(190, 30, 30)),
        }
    }

    /// Theme by name; unknown names fall back to dark.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "light" => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Style for a header level, clamped to 1-6.
    #[must_use]
    pub fn header_style(&self, level: u8) -> Style {
        match level {
            0 | 1 => self.h1,
            2 => self.h2,
            3 => self.h3,
            4 => self.h4,
            5 => self.h5,
            _ => self.h6,
        }
    }

    #[must_use]
    pub fn with_h1(mut self, style: Style) -> Self {
        self.h1 = style;
        self
    }

    #[must_use]
    pub fn with_text(mut self, style: Style) -> Self {
        self.text = style;
        self
    }

    #[must_use]
    pub fn with_bold(mut self, style: Style) -> Self {
        self.bold = style;
        self
    }

    #[must_use]
    pub fn with_code_inline(mut self, style: Style) -> Self {
        self.code_inline = style;
        self
    }

    #[must_use]
    pub fn with_table_border(mut self, style: Style) -> Self {
        self.table_border = style;
        self
    }
}

impl Default for MarkdownTheme {
    fn default() -> Self {
        Self {
            // Headers - decreasing prominence from H1 to H6
            h1: Style::default()
                .fg(ACCENT)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            h2: Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            h3: Style::default()
                .fg(ACCENT_SOFT)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
            h4: Style::default().fg(ACCENT_SOFT).add_modifier(Modifier::ITALIC),
            h5: Style::default().fg(TEXT_DIM).add_modifier(Modifier::ITALIC),
            h6: Style::default().fg(TEXT_MUTED).add_modifier(Modifier::ITALIC),

            text: Style::default(),
            bold: Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            italic: Style::default().add_modifier(Modifier::ITALIC),
            strikethrough: Style::default()
                .fg(TEXT_DIM)
                .add_modifier(Modifier::CROSSED_OUT),
            code_inline: Style::default().fg(HIGHLIGHT).bg(SURFACE),
            math: Style::default().fg(ACCENT_SOFT),
            link_text: Style::default().fg(INFO).add_modifier(Modifier::UNDERLINED),
            link_url: Style::default().fg(TEXT_MUTED),

            code_block_border: Style::default().fg(BORDER),
            code_block_text: Style::default().fg(TEXT),
            code_lang_tag: Style::default().fg(INFO).add_modifier(Modifier::ITALIC),
            code_block_id: Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            run_affordance: Style::default().fg(ACCENT_DEEP),
            blockquote_border: Style::default().fg(ACCENT_DEEP),
            blockquote_text: Style::default().fg(TEXT_DIM).add_modifier(Modifier::ITALIC),
            list_bullet: Style::default().fg(ACCENT),
            list_number: Style::default().fg(ACCENT),
            task_checked: Style::default().fg(SUCCESS),
            task_unchecked: Style::default().fg(TEXT_MUTED),
            hr: Style::default().fg(BORDER),

            table_border: Style::default().fg(ACCENT),
            table_header_text: Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
            table_cell_text: Style::default(),
            table_label: Style::default().fg(TEXT_DIM).add_modifier(Modifier::BOLD),

            output_log: Style::default(),
            output_info: Style::default().fg(INFO),
            output_warn: Style::default().fg(WARNING),
            output_error: Style::default().fg(ERROR),
            output_result: Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            status_ok: Style::default().fg(SUCCESS),
            status_failed: Style::default().fg(ERROR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_style_clamps() {
        let theme = MarkdownTheme::default();
        assert_eq!(theme.header_style(0), theme.h1);
        assert_eq!(theme.header_style(3), theme.h3);
        assert_eq!(theme.header_style(9), theme.h6);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(MarkdownTheme::from_name("LIGHT"), MarkdownTheme::light());
        assert_eq!(MarkdownTheme::from_name("unknown"), MarkdownTheme::dark());
    }
}
