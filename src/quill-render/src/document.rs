//! One-shot rendering of a whole document.

use crate::config::{FALLBACK_WIDTH, RenderConfig};
use crate::renderer::StreamRenderer;

/// Renders a complete document to a string.
///
/// Uses the default theme at a fixed width of 80 columns, so the terminal
/// is never probed. Writing to a `String` cannot fail.
pub fn render_document(document: &str, use_color: bool) -> String {
    let config = RenderConfig::default()
        .with_color(use_color)
        .with_width(FALLBACK_WIDTH);
    let mut renderer = StreamRenderer::with_sink(config, String::new());
    // A String sink never returns an error.
    let _ = renderer.write(document).and_then(|()| renderer.flush());
    renderer.into_sink()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_document() {
        let doc = "# Title\n\nSome **bold** text\n- item\n";
        assert_eq!(
            render_document(doc, false),
            "Title\n\nSome bold text\n• item\n"
        );
    }

    #[test]
    fn test_missing_trailing_newline_is_rendered() {
        assert_eq!(render_document("last line", false), "last line\n");
    }

    #[test]
    fn test_color_flag_controls_escapes() {
        let doc = "**b**";
        assert!(render_document(doc, true).contains("\x1b["));
        assert!(!render_document(doc, false).contains('\x1b'));
    }
}
