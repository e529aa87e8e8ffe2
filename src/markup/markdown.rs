//! Markdown rendering stage.
//!
//! [`MarkdownRenderer`] is injected into the pipeline at construction time.
//! [`CommonMarkRenderer`] renders via `pulldown_cmark`; [`PlainTextRenderer`]
//! is the no-markdown default and only escapes the text.
//!
//! Both are total: any input renders, nothing panics.

use pulldown_cmark::{html, CowStr, Event, Options, Parser};

// ---------------------------------------------------------------------------
// MarkdownRenderer trait
// ---------------------------------------------------------------------------

/// Turns raw reply text into a markup string.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, text: &str) -> String;
}

// ---------------------------------------------------------------------------
// CommonMarkRenderer
// ---------------------------------------------------------------------------

/// CommonMark + tables + strikethrough, rendered to HTML.
///
/// Raw HTML embedded in the reply is escaped rather than passed through, so
/// the only tags in the output are the ones the renderer itself produced.
pub struct CommonMarkRenderer {
    options: Options,
}

impl CommonMarkRenderer {
    pub fn new() -> Self {
        Self {
            options: Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH,
        }
    }
}

impl Default for CommonMarkRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer for CommonMarkRenderer {
    fn render(&self, text: &str) -> String {
        let parser = Parser::new_ext(text, self.options).map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            other => other,
        });

        let mut out = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

// ---------------------------------------------------------------------------
// PlainTextRenderer
// ---------------------------------------------------------------------------

/// Shows the reply verbatim: no markdown, special characters escaped.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextRenderer;

impl MarkdownRenderer for PlainTextRenderer {
    fn render(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        html::push_html(&mut out, std::iter::once(Event::Text(CowStr::Borrowed(text))));
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_strong() {
        let out = CommonMarkRenderer::new().render("Take **ibuprofen**");
        assert_eq!(out.trim_end(), "<p>Take <strong>ibuprofen</strong></p>");
    }

    #[test]
    fn renders_lists() {
        let out = CommonMarkRenderer::new().render("- rest\n- fluids\n");
        assert!(out.contains("<ul>"));
        assert!(out.contains("<li>rest</li>"));
        assert!(out.contains("<li>fluids</li>"));
    }

    #[test]
    fn raw_html_is_escaped() {
        let out = CommonMarkRenderer::new().render("hi <script>alert(1)</script>");
        assert!(!out.contains("<script>"));
        assert!(out.contains("&lt;script&gt;"));
    }

    #[test]
    fn plain_text_escapes_angle_brackets() {
        let out = PlainTextRenderer.render("a < b && **c**");
        assert_eq!(out, "a &lt; b &amp;&amp; **c**");
    }

    #[test]
    fn arbitrary_input_does_not_panic() {
        let renderer = CommonMarkRenderer::new();
        for input in ["", "***", "[](", "```", "<", "|a|\n|-|\n", "\u{0}"] {
            let _ = renderer.render(input);
        }
    }
}
