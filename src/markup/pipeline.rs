//! The three markup stages wired together.

use crate::config::RevealConfig;

use super::highlight::{MedicineHighlighter, NoHighlight, TermHighlighter};
use super::markdown::{CommonMarkRenderer, MarkdownRenderer, PlainTextRenderer};
use super::token::{tokenize, Token};

// ---------------------------------------------------------------------------
// MarkupPipeline
// ---------------------------------------------------------------------------

/// Renders, highlights and tokenizes assistant replies.
///
/// Collaborators are resolved once at construction; the default pipeline
/// uses [`PlainTextRenderer`] and [`NoHighlight`].
///
/// ```rust
/// use medchat::markup::{CommonMarkRenderer, MarkupPipeline, NoHighlight};
///
/// let pipeline = MarkupPipeline::new(Box::new(CommonMarkRenderer::new()), Box::new(NoHighlight));
/// let tokens = pipeline.tokenize("Take **ibuprofen**");
/// assert!(tokens.iter().any(|t| t.is_markup() && t.value == "<strong>"));
/// ```
pub struct MarkupPipeline {
    renderer: Box<dyn MarkdownRenderer>,
    highlighter: Box<dyn TermHighlighter>,
}

impl MarkupPipeline {
    pub fn new(renderer: Box<dyn MarkdownRenderer>, highlighter: Box<dyn TermHighlighter>) -> Self {
        Self {
            renderer,
            highlighter,
        }
    }

    /// Build the pipeline selected by `config`.
    ///
    /// An unusable term list degrades to no highlighting with a warning.
    pub fn from_config(config: &RevealConfig) -> Self {
        let renderer: Box<dyn MarkdownRenderer> = if config.render_markdown {
            Box::new(CommonMarkRenderer::new())
        } else {
            Box::new(PlainTextRenderer)
        };

        let highlighter: Box<dyn TermHighlighter> = if config.highlight_terms {
            match MedicineHighlighter::new(&config.medicine_terms) {
                Ok(hl) => Box::new(hl),
                Err(e) => {
                    log::warn!("markup: medicine term list rejected ({e}); highlighting off");
                    Box::new(NoHighlight)
                }
            }
        } else {
            Box::new(NoHighlight)
        };

        Self::new(renderer, highlighter)
    }

    /// Rendered + highlighted markup for `raw_text`.
    pub fn render(&self, raw_text: &str) -> String {
        let markup = self.renderer.render(raw_text);
        self.highlighter.highlight(&markup)
    }

    /// Token stream for `raw_text`.  Pure: same input, same tokens.
    pub fn tokenize(&self, raw_text: &str) -> Vec<Token> {
        tokenize(&self.render(raw_text))
    }
}

impl Default for MarkupPipeline {
    fn default() -> Self {
        Self::new(Box::new(PlainTextRenderer), Box::new(NoHighlight))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::token::join;

    /// Ignores its input and returns a fixed string.
    struct FixedRenderer(&'static str);

    impl MarkdownRenderer for FixedRenderer {
        fn render(&self, _text: &str) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn strong_scenario_without_highlighting() {
        let pipeline = MarkupPipeline::new(
            Box::new(FixedRenderer("Take <strong>ibuprofen</strong>")),
            Box::new(NoHighlight),
        );
        let values: Vec<String> = pipeline
            .tokenize("Take **ibuprofen**")
            .into_iter()
            .map(|t| t.value)
            .collect();
        assert_eq!(values, ["Take ", "<strong>", "ibuprofen", "</strong>"]);
    }

    #[test]
    fn from_config_highlights_medicines() {
        let pipeline = MarkupPipeline::from_config(&RevealConfig::default());
        let markup = pipeline.render("Take **ibuprofen** with water");
        assert!(markup.contains("<strong><span class=\"medicine\">ibuprofen</span></strong>"));
    }

    #[test]
    fn from_config_respects_switches() {
        let config = RevealConfig {
            render_markdown: false,
            highlight_terms: false,
            ..RevealConfig::default()
        };
        let pipeline = MarkupPipeline::from_config(&config);
        assert_eq!(pipeline.render("**ibuprofen** <b>"), "**ibuprofen** &lt;b&gt;");
    }

    #[test]
    fn tokens_join_back_to_rendered_markup() {
        let pipeline = MarkupPipeline::from_config(&RevealConfig::default());
        let raw = "# Dosage\n\n- **Paracetamol**: 500 mg\n- Rest & fluids\n";
        assert_eq!(join(&pipeline.tokenize(raw)), pipeline.render(raw));
    }

    #[test]
    fn tokenize_is_deterministic() {
        let pipeline = MarkupPipeline::from_config(&RevealConfig::default());
        let raw = "Avoid *aspirin* if you have ulcers.";
        assert_eq!(pipeline.tokenize(raw), pipeline.tokenize(raw));
    }

    #[test]
    fn default_pipeline_shows_plain_text() {
        let pipeline = MarkupPipeline::default();
        assert_eq!(pipeline.tokenize("**x**"), vec![Token::text("**x**")]);
    }
}
