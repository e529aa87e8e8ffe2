//! Domain-term highlighting stage.
//!
//! A [`TermHighlighter`] may only *add* wrapping markup around substrings of
//! text; it never removes or reorders existing content and never touches
//! the inside of a tag.

use regex::Regex;

use super::token::{tag_name, tokenize};

/// Class attribute placed on highlighted medicine names.
pub const MEDICINE_CLASS: &str = "medicine";

// ---------------------------------------------------------------------------
// TermHighlighter trait
// ---------------------------------------------------------------------------

pub trait TermHighlighter: Send + Sync {
    fn highlight(&self, markup: &str) -> String;
}

// ---------------------------------------------------------------------------
// NoHighlight
// ---------------------------------------------------------------------------

/// Returns the markup unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHighlight;

impl TermHighlighter for NoHighlight {
    fn highlight(&self, markup: &str) -> String {
        markup.to_string()
    }
}

// ---------------------------------------------------------------------------
// MedicineHighlighter
// ---------------------------------------------------------------------------

/// Wraps whole-word, case-insensitive matches of known medicine names in
/// `<span class="medicine">…</span>`.
///
/// Text inside `<code>` / `<pre>` is left alone.
///
/// ```rust
/// use medchat::markup::{MedicineHighlighter, TermHighlighter};
///
/// let hl = MedicineHighlighter::new(&["ibuprofen".to_string()]).unwrap();
/// assert_eq!(
///     hl.highlight("<p>Ibuprofen helps</p>"),
///     "<p><span class=\"medicine\">Ibuprofen</span> helps</p>"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct MedicineHighlighter {
    /// `None` when the term list is empty.
    pattern: Option<Regex>,
}

impl MedicineHighlighter {
    /// Build a highlighter for `terms`.  Blank terms are ignored.
    ///
    /// # Errors
    ///
    /// Fails only when the combined pattern exceeds the regex size limit.
    pub fn new(terms: &[String]) -> Result<Self, regex::Error> {
        let mut escaped: Vec<String> = terms
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(regex::escape)
            .collect();
        if escaped.is_empty() {
            return Ok(Self { pattern: None });
        }
        // Longest first so "insulin glargine" wins over "insulin".
        escaped.sort_by(|a, b| b.len().cmp(&a.len()));
        escaped.dedup();

        let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", escaped.join("|")))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }
}

impl TermHighlighter for MedicineHighlighter {
    fn highlight(&self, markup: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return markup.to_string();
        };

        let replacement = format!("<span class=\"{MEDICINE_CLASS}\">$0</span>");
        let mut out = String::with_capacity(markup.len());
        let mut code_depth = 0usize;

        for token in tokenize(markup) {
            if token.is_markup() {
                match tag_name(&token.value) {
                    Some((name, false)) if is_code_tag(name) => code_depth += 1,
                    Some((name, true)) if is_code_tag(name) => {
                        code_depth = code_depth.saturating_sub(1)
                    }
                    _ => {}
                }
                out.push_str(&token.value);
            } else if code_depth > 0 {
                out.push_str(&token.value);
            } else {
                out.push_str(&pattern.replace_all(&token.value, replacement.as_str()));
            }
        }

        out
    }
}

fn is_code_tag(name: &str) -> bool {
    name.eq_ignore_ascii_case("code") || name.eq_ignore_ascii_case("pre")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
