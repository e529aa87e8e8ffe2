//! Token type and the tag-boundary splitter.

use std::sync::OnceLock;

use regex::Regex;

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// What a [`Token`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A complete tag (`<strong>`, `</p>`, `<br />`, `<!-- -->`).
    /// Revealed in one atomic step.
    Markup,
    /// Plain characters between tags.  Revealed one unit at a time.
    Text,
}

/// One unit of the tokenized markup stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
}

impl Token {
    pub fn markup(value: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Markup,
            value: value.into(),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Text,
            value: value.into(),
        }
    }

    pub fn is_markup(&self) -> bool {
        self.kind == TokenKind::Markup
    }
}

// ---------------------------------------------------------------------------
// tokenize
// ---------------------------------------------------------------------------

/// Comments, or an opening/closing/self-closing tag whose name starts with
/// a letter.  `< b >`, `a<b`, `3 > 2` never match and stay text.
const TAG_PATTERN: &str = r"<!--[\s\S]*?-->|</?[A-Za-z][A-Za-z0-9:-]*(?:\s[^<>]*)?/?>";

pub(crate) fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(TAG_PATTERN).expect("tag pattern is a valid regex"))
}

/// Name of a tag and whether it is a closing tag.
pub(crate) fn tag_name(tag: &str) -> Option<(&str, bool)> {
    let inner = tag.strip_prefix('<')?;
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let end = inner
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == ':'))
        .unwrap_or(inner.len());
    if end == 0 {
        return None;
    }
    Some((&inner[..end], closing))
}

/// Split `markup` into markup fragments and text runs.
///
/// Every well-formed tag becomes one [`TokenKind::Markup`] token; the text
/// between two tags becomes one [`TokenKind::Text`] token.  Empty text runs
/// are not emitted.  Malformed or unclosed tags are never an error: their
/// `<` / `>` characters simply stay inside the surrounding text run.
///
/// The split is lossless — [`join`] of the result equals `markup`.
pub fn tokenize(markup: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for tag in tag_regex().find_iter(markup) {
        if tag.start() > last {
            tokens.push(Token::text(&markup[last..tag.start()]));
        }
        tokens.push(Token::markup(tag.as_str()));
        last = tag.end();
    }
    if last < markup.len() {
        tokens.push(Token::text(&markup[last..]));
    }

    tokens
}

/// Concatenate token values in order.
pub fn join(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.value.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_strong_example() {
        let tokens = tokenize("Take <strong>ibuprofen</strong>");
        let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, ["Take ", "<strong>", "ibuprofen", "</strong>"]);
        assert!(!tokens[0].is_markup());
        assert!(tokens[1].is_markup());
        assert!(!tokens[2].is_markup());
        assert!(tokens[3].is_markup());
    }

    #[test]
    fn join_reconstructs_input() {
        let inputs = [
            "",
            "plain text only",
            "<p>Hello <em>there</em> &amp; welcome</p>\n",
            "<a href=\"https://x.org/?a=1&amp;b=2\" title=\"t\">link</a>",
            "<ul>\n<li>one</li>\n<li>two</li>\n</ul>\n",
            "broken <b and <i>unclosed",
            "a < b > c",
            "<!-- note --><br/><br />x<hr>",
            "emoji ⚠️ <strong>dose</strong> ✓",
        ];
        for input in inputs {
            assert_eq!(join(&tokenize(input)), input, "lossless split of {input:?}");
        }
    }

    #[test]
    fn attributes_stay_inside_one_fragment() {
        let tag = r#"<span class="medicine" data-x="1">"#;
        let input = format!("x{tag}ibuprofen</span>y");
        let tokens = tokenize(&input);
        assert!(tokens.iter().any(|t| t.is_markup() && t.value == tag));
        // No token may start or end strictly inside the tag.
        let start = input.find(tag).unwrap();
        let end = start + tag.len();
        let mut pos = 0;
        for t in &tokens {
            let next = pos + t.value.len();
            assert!(!(pos > start && pos < end), "token starts inside tag");
            assert!(!(next > start && next < end), "token ends inside tag");
            pos = next;
        }
    }

    #[test]
    fn stray_angle_brackets_are_text() {
        let tokens = tokenize("a < b > c");
        assert_eq!(tokens, vec![Token::text("a < b > c")]);

        let tokens = tokenize("x <unclosed");
        assert_eq!(tokens, vec![Token::text("x <unclosed")]);
    }

    #[test]
    fn adjacent_tags_produce_no_empty_text() {
        let tokens = tokenize("<p><strong>x</strong></p>");
        assert!(tokens.iter().all(|t| !t.value.is_empty()));
        assert_eq!(tokens.len(), 5);
    }

    #[test]
    fn self_closing_and_comment_tags() {
        let tokens = tokenize("a<br/>b<br />c<!-- hi -->");
        let markup: Vec<&str> = tokens
            .iter()
            .filter(|t| t.is_markup())
            .map(|t| t.value.as_str())
            .collect();
        assert_eq!(markup, ["<br/>", "<br />", "<!-- hi -->"]);
    }

    #[test]
    fn retokenizing_joined_output_is_stable() {
        let input = "<p>Take <strong>ibuprofen</strong> twice</p>";
        let once = tokenize(input);
        let twice = tokenize(&join(&once));
        assert_eq!(once, twice);
    }
}
