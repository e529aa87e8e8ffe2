//! Markup pipeline — turns a raw assistant reply into a tag-aware token
//! stream ready for incremental reveal.
//!
//! ```text
//! raw reply ─▶ MarkdownRenderer ─▶ TermHighlighter ─▶ tokenize ─▶ [Token]
//!              (CommonMark/plain)   (medicine spans)   (tag split)
//! ```
//!
//! * [`Token`] / [`TokenKind`] — one markup fragment or one text run.
//! * [`tokenize`] — splits markup on tag boundaries; joining the tokens
//!   gives back the input exactly.
//! * [`MarkdownRenderer`] — injected renderer; [`CommonMarkRenderer`] or
//!   the no-markdown [`PlainTextRenderer`].
//! * [`TermHighlighter`] — injected highlighter; [`MedicineHighlighter`]
//!   or the no-op [`NoHighlight`].
//! * [`MarkupPipeline`] — the three stages wired together.
//!
//! # Quick start
//!
//! ```rust
//! use medchat::markup::{tokenize, Token};
//!
//! let tokens = tokenize("Take <strong>ibuprofen</strong>");
//! assert_eq!(
//!     tokens,
//!     vec![
//!         Token::text("Take "),
//!         Token::markup("<strong>"),
//!         Token::text("ibuprofen"),
//!         Token::markup("</strong>"),
//!     ]
//! );
//! ```

pub mod highlight;
pub mod markdown;
pub mod pipeline;
pub mod token;

pub use highlight::{MedicineHighlighter, NoHighlight, TermHighlighter};
pub use markdown::{CommonMarkRenderer, MarkdownRenderer, PlainTextRenderer};
pub use pipeline::MarkupPipeline;
pub use token::{join, tokenize, Token, TokenKind};
