//! Rendering revealed markup as ANSI-styled terminal text.

use crate::markup::highlight::MEDICINE_CLASS;
use crate::markup::token::{tag_name, tag_regex};
use crate::reveal::reveal_units;

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const ITALIC: &str = "\x1b[3m";
pub const STRIKE: &str = "\x1b[9m";
pub const RED: &str = "\x1b[31m";
pub const YELLOW: &str = "\x1b[33m";
pub const MAGENTA: &str = "\x1b[35m";
pub const CYAN: &str = "\x1b[36m";
pub const CLEAR_TO_EOL: &str = "\x1b[K";

const MEDICINE: &str = "\x1b[1;32m";
const HEADING: &str = "\x1b[1;4m";

// ---------------------------------------------------------------------------
// AnsiStyler
// ---------------------------------------------------------------------------

/// Turns markup fragments and text units into terminal output.
///
/// Inline tags (`strong`, `em`, `code`, `del`, medicine spans, headings)
/// push a style that stays active until the matching close tag; block tags
/// become line breaks; entities are decoded.  Anything else is dropped.
#[derive(Debug, Default)]
pub struct AnsiStyler {
    stack: Vec<&'static str>,
}

impl AnsiStyler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminal text for one appended fragment.
    pub fn render(&mut self, fragment: &str) -> String {
        if is_whole_tag(fragment) {
            self.tag(fragment)
        } else {
            decode_text(fragment)
        }
    }

    /// Drop every active style.
    pub fn reset(&mut self) -> String {
        self.stack.clear();
        RESET.to_string()
    }

    fn tag(&mut self, tag: &str) -> String {
        let Some((name, closing)) = tag_name(tag) else {
            return String::new();
        };
        let name = name.to_ascii_lowercase();

        match (name.as_str(), closing) {
            ("strong" | "b", false) => self.push(BOLD),
            ("em" | "i", false) => self.push(ITALIC),
            ("code", false) => self.push(CYAN),
            ("del" | "s", false) => self.push(STRIKE),
            ("blockquote", false) => self.push(DIM),
            ("span", false) if is_medicine(tag) => self.push(MEDICINE),
            ("span", false) => self.push(""),
            ("h1" | "h2" | "h3" | "h4" | "h5" | "h6", false) => self.push(HEADING),
            ("strong" | "b" | "em" | "i" | "code" | "del" | "s" | "span", true) => self.pop(),
            ("blockquote", true) => self.pop() + "\n",
            ("h1" | "h2" | "h3" | "h4" | "h5" | "h6", true) => self.pop() + "\n\n",
            ("p", true) => "\n\n".to_string(),
            ("br", _) | ("pre" | "ul" | "ol" | "li" | "tr", true) => "\n".to_string(),
            ("li", false) => "  • ".to_string(),
            ("td" | "th", true) => "\t".to_string(),
            ("hr", _) => "────────\n".to_string(),
            _ => String::new(),
        }
    }

    fn push(&mut self, style: &'static str) -> String {
        self.stack.push(style);
        style.to_string()
    }

    /// Close the innermost style and re-apply the ones still open.
    fn pop(&mut self) -> String {
        self.stack.pop();
        format!("{RESET}{}", self.stack.concat())
    }
}

fn is_whole_tag(fragment: &str) -> bool {
    fragment.len() > 1
        && fragment.starts_with('<')
        && tag_regex()
            .find(fragment)
            .is_some_and(|m| m.start() == 0 && m.end() == fragment.len())
}

fn is_medicine(tag: &str) -> bool {
    tag.contains(&format!("class=\"{MEDICINE_CLASS}\""))
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// `text` with HTML entities replaced by the characters they stand for.
/// Unknown entities are kept as written.
pub fn decode_text(text: &str) -> String {
    reveal_units(text)
        .into_iter()
        .map(|unit| match decode_entity(unit) {
            Some(c) => c.to_string(),
            None => unit.to_string(),
        })
        .collect()
}

fn decode_entity(unit: &str) -> Option<char> {
    let name = unit.strip_prefix('&')?.strip_suffix(';')?;
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(|c| c == 'x' || c == 'X') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
