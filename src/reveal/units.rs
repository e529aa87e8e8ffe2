//! Splitting a text run into reveal units.

use std::sync::OnceLock;

use regex::Regex;

fn entity_regex() -> &'static Regex {
    static ENTITY: OnceLock<Regex> = OnceLock::new();
    ENTITY.get_or_init(|| {
        Regex::new(r"&(?:#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});")
            .expect("entity pattern is a valid regex")
    })
}

/// Units of `text` in reveal order: each character on its own, except that
/// an HTML entity (`&amp;`, `&#39;`, `&#x2014;`) is a single unit.
///
/// Concatenating the units gives back `text`.
///
/// ```
/// use medchat::reveal::reveal_units;
///
/// assert_eq!(reveal_units("a&amp;b"), ["a", "&amp;", "b"]);
/// ```
pub fn reveal_units(text: &str) -> Vec<&str> {
    let mut units = Vec::with_capacity(text.len());
    let mut last = 0;

    for entity in entity_regex().find_iter(text) {
        push_chars(&text[last..entity.start()], &mut units);
        units.push(entity.as_str());
        last = entity.end();
    }
    push_chars(&text[last..], &mut units);

    units
}

fn push_chars<'a>(text: &'a str, units: &mut Vec<&'a str>) {
    let mut indices = text.char_indices().peekable();
    while let Some((start, _)) = indices.next() {
        let end = indices.peek().map(|(i, _)| *i).unwrap_or(text.len());
        units.push(&text[start..end]);
    }
}
