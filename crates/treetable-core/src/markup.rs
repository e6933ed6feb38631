#![forbid(unsafe_code)]

//! Cell markup scanning and search-match highlighting.
//!
//! A cell's markup is scanned once into text units: each unit is one decoded
//! character together with the byte range of its source text (a plain
//! character or a whole entity). Tags and comments are skipped and split the
//! text into runs.
//!
//! Matching runs against the decoded plain text. Highlighting wraps matched
//! units in `<mark>` elements inside text runs only, so tag names and
//! attribute values are never touched. A match that crosses a tag boundary
//! gets one mark per run.
//!
//! ```
//! use treetable_core::markup::{CellMarkup, Highlighter};
//!
//! let cell = CellMarkup::parse("<b>Fish</b> &amp; Chips");
//! assert_eq!(cell.plain_text(), "Fish & Chips");
//!
//! let hl = Highlighter::with_open_tag("<mark>");
//! let out = cell.highlight(&hl, "sh & c").unwrap();
//! assert_eq!(out, "<b>Fi<mark>sh</mark></b><mark> &amp; C</mark>hips");
//! ```

use std::ops::Range;

/// Closing tag for the default highlight marks.
pub const MARK_CLOSE: &str = "</mark>";

/// Produces the opening and closing tags for highlight marks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlighter {
    open: String,
    close: String,
}

impl Highlighter {
    /// Mark with a background colour, matching the default table styling.
    #[must_use]
    pub fn new(color: &str) -> Self {
        Self {
            open: format!(
                "<mark style=\"background:{color};padding:0 2px;border-radius:2px\">"
            ),
            close: MARK_CLOSE.to_owned(),
        }
    }

    /// Mark with a caller-provided opening tag. The closing tag names the
    /// same element; `mark` when no element name can be read.
    #[must_use]
    pub fn with_open_tag(open: impl Into<String>) -> Self {
        let open = open.into();
        let name = element_name(&open).unwrap_or("mark");
        let close = format!("</{name}>");
        Self { open, close }
    }

    #[must_use]
    pub fn open_tag(&self) -> &str {
        &self.open
    }

    #[must_use]
    pub fn close_tag(&self) -> &str {
        &self.close
    }
}

fn element_name(open: &str) -> Option<&str> {
    let rest = open.strip_prefix('<')?;
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(rest.len());
    let name = &rest[..end];
    (!name.is_empty()).then_some(name)
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HIGHLIGHT_COLOR)
    }
}

#[derive(Debug, Clone)]
struct Unit {
    raw: Range<usize>,
}

/// A cell's pristine markup with its decoded plain text.
#[derive(Debug, Clone)]
pub struct CellMarkup {
    source: String,
    units: Vec<Unit>,
    plain: String,
    /// Lower-cased plain text, one entry per lowered char.
    lowered: Vec<char>,
    /// Unit that produced each entry of `lowered`.
    owner: Vec<usize>,
}

impl CellMarkup {
    /// Scan `source` markup.
    #[must_use]
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let mut units = Vec::new();
        let mut plain = String::new();
        let mut lowered = Vec::new();
        let mut owner = Vec::new();

        let bytes = source.as_bytes();
        let mut pos = 0usize;
        while pos < source.len() {
            let rest = &source[pos..];
            if rest.starts_with("<!--") {
                pos = rest
                    .find("-->")
                    .map_or(source.len(), |end| pos + end + "-->".len());
                continue;
            }
            if bytes[pos] == b'<'
                && let Some(end) = tag_end(rest)
            {
                pos += end;
                continue;
            }

            let (ch, len) = if bytes[pos] == b'&' {
                decode_entity(rest).unwrap_or(('&', 1))
            } else {
                // `pos` always sits on a char boundary.
                let ch = rest.chars().next().unwrap_or('\u{fffd}');
                (ch, ch.len_utf8())
            };

            let unit = units.len();
            units.push(Unit {
                raw: pos..pos + len,
            });
            plain.push(ch);
            for lower in ch.to_lowercase() {
                lowered.push(lower);
                owner.push(unit);
            }
            pos += len;
        }

        Self {
            source,
            units,
            plain,
            lowered,
            owner,
        }
    }

    /// Original markup, byte for byte.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Decoded text content.
    #[must_use]
    pub fn plain_text(&self) -> &str {
        &self.plain
    }

    /// Case-insensitive containment test against the plain text.
    ///
    /// `needle` must already be lower-cased with [`lower_chars`].
    #[must_use]
    pub fn contains_lowered(&self, needle: &[char]) -> bool {
        !needle.is_empty() && find(&self.lowered, needle, 0).is_some()
    }

    /// Markup with every non-overlapping case-insensitive occurrence of
    /// `term` wrapped in a mark. `None` when nothing matches.
    #[must_use]
    pub fn highlight(&self, highlighter: &Highlighter, term: &str) -> Option<String> {
        self.highlight_lowered(highlighter, &lower_chars(term))
    }

    /// [`highlight`](Self::highlight) with a pre-lowered term.
    #[must_use]
    pub fn highlight_lowered(&self, highlighter: &Highlighter, needle: &[char]) -> Option<String> {
        if needle.is_empty() {
            return None;
        }

        let mut match_of: Vec<Option<usize>> = vec![None; self.units.len()];
        let mut matches = 0usize;
        let mut from = 0usize;
        while let Some(start) = find(&self.lowered, needle, from) {
            let end = start + needle.len();
            let first = self.owner[start];
            let last = self.owner[end - 1];
            for slot in &mut match_of[first..=last] {
                slot.get_or_insert(matches);
            }
            matches += 1;
            from = end;
        }
        if matches == 0 {
            return None;
        }

        let mut out = String::with_capacity(self.source.len() + matches * 64);
        let mut cursor = 0usize;
        let mut open: Option<usize> = None;
        for (unit, current) in self.units.iter().zip(&match_of) {
            if unit.raw.start != cursor {
                // A tag or comment sits between the previous unit and this one.
                if open.take().is_some() {
                    out.push_str(highlighter.close_tag());
                }
                out.push_str(&self.source[cursor..unit.raw.start]);
            }
            if open != *current {
                if open.is_some() {
                    out.push_str(highlighter.close_tag());
                }
                if current.is_some() {
                    out.push_str(highlighter.open_tag());
                }
                open = *current;
            }
            out.push_str(&self.source[unit.raw.clone()]);
            cursor = unit.raw.end;
        }
        if open.is_some() {
            out.push_str(highlighter.close_tag());
        }
        out.push_str(&self.source[cursor..]);
        Some(out)
    }
}

/// Lower-case `text` char by char, the same way cell text is lowered.
#[must_use]
pub fn lower_chars(text: &str) -> Vec<char> {
    text.chars().flat_map(char::to_lowercase).collect()
}

fn find(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// Length of the tag starting at `rest[0] == '<'`, honouring quoted
/// attribute values. `None` for a lone `<` that never closes or is not
/// followed by a tag name.
fn tag_end(rest: &str) -> Option<usize> {
    let next = rest[1..].chars().next()?;
    if !(next.is_ascii_alphabetic() || next == '/' || next == '!' || next == '?') {
        return None;
    }
    let mut quote: Option<char> = None;
    for (i, ch) in rest.char_indices().skip(1) {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '>') => return Some(i + 1),
            (None, _) => {}
        }
    }
    None
}

/// Decode the entity at the start of `rest` (which begins with `&`).
fn decode_entity(rest: &str) -> Option<(char, usize)> {
    let (semi, _) = rest.char_indices().take(12).find(|&(_, c)| c == ';')?;
    let body = &rest[1..semi];
    let ch = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" | "#39" => '\'',
        "nbsp" => '\u{a0}',
        _ => {
            let num = body.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)?
        }
    };
    Some((ch, semi + 1))
}
