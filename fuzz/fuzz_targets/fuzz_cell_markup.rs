#![no_main]

use libfuzzer_sys::fuzz_target;
use treetable_core::markup::{CellMarkup, Highlighter};

// Markup never contains NUL (it is the term separator), so every NUL in
// the output belongs to an inserted open tag.
const OPEN: &str = "<mark data-fuzz=\"\0\">";

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Cap length to keep fuzzing fast.
    if text.len() > 2048 {
        return;
    }

    // Input is "<markup>\0<term>"; without a separator the whole input is
    // markup and its first char is the term.
    let (markup, term) = match text.split_once('\0') {
        Some((markup, term)) => (markup, term.to_owned()),
        None => (text, text.chars().take(1).collect()),
    };

    // Parsing and lookups must never panic.
    let cell = CellMarkup::parse(markup);
    assert_eq!(cell.source(), markup);
    let _ = cell.contains_lowered(&treetable_core::markup::lower_chars(&term));

    let highlighter = Highlighter::with_open_tag(OPEN);
    let Some(highlighted) = cell.highlight(&highlighter, &term) else {
        return;
    };
    assert!(highlighted.contains(OPEN));
    let close = highlighter.close_tag();

    // Marks are only ever inserted: stripping them yields the source again.
    if !markup.contains(close) {
        assert_eq!(
            highlighted.matches(OPEN).count(),
            highlighted.matches(close).count(),
            "unbalanced marks"
        );
        let stripped = highlighted.replace(OPEN, "").replace(close, "");
        assert_eq!(stripped, markup);
    }
});
