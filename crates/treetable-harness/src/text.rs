#![forbid(unsafe_code)]

//! Plain-text rendering of a [`PageModel`].
//!
//! Visible rows are drawn as an indented tree with guide characters. Rows
//! with a toggle button show `[-]` when open and `[+]` when closed. Cell
//! markup is reduced to its text; highlight marks are shown as `«…»`.
//!
//! ```text
//! [collapse all]
//! [-] Europe | 2 countries
//! ├── [+] France | Paris
//! └── Spain | Madrid
//! [+] Asia | 1 country
//! ```

use treetable_core::RowIndex;
use treetable_core::markup::{CellMarkup, MARK_CLOSE};

use crate::page::PageModel;

/// Guide character styles for tree rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeGuides {
    /// ASCII guides: `|`, `+--`, `` `-- ``.
    Ascii,
    /// Unicode box-drawing characters (default).
    #[default]
    Unicode,
    /// Rounded Unicode characters.
    Rounded,
}

impl TreeGuides {
    /// Vertical continuation (ancestor has siblings below).
    #[must_use]
    pub const fn vertical(&self) -> &str {
        match self {
            Self::Ascii => "|   ",
            Self::Unicode | Self::Rounded => "\u{2502}   ",
        }
    }

    /// Branch guide (row has siblings below).
    #[must_use]
    pub const fn branch(&self) -> &str {
        match self {
            Self::Ascii => "+-- ",
            Self::Unicode | Self::Rounded => "\u{251C}\u{2500}\u{2500} ",
        }
    }

    /// Last-row guide (no siblings below).
    #[must_use]
    pub const fn last(&self) -> &str {
        match self {
            Self::Ascii => "`-- ",
            Self::Unicode => "\u{2514}\u{2500}\u{2500} ",
            Self::Rounded => "\u{2570}\u{2500}\u{2500} ",
        }
    }

    /// Empty indentation.
    #[must_use]
    pub const fn space(&self) -> &str {
        "    "
    }
}

/// Draws a page as text.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    guides: TreeGuides,
    chrome: bool,
    separator: String,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            guides: TreeGuides::default(),
            chrome: true,
            separator: " | ".to_owned(),
        }
    }
}

impl TextRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn guides(mut self, guides: TreeGuides) -> Self {
        self.guides = guides;
        self
    }

    /// Include the global toggle, reset and no-results lines.
    #[must_use]
    pub fn chrome(mut self, on: bool) -> Self {
        self.chrome = on;
        self
    }

    #[must_use]
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Render every visible row of `page`, using `index` for structure.
    #[must_use]
    pub fn render(&self, index: &RowIndex, page: &PageModel) -> String {
        let mut lines = Vec::new();
        if self.chrome {
            let toggle = if page.any_expanded() {
                "[collapse all]"
            } else {
                "[expand all]"
            };
            if page.reset_button_visible() {
                lines.push(format!("{toggle} [reset search]"));
            } else {
                lines.push(toggle.to_owned());
            }
        }

        for row in page.visible_rows() {
            let mut line = self.prefix(index, page, row);
            match page.button(row) {
                Some(true) if index.has_children(row) => line.push_str("[-] "),
                Some(false) if index.has_children(row) => line.push_str("[+] "),
                _ => {}
            }
            let cells: Vec<String> = page.cells(row).iter().map(|c| display_text(c)).collect();
            line.push_str(&cells.join(&self.separator));
            lines.push(line);
        }

        if self.chrome && page.no_results_visible() {
            lines.push("(no results)".to_owned());
        }
        lines.join("\n")
    }

    fn prefix(&self, index: &RowIndex, page: &PageModel, row: usize) -> String {
        if index.is_root(row) {
            return String::new();
        }
        // Ancestors below the root, outermost first.
        let mut chain: Vec<usize> = index.ancestors(row).filter(|&a| !index.is_root(a)).collect();
        chain.reverse();

        let mut prefix = String::new();
        for ancestor in chain {
            if has_visible_sibling_below(index, page, ancestor) {
                prefix.push_str(self.guides.vertical());
            } else {
                prefix.push_str(self.guides.space());
            }
        }
        if has_visible_sibling_below(index, page, row) {
            prefix.push_str(self.guides.branch());
        } else {
            prefix.push_str(self.guides.last());
        }
        prefix
    }
}

fn has_visible_sibling_below(index: &RowIndex, page: &PageModel, row: usize) -> bool {
    index.parent(row).is_some_and(|parent| {
        index
            .children(parent)
            .iter()
            .any(|&sibling| sibling > row && page.is_visible(sibling))
    })
}

/// Text of a cell with highlight marks shown as `«…»` and other tags dropped.
#[must_use]
pub fn display_text(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;
    while let Some(start) = rest.find("<mark") {
        out.push_str(&rest[..start]);
        let after = &rest[start..];
        match after.find('>') {
            Some(end) => {
                out.push('\u{ab}');
                rest = &after[end + 1..];
            }
            None => {
                rest = after;
                break;
            }
        }
    }
    out.push_str(rest);
    let out = out.replace(MARK_CLOSE, "\u{bb}");
    CellMarkup::parse(out).plain_text().to_owned()
}
