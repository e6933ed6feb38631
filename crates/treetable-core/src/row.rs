#![forbid(unsafe_code)]

//! Input rows as handed over by the row source.
//!
//! A row carries a raw depth marker and its cells' markup. The marker is kept
//! raw here; [`RowIndex`](crate::row_index::RowIndex) decides how a missing,
//! negative, or out-of-sequence marker is coerced.

/// Class prefix that carries a row's depth, e.g. `level-2`.
pub const LEVEL_CLASS_PREFIX: &str = "level-";

/// One entry in the flat, pre-order row sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    depth: Option<i64>,
    cells: Vec<String>,
}

impl Row {
    /// Create a row with an explicit depth tag.
    #[must_use]
    pub fn new<I, S>(depth: i64, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            depth: Some(depth),
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a row without a depth marker. It will be treated as a root.
    #[must_use]
    pub fn unmarked<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            depth: None,
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a row from a whitespace-separated class list.
    ///
    /// The first class starting with `level-` supplies the depth. A missing
    /// class, or one whose suffix is not an integer, leaves the marker unset.
    ///
    /// ```
    /// use treetable_core::row::Row;
    ///
    /// let row = Row::from_classes("row level-2 muted", ["Widgets"]);
    /// assert_eq!(row.depth_marker(), Some(2));
    ///
    /// let row = Row::from_classes("level-x", ["Broken"]);
    /// assert_eq!(row.depth_marker(), None);
    /// ```
    #[must_use]
    pub fn from_classes<I, S>(classes: &str, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            depth: parse_level_class(classes),
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    /// Raw depth marker, before coercion.
    #[must_use]
    pub fn depth_marker(&self) -> Option<i64> {
        self.depth
    }

    /// Cell markup in column order.
    #[must_use]
    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

/// Extract the depth from the first `level-N` class in a class list.
#[must_use]
pub fn parse_level_class(classes: &str) -> Option<i64> {
    let class = classes
        .split_whitespace()
        .find(|c| c.starts_with(LEVEL_CLASS_PREFIX))?;
    class[LEVEL_CLASS_PREFIX.len()..].parse().ok()
}
