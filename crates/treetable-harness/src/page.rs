#![forbid(unsafe_code)]

//! An in-memory stand-in for the rendered page.
//!
//! [`PageModel`] applies every [`RenderSink`] call to its own copy of the
//! page and keeps a command log. Because the engine only ever pushes
//! differences, comparing the page against the engine's store after each
//! operation checks that nothing was dropped along the way.

use treetable_core::{RenderSink, Row, VisibilityStore};

/// One call received through [`RenderSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCommand {
    RowVisible { row: usize, visible: bool },
    CellMarkup { row: usize, column: usize, markup: String },
    ButtonState { row: usize, open: bool },
    GlobalToggleIcon { any_expanded: bool },
    NoResultsVisible(bool),
    ResetButtonVisible(bool),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PageRow {
    visible: bool,
    button: Option<bool>,
    cells: Vec<String>,
}

/// Page state as the renderer would show it.
#[derive(Debug, Clone, Default)]
pub struct PageModel {
    rows: Vec<PageRow>,
    any_expanded: bool,
    no_results: bool,
    reset_visible: bool,
    log: Vec<SinkCommand>,
    rejected: usize,
}

/// A row where the page and the engine disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Divergence {
    pub row: usize,
    pub page_visible: bool,
    pub store_visible: bool,
}

impl PageModel {
    /// A page showing `rows` with their original markup. Every row starts
    /// visible, as server-rendered markup would, until the engine says
    /// otherwise.
    #[must_use]
    pub fn new(rows: &[Row]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|row| PageRow {
                    visible: true,
                    button: None,
                    cells: row.cells().to_vec(),
                })
                .collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn is_visible(&self, row: usize) -> bool {
        self.rows.get(row).is_some_and(|r| r.visible)
    }

    /// Button state last pushed for `row`; `None` if the row never got one.
    #[must_use]
    pub fn button(&self, row: usize) -> Option<bool> {
        self.rows.get(row).and_then(|r| r.button)
    }

    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.cells.get(column).map(String::as_str)
    }

    #[must_use]
    pub fn cells(&self, row: usize) -> &[String] {
        self.rows.get(row).map_or(&[], |r| r.cells.as_slice())
    }

    #[must_use]
    pub fn visible_rows(&self) -> Vec<usize> {
        (0..self.rows.len()).filter(|&r| self.rows[r].visible).collect()
    }

    #[must_use]
    pub fn any_expanded(&self) -> bool {
        self.any_expanded
    }

    #[must_use]
    pub fn no_results_visible(&self) -> bool {
        self.no_results
    }

    #[must_use]
    pub fn reset_button_visible(&self) -> bool {
        self.reset_visible
    }

    /// Every command received so far.
    #[must_use]
    pub fn log(&self) -> &[SinkCommand] {
        &self.log
    }

    /// Drain the command log, keeping page state.
    pub fn take_log(&mut self) -> Vec<SinkCommand> {
        std::mem::take(&mut self.log)
    }

    /// Commands that addressed a row or cell the page does not have.
    #[must_use]
    pub fn rejected_commands(&self) -> usize {
        self.rejected
    }

    /// Rows whose visibility differs between the page and `store`.
    #[must_use]
    pub fn divergences(&self, store: &VisibilityStore) -> Vec<Divergence> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(row, page)| {
                let store_visible = store.is_visible(row);
                (page.visible != store_visible).then_some(Divergence {
                    row,
                    page_visible: page.visible,
                    store_visible,
                })
            })
            .collect()
    }

    fn reject(&mut self, what: &'static str, row: usize) {
        self.rejected += 1;
        tracing::warn!(target: "treetable.harness", what, row, "command for unknown row");
    }
}

impl RenderSink for PageModel {
    fn set_row_visible(&mut self, row: usize, visible: bool) {
        self.log.push(SinkCommand::RowVisible { row, visible });
        match self.rows.get_mut(row) {
            Some(r) => r.visible = visible,
            None => self.reject("row_visible", row),
        }
    }

    fn set_cell_markup(&mut self, row: usize, column: usize, markup: &str) {
        self.log.push(SinkCommand::CellMarkup {
            row,
            column,
            markup: markup.to_owned(),
        });
        match self.rows.get_mut(row).and_then(|r| r.cells.get_mut(column)) {
            Some(cell) => markup.clone_into(cell),
            None => self.reject("cell_markup", row),
        }
    }

    fn set_button_state(&mut self, row: usize, open: bool) {
        self.log.push(SinkCommand::ButtonState { row, open });
        match self.rows.get_mut(row) {
            Some(r) => r.button = Some(open),
            None => self.reject("button_state", row),
        }
    }

    fn set_global_toggle_icon(&mut self, any_expanded: bool) {
        self.log.push(SinkCommand::GlobalToggleIcon { any_expanded });
        self.any_expanded = any_expanded;
    }

    fn set_no_results_visible(&mut self, visible: bool) {
        self.log.push(SinkCommand::NoResultsVisible(visible));
        self.no_results = visible;
    }

    fn set_reset_button_visible(&mut self, visible: bool) {
        self.log.push(SinkCommand::ResetButtonVisible(visible));
        self.reset_visible = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_commands_and_logs_them() {
        let mut page = PageModel::new(&[Row::new(0, ["a", "b"])]);
        assert!(page.is_visible(0));
        page.set_row_visible(0, false);
        page.set_cell_markup(0, 1, "<mark>b</mark>");
        page.set_button_state(0, true);
        assert!(!page.is_visible(0));
        assert_eq!(page.cell(0, 1), Some("<mark>b</mark>"));
        assert_eq!(page.button(0), Some(true));
        assert_eq!(page.log().len(), 3);
        assert_eq!(page.take_log().len(), 3);
        assert!(page.log().is_empty());
    }

    #[test]
    fn unknown_rows_are_counted_not_applied() {
        let mut page = PageModel::new(&[Row::new(0, ["a"])]);
        page.set_row_visible(3, false);
        page.set_cell_markup(0, 5, "x");
        assert_eq!(page.rejected_commands(), 2);
        assert!(page.is_visible(0));
    }
}
