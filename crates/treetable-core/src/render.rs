#![forbid(unsafe_code)]

//! The boundary to the presentation layer.
//!
//! The engine never reads visibility back from the renderer; it pushes state
//! through [`RenderSink`]. [`Presenter`] remembers what was last pushed and
//! only emits differences after the first full push.

use crate::row_index::RowIndex;
use crate::search::CellUpdate;
use crate::visibility::VisibilityStore;

/// Receives presentation updates from the engine.
pub trait RenderSink {
    /// Show or hide a row.
    fn set_row_visible(&mut self, row: usize, visible: bool);

    /// Replace a cell's markup (highlight applied or removed).
    fn set_cell_markup(&mut self, row: usize, column: usize, markup: &str);

    /// Open/closed state of a row's toggle button. Only rows with children
    /// have a button.
    fn set_button_state(&mut self, row: usize, open: bool);

    /// Global toggle icon: `true` when anything below the roots is showing.
    fn set_global_toggle_icon(&mut self, any_expanded: bool);

    /// Show or hide the "no results" indicator.
    fn set_no_results_visible(&mut self, visible: bool);

    /// Show or hide the search reset affordance.
    fn set_reset_button_visible(&mut self, visible: bool);
}

impl<S: RenderSink + ?Sized> RenderSink for &mut S {
    fn set_row_visible(&mut self, row: usize, visible: bool) {
        (**self).set_row_visible(row, visible);
    }

    fn set_cell_markup(&mut self, row: usize, column: usize, markup: &str) {
        (**self).set_cell_markup(row, column, markup);
    }

    fn set_button_state(&mut self, row: usize, open: bool) {
        (**self).set_button_state(row, open);
    }

    fn set_global_toggle_icon(&mut self, any_expanded: bool) {
        (**self).set_global_toggle_icon(any_expanded);
    }

    fn set_no_results_visible(&mut self, visible: bool) {
        (**self).set_no_results_visible(visible);
    }

    fn set_reset_button_visible(&mut self, visible: bool) {
        (**self).set_reset_button_visible(visible);
    }
}

/// A sink that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn set_row_visible(&mut self, _row: usize, _visible: bool) {}
    fn set_cell_markup(&mut self, _row: usize, _column: usize, _markup: &str) {}
    fn set_button_state(&mut self, _row: usize, _open: bool) {}
    fn set_global_toggle_icon(&mut self, _any_expanded: bool) {}
    fn set_no_results_visible(&mut self, _visible: bool) {}
    fn set_reset_button_visible(&mut self, _visible: bool) {}
}

/// Indicator state outside the rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Chrome {
    pub any_expanded: bool,
    pub no_results: bool,
    pub reset_visible: bool,
}

/// Change-only pusher of store state to a [`RenderSink`].
#[derive(Debug, Clone, Default)]
pub struct Presenter {
    visible: Vec<Option<bool>>,
    buttons: Vec<Option<bool>>,
    chrome: Option<Chrome>,
}

impl Presenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything pushed so far; the next [`present`](Self::present)
    /// pushes full state.
    pub fn invalidate(&mut self) {
        self.visible.clear();
        self.buttons.clear();
        self.chrome = None;
    }

    /// Push row visibility, button states and chrome that differ from the
    /// last push. Returns the number of sink calls made.
    pub fn present<S: RenderSink + ?Sized>(
        &mut self,
        index: &RowIndex,
        store: &VisibilityStore,
        chrome: Chrome,
        sink: &mut S,
    ) -> usize {
        let rows = store.len();
        if self.visible.len() != rows {
            self.visible = vec![None; rows];
            self.buttons = vec![None; rows];
        }

        let mut calls = 0usize;
        for (row, state) in store.rows().iter().enumerate() {
            if self.visible[row] != Some(state.visible) {
                sink.set_row_visible(row, state.visible);
                self.visible[row] = Some(state.visible);
                calls += 1;
            }
            if index.has_children(row) && self.buttons[row] != Some(state.open) {
                sink.set_button_state(row, state.open);
                self.buttons[row] = Some(state.open);
                calls += 1;
            }
        }

        let last = self.chrome;
        if last.map(|c| c.any_expanded) != Some(chrome.any_expanded) {
            sink.set_global_toggle_icon(chrome.any_expanded);
            calls += 1;
        }
        if last.map(|c| c.no_results) != Some(chrome.no_results) {
            sink.set_no_results_visible(chrome.no_results);
            calls += 1;
        }
        if last.map(|c| c.reset_visible) != Some(chrome.reset_visible) {
            sink.set_reset_button_visible(chrome.reset_visible);
            calls += 1;
        }
        self.chrome = Some(chrome);
        calls
    }

    /// Push cell markup changes. Cells are not diffed here; the search
    /// engine already reports only real changes.
    pub fn push_cells<S: RenderSink + ?Sized>(&mut self, updates: &[CellUpdate], sink: &mut S) {
        for update in updates {
            sink.set_cell_markup(update.row, update.column, &update.markup);
        }
    }
}
