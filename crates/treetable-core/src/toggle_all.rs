#![forbid(unsafe_code)]

//! Global expand/collapse.
//!
//! These functions operate on the unfiltered tree; clearing an active search
//! first is the caller's job (see [`TreeTable::toggle_all`](crate::engine::TreeTable::toggle_all)).

use crate::row_index::RowIndex;
use crate::visibility::VisibilityStore;

/// Which way a global toggle goes from the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAllAction {
    Expand,
    Collapse,
}

/// Whether anything below the roots is showing. Drives the global toggle icon.
#[must_use]
pub fn any_expanded(index: &RowIndex, store: &VisibilityStore) -> bool {
    store.any_non_root_visible(index)
}

/// Collapse when anything below the roots is showing, otherwise expand.
#[must_use]
pub fn next_action(index: &RowIndex, store: &VisibilityStore) -> ToggleAllAction {
    if any_expanded(index, store) {
        ToggleAllAction::Collapse
    } else {
        ToggleAllAction::Expand
    }
}

/// Apply `action` to the whole table.
pub fn apply(index: &RowIndex, store: &mut VisibilityStore, action: ToggleAllAction) {
    match action {
        ToggleAllAction::Expand => expand_all(index, store),
        ToggleAllAction::Collapse => collapse_all(index, store),
    }
}

/// Make every row visible regardless of depth.
pub fn expand_all(index: &RowIndex, store: &mut VisibilityStore) {
    for row in 0..store.len() {
        store.set_visible(row, true);
    }
    store.recompute_open(index);
    tracing::debug!(
        target: "treetable.toggle",
        action = "expand_all",
        rows = store.len(),
        "all rows expanded"
    );
}

/// Collapse to roots only; same result as closing every root branch.
pub fn collapse_all(index: &RowIndex, store: &mut VisibilityStore) {
    for row in 0..store.len() {
        store.set(row, index.is_root(row), false);
    }
    tracing::debug!(
        target: "treetable.toggle",
        action = "collapse_all",
        rows = store.len(),
        "all rows collapsed"
    );
}
