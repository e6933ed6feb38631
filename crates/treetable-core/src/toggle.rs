#![forbid(unsafe_code)]

//! Opening and closing a single branch.
//!
//! Closing hides the whole descendant span and resets every descendant's
//! `open` flag, so reopening later always starts fully collapsed. Opening
//! reveals direct children only; grandchildren stay hidden until their own
//! parent is opened (or [`expand_all`](crate::toggle_all::expand_all) runs).
//!
//! After either direction every `open` flag is re-derived from child
//! visibility.

use crate::row_index::RowIndex;
use crate::visibility::VisibilityStore;

/// What a [`toggle_branch`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The branch was opened; `revealed` direct children became visible.
    Opened { revealed: usize },
    /// The branch was closed; `hidden` descendants were hidden.
    Closed { hidden: usize },
    /// Out-of-range row or a row without children.
    Ignored,
}

impl ToggleOutcome {
    #[must_use]
    pub fn applied(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Open or close the branch rooted at `row`.
///
/// A row without children is left alone. Opening a row that is itself hidden
/// first reveals its ancestor chain so the ancestor invariant keeps holding.
pub fn toggle_branch(
    index: &RowIndex,
    store: &mut VisibilityStore,
    row: usize,
    open: bool,
) -> ToggleOutcome {
    if !index.has_children(row) {
        tracing::debug!(target: "treetable.toggle", row, open, "ignored: no children");
        return ToggleOutcome::Ignored;
    }

    let outcome = if open {
        if !store.is_visible(row) {
            reveal_ancestors(index, store, row);
            store.set_visible(row, true);
        }
        let depth = index.depth(row);
        let mut revealed = 0usize;
        for child in index.descendant_span(row) {
            if index.depth(child) == depth + 1 {
                store.set_visible(child, true);
                revealed += 1;
            }
        }
        ToggleOutcome::Opened { revealed }
    } else {
        let span = index.descendant_span(row);
        let hidden = span.len();
        for descendant in span {
            store.set(descendant, false, false);
        }
        ToggleOutcome::Closed { hidden }
    };
    store.set_open(row, open);
    store.recompute_open(index);

    tracing::debug!(
        target: "treetable.toggle",
        row,
        action = if open { "expand" } else { "collapse" },
        ?outcome,
        "branch toggled"
    );
    outcome
}

/// Make every ancestor of `row` visible and open.
pub(crate) fn reveal_ancestors(index: &RowIndex, store: &mut VisibilityStore, row: usize) {
    for ancestor in index.ancestors(row) {
        if store.is_visible(ancestor) && store.is_open(ancestor) {
            // Everything above an open, visible row is already revealed.
            break;
        }
        store.set(ancestor, true, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    //   0 A
    //   1 ├ B
    //   2 │ ├ C
    //   3 │ └ D
    //   4 └ E
    //   5 F
    fn fixture() -> (RowIndex, VisibilityStore) {
        let idx = RowIndex::from_markers([0, 1, 2, 2, 1, 0].map(Some));
        let store = VisibilityStore::initial(&idx, false);
        (idx, store)
    }

    fn visible(store: &VisibilityStore) -> Vec<usize> {
        (0..store.len()).filter(|&r| store.is_visible(r)).collect()
    }

    #[test]
    fn open_reveals_direct_children_only() {
        let (idx, mut store) = fixture();
        let outcome = toggle_branch(&idx, &mut store, 0, true);
        assert_eq!(outcome, ToggleOutcome::Opened { revealed: 2 });
        assert_eq!(visible(&store), vec![0, 1, 4, 5]);
        assert!(store.is_open(0));
        assert!(!store.is_open(1));
        assert!(store.check_invariant(&idx).is_ok());
    }

    #[test]
    fn close_hides_span_and_resets_sub_expansion() {
        let (idx, mut store) = fixture();
        toggle_branch(&idx, &mut store, 0, true);
        toggle_branch(&idx, &mut store, 1, true);
        assert_eq!(visible(&store), vec![0, 1, 2, 3, 4, 5]);

        let outcome = toggle_branch(&idx, &mut store, 0, false);
        assert_eq!(outcome, ToggleOutcome::Closed { hidden: 4 });
        assert_eq!(visible(&store), vec![0, 5]);
        assert!(!store.is_open(0));
        assert!(!store.is_open(1));

        // Reopening does not bring back B's expansion.
        toggle_branch(&idx, &mut store, 0, true);
        assert_eq!(visible(&store), vec![0, 1, 4, 5]);
        assert!(!store.is_open(1));
    }

    #[test]
    fn collapse_is_idempotent() {
        let (idx, mut store) = fixture();
        toggle_branch(&idx, &mut store, 0, true);
        toggle_branch(&idx, &mut store, 1, true);
        toggle_branch(&idx, &mut store, 0, false);
        let once = store.clone();
        toggle_branch(&idx, &mut store, 0, false);
        assert_eq!(store, once);
    }

    #[test]
    fn leaf_and_out_of_range_are_ignored() {
        let (idx, mut store) = fixture();
        let before = store.clone();
        assert_eq!(toggle_branch(&idx, &mut store, 5, true), ToggleOutcome::Ignored);
        assert_eq!(toggle_branch(&idx, &mut store, 42, true), ToggleOutcome::Ignored);
        assert!(!ToggleOutcome::Ignored.applied());
        assert_eq!(store, before);
    }

    #[test]
    fn opening_hidden_branch_reveals_its_ancestors() {
        let (idx, mut store) = fixture();
        toggle_branch(&idx, &mut store, 1, true);
        assert_eq!(visible(&store), vec![0, 1, 2, 3, 5]);
        assert!(store.is_open(0));
        assert!(store.is_open(1));
        assert!(store.check_invariant(&idx).is_ok());
    }

    #[test]
    fn open_flag_follows_child_visibility() {
        let (idx, mut store) = fixture();
        toggle_branch(&idx, &mut store, 0, true);
        toggle_branch(&idx, &mut store, 1, true);
        toggle_branch(&idx, &mut store, 1, false);
        assert!(store.is_open(0));
        assert!(!store.is_open(1));
        assert_eq!(visible(&store), vec![0, 1, 4, 5]);
    }
}
