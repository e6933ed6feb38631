#![forbid(unsafe_code)]

//! Per-row visibility and expansion flags.
//!
//! [`VisibilityStore`] is the single source of truth for what the table
//! shows. It is only ever pushed to the renderer, never inferred from it.
//!
//! # Invariant
//!
//! A row is visible only if every ancestor on its path to a root is both
//! visible and open. [`VisibilityStore::check_invariant`] verifies it.

use serde::{Deserialize, Serialize};

use crate::error::{InvariantViolation, RestoreError};
use crate::row_index::RowIndex;

/// Flags for one row.
///
/// `open` is only meaningful for rows with children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowState {
    pub visible: bool,
    pub open: bool,
}

impl RowState {
    #[must_use]
    pub const fn new(visible: bool, open: bool) -> Self {
        Self { visible, open }
    }
}

/// Row flags aligned by row index, detached from any store.
///
/// Used both for the pre-search snapshot and for persisted state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedState {
    rows: Vec<RowState>,
}

impl PersistedState {
    #[must_use]
    pub fn new(rows: Vec<RowState>) -> Self {
        Self { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[RowState] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Mutable per-row flags for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityStore {
    rows: Vec<RowState>,
}

impl VisibilityStore {
    /// All rows hidden and closed.
    #[must_use]
    pub fn hidden(len: usize) -> Self {
        Self {
            rows: vec![RowState::default(); len],
        }
    }

    /// Default initial layout: roots visible, everything else hidden, unless
    /// `start_expanded` makes every row visible. `open` flags are derived.
    #[must_use]
    pub fn initial(index: &RowIndex, start_expanded: bool) -> Self {
        let mut store = Self::hidden(index.len());
        store.reset_to_initial(index, start_expanded);
        store
    }

    /// Recompute the default initial layout in place.
    pub fn reset_to_initial(&mut self, index: &RowIndex, start_expanded: bool) {
        for (row, state) in self.rows.iter_mut().enumerate() {
            state.visible = start_expanded || index.is_root(row);
            state.open = false;
        }
        self.recompute_open(index);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Flags for `row`, if in range.
    #[must_use]
    pub fn get(&self, row: usize) -> Option<RowState> {
        self.rows.get(row).copied()
    }

    /// Whether `row` is visible. Out-of-range rows are not.
    #[must_use]
    pub fn is_visible(&self, row: usize) -> bool {
        self.rows.get(row).is_some_and(|s| s.visible)
    }

    /// Whether `row` is open. Out-of-range rows are not.
    #[must_use]
    pub fn is_open(&self, row: usize) -> bool {
        self.rows.get(row).is_some_and(|s| s.open)
    }

    /// Overwrite both flags of `row`. Out-of-range rows are ignored.
    pub fn set(&mut self, row: usize, visible: bool, open: bool) {
        if let Some(state) = self.rows.get_mut(row) {
            *state = RowState { visible, open };
        }
    }

    pub fn set_visible(&mut self, row: usize, visible: bool) {
        if let Some(state) = self.rows.get_mut(row) {
            state.visible = visible;
        }
    }

    pub fn set_open(&mut self, row: usize, open: bool) {
        if let Some(state) = self.rows.get_mut(row) {
            state.open = open;
        }
    }

    /// All row flags in order.
    #[must_use]
    pub fn rows(&self) -> &[RowState] {
        &self.rows
    }

    /// Number of visible rows.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.rows.iter().filter(|s| s.visible).count()
    }

    /// Whether any row that is not a root is visible.
    #[must_use]
    pub fn any_non_root_visible(&self, index: &RowIndex) -> bool {
        self.rows
            .iter()
            .enumerate()
            .any(|(row, s)| s.visible && !index.is_root(row))
    }

    /// Derive every `open` flag as "has at least one visible direct child".
    ///
    /// Deriving instead of storing keeps button state and child visibility
    /// from drifting apart.
    pub fn recompute_open(&mut self, index: &RowIndex) {
        for state in &mut self.rows {
            state.open = false;
        }
        for row in 0..self.rows.len() {
            if !self.rows[row].visible {
                continue;
            }
            if let Some(parent) = index.parent(row) {
                self.rows[parent].open = true;
            }
        }
    }

    /// Copy of the current flags.
    #[must_use]
    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            rows: self.rows.clone(),
        }
    }

    /// Replace the current flags with `snapshot`.
    ///
    /// Rejected, leaving the store untouched, when the snapshot length does
    /// not match the row count.
    pub fn restore(&mut self, snapshot: &PersistedState) -> Result<(), RestoreError> {
        if snapshot.rows.len() != self.rows.len() {
            return Err(RestoreError {
                expected: self.rows.len(),
                found: snapshot.rows.len(),
            });
        }
        self.rows.copy_from_slice(&snapshot.rows);
        Ok(())
    }

    /// Verify the ancestor-visibility invariant.
    ///
    /// # Panics
    ///
    /// Panics if `index` has fewer rows than the store.
    pub fn check_invariant(&self, index: &RowIndex) -> Result<(), InvariantViolation> {
        for (row, state) in self.rows.iter().enumerate() {
            if !state.visible {
                continue;
            }
            // The parent is itself checked against its own parent.
            if let Some(parent) = index.parent(row) {
                let p = self.rows[parent];
                if !(p.visible && p.open) {
                    return Err(InvariantViolation {
                        row,
                        ancestor: parent,
                    });
                }
            }
        }
        Ok(())
    }
}
