#![forbid(unsafe_code)]

//! Incremental text search over cell content.
//!
//! A search pass filters rows by case-insensitive substring match over each
//! cell's plain text, reveals the ancestor chain of every match, and
//! highlights matched text. Clearing the search either restores the layout
//! captured before the first keystroke or recomputes the default layout.
//!
//! # Lifecycle
//!
//! ```text
//!   inactive ──search("fo")──▶ active (snapshot captured)
//!   active ──search("foo")──▶ active (snapshot kept)
//!   active ──search("")────▶ inactive (snapshot consumed or discarded)
//!   inactive ──search("")──▶ inactive (default layout recomputed)
//! ```
//!
//! # Highlight bookkeeping
//!
//! Highlighted markup is always derived from the pristine markup cached at
//! construction, never from what is currently displayed, so repeated passes
//! cannot nest marks. The engine remembers which cells currently carry a
//! highlight and reports only cells whose markup actually changes.

use ahash::AHashMap;

use crate::config::TreeTableConfig;
use crate::markup::{CellMarkup, Highlighter, lower_chars};
use crate::row::Row;
use crate::row_index::RowIndex;
use crate::toggle::reveal_ancestors;
use crate::visibility::{PersistedState, VisibilityStore};

/// Search-related settings, extracted from [`TreeTableConfig`].
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub max_level: Option<usize>,
    pub highlight: bool,
    pub restore_on_clear: bool,
    pub start_expanded: bool,
    pub highlighter: Highlighter,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from(&TreeTableConfig::default())
    }
}

impl From<&TreeTableConfig> for SearchSettings {
    fn from(config: &TreeTableConfig) -> Self {
        Self {
            max_level: config.search_max_level,
            highlight: config.highlight_search_matches,
            restore_on_clear: config.restore_pre_search_state_on_clear,
            start_expanded: config.start_expanded,
            highlighter: Highlighter::new(&config.search_highlight_color),
        }
    }
}

/// New markup for one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub row: usize,
    pub column: usize,
    pub markup: String,
}

/// Result of a search or clear pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Rows whose own text matched, in row order.
    pub matches: Vec<usize>,
    /// Rows visible after the pass.
    pub visible_rows: usize,
    /// Show the "no results" indicator.
    pub no_results: bool,
    /// Show the reset affordance.
    pub reset_visible: bool,
    /// The pre-search snapshot was applied on clear.
    pub snapshot_restored: bool,
    /// Cells whose markup changed, in (row, column) order.
    pub cell_updates: Vec<CellUpdate>,
}

/// Filtering and highlighting state for one table.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    settings: SearchSettings,
    cells: Vec<Vec<CellMarkup>>,
    active: Option<String>,
    snapshot: Option<PersistedState>,
    highlighted: AHashMap<(usize, usize), String>,
}

impl SearchEngine {
    /// Cache the pristine markup of every cell.
    #[must_use]
    pub fn new(rows: &[Row], settings: SearchSettings) -> Self {
        let cells = rows
            .iter()
            .map(|row| row.cells().iter().map(CellMarkup::parse).collect())
            .collect();
        Self {
            settings,
            cells,
            active: None,
            snapshot: None,
            highlighted: AHashMap::new(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Whether a non-empty term is currently filtering the table.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// The active (trimmed) term.
    #[must_use]
    pub fn term(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Whether a pre-search snapshot is being held.
    #[must_use]
    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Cached pristine cell.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<&CellMarkup> {
        self.cells.get(row)?.get(column)
    }

    /// Markup the cell should currently display.
    #[must_use]
    pub fn current_markup(&self, row: usize, column: usize) -> Option<&str> {
        match self.highlighted.get(&(row, column)) {
            Some(markup) => Some(markup),
            None => self.cell(row, column).map(CellMarkup::source),
        }
    }

    /// Number of cells currently carrying a highlight.
    #[must_use]
    pub fn highlighted_cells(&self) -> usize {
        self.highlighted.len()
    }

    /// Run a search pass for `term`. An empty or whitespace-only term clears.
    pub fn search(
        &mut self,
        index: &RowIndex,
        store: &mut VisibilityStore,
        term: &str,
    ) -> SearchOutcome {
        let term = term.trim();
        if term.is_empty() {
            return self.clear(index, store);
        }

        if self.active.is_none() {
            self.snapshot = Some(store.snapshot());
        }
        self.active = Some(term.to_owned());

        let needle = lower_chars(term);
        let mut is_match = vec![false; index.len()];
        let mut matches = Vec::new();
        for (row, slot) in is_match.iter_mut().enumerate() {
            let eligible = self
                .settings
                .max_level
                .is_none_or(|max| index.depth(row) <= max);
            let hit = eligible
                && self
                    .cells
                    .get(row)
                    .is_some_and(|cells| cells.iter().any(|c| c.contains_lowered(&needle)));
            store.set(row, hit, false);
            if hit {
                *slot = true;
                matches.push(row);
            }
        }
        for &row in &matches {
            reveal_ancestors(index, store, row);
        }
        store.recompute_open(index);

        let cell_updates = if self.settings.highlight {
            self.update_highlights(&is_match, &needle)
        } else {
            Vec::new()
        };

        let visible_rows = store.visible_count();
        tracing::debug!(
            target: "treetable.search",
            term_len = term.chars().count(),
            matches = matches.len(),
            visible_rows,
            cell_updates = cell_updates.len(),
            "search pass"
        );

        SearchOutcome {
            matches,
            visible_rows,
            no_results: visible_rows == 0,
            reset_visible: true,
            snapshot_restored: false,
            cell_updates,
        }
    }

    /// End the search and reset the layout.
    ///
    /// Restores the pre-search snapshot when one is held and restore is
    /// configured, otherwise recomputes the default layout, whether or not a
    /// search was active. Every highlighted cell goes back to its pristine
    /// markup.
    pub fn clear(&mut self, index: &RowIndex, store: &mut VisibilityStore) -> SearchOutcome {
        let was_active = self.active.take().is_some();
        let snapshot = self.snapshot.take();
        let mut snapshot_restored = false;

        match snapshot {
            Some(snapshot) if self.settings.restore_on_clear => match store.restore(&snapshot) {
                Ok(()) => snapshot_restored = true,
                Err(e) => {
                    tracing::warn!(
                        target: "treetable.search",
                        error = %e,
                        "pre-search snapshot rejected; using default layout"
                    );
                    store.reset_to_initial(index, self.settings.start_expanded);
                }
            },
            _ => store.reset_to_initial(index, self.settings.start_expanded),
        }

        let mut cell_updates: Vec<CellUpdate> = self
            .highlighted
            .drain()
            .filter_map(|((row, column), _)| {
                let markup = self.cells.get(row)?.get(column)?.source().to_owned();
                Some(CellUpdate {
                    row,
                    column,
                    markup,
                })
            })
            .collect();
        cell_updates.sort_by_key(|u| (u.row, u.column));

        tracing::debug!(
            target: "treetable.search",
            was_active,
            snapshot_restored,
            cell_updates = cell_updates.len(),
            "search cleared"
        );

        SearchOutcome {
            matches: Vec::new(),
            visible_rows: store.visible_count(),
            no_results: false,
            reset_visible: false,
            snapshot_restored,
            cell_updates,
        }
    }

    fn update_highlights(&mut self, is_match: &[bool], needle: &[char]) -> Vec<CellUpdate> {
        let mut updates = Vec::new();
        for (row, cells) in self.cells.iter().enumerate() {
            let row_matches = is_match.get(row).copied().unwrap_or(false);
            for (column, cell) in cells.iter().enumerate() {
                let wanted = if row_matches {
                    cell.highlight_lowered(&self.settings.highlighter, needle)
                } else {
                    None
                };
                let key = (row, column);
                match wanted {
                    Some(markup) => {
                        if self.highlighted.get(&key) != Some(&markup) {
                            updates.push(CellUpdate {
                                row,
                                column,
                                markup: markup.clone(),
                            });
                            self.highlighted.insert(key, markup);
                        }
                    }
                    None => {
                        if self.highlighted.remove(&key).is_some() {
                            updates.push(CellUpdate {
                                row,
                                column,
                                markup: cell.source().to_owned(),
                            });
                        }
                    }
                }
            }
        }
        updates
    }
}
