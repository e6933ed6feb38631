#![forbid(unsafe_code)]

//! The table facade.
//!
//! [`TreeTable`] owns the row index, the visibility store, the search engine
//! and optional persistence, and pushes every change to a [`RenderSink`].
//! Each public operation runs to completion: mutate the store, present the
//! difference, then persist when no search filter is active.
//!
//! # Example
//!
//! ```
//! use treetable_core::{Row, TreeTable, TreeTableConfig};
//!
//! let rows = vec![
//!     Row::new(0, ["Fruit"]),
//!     Row::new(1, ["Apple"]),
//!     Row::new(2, ["Gala"]),
//! ];
//! let mut table = TreeTable::headless(rows, TreeTableConfig::default());
//! assert!(!table.state().is_visible(1));
//!
//! table.toggle_branch(0, true);
//! assert!(table.state().is_visible(1));
//! assert!(!table.state().is_visible(2));
//!
//! table.search("gala");
//! assert!(table.state().is_visible(2));
//!
//! table.reset_search();
//! assert!(!table.is_search_active());
//! ```

use web_time::Instant;

use crate::config::TreeTableConfig;
use crate::debounce::SearchDebouncer;
use crate::persistence::{KeyValueStore, StatePersistence};
use crate::render::{Chrome, NullSink, Presenter, RenderSink};
use crate::row::Row;
use crate::row_index::RowIndex;
use crate::search::{CellUpdate, SearchEngine, SearchOutcome, SearchSettings};
use crate::toggle::{self, ToggleOutcome};
use crate::toggle_all::{self, ToggleAllAction};
use crate::visibility::VisibilityStore;

/// A collapsible tree table bound to a render sink.
#[derive(Debug)]
pub struct TreeTable<S: RenderSink = NullSink> {
    config: TreeTableConfig,
    index: RowIndex,
    state: VisibilityStore,
    search: SearchEngine,
    persistence: Option<StatePersistence>,
    presenter: Presenter,
    debouncer: SearchDebouncer,
    sink: S,
}

impl TreeTable<NullSink> {
    /// A table without a renderer, for driving the model directly.
    #[must_use]
    pub fn headless(rows: Vec<Row>, config: TreeTableConfig) -> Self {
        Self::new(rows, config, NullSink)
    }
}

impl<S: RenderSink> TreeTable<S> {
    /// Build a table without persistence. `remember_state` has no effect.
    pub fn new(rows: Vec<Row>, config: TreeTableConfig, sink: S) -> Self {
        Self::build(rows, config, sink, None)
    }

    /// Build a table that persists into `store` when `remember_state` is on.
    ///
    /// Saved state for this instance is loaded and replaces the initial
    /// layout; unusable saved state is logged and ignored.
    pub fn with_store(
        rows: Vec<Row>,
        config: TreeTableConfig,
        sink: S,
        store: impl KeyValueStore + 'static,
    ) -> Self {
        let persistence = config
            .remember_state
            .then(|| StatePersistence::new(store, config.storage_key()));
        Self::build(rows, config, sink, persistence)
    }

    fn build(
        rows: Vec<Row>,
        config: TreeTableConfig,
        sink: S,
        persistence: Option<StatePersistence>,
    ) -> Self {
        let index = RowIndex::build(&rows);
        let search = SearchEngine::new(&rows, SearchSettings::from(&config));
        let loaded = persistence.as_ref().and_then(|p| p.load(&index));
        let restored = loaded.is_some();
        let state =
            loaded.unwrap_or_else(|| VisibilityStore::initial(&index, config.start_expanded));
        let debouncer = SearchDebouncer::new(config.search_debounce());

        tracing::debug!(
            target: "treetable.engine",
            instance = %config.instance_id,
            rows = index.len(),
            coerced = index.coerced_rows(),
            persistence = persistence.is_some(),
            restored,
            "table initialized"
        );

        let mut table = Self {
            config,
            index,
            state,
            search,
            persistence,
            presenter: Presenter::new(),
            debouncer,
            sink,
        };
        if !table.is_inert() {
            table.present(&[]);
        }
        table
    }

    /// No rows: every operation is a no-op.
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.index.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[must_use]
    pub fn config(&self) -> &TreeTableConfig {
        &self.config
    }

    #[must_use]
    pub fn index(&self) -> &RowIndex {
        &self.index
    }

    /// Current visibility flags.
    #[must_use]
    pub fn state(&self) -> &VisibilityStore {
        &self.state
    }

    #[must_use]
    pub fn search_engine(&self) -> &SearchEngine {
        &self.search
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    #[must_use]
    pub fn into_sink(self) -> S {
        self.sink
    }

    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search.term()
    }

    #[must_use]
    pub fn is_search_active(&self) -> bool {
        self.search.is_active()
    }

    /// Whether state is being persisted.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.persistence.is_some()
    }

    /// Cell that hosts `row`'s toggle button: the configured column, or
    /// column 0 when the row is shorter. `None` for out-of-range rows.
    #[must_use]
    pub fn toggle_column(&self, row: usize) -> Option<usize> {
        if row >= self.index.len() {
            return None;
        }
        let column = self.config.toggle_column_index;
        if self.search.cell(row, column).is_some() {
            Some(column)
        } else {
            Some(0)
        }
    }

    /// Markup `row`/`column` currently displays.
    #[must_use]
    pub fn cell_markup(&self, row: usize, column: usize) -> Option<&str> {
        self.search.current_markup(row, column)
    }

    /// Open or close one branch.
    pub fn toggle_branch(&mut self, row: usize, open: bool) -> ToggleOutcome {
        if self.is_inert() {
            return ToggleOutcome::Ignored;
        }
        let outcome = toggle::toggle_branch(&self.index, &mut self.state, row, open);
        if outcome.applied() {
            self.commit(&[]);
        }
        outcome
    }

    /// Flip a branch: close it when open, open it otherwise.
    pub fn toggle_row(&mut self, row: usize) -> ToggleOutcome {
        let open = !self.state.is_open(row);
        self.toggle_branch(row, open)
    }

    /// Collapse to roots when anything below them is showing, otherwise
    /// expand every row. An active search is cleared first.
    pub fn toggle_all(&mut self) -> Option<ToggleAllAction> {
        if self.is_inert() {
            return None;
        }
        let cleared = self.end_search();
        let action = toggle_all::next_action(&self.index, &self.state);
        toggle_all::apply(&self.index, &mut self.state, action);
        tracing::debug!(target: "treetable.engine", ?action, "toggle all");
        self.commit(&cleared);
        Some(action)
    }

    /// Show every row. An active search is cleared first.
    pub fn expand_all(&mut self) {
        self.apply_all(ToggleAllAction::Expand);
    }

    /// Collapse to roots only. An active search is cleared first.
    pub fn collapse_all(&mut self) {
        self.apply_all(ToggleAllAction::Collapse);
    }

    fn apply_all(&mut self, action: ToggleAllAction) {
        if self.is_inert() {
            return;
        }
        let cleared = self.end_search();
        toggle_all::apply(&self.index, &mut self.state, action);
        tracing::debug!(target: "treetable.engine", ?action, "apply all");
        self.commit(&cleared);
    }

    /// Run a search pass now. An empty or whitespace-only term clears the
    /// search. Any queued term is dropped.
    pub fn search(&mut self, term: &str) -> SearchOutcome {
        self.debouncer.cancel();
        if self.is_inert() {
            return SearchOutcome::default();
        }
        let outcome = self.search.search(&self.index, &mut self.state, term);
        self.commit(&outcome.cell_updates);
        outcome
    }

    /// Clear the search, as the reset affordance does.
    pub fn reset_search(&mut self) -> SearchOutcome {
        self.search("")
    }

    /// Queue `term` typed at `now`; it runs on a later
    /// [`poll_search`](Self::poll_search) once input has been quiet for the
    /// configured debounce period.
    pub fn queue_search(&mut self, term: impl Into<String>, now: Instant) {
        if self.is_inert() {
            return;
        }
        self.debouncer.push(term, now);
    }

    /// Run the queued search if it is due at `now`.
    pub fn poll_search(&mut self, now: Instant) -> Option<SearchOutcome> {
        let term = self.debouncer.poll(now)?;
        Some(self.search(&term))
    }

    /// Run the queued search immediately, if any.
    pub fn flush_search(&mut self) -> Option<SearchOutcome> {
        let term = self.debouncer.flush()?;
        Some(self.search(&term))
    }

    /// Whether a queued search is waiting.
    #[must_use]
    pub fn has_queued_search(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Write the current layout now. Returns `false` when persistence is off,
    /// a search filter is active, or the write failed.
    pub fn save_state(&mut self) -> bool {
        if self.search.is_active() {
            return false;
        }
        match self.persistence.as_mut() {
            Some(persistence) => persistence.save(&self.state),
            None => false,
        }
    }

    /// Push the full state again, e.g. after the renderer was rebuilt.
    pub fn repaint(&mut self) {
        if self.is_inert() {
            return;
        }
        self.presenter.invalidate();
        self.present(&[]);
    }

    fn end_search(&mut self) -> Vec<CellUpdate> {
        self.debouncer.cancel();
        if !self.search.is_active() {
            return Vec::new();
        }
        self.search.clear(&self.index, &mut self.state).cell_updates
    }

    fn commit(&mut self, cells: &[CellUpdate]) {
        let calls = self.present(cells);
        let saved = !self.search.is_active() && self.save_state();
        tracing::debug!(
            target: "treetable.engine",
            sink_calls = calls,
            visible_rows = self.state.visible_count(),
            search_active = self.search.is_active(),
            saved,
            "committed"
        );
    }

    fn present(&mut self, cells: &[CellUpdate]) -> usize {
        let active = self.search.is_active();
        let chrome = Chrome {
            any_expanded: toggle_all::any_expanded(&self.index, &self.state),
            no_results: active && self.state.visible_count() == 0,
            reset_visible: active,
        };
        let calls = self
            .presenter
            .present(&self.index, &self.state, chrome, &mut self.sink);
        self.presenter.push_cells(cells, &mut self.sink);
        calls + cells.len()
    }
}
