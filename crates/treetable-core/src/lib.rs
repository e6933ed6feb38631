#![forbid(unsafe_code)]

//! Row-visibility engine for collapsible tree tables.
//!
//! # Role
//! A table arrives as a flat, pre-order list of rows, each tagged with a
//! depth. `treetable-core` turns that list into an explicit tree once, keeps
//! per-row visible/open flags as the single source of truth, and pushes every
//! change to a renderer through [`RenderSink`]. It never reads visibility
//! back from the renderer.
//!
//! # Primary responsibilities
//! - **RowIndex**: parent links, child lists and descendant spans.
//! - **VisibilityStore**: per-row flags plus the ancestor invariant.
//! - **Toggling**: single-branch open/close and global expand/collapse.
//! - **SearchEngine**: case-insensitive filtering with ancestor reveal and
//!   highlight marks derived from pristine cell markup.
//! - **StatePersistence**: best-effort save/load through a key-value store.
//!
//! # How it fits together
//! [`TreeTable`] wires the pieces up for one table instance and is what an
//! embedding calls. The free functions in [`toggle`], [`toggle_all`] and the
//! [`SearchEngine`] operate on a `(RowIndex, VisibilityStore)` pair directly
//! and can be used without the facade.

pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod markup;
pub mod persistence;
pub mod render;
pub mod row;
pub mod row_index;
pub mod search;
pub mod toggle;
pub mod toggle_all;
pub mod visibility;

pub use config::TreeTableConfig;
pub use engine::TreeTable;
pub use error::{ConfigError, InvariantViolation, PersistError, RestoreError, StoreError};
pub use persistence::{FileStore, KeyValueStore, MemoryStore, StatePersistence};
pub use render::{NullSink, RenderSink};
pub use row::Row;
pub use row_index::RowIndex;
pub use search::{SearchEngine, SearchOutcome};
pub use toggle::ToggleOutcome;
pub use toggle_all::ToggleAllAction;
pub use visibility::{PersistedState, RowState, VisibilityStore};
