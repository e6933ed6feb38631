//! Property-based invariant tests for the visibility engine.
//!
//! These tests verify structural invariants that must hold for **any** row
//! sequence (well-formed or not) and any sequence of operations:
//!
//! 1. Every row's parent precedes it and is exactly one level shallower.
//! 2. Descendant spans are contiguous and strictly deeper.
//! 3. A visible row has every ancestor visible and open, after any ops.
//! 4. `open` equals "has a visible direct child" after any ops.
//! 5. Collapsing a branch twice equals collapsing it once.
//! 6. Open-then-close leaves only the branch root visible in its subtree.
//! 7. Search then clear with restore returns the exact pre-search state.
//! 8. Save then load in a fresh table reproduces the state.

use proptest::prelude::*;
use treetable_core::{MemoryStore, NullSink, RenderSink, Row, RowIndex, TreeTable, TreeTableConfig};

// ── Strategies ────────────────────────────────────────────────────────────

const WORDS: [&str; 6] = ["alpha", "beta", "gamma", "delta", "Alpine", "<b>bet</b>a"];

/// Depth markers including negatives, jumps and missing markers.
fn raw_marker() -> impl Strategy<Value = Option<i64>> {
    prop_oneof![
        8 => (0i64..5).prop_map(Some),
        1 => (-3i64..0).prop_map(Some),
        1 => Just(None),
    ]
}

/// A well-formed pre-order depth sequence.
fn valid_depths(max_len: usize) -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(0u8..3, 0..max_len).prop_map(|steps| {
        let mut depths = Vec::with_capacity(steps.len());
        let mut prev: i64 = -1;
        for step in steps {
            let next = match step {
                0 => prev + 1,
                1 => prev.max(0),
                _ => (prev - 1).max(0),
            };
            depths.push(next);
            prev = next;
        }
        depths
    })
}

fn rows_from_markers(markers: &[Option<i64>]) -> Vec<Row> {
    markers
        .iter()
        .enumerate()
        .map(|(i, marker)| {
            let cells = [WORDS[i % WORDS.len()].to_owned(), format!("row {i}")];
            match marker {
                Some(depth) => Row::new(*depth, cells),
                None => Row::unmarked(cells),
            }
        })
        .collect()
}

fn rows_from_depths(depths: &[i64]) -> Vec<Row> {
    let markers: Vec<Option<i64>> = depths.iter().copied().map(Some).collect();
    rows_from_markers(&markers)
}

#[derive(Debug, Clone)]
enum Op {
    Toggle(usize, bool),
    Flip(usize),
    ToggleAll,
    ExpandAll,
    CollapseAll,
    Search(&'static str),
    Reset,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..40, any::<bool>()).prop_map(|(r, o)| Op::Toggle(r, o)),
        2 => (0usize..40).prop_map(Op::Flip),
        1 => Just(Op::ToggleAll),
        1 => Just(Op::ExpandAll),
        1 => Just(Op::CollapseAll),
        2 => prop::sample::select(vec!["al", "bet", "ROW 1", "zzz", "  gam ", ""])
            .prop_map(Op::Search),
        1 => Just(Op::Reset),
    ]
}

fn apply<S: RenderSink>(table: &mut TreeTable<S>, op: &Op) {
    match *op {
        Op::Toggle(row, open) => {
            table.toggle_branch(row, open);
        }
        Op::Flip(row) => {
            table.toggle_row(row);
        }
        Op::ToggleAll => {
            table.toggle_all();
        }
        Op::ExpandAll => table.expand_all(),
        Op::CollapseAll => table.collapse_all(),
        Op::Search(term) => {
            table.search(term);
        }
        Op::Reset => {
            table.reset_search();
        }
    }
}

fn check_open_is_derived(table: &TreeTable) -> Result<(), TestCaseError> {
    let index = table.index();
    for row in 0..table.len() {
        let has_visible_child = index
            .children(row)
            .iter()
            .any(|&c| table.state().is_visible(c));
        prop_assert_eq!(
            table.state().is_open(row),
            has_visible_child,
            "row {} open flag out of sync",
            row
        );
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// 1-2. Index structure
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn parents_precede_and_are_one_level_up(markers in prop::collection::vec(raw_marker(), 0..60)) {
        let index = RowIndex::from_markers(markers.iter().copied());
        prop_assert_eq!(index.len(), markers.len());
        for row in 0..index.len() {
            match index.parent(row) {
                Some(parent) => {
                    prop_assert!(parent < row);
                    prop_assert_eq!(index.depth(parent) + 1, index.depth(row));
                }
                None => prop_assert_eq!(index.depth(row), 0),
            }
        }
    }

    #[test]
    fn spans_are_contiguous_and_deeper(markers in prop::collection::vec(raw_marker(), 0..60)) {
        let index = RowIndex::from_markers(markers.iter().copied());
        for row in 0..index.len() {
            let span = index.descendant_span(row);
            prop_assert_eq!(span.start, row + 1);
            for d in span.clone() {
                prop_assert!(index.depth(d) > index.depth(row));
                prop_assert!(index.ancestors(d).any(|a| a == row));
            }
            if span.end < index.len() {
                prop_assert!(index.depth(span.end) <= index.depth(row));
            }
            prop_assert_eq!(index.has_children(row), !index.children(row).is_empty());
        }
    }

    #[test]
    fn valid_sequences_are_never_coerced(depths in valid_depths(60)) {
        let index = RowIndex::build(&rows_from_depths(&depths));
        prop_assert_eq!(index.coerced_rows(), 0);
        for (row, &depth) in depths.iter().enumerate() {
            prop_assert_eq!(index.depth(row) as i64, depth);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 3-4. Invariants survive arbitrary operation sequences
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn ancestor_invariant_holds_after_any_ops(
        markers in prop::collection::vec(raw_marker(), 0..40),
        start_expanded in any::<bool>(),
        restore in any::<bool>(),
        max_level in prop::option::of(0usize..4),
        ops in prop::collection::vec(op(), 0..30),
    ) {
        let config = TreeTableConfig::default()
            .with_start_expanded(start_expanded)
            .with_restore_pre_search_state_on_clear(restore)
            .with_search_max_level(max_level);
        let mut table = TreeTable::headless(rows_from_markers(&markers), config);
        prop_assert!(table.state().check_invariant(table.index()).is_ok());
        for op in &ops {
            apply(&mut table, op);
            let checked = table.state().check_invariant(table.index());
            prop_assert!(checked.is_ok(), "after {:?}: {:?}", op, checked);
        }
    }

    #[test]
    fn open_flags_track_visible_children(
        depths in valid_depths(40),
        ops in prop::collection::vec(op(), 0..30),
    ) {
        let mut table = TreeTable::headless(rows_from_depths(&depths), TreeTableConfig::default());
        for op in &ops {
            apply(&mut table, op);
            // A restored snapshot is applied verbatim; it was derived too.
            check_open_is_derived(&table)?;
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 5-6. Toggle laws
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn collapse_twice_equals_once(
        depths in valid_depths(40),
        ops in prop::collection::vec(op(), 0..15),
        row in 0usize..40,
    ) {
        let mut table = TreeTable::headless(rows_from_depths(&depths), TreeTableConfig::default());
        for op in &ops {
            apply(&mut table, op);
        }
        table.toggle_branch(row, false);
        let once = table.state().clone();
        table.toggle_branch(row, false);
        prop_assert_eq!(table.state(), &once);
    }

    #[test]
    fn open_then_close_leaves_only_the_branch_root(
        depths in valid_depths(40),
        ops in prop::collection::vec(op(), 0..15),
        pick in any::<prop::sample::Index>(),
        inner in prop::collection::vec(0usize..40, 0..6),
    ) {
        let mut table = TreeTable::headless(rows_from_depths(&depths), TreeTableConfig::default());
        for op in &ops {
            apply(&mut table, op);
        }
        let branches: Vec<usize> = (0..table.len())
            .filter(|&r| table.index().has_children(r))
            .collect();
        if branches.is_empty() {
            return Ok(());
        }
        let row = *pick.get(&branches);

        table.toggle_branch(row, true);
        for &sub in &inner {
            if table.index().descendant_span(row).contains(&sub) {
                table.toggle_row(sub);
            }
        }
        table.toggle_branch(row, false);

        prop_assert!(table.state().is_visible(row));
        prop_assert!(!table.state().is_open(row));
        for d in table.index().descendant_span(row) {
            prop_assert!(!table.state().is_visible(d));
            prop_assert!(!table.state().is_open(d));
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 7-8. Restore and persistence round trips
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn search_then_clear_restores_exactly(
        depths in valid_depths(40),
        ops in prop::collection::vec(op(), 0..15),
        terms in prop::collection::vec(
            prop::sample::select(vec!["a", "al", "be", "row", "zz"]),
            1..5,
        ),
    ) {
        let config = TreeTableConfig::default().with_restore_pre_search_state_on_clear(true);
        let mut table = TreeTable::headless(rows_from_depths(&depths), config);
        for op in &ops {
            apply(&mut table, op);
        }
        if table.is_search_active() {
            table.reset_search();
        }
        let before = table.state().clone();
        for term in &terms {
            table.search(term);
        }
        table.search("");
        prop_assert_eq!(table.state(), &before);
    }

    #[test]
    fn saved_state_reloads_identically(
        depths in valid_depths(40),
        ops in prop::collection::vec(op(), 0..20),
    ) {
        let kv = MemoryStore::new();
        let config = TreeTableConfig::new("prop").with_remember_state(true);
        let rows = rows_from_depths(&depths);
        let mut first = TreeTable::with_store(rows.clone(), config.clone(), NullSink, kv.clone());
        for op in &ops {
            apply(&mut first, op);
        }
        first.reset_search();
        prop_assert!(first.save_state());

        let second = TreeTable::with_store(rows, config, NullSink, kv);
        prop_assert_eq!(second.state(), first.state());
    }
}
