#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use treetable_core::{Row, TreeTable, TreeTableConfig};

#[derive(Debug, Arbitrary)]
enum Op {
    Toggle(u8, bool),
    Flip(u8),
    ToggleAll,
    ExpandAll,
    CollapseAll,
    Search(String),
    Reset,
}

#[derive(Debug, Arbitrary)]
struct Input {
    depths: Vec<Option<i8>>,
    cells: Vec<String>,
    start_expanded: bool,
    restore: bool,
    max_level: Option<u8>,
    ops: Vec<Op>,
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(input) = Input::arbitrary(&mut u) else {
        return;
    };
    if input.depths.len() > 256 || input.ops.len() > 64 {
        return;
    }

    let rows: Vec<Row> = input
        .depths
        .iter()
        .enumerate()
        .map(|(i, depth)| {
            let cell = input
                .cells
                .get(i % input.cells.len().max(1))
                .cloned()
                .unwrap_or_default();
            match depth {
                Some(d) => Row::new(i64::from(*d), [cell]),
                None => Row::unmarked([cell]),
            }
        })
        .collect();

    let config = TreeTableConfig::default()
        .with_start_expanded(input.start_expanded)
        .with_restore_pre_search_state_on_clear(input.restore)
        .with_search_max_level(input.max_level.map(usize::from));
    let mut table = TreeTable::headless(rows, config);

    for op in &input.ops {
        match op {
            Op::Toggle(row, open) => {
                table.toggle_branch(usize::from(*row), *open);
            }
            Op::Flip(row) => {
                table.toggle_row(usize::from(*row));
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

        // Post-condition that must always hold.
        assert!(
            table.state().check_invariant(table.index()).is_ok(),
            "ancestor invariant broken after {op:?}"
        );
    }
});
