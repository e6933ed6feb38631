#![forbid(unsafe_code)]

//! Scripted scenarios with per-step frame checksums.
//!
//! A scenario drives a [`TreeTable`] bound to a [`PageModel`] through a list
//! of [`Step`]s and records the rendered frame after each one. Checksums are
//! BLAKE3 over the frame text, prefixed with `blake3:`, so a golden run can
//! be compared with a single string per step.

use ahash::AHashSet;
use treetable_core::{Row, TreeTable, TreeTableConfig};

use crate::page::{Divergence, PageModel};
use crate::text::TextRenderer;

/// Checksum prefix for clarity in logs.
pub const CHECKSUM_PREFIX: &str = "blake3:";

/// BLAKE3 checksum of a rendered frame.
#[must_use]
pub fn frame_checksum(frame: &str) -> String {
    let hash = blake3::hash(frame.as_bytes());
    format!("{CHECKSUM_PREFIX}{}", hash.to_hex())
}

/// One user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Toggle { row: usize, open: bool },
    ToggleRow(usize),
    ToggleAll,
    ExpandAll,
    CollapseAll,
    Search(String),
    ResetSearch,
}

impl Step {
    fn apply(&self, table: &mut TreeTable<PageModel>) {
        match self {
            Self::Toggle { row, open } => {
                table.toggle_branch(*row, *open);
            }
            Self::ToggleRow(row) => {
                table.toggle_row(*row);
            }
            Self::ToggleAll => {
                table.toggle_all();
            }
            Self::ExpandAll => table.expand_all(),
            Self::CollapseAll => table.collapse_all(),
            Self::Search(term) => {
                table.search(term);
            }
            Self::ResetSearch => {
                table.reset_search();
            }
        }
    }
}

/// The frame after one step.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    /// `None` for the initial frame.
    pub step: Option<Step>,
    pub text: String,
    pub checksum: String,
    /// Sink calls the step produced.
    pub sink_calls: usize,
    /// Rows where the page disagreed with the engine afterwards.
    pub divergences: Vec<Divergence>,
}

/// Everything a scenario run produced.
#[derive(Debug, Clone, Default)]
pub struct ScenarioReport {
    pub frames: Vec<FrameRecord>,
}

impl ScenarioReport {
    #[must_use]
    pub fn checksums(&self) -> Vec<&str> {
        self.frames.iter().map(|f| f.checksum.as_str()).collect()
    }

    /// Number of distinct frames seen.
    #[must_use]
    pub fn distinct_frames(&self) -> usize {
        self.frames
            .iter()
            .map(|f| f.checksum.as_str())
            .collect::<AHashSet<_>>()
            .len()
    }

    /// Whether the page mirrored the engine after every step.
    #[must_use]
    pub fn consistent(&self) -> bool {
        self.frames.iter().all(|f| f.divergences.is_empty())
    }

    #[must_use]
    pub fn last_frame(&self) -> Option<&str> {
        self.frames.last().map(|f| f.text.as_str())
    }
}

/// Runs steps against a fresh table and records every frame.
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    renderer: TextRenderer,
}

impl ScenarioRunner {
    #[must_use]
    pub fn new(renderer: TextRenderer) -> Self {
        Self { renderer }
    }

    pub fn run(&self, rows: Vec<Row>, config: TreeTableConfig, steps: &[Step]) -> ScenarioReport {
        let page = PageModel::new(&rows);
        let mut table = TreeTable::new(rows, config, page);
        let mut report = ScenarioReport::default();

        let initial = table.sink_mut().take_log().len();
        report.frames.push(self.record(&table, None, initial));

        for step in steps {
            step.apply(&mut table);
            let calls = table.sink_mut().take_log().len();
            report.frames.push(self.record(&table, Some(step.clone()), calls));
        }

        tracing::debug!(
            target: "treetable.harness",
            steps = steps.len(),
            distinct_frames = report.distinct_frames(),
            consistent = report.consistent(),
            "scenario complete"
        );
        report
    }

    fn record(
        &self,
        table: &TreeTable<PageModel>,
        step: Option<Step>,
        sink_calls: usize,
    ) -> FrameRecord {
        let text = self.renderer.render(table.index(), table.sink());
        let checksum = frame_checksum(&text);
        FrameRecord {
            step,
            text,
            checksum,
            sink_calls,
            divergences: table.sink().divergences(table.state()),
        }
    }
}
