#![forbid(unsafe_code)]

//! Explicit tree structure derived from the flat depth-tagged row sequence.
//!
//! The flat "depth tag per row" encoding only answers structural questions by
//! scanning. [`RowIndex`] parses it once into nodes with a parent link, a
//! descendant span, and a child list, so every later query is a lookup.
//!
//! # Depth coercion
//!
//! A row's depth is coerced to `0` (promoted to a new root) when its marker is
//! missing, negative, or jumps more than one level below the previous row.
//! Construction never fails: malformed markup must still render something.
//!
//! # Invariants
//!
//! 1. `depth(0) == 0` and `depth(i) <= depth(i - 1) + 1` for every `i > 0`.
//! 2. `descendant_span(i)` is `i + 1..end` where every row in the span is
//!    deeper than `i` and row `end` (if any) is not.
//! 3. `parent(i)` is the nearest preceding row with depth `depth(i) - 1`.

use std::ops::Range;

use crate::row::Row;

/// Structural facts about one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowNode {
    depth: usize,
    parent: Option<usize>,
    span_end: usize,
    children: Range<usize>,
}

impl RowNode {
    /// Effective (coerced) depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Index of the parent row, `None` for roots.
    #[must_use]
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }
}

/// Parsed tree over a row sequence.
#[derive(Debug, Clone, Default)]
pub struct RowIndex {
    nodes: Vec<RowNode>,
    /// Child indices, grouped per parent; `RowNode::children` ranges into this.
    child_list: Vec<usize>,
    coerced: usize,
}

impl RowIndex {
    /// Build the index from rows.
    #[must_use]
    pub fn build(rows: &[Row]) -> Self {
        Self::from_markers(rows.iter().map(Row::depth_marker))
    }

    /// Build the index from raw depth markers in row order.
    ///
    /// ```
    /// use treetable_core::row_index::RowIndex;
    ///
    /// let index = RowIndex::from_markers([Some(0), Some(1), Some(2), Some(1), Some(0)]);
    /// assert_eq!(index.descendant_span(0), 1..4);
    /// assert_eq!(index.children(0), &[1, 3]);
    /// assert_eq!(index.parent(2), Some(1));
    /// assert!(!index.has_children(4));
    /// ```
    pub fn from_markers<I>(markers: I) -> Self
    where
        I: IntoIterator<Item = Option<i64>>,
    {
        let mut depths = Vec::new();
        let mut coerced = 0usize;
        let mut prev: Option<usize> = None;

        for (row, marker) in markers.into_iter().enumerate() {
            let depth = match marker {
                Some(d) if d >= 0 => {
                    let limit = prev.map_or(0, |p| p + 1);
                    match usize::try_from(d) {
                        Ok(d) if d <= limit => d,
                        _ => {
                            tracing::warn!(
                                target: "treetable.index",
                                row,
                                marker = d,
                                limit,
                                "depth skips a level; promoting row to root"
                            );
                            coerced += 1;
                            0
                        }
                    }
                }
                Some(d) => {
                    tracing::warn!(
                        target: "treetable.index",
                        row,
                        marker = d,
                        "negative depth marker; promoting row to root"
                    );
                    coerced += 1;
                    0
                }
                None => {
                    tracing::debug!(
                        target: "treetable.index",
                        row,
                        "missing depth marker; treating row as root"
                    );
                    0
                }
            };
            depths.push(depth);
            prev = Some(depth);
        }

        let n = depths.len();
        let mut parents: Vec<Option<usize>> = vec![None; n];
        let mut span_ends = vec![n; n];
        // Stack of open ancestors (row indices), shallowest at the bottom.
        let mut stack: Vec<usize> = Vec::new();

        for (row, &depth) in depths.iter().enumerate() {
            while let Some(&top) = stack.last() {
                if depths[top] >= depth {
                    span_ends[top] = row;
                    stack.pop();
                } else {
                    break;
                }
            }
            parents[row] = stack.last().copied();
            stack.push(row);
        }
        // Rows still open at the end run to the end of the sequence.

        let mut per_parent: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (row, parent) in parents.iter().enumerate() {
            if let Some(p) = parent {
                per_parent[*p].push(row);
            }
        }

        let mut child_list = Vec::with_capacity(n);
        let mut nodes = Vec::with_capacity(n);
        for (row, kids) in per_parent.into_iter().enumerate() {
            let start = child_list.len();
            child_list.extend(kids);
            nodes.push(RowNode {
                depth: depths[row],
                parent: parents[row],
                span_end: span_ends[row],
                children: start..child_list.len(),
            });
        }

        tracing::debug!(
            target: "treetable.index",
            rows = n,
            roots = nodes.iter().filter(|n| n.parent.is_none()).count(),
            coerced,
            "row index built"
        );

        Self {
            nodes,
            child_list,
            coerced,
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of rows whose marker was negative or skipped a level.
    #[must_use]
    pub fn coerced_rows(&self) -> usize {
        self.coerced
    }

    /// Structural node for `row`, if in range.
    #[must_use]
    pub fn get(&self, row: usize) -> Option<&RowNode> {
        self.nodes.get(row)
    }

    /// Effective depth of `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of range.
    #[must_use]
    pub fn depth(&self, row: usize) -> usize {
        self.nodes[row].depth
    }

    /// Parent of `row`, `None` for roots.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of range.
    #[must_use]
    pub fn parent(&self, row: usize) -> Option<usize> {
        self.nodes[row].parent
    }

    #[must_use]
    pub fn is_root(&self, row: usize) -> bool {
        self.nodes[row].parent.is_none()
    }

    /// Contiguous run of rows below `row` in the tree.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of range.
    #[must_use]
    pub fn descendant_span(&self, row: usize) -> Range<usize> {
        row + 1..self.nodes[row].span_end
    }

    /// Direct children of `row`, in row order.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of range.
    #[must_use]
    pub fn children(&self, row: usize) -> &[usize] {
        &self.child_list[self.nodes[row].children.clone()]
    }

    /// Whether `row` has at least one child.
    #[must_use]
    pub fn has_children(&self, row: usize) -> bool {
        self.nodes
            .get(row)
            .is_some_and(|node| !node.children.is_empty())
    }

    /// Root rows, in row order.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(row, _)| row)
    }

    /// Ancestors of `row` from its parent up to its root.
    #[must_use]
    pub fn ancestors(&self, row: usize) -> Ancestors<'_> {
        Ancestors {
            index: self,
            next: self.nodes.get(row).and_then(|n| n.parent),
        }
    }
}

/// Iterator over a row's ancestor chain, nearest first.
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    index: &'a RowIndex,
    next: Option<usize>,
}

impl Iterator for Ancestors<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = self.index.nodes[current].parent;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(depths: &[i64]) -> RowIndex {
        RowIndex::from_markers(depths.iter().copied().map(Some))
    }

    #[test]
    fn empty_sequence() {
        let idx = RowIndex::from_markers(std::iter::empty());
        assert!(idx.is_empty());
        assert_eq!(idx.roots().count(), 0);
    }

    #[test]
    fn spans_and_parents() {
        //   0 A
        //   1 ├ B
        //   2 │ └ C
        //   3 └ D
        //   4 E
        let idx = index(&[0, 1, 2, 1, 0]);
        assert_eq!(idx.descendant_span(0), 1..4);
        assert_eq!(idx.descendant_span(1), 2..3);
        assert_eq!(idx.descendant_span(2), 3..3);
        assert_eq!(idx.descendant_span(4), 5..5);
        assert_eq!(idx.parent(1), Some(0));
        assert_eq!(idx.parent(3), Some(0));
        assert_eq!(idx.parent(4), None);
        assert_eq!(idx.children(0), &[1, 3]);
        assert_eq!(idx.children(1), &[2]);
        assert!(idx.children(2).is_empty());
        assert_eq!(idx.roots().collect::<Vec<_>>(), vec![0, 4]);
    }

    #[test]
    fn last_branch_runs_to_end() {
        let idx = index(&[0, 1, 1, 2]);
        assert_eq!(idx.descendant_span(0), 1..4);
        assert_eq!(idx.descendant_span(2), 3..4);
        assert!(idx.has_children(2));
        assert!(!idx.has_children(1));
    }

    #[test]
    fn ancestors_walk_to_root() {
        let idx = index(&[0, 1, 2, 3, 1]);
        assert_eq!(idx.ancestors(3).collect::<Vec<_>>(), vec![2, 1, 0]);
        assert_eq!(idx.ancestors(0).count(), 0);
        assert_eq!(idx.ancestors(99).count(), 0);
    }

    #[test]
    fn negative_depth_becomes_root() {
        let idx = index(&[0, 1, -3, 1]);
        assert_eq!(idx.depth(2), 0);
        assert!(idx.is_root(2));
        assert_eq!(idx.parent(3), Some(2));
        assert_eq!(idx.coerced_rows(), 1);
    }

    #[test]
    fn level_skip_becomes_root() {
        let idx = index(&[0, 2, 1]);
        assert_eq!(idx.depth(1), 0);
        assert_eq!(idx.parent(2), Some(1));
        assert_eq!(idx.coerced_rows(), 1);

        // A first row that is not a root is promoted too.
        let idx = index(&[1, 2]);
        assert_eq!(idx.depth(0), 0);
        // Relative to the promoted first row the second now skips a level.
        assert_eq!(idx.depth(1), 0);
        assert_eq!(idx.coerced_rows(), 2);
    }

    #[test]
    fn huge_marker_becomes_root() {
        let idx = RowIndex::from_markers([Some(0), Some(1), Some(i64::MAX), Some(1 << 40)]);
        assert_eq!(idx.depth(2), 0);
        assert_eq!(idx.depth(3), 0);
        assert_eq!(idx.coerced_rows(), 2);
        assert_eq!(idx.children(0), &[1]);
    }

    #[test]
    fn missing_marker_is_root_but_not_counted_as_coerced() {
        let idx = RowIndex::from_markers([Some(0), None, Some(1)]);
        assert!(idx.is_root(1));
        assert_eq!(idx.parent(2), Some(1));
        assert_eq!(idx.coerced_rows(), 0);
    }

    #[test]
    fn out_of_range_lookups_are_safe() {
        let idx = index(&[0]);
        assert!(idx.get(5).is_none());
        assert!(!idx.has_children(5));
    }
}
