//! Row memberships
//!
//! Weighted views over the rows belonging to one tree node, and cursors for
//! scanning a single attribute column restricted to such a view. Views are
//! immutable once built; a child view is derived functionally from its parent
//! and an inclusion bitmap, so concurrent node evaluations never share
//! mutable membership state.
use fixedbitset::FixedBitSet;

/// An indexed, weighted view over the subset of rows that belong to one tree
/// node, without copying any column data.
///
/// Position `i` in the view maps to the global row
/// `original_row_index[i]` with weight `row_weight[i]`. The two arrays are
/// always the same length.
#[derive(Debug, Clone)]
pub struct RowSubsetView {
    row_weight: Vec<f64>,
    original_row_index: Vec<usize>,
}

impl RowSubsetView {
    /// Create the root view spanning all rows of the table, each with
    /// weight 1.0.
    pub fn root(row_count: usize) -> Self {
        RowSubsetView {
            row_weight: vec![1.0; row_count],
            original_row_index: (0..row_count).collect(),
        }
    }

    /// Create a root view with externally supplied row weights, such as the
    /// occurrence counts produced by bagging or boosting.
    pub fn with_weights(row_weight: Vec<f64>) -> Self {
        let original_row_index = (0..row_weight.len()).collect();
        RowSubsetView {
            row_weight,
            original_row_index,
        }
    }

    /// Derive the view of a child node from this view and an inclusion
    /// bitmap over this view's local row positions. Weights carry over.
    pub fn child(&self, included: &FixedBitSet) -> Self {
        let n = included.count_ones(..);
        let mut row_weight = Vec::with_capacity(n);
        let mut original_row_index = Vec::with_capacity(n);
        for i in included.ones() {
            if i >= self.row_count() {
                break;
            }
            row_weight.push(self.row_weight[i]);
            original_row_index.push(self.original_row_index[i]);
        }
        RowSubsetView {
            row_weight,
            original_row_index,
        }
    }

    /// Number of rows in this view.
    pub fn row_count(&self) -> usize {
        self.original_row_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original_row_index.is_empty()
    }

    /// Weight of the row at local position `i`.
    pub fn weight(&self, i: usize) -> f64 {
        self.row_weight[i]
    }

    /// Global row id of the row at local position `i`.
    pub fn original_index(&self, i: usize) -> usize {
        self.original_row_index[i]
    }

    /// Total weight of all rows in the view.
    pub fn total_weight(&self) -> f64 {
        self.row_weight.iter().sum()
    }

    /// Create a cursor over `column` restricted to the rows of this view.
    pub fn cursor<'a>(&'a self, column: &'a [f64]) -> ColumnCursor<'a> {
        ColumnCursor::new(column, self)
    }
}

/// A forward-seekable cursor over one column's values restricted to the rows
/// of a [`RowSubsetView`], visited in the view's row order.
///
/// The cursor starts located at row 0, so the current row must be read
/// before the first [`advance`](ColumnCursor::advance). It is stateful and
/// single-node-scoped: concurrent workers each create their own cursor
/// rather than sharing one.
#[derive(Debug)]
pub struct ColumnCursor<'a> {
    column: &'a [f64],
    view: &'a RowSubsetView,
    position: usize,
}

impl<'a> ColumnCursor<'a> {
    /// Create a new cursor located at the first row of the view.
    pub fn new(column: &'a [f64], view: &'a RowSubsetView) -> Self {
        ColumnCursor {
            column,
            view,
            position: 0,
        }
    }

    /// Number of rows in the underlying view.
    pub fn size(&self) -> usize {
        self.view.row_count()
    }

    /// Move to the next row. Returns false and leaves the position unchanged
    /// if the cursor is already at the last row.
    pub fn advance(&mut self) -> bool {
        if self.position + 1 < self.size() {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Jump to `index_in_view` if it is within bounds and report whether the
    /// jump succeeded. An out-of-range request leaves the position
    /// unchanged and returns false rather than failing.
    pub fn seek_from(&mut self, index_in_view: usize) -> bool {
        if index_in_view < self.size() {
            self.position = index_in_view;
            true
        } else {
            false
        }
    }

    /// Return to the first row.
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Weight of the row at the cursor's position.
    pub fn current_weight(&self) -> f64 {
        self.view.weight(self.position)
    }

    /// Global row id of the row at the cursor's position.
    pub fn current_global_row(&self) -> usize {
        self.view.original_index(self.position)
    }

    /// Position of the cursor within the view.
    pub fn current_local_index(&self) -> usize {
        self.position
    }

    /// Column value of the row at the cursor's position.
    pub fn current_value(&self) -> f64 {
        self.column[self.current_global_row()]
    }
}
