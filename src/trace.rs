//! Shared trace matrix for constraint rows.
//!
//! The matrix is a pre-sized arena of fixed-width rows. Gadgets never hold
//! pointers into it; they receive a bounds-checked `RowRange` from the
//! session's allocator and write through `rows_mut`, so ranges cannot alias.

use ark_bls12_381::Fr;
use ark_ff::{AdditiveGroup, Field};

/// One row of the Merkle gadget's column group.
///
/// All-zero rows are valid padding: `sel = 0` disables every relation the
/// constraint system attaches to this column set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleRow {
    /// Gadget selector, 1 on every populated row
    pub sel: Fr,
    /// Row key, strictly increasing across the session
    pub clk: Fr,
    /// Node index at this level
    pub node_index: Fr,
    /// Running hash value entering this level
    pub node_value: Fr,
    /// Sibling value at this level
    pub sibling: Fr,
    /// 1 when `node_index` is even
    pub index_is_even: Fr,
    /// Left hash operand
    pub left: Fr,
    /// Right hash operand
    pub right: Fr,
    /// Hash output for this level
    pub output: Fr,
    /// Root the operation was checked against (constant across the group)
    pub expected_root: Fr,
    /// Levels left after this row
    pub remaining_len: Fr,
    /// Inverse of `remaining_len`, 0 when `remaining_len` is 0
    pub remaining_len_inv: Fr,
    /// Inverse of `output - expected_root`, 0 when they agree
    pub diff_inv: Fr,
    /// 1 on the last row of an operation
    pub latch: Fr,
    /// Membership result, nonzero only on latched membership rows
    pub is_member: Fr,
    /// Operation tag, nonzero only on latched rows
    pub sel_membership: Fr,
    /// Operation tag, nonzero only on latched rows
    pub sel_update: Fr,
}

impl Default for MerkleRow {
    fn default() -> Self {
        Self {
            sel: Fr::ZERO,
            clk: Fr::ZERO,
            node_index: Fr::ZERO,
            node_value: Fr::ZERO,
            sibling: Fr::ZERO,
            index_is_even: Fr::ZERO,
            left: Fr::ZERO,
            right: Fr::ZERO,
            output: Fr::ZERO,
            expected_root: Fr::ZERO,
            remaining_len: Fr::ZERO,
            remaining_len_inv: Fr::ZERO,
            diff_inv: Fr::ZERO,
            latch: Fr::ZERO,
            is_member: Fr::ZERO,
            sel_membership: Fr::ZERO,
            sel_update: Fr::ZERO,
        }
    }
}

/// Contiguous handle into the trace matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowRange {
    pub start: usize,
    pub len: usize,
}

impl RowRange {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Pre-sized arena of trace rows.
pub struct TraceMatrix {
    rows: Vec<MerkleRow>,
}

impl TraceMatrix {
    /// Creates a matrix of `height` zeroed rows.
    pub fn new(height: usize) -> Self {
        Self {
            rows: vec![MerkleRow::default(); height],
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[MerkleRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &MerkleRow {
        &self.rows[index]
    }

    /// Mutable view of a range. Panics if the range exceeds the matrix.
    pub fn range_mut(&mut self, range: RowRange) -> &mut [MerkleRow] {
        assert!(
            range.end() <= self.rows.len(),
            "row range {}..{} exceeds trace height {}",
            range.start,
            range.end(),
            self.rows.len()
        );
        &mut self.rows[range.start..range.end()]
    }
}

/// One proving session's trace-building pass.
///
/// Owns the matrix and a bump allocator over its rows; ranges handed out by
/// `allocate` are disjoint by construction. `close` ends the session and
/// releases the finished matrix to the prover.
pub struct TraceSession {
    matrix: TraceMatrix,
    cursor: usize,
}

impl TraceSession {
    pub fn open(height: usize) -> Self {
        Self {
            matrix: TraceMatrix::new(height),
            cursor: 0,
        }
    }

    /// Reserves the next `len` rows. Panics if the matrix is exhausted.
    pub fn allocate(&mut self, len: usize) -> RowRange {
        assert!(
            self.cursor + len <= self.matrix.height(),
            "cannot allocate {} rows at cursor {} in a trace of height {}",
            len,
            self.cursor,
            self.matrix.height()
        );
        let range = RowRange {
            start: self.cursor,
            len,
        };
        self.cursor += len;
        range
    }

    pub fn rows_mut(&mut self, range: RowRange) -> &mut [MerkleRow] {
        self.matrix.range_mut(range)
    }

    pub fn close(self) -> TraceMatrix {
        self.matrix
    }
}

/// Inverse-or-zero witness for the zero-test idiom.
///
/// Returns 0 for 0, else the multiplicative inverse, so the constraint
/// `v * (1 - v * inv) = 0` holds and `1 - v * inv` is 1 exactly when `v` is
/// zero. Shared by every inverse column the gadget emits.
pub fn zero_test_inverse(value: Fr) -> Fr {
    value.inverse().unwrap_or(Fr::ZERO)
}
