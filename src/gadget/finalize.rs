//! Expansion of the entry log into constraint rows.

use ark_bls12_381::Fr;
use ark_ff::{AdditiveGroup, Field};

use crate::gadget::walk::{MerkleTraceBuilder, entry_id};
use crate::hash::TwoToOneHasher;
use crate::trace::{MerkleRow, zero_test_inverse};

impl<H: TwoToOneHasher> MerkleTraceBuilder<H> {
    /// Expands the entry log into `rows`, one row per recorded level, in log
    /// order and leaf-to-root within each operation.
    ///
    /// Runs once per session, after recording has ended. The destination
    /// slice must hold exactly [`row_count`](Self::row_count) rows; it is the
    /// caller's pre-assigned range of the shared trace matrix. Operand order
    /// is re-derived from index parity, never invented, and `output` is
    /// asserted from the recorded walk rather than recomputed: the hash
    /// relation itself is checked by the hash primitive's own constraints.
    pub fn finalize(&self, rows: &mut [MerkleRow]) {
        assert_eq!(
            rows.len(),
            self.row_count(),
            "destination range must hold exactly one row per recorded level"
        );

        let mut cursor = 0;
        for entry in self.entries() {
            let path_len = entry.path.len();
            let base = entry_id(entry.sequence_id);
            let mut node_index = entry.leaf_index;
            let mut node_value = entry.leaf_value;

            for level in 0..path_len {
                let sibling = entry.path[level];
                let output = entry.path_values[level];
                let even = node_index % 2 == 0;
                let remaining = (path_len - level - 1) as u64;

                let row = &mut rows[cursor];
                cursor += 1;

                row.sel = Fr::ONE;
                row.clk = Fr::from(base + level as u64);
                row.node_index = Fr::from(node_index);
                row.node_value = node_value;
                row.sibling = sibling;
                row.index_is_even = if even { Fr::ONE } else { Fr::ZERO };
                row.left = if even { node_value } else { sibling };
                row.right = if even { sibling } else { node_value };
                row.output = output;
                row.expected_root = entry.root;
                row.remaining_len = Fr::from(remaining);
                row.remaining_len_inv = zero_test_inverse(Fr::from(remaining));
                row.diff_inv = zero_test_inverse(output - entry.root);

                // Operation-level results live on the latch row only
                if level == path_len - 1 {
                    row.latch = Fr::ONE;
                    row.is_member = if entry.is_member { Fr::ONE } else { Fr::ZERO };
                    row.sel_membership = if entry.is_membership_op {
                        Fr::ONE
                    } else {
                        Fr::ZERO
                    };
                    row.sel_update = if entry.is_update_op { Fr::ONE } else { Fr::ZERO };
                }

                node_value = output;
                node_index >>= 1;
            }
        }
    }
}
