//! Path walking and the per-operation entry log.

use ark_bls12_381::Fr;

use crate::hash::TwoToOneHasher;

/// Levels reserved per operation in the row-key space. Also the deepest
/// tree this gadget supports.
pub const LEVEL_CAPACITY: u64 = 64;

/// Base of the hash-domain and row-key range owned by one operation.
pub fn entry_id(sequence_id: u32) -> u64 {
    u64::from(sequence_id) * LEVEL_CAPACITY
}

/// One recorded Merkle-path operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalkRecord {
    /// Operation identifier, strictly increasing within a session
    pub sequence_id: u32,
    /// Original leaf content
    pub leaf_value: Fr,
    /// Tree position; its bit pattern picks left/right at each level
    pub leaf_index: u64,
    /// Sibling values, leaf to root
    pub path: Vec<Fr>,
    /// Reserved; not populated by the walker
    pub path_bits: Vec<bool>,
    /// Intermediate hash outputs, one per level
    pub path_values: Vec<Fr>,
    /// Root this operation was checked against
    pub root: Fr,
    pub is_membership_op: bool,
    pub is_update_op: bool,
    /// Meaningful only when `is_membership_op` is set
    pub is_member: bool,
}

/// Records Merkle-path operations and accumulates the entry log for one
/// proving session.
pub struct MerkleTraceBuilder<H: TwoToOneHasher> {
    hasher: H,
    entries: Vec<WalkRecord>,
}

impl<H: TwoToOneHasher> MerkleTraceBuilder<H> {
    pub fn new(hasher: H) -> Self {
        Self {
            hasher,
            entries: Vec::new(),
        }
    }

    /// Recomputes the root from a leaf and its sibling path, recording every
    /// intermediate hash.
    ///
    /// At each level the current index's parity decides operand order: even
    /// means the current value hashes on the left. The hash domain is
    /// `entry_id(sequence_id) + level`, unique per level across the session.
    /// An empty path yields `root == leaf_value`.
    pub fn compute_root_from_path(
        &self,
        sequence_id: u32,
        leaf_value: Fr,
        leaf_index: u64,
        path: &[Fr],
    ) -> WalkRecord {
        assert!(
            path.len() as u64 <= LEVEL_CAPACITY,
            "path length {} exceeds the supported depth of {}",
            path.len(),
            LEVEL_CAPACITY
        );
        if (path.len() as u64) < LEVEL_CAPACITY {
            assert!(
                leaf_index >> path.len() == 0,
                "leaf index {} out of range for a tree of depth {}",
                leaf_index,
                path.len()
            );
        }

        let base = entry_id(sequence_id);
        let mut curr_value = leaf_value;
        let mut curr_index = leaf_index;
        let mut path_values = Vec::with_capacity(path.len());
        for (level, sibling) in path.iter().enumerate() {
            let domain_id = base + level as u64;
            curr_value = if curr_index % 2 == 0 {
                self.hasher.hash(curr_value, *sibling, domain_id)
            } else {
                self.hasher.hash(*sibling, curr_value, domain_id)
            };
            path_values.push(curr_value);
            curr_index >>= 1;
        }

        WalkRecord {
            sequence_id,
            leaf_value,
            leaf_index,
            path: path.to_vec(),
            path_bits: Vec::new(),
            path_values,
            root: curr_value,
            is_membership_op: false,
            is_update_op: false,
            is_member: false,
        }
    }

    /// Checks the leaf against an externally supplied candidate root and
    /// records the operation. Non-membership is a normal provable outcome.
    ///
    /// On mismatch the stored record keeps `candidate_root`, not the
    /// computed value: downstream constraints always compare against the
    /// root the operation was checked against, while `path_values` still
    /// locates where the chains diverge.
    ///
    /// With an empty path the operation emits no trace rows, so its result
    /// cannot be latched here and must be asserted by the caller through
    /// another mechanism.
    pub fn check_membership(
        &mut self,
        sequence_id: u32,
        leaf_value: Fr,
        leaf_index: u64,
        path: &[Fr],
        candidate_root: Fr,
    ) -> bool {
        let mut entry = self.compute_root_from_path(sequence_id, leaf_value, leaf_index, path);
        entry.is_membership_op = true;
        let is_member = entry.root == candidate_root;
        entry.is_member = is_member;
        if !is_member {
            entry.root = candidate_root;
        }
        self.append(entry);
        is_member
    }

    /// Writes a new leaf value and records the operation. The recomputed
    /// root is authoritative and becomes the new committed root.
    ///
    /// The empty-path caveat on [`check_membership`](Self::check_membership)
    /// applies here as well.
    pub fn update_leaf(
        &mut self,
        sequence_id: u32,
        leaf_value: Fr,
        leaf_index: u64,
        path: &[Fr],
    ) -> Fr {
        let mut entry = self.compute_root_from_path(sequence_id, leaf_value, leaf_index, path);
        entry.is_update_op = true;
        let root = entry.root;
        self.append(entry);
        root
    }

    pub fn entries(&self) -> &[WalkRecord] {
        &self.entries
    }

    /// Trace rows the log expands to: one per recorded level.
    pub fn row_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.path.len()).sum()
    }

    fn append(&mut self, entry: WalkRecord) {
        if let Some(last) = self.entries.last() {
            assert!(
                entry.sequence_id > last.sequence_id,
                "sequence id {} does not increase past {}",
                entry.sequence_id,
                last.sequence_id
            );
        }
        self.entries.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Sha2Hasher;

    #[test]
    fn test_walk_is_deterministic() {
        let builder = MerkleTraceBuilder::new(Sha2Hasher);
        let path = vec![Fr::from(11u64), Fr::from(12u64), Fr::from(13u64)];
        let a = builder.compute_root_from_path(1, Fr::from(7u64), 5, &path);
        let b = builder.compute_root_from_path(1, Fr::from(7u64), 5, &path);
        assert_eq!(a.root, b.root);
        assert_eq!(a.path_values, b.path_values);
    }

    #[test]
    fn test_empty_path_root_is_leaf() {
        let builder = MerkleTraceBuilder::new(Sha2Hasher);
        let entry = builder.compute_root_from_path(0, Fr::from(9u64), 0, &[]);
        assert_eq!(entry.root, Fr::from(9u64));
        assert!(entry.path_values.is_empty());
    }

    #[test]
    fn test_membership_round_trip() {
        let mut builder = MerkleTraceBuilder::new(Sha2Hasher);
        let path = vec![Fr::from(3u64), Fr::from(4u64)];
        let root = builder
            .compute_root_from_path(0, Fr::from(1u64), 2, &path)
            .root;
        assert!(builder.check_membership(0, Fr::from(1u64), 2, &path, root));
        let entry = &builder.entries()[0];
        assert!(entry.is_membership_op);
        assert!(entry.is_member);
        assert_eq!(entry.root, root);
    }

    #[test]
    fn test_non_membership_stores_candidate() {
        let mut builder = MerkleTraceBuilder::new(Sha2Hasher);
        let path = vec![Fr::from(3u64), Fr::from(4u64)];
        let computed = builder
            .compute_root_from_path(0, Fr::from(1u64), 2, &path)
            .root;
        let candidate = computed + Fr::from(1u64);
        assert!(!builder.check_membership(0, Fr::from(1u64), 2, &path, candidate));
        let entry = &builder.entries()[0];
        assert!(!entry.is_member);
        assert_eq!(entry.root, candidate);
        assert_eq!(*entry.path_values.last().unwrap(), computed);
    }

    #[test]
    fn test_update_then_check() {
        let mut builder = MerkleTraceBuilder::new(Sha2Hasher);
        let path = vec![Fr::from(21u64), Fr::from(22u64), Fr::from(23u64)];
        let new_root = builder.update_leaf(4, Fr::from(99u64), 6, &path);
        let entry = &builder.entries()[0];
        assert!(entry.is_update_op);
        assert!(!entry.is_membership_op);
        assert!(builder.check_membership(5, Fr::from(99u64), 6, &path, new_root));
    }

    #[test]
    fn test_concrete_scenario() {
        // leaf = 5 at index 2 (binary 10): level 0 even, level 1 odd
        let builder = MerkleTraceBuilder::new(Sha2Hasher);
        let a = Fr::from(101u64);
        let b = Fr::from(202u64);
        let leaf = Fr::from(5u64);
        let entry = builder.compute_root_from_path(3, leaf, 2, &[a, b]);

        let base = entry_id(3);
        let h0 = Sha2Hasher.hash(leaf, a, base);
        let h1 = Sha2Hasher.hash(b, h0, base + 1);
        assert_eq!(entry.path_values, vec![h0, h1]);
        assert_eq!(entry.root, h1);
    }

    #[test]
    #[should_panic(expected = "does not increase")]
    fn test_sequence_ids_must_increase() {
        let mut builder = MerkleTraceBuilder::new(Sha2Hasher);
        let path = vec![Fr::from(1u64)];
        builder.update_leaf(2, Fr::from(1u64), 0, &path);
        builder.update_leaf(2, Fr::from(2u64), 1, &path);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_index_too_large_for_path() {
        let builder = MerkleTraceBuilder::new(Sha2Hasher);
        builder.compute_root_from_path(0, Fr::from(1u64), 4, &[Fr::from(1u64), Fr::from(2u64)]);
    }
}
