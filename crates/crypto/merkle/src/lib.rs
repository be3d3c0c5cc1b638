//! Sorted-pair keccak Merkle trees, laid out the way OpenZeppelin's `StandardMerkleTree`
//! builds them so roots match what contracts verify with `MerkleProof`.

use alloy_primitives::B256;
use anyhow::ensure;

mod hash;

use hash::hash_pair;

/// Builds the flat tree array. Index 0 is the root, leaves occupy the tail in reverse
/// order, and the children of node `i` live at `2i + 1` and `2i + 2`.
pub fn merkle_tree(leaves: &[B256]) -> anyhow::Result<Vec<B256>> {
    ensure!(!leaves.is_empty(), "Expected non-zero number of leaves");

    let tree_length = 2 * leaves.len() - 1;
    let mut tree = vec![B256::ZERO; tree_length];
    for (index, leaf) in leaves.iter().enumerate() {
        tree[tree_length - 1 - index] = *leaf;
    }
    for index in (0..tree_length - leaves.len()).rev() {
        tree[index] = hash_pair(&tree[2 * index + 1], &tree[2 * index + 2]);
    }

    Ok(tree)
}

/// Root over `leaves` after sorting them, as OpenZeppelin's `StandardMerkleTree` builds it
/// with `sortLeaves: true`.
pub fn standard_merkle_root(leaves: &[B256]) -> anyhow::Result<B256> {
    let mut sorted_leaves = leaves.to_vec();
    sorted_leaves.sort();
    Ok(merkle_tree(&sorted_leaves)?[0])
}

#[cfg(test)]
mod tests {
    use alloy_primitives::keccak256;

    use super::*;

    #[test]
    fn test_single_leaf_is_root() {
        let leaf = keccak256(b"only");
        assert_eq!(standard_merkle_root(&[leaf]).unwrap(), leaf);
    }

    #[test]
    fn test_empty_tree_is_rejected() {
        assert!(merkle_tree(&[]).is_err());
    }

    #[test]
    fn test_root_of_four_leaves() {
        let leaves = [
            B256::repeat_byte(0xaa),
            B256::repeat_byte(0xbb),
            B256::repeat_byte(0xcc),
            B256::repeat_byte(0xdd),
        ];

        let tree = merkle_tree(&leaves).unwrap();
        let left = hash_pair(&leaves[3], &leaves[2]);
        let right = hash_pair(&leaves[1], &leaves[0]);
        assert_eq!(tree[0], hash_pair(&left, &right));
    }

    #[test]
    fn test_root_of_three_leaves() {
        let leaves = [
            B256::repeat_byte(0x01),
            B256::repeat_byte(0x02),
            B256::repeat_byte(0x03),
        ];

        // tree = [root, n1, leaf2, leaf1, leaf0]; n1 = hash(leaf1, leaf0)
        let tree = merkle_tree(&leaves).unwrap();
        let inner = hash_pair(&leaves[1], &leaves[0]);
        assert_eq!(tree[1], inner);
        assert_eq!(tree[0], hash_pair(&inner, &leaves[2]));
    }

    #[test]
    fn test_standard_root_ignores_input_order() {
        let leaves = [keccak256(b"a"), keccak256(b"b"), keccak256(b"c")];
        let reversed = [leaves[2], leaves[1], leaves[0]];
        assert_eq!(
            standard_merkle_root(&leaves).unwrap(),
            standard_merkle_root(&reversed).unwrap()
        );
    }
}
