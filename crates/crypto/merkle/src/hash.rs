use alloy_primitives::{B256, keccak256};

/// Commutative pair hash: the smaller node always goes first.
pub(crate) fn hash_pair(left: &B256, right: &B256) -> B256 {
    if left <= right {
        keccak256([left.as_slice(), right.as_slice()].concat())
    } else {
        keccak256([right.as_slice(), left.as_slice()].concat())
    }
}
