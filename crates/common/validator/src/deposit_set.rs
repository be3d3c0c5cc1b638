use alloy_primitives::{B256, Bytes, U256, keccak256};
use alloy_sol_types::SolValue;
use depot_merkle::standard_merkle_root;

use crate::deposit::ExtendedDepositData;

/// Leaf for the deposit at `index`: double keccak over `abi.encode(pubkey ++ signature ++
/// deposit_data_root, index)`, the layout vaults verify with OpenZeppelin's `MerkleProof`.
pub fn deposit_data_leaf(deposit_data: &ExtendedDepositData, index: usize) -> B256 {
    let packed = Bytes::from(
        [
            deposit_data.public_key.to_bytes(),
            deposit_data.signature.to_bytes(),
            deposit_data.deposit_data_root.as_slice(),
        ]
        .concat(),
    );
    let encoded = (packed, U256::from(index)).abi_encode_params();
    keccak256(keccak256(encoded))
}

/// Root the vault stores as `validatorsRoot` for this exact, ordered deposit-data set.
pub fn deposit_data_set_root(deposit_data: &[ExtendedDepositData]) -> anyhow::Result<B256> {
    let leaves = deposit_data
        .iter()
        .enumerate()
        .map(|(index, deposit)| deposit_data_leaf(deposit, index))
        .collect::<Vec<_>>();
    standard_merkle_root(&leaves)
}
