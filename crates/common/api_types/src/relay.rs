use alloy_primitives::Address;
use depot_bls::PublicKey;
use serde::{Deserialize, Serialize};

/// Batch request sent by the Operator to `POST /validators`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorsRequest {
    pub vault: Address,
    pub validators_start_index: u64,
    pub validators_batch_size: u64,
    pub validators_total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorInfo {
    pub public_key: PublicKey,
    pub deposit_signature: String,
    pub amount_gwei: u64,
    pub exit_signature: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorsResponse {
    pub validators: Vec<ValidatorInfo>,
    pub validators_manager_signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoResponse {
    pub network: String,
    pub vault: Address,
    pub deployment: String,
    pub version: String,
    pub available_keys: usize,
}
