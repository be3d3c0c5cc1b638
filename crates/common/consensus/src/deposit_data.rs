use alloy_primitives::B256;
use depot_bls::{BLSSignature, PublicKey};
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash::TreeHash;
use tree_hash_derive::TreeHash;

use crate::deposit_message::DepositMessage;

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct DepositData {
    #[serde(rename = "pubkey")]
    pub public_key: PublicKey,
    pub withdrawal_credentials: B256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub amount: u64,
    pub signature: BLSSignature,
}

impl DepositData {
    pub fn deposit_message(&self) -> DepositMessage {
        DepositMessage {
            public_key: self.public_key.clone(),
            withdrawal_credentials: self.withdrawal_credentials,
            amount: self.amount,
        }
    }

    /// The root the deposit contract recomputes and checks against `deposit_data_root`.
    pub fn deposit_data_root(&self) -> B256 {
        self.tree_hash_root()
    }
}
