use alloy_primitives::{Address, B256, aliases::B32};
use anyhow::anyhow;
use depot_bls::{
    BLSSignature, PrivateKey, PublicKey,
    traits::{Signable, Verifiable},
};
use depot_consensus::{
    constants::{DEPOSIT_AMOUNT_GWEI, DOMAIN_DEPOSIT},
    deposit_data::DepositData,
    deposit_message::DepositMessage,
    misc::{compute_domain, compute_signing_root, withdrawal_credentials_from_address},
};
use depot_network_spec::networks::NetworkSpec;
use serde::{Deserialize, Serialize};
use tree_hash::TreeHash;

/// Deposit data in the JSON layout produced by the staking deposit CLI, which is what the
/// Operator and the authorization service both exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedDepositData {
    #[serde(rename = "pubkey")]
    pub public_key: PublicKey,
    pub withdrawal_credentials: B256,
    pub amount: u64,
    pub signature: BLSSignature,
    pub deposit_message_root: B256,
    pub deposit_data_root: B256,
    pub fork_version: B32,
    pub network_name: String,
    pub deposit_cli_version: String,
}

impl ExtendedDepositData {
    pub fn deposit_data(&self) -> DepositData {
        DepositData {
            public_key: self.public_key.clone(),
            withdrawal_credentials: self.withdrawal_credentials,
            amount: self.amount,
            signature: self.signature.clone(),
        }
    }
}

/// Signs a full deposit of `private_key` into `vault` and returns it with its derived roots.
pub fn generate_deposit_data(
    private_key: &PrivateKey,
    vault: Address,
    network_spec: &NetworkSpec,
) -> anyhow::Result<ExtendedDepositData> {
    let public_key = private_key
        .public_key()
        .map_err(|err| anyhow!("Failed to derive public key: {err}"))?;
    let deposit_message = DepositMessage {
        public_key: public_key.clone(),
        withdrawal_credentials: withdrawal_credentials_from_address(vault),
        amount: DEPOSIT_AMOUNT_GWEI,
    };
    let domain = compute_domain(
        DOMAIN_DEPOSIT,
        Some(network_spec.genesis_fork_version),
        None,
    );
    let signature = private_key
        .sign(compute_signing_root(&deposit_message, domain).as_ref())
        .map_err(|err| anyhow!("Failed to sign deposit message for {public_key}: {err}"))?;

    let deposit_data = DepositData {
        public_key,
        withdrawal_credentials: deposit_message.withdrawal_credentials,
        amount: deposit_message.amount,
        signature,
    };

    Ok(ExtendedDepositData {
        deposit_message_root: deposit_message.tree_hash_root(),
        deposit_data_root: deposit_data.deposit_data_root(),
        public_key: deposit_data.public_key,
        withdrawal_credentials: deposit_data.withdrawal_credentials,
        amount: deposit_data.amount,
        signature: deposit_data.signature,
        fork_version: network_spec.genesis_fork_version,
        network_name: network_spec.network.to_string(),
        deposit_cli_version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Deposits are valid across forks, so only the genesis fork version feeds the domain.
pub fn verify_deposit_signature(
    deposit_data: &DepositData,
    genesis_fork_version: B32,
) -> anyhow::Result<bool> {
    let domain = compute_domain(DOMAIN_DEPOSIT, Some(genesis_fork_version), None);
    let signing_root = compute_signing_root(deposit_data.deposit_message(), domain);

    deposit_data
        .signature
        .verify(&deposit_data.public_key, signing_root.as_ref())
        .map_err(|err| anyhow!("Invalid deposit signature: {err:?}"))
}
