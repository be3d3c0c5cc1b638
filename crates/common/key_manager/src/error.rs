use depot_beacon_client::ClientError;
use depot_bls::PublicKey;
use depot_execution_client::ExecutionError;
use depot_storage::errors::StoreError;
use depot_wallet::WalletError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyManagerError {
    #[error("Execution client is not synced")]
    ExecutionClientNotSynced,

    #[error("Beacon node is not synced")]
    BeaconNodeNotSynced,

    #[error("Beacon node error: {0}")]
    Consensus(#[from] ClientError),

    #[error("Execution client error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("No private key loaded for {0:?}")]
    MissingPrivateKey(PublicKey),

    #[error("Key loading task failed: {0}")]
    KeyLoading(String),
}
