use std::path::PathBuf;

use alloy_primitives::Address;
use depot_bls::errors::BLSError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Node wallet is not initialized in {0}")]
    NotReady(PathBuf),

    #[error("Parent wallet file {0} is missing")]
    ParentFileMissing(PathBuf),

    #[error("Node wallet already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Node wallet keystore is for {expected} but its secret belongs to {actual}")]
    AddressMismatch { expected: Address, actual: Address },

    #[error("Invalid node wallet secret: {0}")]
    InvalidSecret(String),

    #[error("Failed to sign message: {0}")]
    Signing(String),

    #[error("BLS error: {0}")]
    Bls(#[from] BLSError),

    #[error("Keystore error: {0}")]
    Keystore(#[from] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
