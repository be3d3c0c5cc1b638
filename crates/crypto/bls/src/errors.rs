use thiserror::Error;

#[derive(Error, PartialEq, Debug)]
pub enum BLSError {
    #[error("Invalid hex string")]
    InvalidHexString,

    #[error("Invalid byte length, expected {expected} got {actual}")]
    InvalidByteLength { expected: usize, actual: usize },

    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Invalid private key")]
    InvalidPrivateKey,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("blst error: {0}")]
    BlstError(String),
}
