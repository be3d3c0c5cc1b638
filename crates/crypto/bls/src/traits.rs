use crate::{PublicKey, errors::BLSError, signature::BLSSignature};

pub trait Signable {
    fn sign(&self, message: &[u8]) -> Result<BLSSignature, BLSError>;
}

pub trait Verifiable {
    /// Verifies a BLS signature against a public key and message.
    ///
    /// Returns `Ok(false)` when the signature does not match, and `Err` when the
    /// signature or public key bytes cannot be decoded.
    fn verify(&self, public_key: &PublicKey, message: &[u8]) -> Result<bool, BLSError>;
}
