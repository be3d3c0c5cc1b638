use std::fmt;

use alloy_primitives::B256;

use crate::errors::BLSError;

#[derive(PartialEq, Clone, Default, Eq, Hash)]
pub struct PrivateKey {
    pub inner: B256,
}

impl PrivateKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BLSError> {
        if bytes.len() != 32 {
            return Err(BLSError::InvalidByteLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        Ok(PrivateKey {
            inner: B256::from_slice(bytes),
        })
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}
