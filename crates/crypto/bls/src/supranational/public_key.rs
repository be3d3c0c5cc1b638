use blst::min_pk::PublicKey as BlstPublicKey;

use crate::{PublicKey, errors::BLSError};

impl PublicKey {
    pub fn to_blst_public_key(&self) -> Result<BlstPublicKey, BLSError> {
        BlstPublicKey::key_validate(self.to_bytes()).map_err(|_| BLSError::InvalidPublicKey)
    }
}
