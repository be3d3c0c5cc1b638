use alloy_primitives::B256;
use blst::min_pk::SecretKey as BlstSecretKey;

use crate::{
    PrivateKey, PublicKey,
    constants::DST,
    errors::BLSError,
    signature::BLSSignature,
    traits::Signable,
};

impl PrivateKey {
    /// Generates a fresh key from 32 bytes of OS randomness using the EIP-2333 `KeyGen`.
    pub fn generate() -> Result<Self, BLSError> {
        let input_key_material = rand::random::<[u8; 32]>();
        let secret_key = BlstSecretKey::key_gen(&input_key_material, &[])
            .map_err(|err| BLSError::BlstError(format!("{err:?}")))?;
        Ok(PrivateKey {
            inner: B256::from(secret_key.to_bytes()),
        })
    }

    pub fn public_key(&self) -> Result<PublicKey, BLSError> {
        let secret_key = self.to_blst_secret_key()?;
        PublicKey::from_bytes(&secret_key.sk_to_pk().to_bytes())
    }

    fn to_blst_secret_key(&self) -> Result<BlstSecretKey, BLSError> {
        BlstSecretKey::from_bytes(self.inner.as_slice()).map_err(|_| BLSError::InvalidPrivateKey)
    }
}

impl Signable for PrivateKey {
    fn sign(&self, message: &[u8]) -> Result<BLSSignature, BLSError> {
        let signature = self.to_blst_secret_key()?.sign(message, DST, &[]);
        BLSSignature::from_bytes(&signature.to_bytes())
    }
}
