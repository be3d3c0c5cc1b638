use blst::{BLST_ERROR, min_pk::Signature as BlstSignature};

use crate::{
    PublicKey, constants::DST, errors::BLSError, signature::BLSSignature, traits::Verifiable,
};

impl BLSSignature {
    pub fn to_blst_signature(&self) -> Result<BlstSignature, BLSError> {
        BlstSignature::from_bytes(self.to_bytes()).map_err(|_| BLSError::InvalidSignature)
    }
}

impl Verifiable for BLSSignature {
    fn verify(&self, public_key: &PublicKey, message: &[u8]) -> Result<bool, BLSError> {
        let signature = self.to_blst_signature()?;
        let public_key = public_key.to_blst_public_key()?;

        Ok(
            signature.verify(true, message, DST, &[], &public_key, false)
                == BLST_ERROR::BLST_SUCCESS,
        )
    }
}
