use alloy_primitives::{Address, Bytes, eip191_hash_message, keccak256};
use k256::{SecretKey, ecdsa::SigningKey, elliptic_curve::sec1::ToEncodedPoint};

use crate::error::WalletError;

/// The node's secp256k1 account, used to log in to the authorization service.
#[derive(Clone)]
pub struct NodeWallet {
    secret_key: SecretKey,
    address: Address,
}

impl NodeWallet {
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let address = address_from_public_key(&secret_key.public_key());
        Self {
            secret_key,
            address,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WalletError> {
        let secret_key = SecretKey::from_slice(bytes)
            .map_err(|err| WalletError::InvalidSecret(err.to_string()))?;
        Ok(Self::from_secret_key(secret_key))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn secret_bytes(&self) -> Vec<u8> {
        self.secret_key.to_bytes().to_vec()
    }

    /// EIP-191 personal message signature, `r || s || v` with `v` in {27, 28}.
    pub fn sign_message(&self, message: &[u8]) -> Result<Bytes, WalletError> {
        let digest = eip191_hash_message(message);
        let signing_key = SigningKey::from(&self.secret_key);
        let (signature, recovery_id) = signing_key
            .sign_prehash_recoverable(digest.as_slice())
            .map_err(|err| WalletError::Signing(err.to_string()))?;

        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte() + 27);
        Ok(Bytes::from(bytes))
    }
}

impl std::fmt::Debug for NodeWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeWallet({})", self.address)
    }
}

pub fn address_from_public_key(public_key: &k256::PublicKey) -> Address {
    let encoded = public_key.to_encoded_point(false);
    Address::from_slice(&keccak256(&encoded.as_bytes()[1..])[12..])
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, hex};
    use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

    use super::*;

    fn key_one() -> NodeWallet {
        NodeWallet::from_bytes(&hex!(
            "0000000000000000000000000000000000000000000000000000000000000001"
        ))
        .unwrap()
    }

    #[test]
    fn test_address_derivation() {
        assert_eq!(
            key_one().address(),
            address!("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf")
        );
    }

    #[test]
    fn test_sign_message_recovers_to_address() {
        let wallet = key_one();
        let message = br#"{"nonce":"abc","address":"0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"}"#;
        let signature = wallet.sign_message(message).unwrap();
        assert_eq!(signature.len(), 65);
        assert!(signature[64] == 27 || signature[64] == 28);

        let recovery_id = RecoveryId::from_byte(signature[64] - 27).unwrap();
        let parsed = Signature::from_slice(&signature[..64]).unwrap();
        let recovered = VerifyingKey::recover_from_prehash(
            eip191_hash_message(message).as_slice(),
            &parsed,
            recovery_id,
        )
        .unwrap();
        assert_eq!(
            address_from_public_key(&k256::PublicKey::from(&recovered)),
            wallet.address()
        );
    }

    #[test]
    fn test_rejects_zero_secret() {
        assert!(NodeWallet::from_bytes(&[0u8; 32]).is_err());
    }
}
