use std::{fs, path::Path};

use anyhow::{anyhow, bail, ensure};
use depot_bls::{PrivateKey, PublicKey};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{cipher::aes128_ctr, hex_serde, kdf::pbkdf2_sha256};

/// EIP-2335 recommends this iteration count for PBKDF2.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 262_144;
pub const DERIVED_KEY_LENGTH: u8 = 32;
pub const KEYSTORE_VERSION: u64 = 4;

/// An EIP-2335 keystore. `P` is whatever identifies the secret: a BLS public key
/// for validator keys, an execution address for the node wallet.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct EncryptedKeystore<P = PublicKey> {
    pub crypto: Crypto,
    pub description: String,
    #[serde(rename = "pubkey")]
    pub public_key: P,
    pub path: String,
    pub uuid: String,
    pub version: u64,
}

pub struct Keystore {
    pub public_key: PublicKey,
    pub private_key: PrivateKey,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct Crypto {
    pub kdf: FunctionBlock<KdfParams>,
    pub checksum: FunctionBlock<ChecksumParams>,
    pub cipher: FunctionBlock<CipherParams>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct FunctionBlock<ParamType> {
    #[serde(flatten)]
    pub params: ParamType,
    #[serde(with = "hex_serde")]
    pub message: Vec<u8>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(tag = "function", content = "params", rename_all = "lowercase")]
pub enum KdfParams {
    Pbkdf2 {
        c: u32,
        dklen: u8,
        prf: String,
        #[serde(with = "hex_serde")]
        salt: Vec<u8>,
    },
}

impl KdfParams {
    pub fn derive_key(&self, password: &[u8]) -> anyhow::Result<Vec<u8>> {
        match self {
            KdfParams::Pbkdf2 {
                c,
                dklen,
                prf,
                salt,
            } => {
                ensure!(prf == "hmac-sha256", "Unsupported PBKDF2 PRF: {prf}");
                ensure!(*dklen >= 32, "Derived key length must be at least 32 bytes");
                Ok(pbkdf2_sha256(password, salt, *c, *dklen as usize))
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(tag = "function", content = "params")]
pub enum CipherParams {
    #[serde(rename = "aes-128-ctr")]
    Aes128Ctr {
        #[serde(with = "hex_serde")]
        iv: Vec<u8>,
    },
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(tag = "function", content = "params", rename_all = "lowercase")]
pub enum ChecksumParams {
    Sha256 {},
}

fn checksum(derived_key: &[u8], cipher_message: &[u8]) -> Vec<u8> {
    Sha256::new()
        .chain_update(&derived_key[16..32])
        .chain_update(cipher_message)
        .finalize()
        .to_vec()
}

fn cipher_key(derived_key: &[u8]) -> anyhow::Result<[u8; 16]> {
    derived_key[0..16]
        .try_into()
        .map_err(|err| anyhow!("Failed to convert derived key into 16 byte array: {err:?}"))
}

impl<P> EncryptedKeystore<P>
where
    P: Serialize + DeserializeOwned,
{
    /// Encrypts `secret` under `password` with a fresh salt and IV.
    pub fn encrypt(
        secret: &[u8],
        password: &[u8],
        public_key: P,
        path: String,
        iterations: u32,
    ) -> anyhow::Result<Self> {
        let kdf = KdfParams::Pbkdf2 {
            c: iterations,
            dklen: DERIVED_KEY_LENGTH,
            prf: "hmac-sha256".to_string(),
            salt: rand::random::<[u8; 32]>().to_vec(),
        };
        let initial_vector = rand::random::<[u8; 16]>();
        let derived_key = kdf.derive_key(password)?;

        let mut cipher_message = secret.to_vec();
        aes128_ctr(&mut cipher_message, cipher_key(&derived_key)?, &initial_vector);

        Ok(EncryptedKeystore {
            crypto: Crypto {
                kdf: FunctionBlock {
                    params: kdf,
                    message: vec![],
                },
                checksum: FunctionBlock {
                    params: ChecksumParams::Sha256 {},
                    message: checksum(&derived_key, &cipher_message),
                },
                cipher: FunctionBlock {
                    params: CipherParams::Aes128Ctr {
                        iv: initial_vector.to_vec(),
                    },
                    message: cipher_message,
                },
            },
            description: String::new(),
            public_key,
            path,
            uuid: Uuid::new_v4().to_string(),
            version: KEYSTORE_VERSION,
        })
    }

    pub fn load_from_file<T: AsRef<Path>>(path: T) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(fs::read_to_string(path)?.as_str())?)
    }

    pub fn save_to_file<T: AsRef<Path>>(&self, path: T) -> anyhow::Result<()> {
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    pub fn validate_password(&self, password: &[u8]) -> anyhow::Result<bool> {
        let derived_key = self.crypto.kdf.params.derive_key(password)?;
        Ok(checksum(&derived_key, &self.crypto.cipher.message) == self.crypto.checksum.message)
    }

    pub fn decrypt_secret(&self, password: &[u8]) -> anyhow::Result<Vec<u8>> {
        let derived_key = self.crypto.kdf.params.derive_key(password)?;
        if checksum(&derived_key, &self.crypto.cipher.message) != self.crypto.checksum.message {
            bail!("Password provided is invalid!");
        }

        let mut secret = self.crypto.cipher.message.clone();
        match &self.crypto.cipher.params {
            CipherParams::Aes128Ctr { iv } => {
                let initial_vector: &[u8; 16] = iv.as_slice().try_into().map_err(|err| {
                    anyhow!("Failed to convert initial vector into 16 byte array: {err:?}")
                })?;
                aes128_ctr(&mut secret, cipher_key(&derived_key)?, initial_vector);
            }
        }
        Ok(secret)
    }
}

impl EncryptedKeystore {
    pub fn from_private_key(
        private_key: &PrivateKey,
        password: &[u8],
        iterations: u32,
    ) -> anyhow::Result<Self> {
        let public_key = private_key
            .public_key()
            .map_err(|err| anyhow!("Failed to derive public key: {err}"))?;
        Self::encrypt(
            private_key.inner.as_slice(),
            password,
            public_key,
            String::new(),
            iterations,
        )
    }

    pub fn decrypt(&self, password: &[u8]) -> anyhow::Result<Keystore> {
        let private_key = PrivateKey::from_bytes(&self.decrypt_secret(password)?)
            .map_err(|err| anyhow!("Decrypted secret is not a BLS private key: {err}"))?;
        let derived_public_key = private_key
            .public_key()
            .map_err(|err| anyhow!("Failed to derive public key: {err}"))?;
        ensure!(
            derived_public_key == self.public_key,
            "Keystore public key {} does not match its secret",
            self.public_key
        );

        Ok(Keystore {
            public_key: derived_public_key,
            private_key,
        })
    }

    pub fn file_name(&self) -> String {
        keystore_file_name(&self.public_key)
    }
}

pub fn keystore_file_name(public_key: &PublicKey) -> String {
    format!("{public_key}.json")
}

pub fn is_keystore_file(path: &Path) -> bool {
    path.is_file() && path.extension().and_then(|extension| extension.to_str()) == Some("json")
}

#[cfg(test)]
mod tests {
    use alloy_primitives::Address;
    use tempdir::TempDir;

    use super::*;

    const TEST_ITERATIONS: u32 = 16;

    #[test]
    fn test_bls_keystore_round_trip() {
        let private_key = PrivateKey::generate().unwrap();
        let keystore =
            EncryptedKeystore::from_private_key(&private_key, b"password123", TEST_ITERATIONS)
                .unwrap();

        assert!(keystore.validate_password(b"password123").unwrap());
        assert!(!keystore.validate_password(b"wrong").unwrap());

        let decrypted = keystore.decrypt(b"password123").unwrap();
        assert_eq!(decrypted.private_key, private_key);
        assert_eq!(decrypted.public_key, private_key.public_key().unwrap());
        assert!(keystore.decrypt(b"wrong").is_err());
    }

    #[test]
    fn test_keystore_file_round_trip() {
        let temp_dir = TempDir::new("keystore").unwrap();
        let keystore = EncryptedKeystore::<Address>::encrypt(
            &[0x42; 32],
            b"node",
            Address::repeat_byte(0x11),
            String::new(),
            TEST_ITERATIONS,
        )
        .unwrap();

        let path = temp_dir.path().join("node_wallet.json");
        keystore.save_to_file(&path).unwrap();
        assert!(is_keystore_file(&path));

        let loaded = EncryptedKeystore::<Address>::load_from_file(&path).unwrap();
        assert_eq!(loaded, keystore);
        assert_eq!(loaded.decrypt_secret(b"node").unwrap(), vec![0x42; 32]);
    }

    #[test]
    fn test_keystore_json_layout() {
        let keystore = EncryptedKeystore::<Address>::encrypt(
            &[1; 32],
            b"layout",
            Address::ZERO,
            "m/12381/3600/0/0/0".to_string(),
            TEST_ITERATIONS,
        )
        .unwrap();

        let json: serde_json::Value = serde_json::to_value(&keystore).unwrap();
        assert_eq!(json["crypto"]["kdf"]["function"], "pbkdf2");
        assert_eq!(json["crypto"]["kdf"]["params"]["prf"], "hmac-sha256");
        assert_eq!(json["crypto"]["cipher"]["function"], "aes-128-ctr");
        assert_eq!(json["crypto"]["checksum"]["function"], "sha256");
        assert_eq!(json["version"], 4);
    }
}
