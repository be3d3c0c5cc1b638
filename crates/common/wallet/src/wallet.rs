use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use alloy_primitives::{Address, hex};
use depot_bls::{PrivateKey, PublicKey};
use depot_keystore::{
    envelope::random_secret_key,
    keystore::{EncryptedKeystore, is_keystore_file, keystore_file_name},
    password::{load_password_file, process_password},
};
use tracing::{debug, info, warn};

use crate::{error::WalletError, node_wallet::NodeWallet};

pub const NODE_WALLET_FILE: &str = "node_wallet.json";
pub const NODE_PASSWORD_FILE: &str = "node_password";
pub const VALIDATORS_DIRECTORY: &str = "validators";
pub const VALIDATOR_PASSWORD_FILE: &str = "password";
pub const DEFAULT_KDF_ITERATIONS: u32 = 262_144;

/// On-disk wallet: the node account plus one EIP-2335 keystore per validator key.
///
/// ```text
/// <data_dir>/node_wallet.json
/// <data_dir>/node_password
/// <data_dir>/validators/password
/// <data_dir>/validators/0x<pubkey>.json
/// ```
#[derive(Debug, Clone)]
pub struct Wallet {
    data_dir: PathBuf,
    parent_dir: Option<PathBuf>,
    kdf_iterations: u32,
}

impl Wallet {
    pub fn new(data_dir: PathBuf, parent_dir: Option<PathBuf>) -> Self {
        Self {
            data_dir,
            parent_dir,
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
        }
    }

    pub fn with_kdf_iterations(mut self, kdf_iterations: u32) -> Self {
        self.kdf_iterations = kdf_iterations;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn node_wallet_path(&self) -> PathBuf {
        self.data_dir.join(NODE_WALLET_FILE)
    }

    fn node_password_path(&self) -> PathBuf {
        self.data_dir.join(NODE_PASSWORD_FILE)
    }

    fn validators_dir(&self) -> PathBuf {
        self.data_dir.join(VALIDATORS_DIRECTORY)
    }

    fn validator_password_path(&self) -> PathBuf {
        self.validators_dir().join(VALIDATOR_PASSWORD_FILE)
    }

    pub fn is_ready(&self) -> bool {
        self.node_wallet_path().is_file() && self.node_password_path().is_file()
    }

    /// Makes sure a usable node wallet exists locally, copying it from the parent
    /// directory when it is missing.
    pub fn ensure_ready(&self) -> Result<(), WalletError> {
        if !self.is_ready() {
            let Some(parent_dir) = &self.parent_dir else {
                return Err(WalletError::NotReady(self.data_dir.clone()));
            };
            let sources = [
                parent_dir.join(NODE_WALLET_FILE),
                parent_dir.join(NODE_PASSWORD_FILE),
            ];
            if let Some(missing) = sources.iter().find(|source| !source.is_file()) {
                return Err(WalletError::ParentFileMissing(missing.clone()));
            }

            fs::create_dir_all(&self.data_dir)?;
            fs::copy(&sources[0], self.node_wallet_path())?;
            fs::copy(&sources[1], self.node_password_path())?;
            info!(parent = %parent_dir.display(), "Copied node wallet from parent directory");
        }

        self.node_wallet().map(|_| ())
    }

    pub fn initialize_node_wallet(&self) -> Result<Address, WalletError> {
        if self.node_wallet_path().exists() {
            return Err(WalletError::AlreadyInitialized(self.node_wallet_path()));
        }

        let node_wallet = NodeWallet::from_secret_key(random_secret_key());
        let password = generate_password();
        let keystore = EncryptedKeystore::encrypt(
            &node_wallet.secret_bytes(),
            &process_password(&password),
            node_wallet.address(),
            String::new(),
            self.kdf_iterations,
        )?;

        fs::create_dir_all(&self.data_dir)?;
        fs::write(self.node_password_path(), &password)?;
        keystore.save_to_file(self.node_wallet_path())?;
        info!(address = %node_wallet.address(), "Initialized node wallet");
        Ok(node_wallet.address())
    }

    pub fn node_wallet(&self) -> Result<NodeWallet, WalletError> {
        if !self.is_ready() {
            return Err(WalletError::NotReady(self.data_dir.clone()));
        }

        let password = load_password_file(self.node_password_path())?;
        let keystore = EncryptedKeystore::<Address>::load_from_file(self.node_wallet_path())?;
        let node_wallet =
            NodeWallet::from_bytes(&keystore.decrypt_secret(&process_password(&password))?)?;
        if node_wallet.address() != keystore.public_key {
            return Err(WalletError::AddressMismatch {
                expected: keystore.public_key,
                actual: node_wallet.address(),
            });
        }
        Ok(node_wallet)
    }

    fn validator_password(&self) -> Result<String, WalletError> {
        let path = self.validator_password_path();
        if path.is_file() {
            return Ok(load_password_file(path)?);
        }

        fs::create_dir_all(self.validators_dir())?;
        let password = generate_password();
        fs::write(&path, &password)?;
        Ok(password)
    }

    /// Creates a fresh BLS key and stores it as `validators/0x<pubkey>.json`.
    pub fn generate_validator_key(&self) -> Result<PrivateKey, WalletError> {
        let private_key = PrivateKey::generate()?;
        let password = self.validator_password()?;
        let keystore = EncryptedKeystore::from_private_key(
            &private_key,
            &process_password(&password),
            self.kdf_iterations,
        )?;

        keystore.save_to_file(self.validators_dir().join(keystore.file_name()))?;
        debug!(public_key = ?keystore.public_key, "Saved validator keystore");
        Ok(private_key)
    }

    pub fn validator_key(&self, public_key: &PublicKey) -> Result<Option<PrivateKey>, WalletError> {
        Ok(self
            .validator_keys(std::slice::from_ref(public_key))?
            .remove(public_key))
    }

    /// Decrypts the keystores for `public_keys`. Keys without a readable keystore are absent
    /// from the result.
    pub fn validator_keys(
        &self,
        public_keys: &[PublicKey],
    ) -> Result<HashMap<PublicKey, PrivateKey>, WalletError> {
        let present = public_keys
            .iter()
            .map(|public_key| {
                let path = self.validators_dir().join(keystore_file_name(public_key));
                (public_key, path)
            })
            .filter(|(_, path)| path.is_file())
            .collect::<Vec<_>>();
        if present.is_empty() {
            return Ok(HashMap::new());
        }

        let password = process_password(&load_password_file(self.validator_password_path())?);
        let mut keys = HashMap::with_capacity(present.len());
        for (public_key, path) in present {
            match EncryptedKeystore::<PublicKey>::load_from_file(&path)
                .and_then(|keystore| keystore.decrypt(&password))
            {
                Ok(keystore) => {
                    keys.insert(public_key.clone(), keystore.private_key);
                }
                Err(err) => warn!(?public_key, "Skipping unreadable keystore: {err}"),
            }
        }
        Ok(keys)
    }

    /// Every validator key in the wallet. Unreadable keystores are skipped.
    pub fn all_validator_keys(&self) -> Result<Vec<PrivateKey>, WalletError> {
        let validators_dir = self.validators_dir();
        if !validators_dir.is_dir() {
            return Ok(vec![]);
        }

        let password = process_password(&load_password_file(self.validator_password_path())?);
        let mut keys = vec![];
        for entry in fs::read_dir(&validators_dir)? {
            let path = entry?.path();
            if !is_keystore_file(&path) {
                continue;
            }
            match EncryptedKeystore::<PublicKey>::load_from_file(&path)
                .and_then(|keystore| keystore.decrypt(&password))
            {
                Ok(keystore) => keys.push(keystore.private_key),
                Err(err) => warn!(path = %path.display(), "Skipping unreadable keystore: {err}"),
            }
        }
        Ok(keys)
    }
}

fn generate_password() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;

    const TEST_ITERATIONS: u32 = 16;

    fn wallet(dir: &TempDir, parent_dir: Option<PathBuf>) -> Wallet {
        Wallet::new(dir.path().join("data"), parent_dir).with_kdf_iterations(TEST_ITERATIONS)
    }

    #[test]
    fn test_not_ready_without_parent() {
        let dir = TempDir::new("wallet").unwrap();
        let wallet = wallet(&dir, None);
        assert!(!wallet.is_ready());
        assert!(matches!(wallet.ensure_ready(), Err(WalletError::NotReady(_))));
        assert!(matches!(wallet.node_wallet(), Err(WalletError::NotReady(_))));
    }

    #[test]
    fn test_initialize_and_load_node_wallet() {
        let dir = TempDir::new("wallet").unwrap();
        let wallet = wallet(&dir, None);
        let address = wallet.initialize_node_wallet().unwrap();

        assert!(wallet.is_ready());
        wallet.ensure_ready().unwrap();
        assert_eq!(wallet.node_wallet().unwrap().address(), address);
        assert!(matches!(
            wallet.initialize_node_wallet(),
            Err(WalletError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn test_ensure_ready_copies_from_parent() {
        let dir = TempDir::new("wallet").unwrap();
        let parent =
            Wallet::new(dir.path().join("parent"), None).with_kdf_iterations(TEST_ITERATIONS);
        let address = parent.initialize_node_wallet().unwrap();

        let wallet = wallet(&dir, Some(dir.path().join("parent")));
        assert!(!wallet.is_ready());
        wallet.ensure_ready().unwrap();
        assert!(wallet.is_ready());
        assert_eq!(wallet.node_wallet().unwrap().address(), address);
    }

    #[test]
    fn test_ensure_ready_reports_missing_parent_file() {
        let dir = TempDir::new("wallet").unwrap();
        fs::create_dir_all(dir.path().join("parent")).unwrap();
        let wallet = wallet(&dir, Some(dir.path().join("parent")));
        assert!(matches!(
            wallet.ensure_ready(),
            Err(WalletError::ParentFileMissing(_))
        ));
    }

    #[test]
    fn test_ensure_ready_rejects_corrupt_wallet() {
        let dir = TempDir::new("wallet").unwrap();
        let wallet = wallet(&dir, None);
        wallet.initialize_node_wallet().unwrap();
        fs::write(dir.path().join("data").join(NODE_PASSWORD_FILE), "wrong").unwrap();
        assert!(matches!(wallet.ensure_ready(), Err(WalletError::Keystore(_))));
    }

    #[test]
    fn test_generate_and_load_validator_keys() {
        let dir = TempDir::new("wallet").unwrap();
        let wallet = wallet(&dir, None);
        let first = wallet.generate_validator_key().unwrap();
        let second = wallet.generate_validator_key().unwrap();
        let first_public_key = first.public_key().unwrap();
        let second_public_key = second.public_key().unwrap();

        assert_eq!(wallet.validator_key(&first_public_key).unwrap(), Some(first.clone()));

        let unknown = PrivateKey::generate().unwrap().public_key().unwrap();
        let keys = wallet
            .validator_keys(&[
                first_public_key.clone(),
                unknown.clone(),
                second_public_key.clone(),
            ])
            .unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[&second_public_key], second);
        assert!(!keys.contains_key(&unknown));
        assert_eq!(wallet.validator_key(&unknown).unwrap(), None);

        let mut all = wallet.all_validator_keys().unwrap();
        all.sort_by_key(|key| key.inner);
        let mut expected = vec![first, second];
        expected.sort_by_key(|key| key.inner);
        assert_eq!(all, expected);
    }

    #[test]
    fn test_empty_validator_directory() {
        let dir = TempDir::new("wallet").unwrap();
        let wallet = wallet(&dir, None);
        assert!(wallet.all_validator_keys().unwrap().is_empty());
        assert!(wallet.validator_keys(&[]).unwrap().is_empty());
    }
}
