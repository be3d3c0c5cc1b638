use std::{fs, path::PathBuf, sync::Arc};

use redb::{Builder, Database};
use tracing::info;

use crate::{
    errors::StoreError,
    tables::{
        available_keys::{AVAILABLE_KEYS_FIELD, AvailableKeysField},
        deposit_data::{DEPOSIT_DATA_FIELD, DepositDataField},
    },
};

pub const REDB_FILE: &str = "depot.redb";

/// The size of the cache for the database
///
/// 16 MiB
pub const REDB_CACHE_SIZE: usize = 16 * 1_024 * 1_024;

#[derive(Clone, Debug)]
pub struct DepotDB {
    pub db: Arc<Database>,
}

impl DepotDB {
    pub fn new(data_dir: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&data_dir)?;
        let db = Builder::new()
            .set_cache_size(REDB_CACHE_SIZE)
            .create(data_dir.join(REDB_FILE))?;

        let write_txn = db.begin_write()?;
        write_txn.open_table(AVAILABLE_KEYS_FIELD)?;
        write_txn.open_table(DEPOSIT_DATA_FIELD)?;
        write_txn.commit()?;
        info!(path = %data_dir.join(REDB_FILE).display(), "Opened database");

        Ok(DepotDB { db: Arc::new(db) })
    }

    pub fn available_keys_provider(&self) -> AvailableKeysField {
        AvailableKeysField {
            db: self.db.clone(),
        }
    }

    pub fn deposit_data_provider(&self) -> DepositDataField {
        DepositDataField {
            db: self.db.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;
    use depot_bls::PublicKey;
    use tempdir::TempDir;

    use super::*;
    use crate::tables::{
        available_keys::{AvailableKey, AvailableKeyList},
        deposit_data::StoredDepositData,
        field::Field,
    };

    #[test]
    fn test_unwritten_fields_read_as_default() {
        let dir = TempDir::new("depot_db").unwrap();
        let db = DepotDB::new(dir.path().to_path_buf()).unwrap();

        assert_eq!(
            db.available_keys_provider().get().unwrap(),
            AvailableKeyList::default()
        );
        assert_eq!(
            db.deposit_data_provider().get().unwrap(),
            StoredDepositData::default()
        );
    }

    #[test]
    fn test_available_keys_survive_reopen() {
        let dir = TempDir::new("depot_db").unwrap();
        let list = AvailableKeyList {
            next_block_to_scan: 1_234,
            keys: vec![
                AvailableKey::new(PublicKey::from_bytes(&[0xaa; 48]).unwrap()),
                AvailableKey {
                    public_key: PublicKey::from_bytes(&[0xbb; 48]).unwrap(),
                    last_deposit_root: Some(B256::repeat_byte(7)),
                    has_lookback_scanned: true,
                },
            ],
        };

        {
            let db = DepotDB::new(dir.path().to_path_buf()).unwrap();
            db.available_keys_provider().insert(list.clone()).unwrap();
        }

        let db = DepotDB::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(db.available_keys_provider().get().unwrap(), list);

        db.available_keys_provider()
            .insert(AvailableKeyList::default())
            .unwrap();
        assert!(db.available_keys_provider().get().unwrap().keys.is_empty());
    }

    #[test]
    fn test_deposit_data_version_round_trip() {
        let dir = TempDir::new("depot_db").unwrap();
        let db = DepotDB::new(dir.path().to_path_buf()).unwrap();
        db.deposit_data_provider()
            .insert(StoredDepositData {
                version: 3,
                deposit_data: vec![],
            })
            .unwrap();
        assert_eq!(db.deposit_data_provider().get().unwrap().version, 3);
    }
}
