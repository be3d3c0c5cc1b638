use std::sync::Arc;

use alloy_primitives::B256;
use depot_bls::PublicKey;
use redb::{Database, Durability, TableDefinition};
use ssz_derive::{Decode, Encode};

use crate::{
    errors::StoreError,
    tables::{encoding::SSZEncoding, field::Field},
};

/// Table definition for the Available_Keys table
///
/// Value: AvailableKeyList
pub(crate) const AVAILABLE_KEYS_FIELD: TableDefinition<&str, SSZEncoding<AvailableKeyList>> =
    TableDefinition::new("available_keys");

const AVAILABLE_KEYS_KEY: &str = "available_keys_key";

/// A generated validator key that has not been irrevocably deposited yet.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct AvailableKey {
    pub public_key: PublicKey,
    /// Deposit root the key was last handed out against.
    pub last_deposit_root: Option<B256>,
    pub has_lookback_scanned: bool,
}

impl AvailableKey {
    pub fn new(public_key: PublicKey) -> Self {
        Self {
            public_key,
            last_deposit_root: None,
            has_lookback_scanned: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Encode, Decode)]
pub struct AvailableKeyList {
    /// First execution block the deposit-log scan has not covered yet.
    pub next_block_to_scan: u64,
    pub keys: Vec<AvailableKey>,
}

pub struct AvailableKeysField {
    pub db: Arc<Database>,
}

impl Field for AvailableKeysField {
    type Value = AvailableKeyList;

    fn get(&self) -> Result<AvailableKeyList, StoreError> {
        let read_txn = self.db.begin_read()?;

        let table = read_txn.open_table(AVAILABLE_KEYS_FIELD)?;
        Ok(table
            .get(AVAILABLE_KEYS_KEY)?
            .map(|value| value.value())
            .unwrap_or_default())
    }

    fn insert(&self, value: Self::Value) -> Result<(), StoreError> {
        let mut write_txn = self.db.begin_write()?;
        write_txn.set_durability(Durability::Immediate);
        let mut table = write_txn.open_table(AVAILABLE_KEYS_FIELD)?;
        table.insert(AVAILABLE_KEYS_KEY, value)?;
        drop(table);
        write_txn.commit()?;
        Ok(())
    }
}
