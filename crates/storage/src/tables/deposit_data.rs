use std::sync::Arc;

use depot_validator::deposit::ExtendedDepositData;
use redb::{Database, Durability, TableDefinition};
use serde::{Deserialize, Serialize};

use crate::{
    errors::StoreError,
    tables::{encoding::JsonEncoding, field::Field},
};

/// Table definition for the Deposit_Data table
///
/// Value: StoredDepositData
pub(crate) const DEPOSIT_DATA_FIELD: TableDefinition<&str, JsonEncoding<StoredDepositData>> =
    TableDefinition::new("deposit_data");

const DEPOSIT_DATA_KEY: &str = "deposit_data_key";

/// The last aggregated deposit-data set accepted from the authorization service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredDepositData {
    pub version: u64,
    pub deposit_data: Vec<ExtendedDepositData>,
}

pub struct DepositDataField {
    pub db: Arc<Database>,
}

impl Field for DepositDataField {
    type Value = StoredDepositData;

    fn get(&self) -> Result<StoredDepositData, StoreError> {
        let read_txn = self.db.begin_read()?;

        let table = read_txn.open_table(DEPOSIT_DATA_FIELD)?;
        Ok(table
            .get(DEPOSIT_DATA_KEY)?
            .map(|value| value.value())
            .unwrap_or_default())
    }

    fn insert(&self, value: Self::Value) -> Result<(), StoreError> {
        let mut write_txn = self.db.begin_write()?;
        write_txn.set_durability(Durability::Immediate);
        let mut table = write_txn.open_table(DEPOSIT_DATA_FIELD)?;
        table.insert(DEPOSIT_DATA_KEY, value)?;
        drop(table);
        write_txn.commit()?;
        Ok(())
    }
}
