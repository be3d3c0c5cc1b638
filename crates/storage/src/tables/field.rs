use crate::errors::StoreError;

/// A single-record table. Reading a record that was never written yields its default.
#[allow(clippy::result_large_err)]
pub trait Field {
    type Value;

    fn get(&self) -> Result<Self::Value, StoreError>;

    /// Replaces the whole record in one durable write transaction.
    fn insert(&self, value: Self::Value) -> Result<(), StoreError>;
}
