use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Redb(#[from] Box<redb::Error>),

    #[error("Failed to create the database directory: {0}")]
    Io(#[from] std::io::Error),
}

macro_rules! impl_from_redb {
    ($($error:ty),+ $(,)?) => {
        $(
            impl From<$error> for StoreError {
                fn from(err: $error) -> Self {
                    StoreError::Redb(Box::new(err.into()))
                }
            }
        )+
    };
}

impl_from_redb!(
    redb::Error,
    redb::TransactionError,
    redb::TableError,
    redb::CommitError,
    redb::StorageError,
    redb::DatabaseError,
);
