pub mod error;
pub mod manager;

pub use error::KeyManagerError;
pub use manager::{
    AvailableKeyManager, AvailableKeys, DEPOSIT_EVENT_LOOKBACK_LIMIT, GetAvailableKeysOptions,
    INTERVAL_SIZE, IneligibleReason,
};
