pub mod available_keys;
pub mod deposit_data;
pub mod encoding;
pub mod field;
